//! Fallback execution.
//!
//! The executor walks the router's candidates one at a time, bounding each
//! call by the candidate's own timeout. The first usable record wins; every
//! failure along the way is classified and kept so that, if the chain runs
//! dry, the caller sees exactly what was tried and why each attempt failed.

use crate::domain::Domain;
use crate::error::{FailureKind, LookupError, SourceFailure};
use crate::normalize::normalize;
use crate::sources::SourceSpec;
use crate::transport::{call_with_timeout, FetchRequest, Fetcher, RawResponse, TransportError};
use crate::types::{LookupOutcome, LookupResult, NoRegistrationData};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// What a single attempt produced.
enum Attempt {
    /// A usable record; stop here
    Found(LookupResult),
    /// Authoritative 404 from the last candidate
    NotRegistered,
    /// Record the failure and try the next candidate
    Failed(FailureKind, String),
}

/// Drains candidate lists against a [`Fetcher`].
///
/// Holds no per-lookup state, so one executor can serve concurrent lookups.
#[derive(Clone)]
pub struct Executor {
    fetcher: Arc<dyn Fetcher>,
    api_key: Option<String>,
}

impl Executor {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            api_key: None,
        }
    }

    /// Set the key sent to sources that require one. Blank keys count as unset.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Resolve `domain` against `candidates`, in order.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::AllSourcesExhausted` with one entry per
    /// candidate when none produced a usable record.
    pub async fn execute(
        &self,
        domain: &Domain,
        candidates: &[SourceSpec],
    ) -> Result<LookupOutcome, LookupError> {
        let mut attempts = Vec::with_capacity(candidates.len());
        // A 404 is authoritative only from the last source that will really be queried.
        let last_callable = candidates.iter().rposition(|spec| self.can_query(spec));

        for (index, spec) in candidates.iter().enumerate() {
            let is_last = Some(index) == last_callable;

            match self.attempt(domain, spec, is_last).await {
                Attempt::Found(result) => {
                    debug!(domain = %domain, source = %spec.id, "usable record found");
                    return Ok(LookupOutcome::Registered(result));
                }
                Attempt::NotRegistered => {
                    debug!(domain = %domain, source = %spec.id, "no registration data");
                    return Ok(LookupOutcome::Unregistered(NoRegistrationData::new(
                        domain.fqdn(),
                        &spec.id,
                    )));
                }
                Attempt::Failed(kind, detail) => {
                    debug!(
                        domain = %domain,
                        source = %spec.id,
                        reason = %kind,
                        detail = %detail,
                        "source failed, falling back"
                    );
                    attempts.push(SourceFailure::new(&spec.id, kind, detail));
                }
            }
        }

        warn!(
            domain = %domain,
            attempts = attempts.len(),
            "all sources exhausted"
        );
        Err(LookupError::exhausted(domain.fqdn(), attempts))
    }

    /// Whether `spec` would be sent a request rather than skipped for a missing key.
    pub fn can_query(&self, spec: &SourceSpec) -> bool {
        !spec.requires_api_key || self.api_key.is_some()
    }

    async fn attempt(&self, domain: &Domain, spec: &SourceSpec, is_last: bool) -> Attempt {
        let mut request = FetchRequest::new(spec.url_for(domain));

        if spec.requires_api_key {
            match &self.api_key {
                Some(key) => request = request.with_header(&spec.api_key_header, key),
                None => {
                    return Attempt::Failed(
                        FailureKind::MissingApiKey,
                        format!("no API key configured for header {}", spec.api_key_header),
                    )
                }
            }
        }

        debug!(source = %spec.id, url = %request.url, timeout = ?spec.timeout, "querying source");

        let response = match call_with_timeout(spec.timeout, self.fetcher.get(&request)).await {
            None | Some(Err(TransportError::Timeout)) => {
                return Attempt::Failed(
                    FailureKind::SourceTimeout,
                    format!("no response within {:?}", spec.timeout),
                )
            }
            Some(Err(e)) => return Attempt::Failed(FailureKind::SourceUnreachable, e.to_string()),
            Some(Ok(response)) => response,
        };

        debug!(source = %spec.id, status = response.status, "source responded");

        if response.status == 404 && is_last {
            return Attempt::NotRegistered;
        }
        if !response.is_success() {
            return Attempt::Failed(
                FailureKind::SourceHttpError,
                format!("HTTP {}", response.status),
            );
        }

        let raw = match serde_json::from_slice(&response.body) {
            Ok(body) => RawResponse {
                source: spec.id.clone(),
                url: request.url,
                http_status: response.status,
                fetched_at: Utc::now(),
                body,
            },
            Err(e) => return Attempt::Failed(FailureKind::SourceUnparsable, e.to_string()),
        };

        let data = normalize(spec.kind, &raw.body);
        if !data.is_usable() {
            return Attempt::Failed(
                FailureKind::SourceEmpty,
                "no registrar, creation date or nameservers".to_string(),
            );
        }

        let mut result = LookupResult::new(domain.fqdn(), data, raw.source);
        result.resolved_at = raw.fetched_at;
        Attempt::Found(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceKind;
    use crate::transport::FetchResponse;
    use crate::types::Known;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted upstream behaviour keyed by URL.
    #[derive(Clone)]
    enum Reply {
        Status(u16, &'static str),
        Hang,
        Refused,
    }

    #[derive(Default)]
    struct MockFetcher {
        replies: HashMap<String, Reply>,
        calls: Mutex<Vec<FetchRequest>>,
    }

    impl MockFetcher {
        fn reply(mut self, url: &str, reply: Reply) -> Self {
            self.replies.insert(url.to_string(), reply);
            self
        }

        fn urls_called(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|r| r.url.clone()).collect()
        }

        fn requests(&self) -> Vec<FetchRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn get(&self, request: &FetchRequest) -> Result<FetchResponse, TransportError> {
            self.calls.lock().unwrap().push(request.clone());
            match self.replies.get(&request.url).cloned() {
                Some(Reply::Status(status, body)) => Ok(FetchResponse::new(status, body)),
                Some(Reply::Hang) => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(FetchResponse::new(200, "{}"))
                }
                Some(Reply::Refused) | None => Err(TransportError::Connect("connection refused".to_string())),
            }
        }
    }

    const USABLE_RDAP: &str = r#"{
        "entities": [{
            "roles": ["registrar"],
            "vcardArray": ["vcard", [["fn", {}, "text", "Example Registrar"]]]
        }],
        "events": [{ "eventAction": "expiration", "eventDate": "2030-01-01T00:00:00Z" }],
        "nameservers": [{ "ldhName": "a.iana-servers.net" }]
    }"#;

    fn spec(id: &str, timeout_ms: u64) -> SourceSpec {
        SourceSpec::rdap_registry(
            id,
            format!("https://{}.test/domain/", id),
            Duration::from_millis(timeout_ms),
        )
    }

    fn url(id: &str, domain: &str) -> String {
        format!("https://{}.test/domain/{}", id, domain)
    }

    fn domain(s: &str) -> Domain {
        Domain::parse(s).unwrap()
    }

    fn executor(fetcher: &Arc<MockFetcher>) -> Executor {
        Executor::new(fetcher.clone())
    }

    #[tokio::test]
    async fn test_timeout_then_usable_short_circuits() {
        let fetcher = Arc::new(
            MockFetcher::default()
                .reply(&url("one", "example.com"), Reply::Hang)
                .reply(&url("two", "example.com"), Reply::Status(200, USABLE_RDAP))
                .reply(&url("three", "example.com"), Reply::Status(200, USABLE_RDAP)),
        );
        let candidates = vec![spec("one", 50), spec("two", 1000), spec("three", 1000)];

        let outcome = executor(&fetcher)
            .execute(&domain("example.com"), &candidates)
            .await
            .unwrap();

        let result = outcome.as_registered().unwrap();
        assert_eq!(result.source, "two");
        assert_eq!(result.domain, "example.com");
        assert_eq!(result.data.registrar, Known::Value("Example Registrar".to_string()));
        assert_eq!(
            fetcher.urls_called(),
            vec![url("one", "example.com"), url("two", "example.com")]
        );
    }

    #[tokio::test]
    async fn test_all_not_found_is_unregistered() {
        let fetcher = Arc::new(
            MockFetcher::default()
                .reply(&url("one", "nonexistent-xyz123.io"), Reply::Status(404, ""))
                .reply(&url("two", "nonexistent-xyz123.io"), Reply::Status(404, "")),
        );
        let candidates = vec![spec("one", 500), spec("two", 500)];

        let outcome = executor(&fetcher)
            .execute(&domain("nonexistent-xyz123.io"), &candidates)
            .await
            .unwrap();

        assert!(!outcome.is_registered());
        assert_eq!(outcome.source(), "two");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["registered"], false);
        assert!(json.get("error").is_none());
        assert_eq!(fetcher.urls_called().len(), 2);
    }

    #[tokio::test]
    async fn test_not_found_before_last_candidate_falls_back() {
        let fetcher = Arc::new(
            MockFetcher::default()
                .reply(&url("one", "example.org"), Reply::Status(404, ""))
                .reply(&url("two", "example.org"), Reply::Status(200, USABLE_RDAP)),
        );
        let candidates = vec![spec("one", 500), spec("two", 500)];

        let outcome = executor(&fetcher)
            .execute(&domain("example.org"), &candidates)
            .await
            .unwrap();
        assert_eq!(outcome.source(), "two");
    }

    #[tokio::test]
    async fn test_all_timeouts_exhaust_chain() {
        let fetcher = Arc::new(
            MockFetcher::default()
                .reply(&url("one", "example.com"), Reply::Hang)
                .reply(&url("two", "example.com"), Reply::Hang)
                .reply(&url("three", "example.com"), Reply::Hang),
        );
        let candidates = vec![spec("one", 20), spec("two", 20), spec("three", 20)];

        let err = executor(&fetcher)
            .execute(&domain("example.com"), &candidates)
            .await
            .unwrap_err();

        let attempts = err.attempts();
        assert_eq!(attempts.len(), 3);
        assert!(attempts.iter().all(|a| a.kind == FailureKind::SourceTimeout));
        assert_eq!(
            attempts.iter().map(|a| a.source.as_str()).collect::<Vec<_>>(),
            vec!["one", "two", "three"]
        );
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_failure_classification() {
        let fetcher = Arc::new(
            MockFetcher::default()
                .reply(&url("refused", "example.com"), Reply::Refused)
                .reply(&url("broken", "example.com"), Reply::Status(503, "unavailable"))
                .reply(&url("garbled", "example.com"), Reply::Status(200, "<html>oops</html>"))
                .reply(&url("empty", "example.com"), Reply::Status(200, r#"{"objectClassName":"domain"}"#))
                .reply(&url("missing", "example.com"), Reply::Status(404, "")),
        );
        let candidates = vec![
            spec("refused", 500),
            spec("broken", 500),
            spec("garbled", 500),
            spec("empty", 500),
            spec("missing", 500),
            spec("last", 500),
        ];

        let err = executor(&fetcher)
            .execute(&domain("example.com"), &candidates)
            .await
            .unwrap_err();

        let kinds: Vec<FailureKind> = err.attempts().iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FailureKind::SourceUnreachable,
                FailureKind::SourceHttpError,
                FailureKind::SourceUnparsable,
                FailureKind::SourceEmpty,
                FailureKind::SourceHttpError,
                FailureKind::SourceUnreachable,
            ]
        );
        assert_eq!(err.attempts()[1].detail, "HTTP 503");
        assert_eq!(err.attempts()[4].detail, "HTTP 404");
    }

    #[tokio::test]
    async fn test_missing_api_key_skips_call() {
        let aggregator = SourceSpec::new(
            "whois-api",
            SourceKind::WhoisAggregator,
            "https://api.whois.test/{domain}",
            Duration::from_millis(500),
        )
        .with_api_key_header("X-API-Key");
        let fetcher = Arc::new(
            MockFetcher::default().reply(&url("two", "example.com"), Reply::Status(200, USABLE_RDAP)),
        );

        let outcome = executor(&fetcher)
            .with_api_key(Some("   ".to_string()))
            .execute(&domain("example.com"), &[aggregator, spec("two", 500)])
            .await
            .unwrap();

        assert_eq!(outcome.source(), "two");
        assert_eq!(fetcher.urls_called(), vec![url("two", "example.com")]);
    }

    #[tokio::test]
    async fn test_not_found_before_skipped_keyed_source_is_unregistered() {
        let aggregator = SourceSpec::new(
            "whois-api",
            SourceKind::WhoisAggregator,
            "https://api.whois.test/{domain}",
            Duration::from_millis(500),
        )
        .with_api_key_header("X-API-Key");
        let fetcher = Arc::new(
            MockFetcher::default().reply(&url("one", "nonexistent-xyz123.museum"), Reply::Status(404, "")),
        );

        let outcome = executor(&fetcher)
            .execute(&domain("nonexistent-xyz123.museum"), &[spec("one", 500), aggregator])
            .await
            .unwrap();

        assert!(!outcome.is_registered());
        assert_eq!(outcome.source(), "one");
        assert_eq!(fetcher.urls_called(), vec![url("one", "nonexistent-xyz123.museum")]);
    }

    #[tokio::test]
    async fn test_api_key_sent_in_configured_header() {
        let aggregator = SourceSpec::new(
            "whois-api",
            SourceKind::WhoisAggregator,
            "https://api.whois.test/{domain}",
            Duration::from_millis(500),
        )
        .with_api_key_header("Authorization");
        let fetcher = Arc::new(MockFetcher::default().reply(
            "https://api.whois.test/example.com",
            Reply::Status(200, r#"{"registrar_name": "Flat Registrar"}"#),
        ));

        let outcome = executor(&fetcher)
            .with_api_key(Some("secret".to_string()))
            .execute(&domain("example.com"), &[aggregator])
            .await
            .unwrap();

        assert_eq!(outcome.source(), "whois-api");
        let requests = fetcher.requests();
        assert_eq!(
            requests[0].headers,
            vec![("Authorization".to_string(), "secret".to_string())]
        );
    }

    #[tokio::test]
    async fn test_rdap_sources_get_no_key_header() {
        let fetcher = Arc::new(
            MockFetcher::default().reply(&url("one", "example.com"), Reply::Status(200, USABLE_RDAP)),
        );
        executor(&fetcher)
            .with_api_key(Some("secret".to_string()))
            .execute(&domain("example.com"), &[spec("one", 500)])
            .await
            .unwrap();
        assert!(fetcher.requests()[0].headers.is_empty());
    }

    #[tokio::test]
    async fn test_empty_candidate_list_exhausts() {
        let fetcher = Arc::new(MockFetcher::default());
        let err = executor(&fetcher)
            .execute(&domain("example.com"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::AllSourcesExhausted { .. }));
        assert!(err.attempts().is_empty());
        assert!(fetcher.urls_called().is_empty());
    }
}
