//! Main lookup implementation.
//!
//! [`DomainLookup`] ties the pieces together: validate the input, ask the
//! router for candidates, hand them to the executor.

use crate::domain::Domain;
use crate::executor::Executor;
use crate::router::Router;
use crate::sources::SourceSpec;
use crate::transport::{Fetcher, HttpFetcher};
use crate::types::{LookupConfig, LookupOutcome};
use std::sync::Arc;
use tracing::debug;

/// Resolves registration data for one domain at a time.
///
/// A `DomainLookup` is immutable once built and can be shared between tasks
/// behind an `Arc`; concurrent lookups do not interact.
///
/// # Example
///
/// ```rust,no_run
/// use whois_lookup_lib::{DomainLookup, LookupOutcome};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let lookup = DomainLookup::new()?;
///     match lookup.lookup("example.com").await? {
///         LookupOutcome::Registered(r) => println!("{} expires {}", r.domain, r.data.expires),
///         LookupOutcome::Unregistered(n) => println!("{}: {}", n.domain, n.message),
///     }
///     Ok(())
/// }
/// ```
pub struct DomainLookup {
    /// Configuration settings for this instance
    config: LookupConfig,
    router: Router,
    executor: Executor,
}

impl DomainLookup {
    /// Create a lookup with default configuration and the built-in registry table.
    pub fn new() -> crate::Result<Self> {
        Self::with_config(LookupConfig::default())
    }

    /// Create a lookup with custom configuration and the built-in registry table.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use whois_lookup_lib::{DomainLookup, LookupConfig};
    ///
    /// let config = LookupConfig::default().with_timeout(Duration::from_secs(5));
    /// let lookup = DomainLookup::with_config(config).unwrap();
    /// assert_eq!(lookup.config().timeout, Duration::from_secs(5));
    /// ```
    pub fn with_config(config: LookupConfig) -> crate::Result<Self> {
        let router = Router::new(config.timeout);
        Ok(Self::with_parts(config, router, Arc::new(HttpFetcher::new()?)))
    }

    /// Assemble a lookup from an explicit router and transport.
    ///
    /// The router's aggregator is dropped when `config.enable_aggregator` is
    /// false, or when it needs an API key and none is configured, so that
    /// [`plan`](Self::plan) lists only sources a lookup can actually query.
    pub fn with_parts(config: LookupConfig, router: Router, fetcher: Arc<dyn Fetcher>) -> Self {
        let executor = Executor::new(fetcher).with_api_key(config.api_key.clone());
        let usable_aggregator = router
            .aggregator()
            .is_some_and(|spec| config.enable_aggregator && executor.can_query(spec));
        let router = if usable_aggregator {
            router
        } else {
            router.with_aggregator(None)
        };

        Self {
            config,
            router,
            executor,
        }
    }

    /// Validate `input` and compute the candidate order without any I/O.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::InvalidDomain` for malformed input.
    pub fn plan(&self, input: &str) -> crate::Result<(Domain, Vec<SourceSpec>)> {
        let domain = Domain::parse(input)?;
        let candidates = self.router.route(&domain);
        Ok((domain, candidates))
    }

    /// Look up registration data for a single domain.
    ///
    /// The process:
    /// 1. Sanitizes and validates the input (no network call on failure)
    /// 2. Routes the domain to an ordered list of sources
    /// 3. Tries each source until one yields a usable record
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if:
    /// - The domain name is invalid
    /// - Every source failed (the error lists each attempt)
    pub async fn lookup(&self, input: &str) -> crate::Result<LookupOutcome> {
        let (domain, candidates) = self.plan(input)?;
        debug!(
            domain = %domain,
            candidates = ?candidates.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            "resolving"
        );
        self.executor.execute(&domain, &candidates).await
    }

    /// Get the current configuration.
    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Get the router used for candidate selection.
    pub fn router(&self) -> &Router {
        &self.router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::router::aggregator_source;
    use crate::transport::{FetchRequest, FetchResponse, TransportError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts calls and answers every one with the same response.
    struct CountingFetcher {
        calls: AtomicUsize,
        status: u16,
        body: &'static str,
    }

    impl CountingFetcher {
        fn new(status: u16, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                status,
                body,
            })
        }
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        async fn get(&self, _request: &FetchRequest) -> Result<FetchResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchResponse::new(self.status, self.body))
        }
    }

    fn aggregator() -> SourceSpec {
        aggregator_source(
            "whois-api",
            "https://api.whois.test/{domain}",
            Duration::from_secs(1),
            Some("X-API-Key".to_string()),
        )
    }

    #[tokio::test]
    async fn test_invalid_domain_makes_no_call() {
        let fetcher = CountingFetcher::new(200, "{}");
        let lookup = DomainLookup::with_parts(LookupConfig::default(), Router::default(), fetcher.clone());

        for input in ["", "not a domain", "localhost", "bad_label.com", "-x.com"] {
            let err = lookup.lookup(input).await.unwrap_err();
            assert!(err.is_client_error(), "{}: {:?}", input, err);
            assert!(err.attempts().is_empty());
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lookup_sanitizes_input() {
        let fetcher = CountingFetcher::new(
            200,
            r#"{"nameservers": [{"ldhName": "ns1.example.com"}]}"#,
        );
        let lookup = DomainLookup::with_parts(LookupConfig::default(), Router::default(), fetcher.clone());

        let outcome = lookup.lookup("https://WWW.Example.COM/path?q=1").await.unwrap();
        assert_eq!(outcome.domain(), "www.example.com");
        assert_eq!(outcome.source(), "verisign-com");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_answers_everywhere_exhaust() {
        let fetcher = CountingFetcher::new(200, "{}");
        let lookup = DomainLookup::with_parts(LookupConfig::default(), Router::default(), fetcher.clone());

        let err = tokio_test::block_on(lookup.lookup("example.com")).unwrap_err();
        let reasons: Vec<_> = err.attempts().iter().map(|a| a.kind).collect();
        assert_eq!(reasons, vec![FailureKind::SourceEmpty, FailureKind::SourceEmpty]);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_disabled_aggregator_is_not_routed() {
        let router = Router::default().with_aggregator(Some(aggregator()));
        let fetcher = CountingFetcher::new(200, "{}");

        let enabled = DomainLookup::with_parts(
            LookupConfig::default().with_api_key("secret"),
            router.clone(),
            fetcher.clone(),
        );
        let (_, candidates) = enabled.plan("example.com").unwrap();
        assert!(candidates.iter().any(|c| c.id == "whois-api"));

        let disabled = DomainLookup::with_parts(
            LookupConfig::default().with_api_key("secret").with_aggregator(false),
            router,
            fetcher,
        );
        let (_, candidates) = disabled.plan("example.com").unwrap();
        assert!(candidates.iter().all(|c| c.id != "whois-api"));
        assert!(disabled.router().aggregator().is_none());
    }

    #[tokio::test]
    async fn test_keyless_aggregator_does_not_mask_not_found() {
        let router = Router::default().with_aggregator(Some(aggregator()));
        let fetcher = CountingFetcher::new(404, "");
        let lookup = DomainLookup::with_parts(LookupConfig::default(), router, fetcher.clone());

        let (_, candidates) = lookup.plan("nonexistent-xyz123.museum").unwrap();
        let ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["rdap-org"]);

        let outcome = lookup.lookup("nonexistent-xyz123.museum").await.unwrap();
        match outcome {
            LookupOutcome::Unregistered(none) => assert_eq!(none.source, "rdap-org"),
            other => panic!("expected unregistered, got {:?}", other),
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let router = Router::default().with_aggregator(Some(aggregator()));
        let lookup = DomainLookup::with_parts(
            LookupConfig::default().with_api_key("  "),
            router,
            CountingFetcher::new(200, "{}"),
        );
        assert!(lookup.router().aggregator().is_none());
    }

    #[test]
    fn test_lookup_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DomainLookup>();
    }
}
