//! Upstream source descriptions.
//!
//! Every upstream the router can hand to the executor is a [`SourceSpec`].
//! The executor never special-cases a particular registry: it only looks at
//! the source's kind (to choose a normalizer), its URL template, its timeout
//! and whether it wants an API key.

use crate::domain::Domain;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Placeholder replaced with the full domain name.
pub const DOMAIN_PLACEHOLDER: &str = "{domain}";

/// Placeholder replaced with the domain's TLD.
pub const TLD_PLACEHOLDER: &str = "{tld}";

/// Header used for aggregator API keys when none is configured.
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

/// TLD-agnostic RDAP redirector used for unknown TLDs and as a last resort.
pub const RDAP_BOOTSTRAP_TEMPLATE: &str = "https://rdap.org/domain/{domain}";

/// Family of upstream a source belongs to.
///
/// The kind selects the response shape the normalizer expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Authoritative RDAP server operated by (or for) the TLD's registry
    RdapRegistry,
    /// Directory service that resolves the authoritative RDAP server itself
    RdapBootstrap,
    /// Non-RDAP WHOIS API returning flat JSON fields
    WhoisAggregator,
    /// Third-party service relaying RDAP responses unchanged
    RdapProxy,
}

impl SourceKind {
    /// Whether responses from this kind follow the RDAP JSON shape.
    pub fn speaks_rdap(&self) -> bool {
        !matches!(self, Self::WhoisAggregator)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::RdapRegistry => write!(f, "RDAP registry"),
            SourceKind::RdapBootstrap => write!(f, "RDAP bootstrap"),
            SourceKind::WhoisAggregator => write!(f, "WHOIS aggregator"),
            SourceKind::RdapProxy => write!(f, "RDAP proxy"),
        }
    }
}

/// Static description of one upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    /// Stable identifier, reported as the `source` of a result
    pub id: String,

    /// Response family
    pub kind: SourceKind,

    /// URL with `{domain}` / `{tld}` placeholders. A template without
    /// `{domain}` gets the domain appended.
    pub endpoint_template: String,

    /// Upper bound for one call to this source
    pub timeout: Duration,

    /// Whether the call must carry an API key
    pub requires_api_key: bool,

    /// Header name for the API key
    pub api_key_header: String,
}

impl SourceSpec {
    /// Create a keyless source with the given default timeout.
    pub fn new<I: Into<String>, T: Into<String>>(
        id: I,
        kind: SourceKind,
        endpoint_template: T,
        timeout: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            endpoint_template: endpoint_template.into(),
            timeout,
            requires_api_key: false,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
        }
    }

    /// An authoritative RDAP registry source.
    pub fn rdap_registry<I: Into<String>, T: Into<String>>(id: I, template: T, timeout: Duration) -> Self {
        Self::new(id, SourceKind::RdapRegistry, template, timeout)
    }

    /// The TLD-agnostic bootstrap source.
    pub fn rdap_bootstrap(timeout: Duration) -> Self {
        Self::new("rdap-org", SourceKind::RdapBootstrap, RDAP_BOOTSTRAP_TEMPLATE, timeout)
    }

    /// Require an API key sent in `header`.
    pub fn with_api_key_header<H: Into<String>>(mut self, header: H) -> Self {
        self.requires_api_key = true;
        self.api_key_header = header.into();
        self
    }

    /// Override the timeout for this source.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Substitute the domain into the endpoint template.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use whois_lookup_lib::{Domain, SourceSpec};
    ///
    /// let spec = SourceSpec::rdap_registry(
    ///     "verisign-com",
    ///     "https://rdap.verisign.com/com/v1/domain/",
    ///     Duration::from_secs(10),
    /// );
    /// let domain = Domain::parse("example.com").unwrap();
    /// assert_eq!(spec.url_for(&domain), "https://rdap.verisign.com/com/v1/domain/example.com");
    /// ```
    pub fn url_for(&self, domain: &Domain) -> String {
        let url = self.endpoint_template.replace(TLD_PLACEHOLDER, domain.tld());
        if url.contains(DOMAIN_PLACEHOLDER) {
            url.replace(DOMAIN_PLACEHOLDER, domain.fqdn())
        } else {
            format!("{}{}", url, domain.fqdn())
        }
    }
}

impl std::fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.kind)
    }
}
