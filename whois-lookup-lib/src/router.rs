//! Source routing.
//!
//! The router maps a domain's TLD to the ordered list of sources the executor
//! should try. It is built once from static configuration and `route` is a
//! pure function of the TLD: no I/O, no randomness, never empty.
//!
//! Order for a TLD with a known registry:
//! 1. the authoritative RDAP registry
//! 2. the aggregator, when configured
//! 3. an alternate registry endpoint, when one exists for the TLD
//! 4. the RDAP bootstrap redirector
//!
//! Order for any other TLD:
//! 1. the RDAP bootstrap redirector
//! 2. the aggregator, when configured
//! 3. the configured default registry, when set

use crate::domain::Domain;
use crate::error::LookupError;
use crate::registry::{alternate_registries, builtin_registries, parse_iana_bootstrap, source_id_for};
use crate::sources::{SourceKind, SourceSpec};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;

/// Maps domains to ordered candidate sources.
#[derive(Debug, Clone)]
pub struct Router {
    registries: HashMap<String, SourceSpec>,
    alternates: HashMap<String, SourceSpec>,
    bootstrap: SourceSpec,
    aggregator: Option<SourceSpec>,
    default_registry: Option<SourceSpec>,
}

impl Router {
    /// Create a router over the built-in registry table.
    ///
    /// Every built-in source gets `timeout` as its per-call bound.
    pub fn new(timeout: Duration) -> Self {
        let registries = builtin_registries()
            .iter()
            .map(|e| {
                (
                    e.tld.to_string(),
                    SourceSpec::rdap_registry(format!("{}-{}", e.operator, e.tld), e.template, timeout),
                )
            })
            .collect();

        let alternates = alternate_registries()
            .iter()
            .map(|e| {
                (
                    e.tld.to_string(),
                    SourceSpec::rdap_registry(format!("{}-{}", e.operator, e.tld), e.template, timeout),
                )
            })
            .collect();

        Self {
            registries,
            alternates,
            bootstrap: SourceSpec::rdap_bootstrap(timeout),
            aggregator: None,
            default_registry: None,
        }
    }

    /// Add or replace the authoritative source for a TLD.
    ///
    /// Replacing a TLD's registry also drops its built-in alternate endpoint.
    pub fn with_registry<T: AsRef<str>>(mut self, tld: T, spec: SourceSpec) -> Self {
        let tld = tld.as_ref().trim_start_matches('.').to_ascii_lowercase();
        self.alternates.remove(&tld);
        self.registries.insert(tld, spec);
        self
    }

    /// Add registries from an IANA RDAP bootstrap document.
    ///
    /// Built-in entries win over the document; only TLDs the table does not
    /// already cover are added.
    pub fn with_iana_bootstrap(mut self, json: &serde_json::Value) -> Result<Self, LookupError> {
        let timeout = self.bootstrap.timeout;
        for (tld, template) in parse_iana_bootstrap(json)? {
            self.registries.entry(tld).or_insert_with(|| {
                SourceSpec::rdap_registry(source_id_for(&template), template, timeout)
            });
        }
        Ok(self)
    }

    /// Replace the bootstrap redirector.
    pub fn with_bootstrap(mut self, spec: SourceSpec) -> Self {
        self.bootstrap = spec;
        self
    }

    /// Set (or clear) the second-tier aggregator source.
    pub fn with_aggregator(mut self, spec: Option<SourceSpec>) -> Self {
        self.aggregator = spec;
        self
    }

    /// Set (or clear) the last-resort registry for TLDs without a table entry.
    pub fn with_default_registry(mut self, spec: Option<SourceSpec>) -> Self {
        self.default_registry = spec;
        self
    }

    /// The ordered candidates for `domain`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use whois_lookup_lib::{Domain, Router, SourceKind};
    ///
    /// let router = Router::new(Duration::from_secs(10));
    /// let candidates = router.route(&Domain::parse("example.com").unwrap());
    /// assert_eq!(candidates[0].kind, SourceKind::RdapRegistry);
    /// assert_eq!(candidates.last().unwrap().kind, SourceKind::RdapBootstrap);
    /// ```
    pub fn route(&self, domain: &Domain) -> Vec<SourceSpec> {
        let tld = domain.tld();
        let mut chain: Vec<&SourceSpec> = Vec::with_capacity(4);

        match self.registries.get(tld) {
            Some(registry) => {
                chain.push(registry);
                chain.extend(self.aggregator.as_ref());
                chain.extend(self.alternates.get(tld));
                chain.push(&self.bootstrap);
            }
            None => {
                chain.push(&self.bootstrap);
                chain.extend(self.aggregator.as_ref());
                chain.extend(self.default_registry.as_ref());
            }
        }

        let mut seen = HashSet::new();
        chain
            .into_iter()
            .filter(|spec| seen.insert(spec.id.as_str()))
            .cloned()
            .collect()
    }

    /// Whether the TLD has an authoritative registry entry.
    pub fn has_registry(&self, tld: &str) -> bool {
        self.registries.contains_key(&tld.to_ascii_lowercase())
    }

    /// All TLDs with a registry entry, sorted.
    pub fn registry_tlds(&self) -> Vec<String> {
        self.registries
            .keys()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The registry entry for a TLD, if any.
    pub fn registry_for(&self, tld: &str) -> Option<&SourceSpec> {
        self.registries.get(&tld.to_ascii_lowercase())
    }

    /// The configured aggregator, if any.
    pub fn aggregator(&self) -> Option<&SourceSpec> {
        self.aggregator.as_ref()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

/// Build an aggregator source from its pieces.
pub fn aggregator_source<I: Into<String>, T: Into<String>>(
    id: I,
    template: T,
    timeout: Duration,
    api_key_header: Option<String>,
) -> SourceSpec {
    let spec = SourceSpec::new(id, SourceKind::WhoisAggregator, template, timeout);
    match api_key_header {
        Some(header) => spec.with_api_key_header(header),
        None => spec,
    }
}
