//! TLD to RDAP endpoint mappings.
//!
//! Provides the built-in table of authoritative RDAP servers and a parser for
//! the IANA RDAP bootstrap document (`https://data.iana.org/rdap/dns.json`),
//! so a locally saved copy can extend the table without network access at
//! routing time.

use crate::error::LookupError;
use std::collections::BTreeMap;

/// One built-in registry endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub tld: &'static str,
    /// Operator identifier, used as the source id
    pub operator: &'static str,
    pub template: &'static str,
}

const fn entry(tld: &'static str, operator: &'static str, template: &'static str) -> RegistryEntry {
    RegistryEntry {
        tld,
        operator,
        template,
    }
}

/// Authoritative RDAP servers for common gTLDs and ccTLDs.
const BUILTIN_REGISTRIES: &[RegistryEntry] = &[
    // Popular gTLDs
    entry("com", "verisign", "https://rdap.verisign.com/com/v1/domain/"),
    entry("net", "verisign", "https://rdap.verisign.com/net/v1/domain/"),
    entry("org", "pir", "https://rdap.publicinterestregistry.org/rdap/domain/"),
    entry("info", "identity-digital", "https://rdap.identitydigital.services/rdap/domain/"),
    entry("biz", "godaddy-registry", "https://rdap.nic.biz/domain/"),
    // Google TLDs
    entry("app", "google-registry", "https://pubapi.registry.google/rdap/domain/"),
    entry("dev", "google-registry", "https://pubapi.registry.google/rdap/domain/"),
    entry("page", "google-registry", "https://pubapi.registry.google/rdap/domain/"),
    // CentralNic managed gTLDs
    entry("xyz", "centralnic", "https://rdap.centralnic.com/xyz/domain/"),
    entry("tech", "centralnic", "https://rdap.centralnic.com/tech/domain/"),
    entry("online", "centralnic", "https://rdap.centralnic.com/online/domain/"),
    entry("site", "centralnic", "https://rdap.centralnic.com/site/domain/"),
    entry("website", "centralnic", "https://rdap.centralnic.com/website/domain/"),
    // Other popular gTLDs
    entry("blog", "fury-blog", "https://rdap.blog.fury.ca/rdap/domain/"),
    entry("shop", "gmo-registry", "https://rdap.gmoregistry.net/rdap/domain/"),
    entry("cloud", "registry-cloud", "https://rdap.registry.cloud/rdap/domain/"),
    // Identity Digital managed TLDs
    entry("ai", "identity-digital", "https://rdap.identitydigital.services/rdap/domain/"),
    entry("io", "identity-digital", "https://rdap.identitydigital.services/rdap/domain/"),
    entry("me", "identity-digital", "https://rdap.identitydigital.services/rdap/domain/"),
    entry("zone", "identity-digital", "https://rdap.identitydigital.services/rdap/domain/"),
    entry("digital", "identity-digital", "https://rdap.identitydigital.services/rdap/domain/"),
    // Country code TLDs with working RDAP endpoints
    entry("us", "nic-us", "https://rdap.nic.us/domain/"),
    entry("uk", "nominet", "https://rdap.nominet.uk/domain/"),
    entry("de", "denic", "https://rdap.denic.de/domain/"),
    entry("ca", "cira", "https://rdap.ca.fury.ca/rdap/domain/"),
    entry("au", "auda", "https://rdap.cctld.au/rdap/domain/"),
    entry("fr", "afnic", "https://rdap.nic.fr/domain/"),
    entry("nl", "sidn", "https://rdap.sidn.nl/domain/"),
    entry("br", "registro-br", "https://rdap.registro.br/domain/"),
    entry("in", "nixi", "https://rdap.nixiregistry.in/rdap/domain/"),
    entry("vn", "vnnic", "https://rdap.vnnic.vn/rdap/domain/"),
    entry("tv", "verisign", "https://rdap.nic.tv/domain/"),
    entry("cc", "verisign", "https://tld-rdap.verisign.com/cc/v1/domain/"),
];

/// Secondary endpoints operated by someone other than the primary entry.
/// Tried after the aggregator and before the bootstrap redirector.
const ALTERNATE_REGISTRIES: &[RegistryEntry] = &[
    entry("org", "pir-legacy", "https://rdap.publicinterestregistry.net/rdap/org/domain/"),
    entry("dev", "google-apis", "https://rdap.googleapis.com/domain/"),
];

/// The built-in registry table.
pub fn builtin_registries() -> &'static [RegistryEntry] {
    BUILTIN_REGISTRIES
}

/// The built-in alternate endpoints.
pub fn alternate_registries() -> &'static [RegistryEntry] {
    ALTERNATE_REGISTRIES
}

/// Look up the built-in entry for a TLD.
pub fn builtin_entry(tld: &str) -> Option<&'static RegistryEntry> {
    let tld = tld.to_ascii_lowercase();
    BUILTIN_REGISTRIES.iter().find(|e| e.tld == tld)
}

/// Parse an IANA RDAP bootstrap document into TLD → endpoint template.
///
/// The document's `services` array holds `[[tlds...], [urls...]]` pairs.
/// The first URL of each service is used and `domain/` is appended to it.
///
/// # Errors
///
/// Returns `LookupError::Config` if the `services` array is missing.
pub fn parse_iana_bootstrap(json: &serde_json::Value) -> Result<BTreeMap<String, String>, LookupError> {
    let services = json
        .get("services")
        .and_then(|s| s.as_array())
        .ok_or_else(|| {
            LookupError::config("Invalid bootstrap JSON: missing or invalid 'services' array")
        })?;

    let mut endpoints = BTreeMap::new();

    for service in services {
        let Some(pair) = service.as_array().filter(|p| p.len() >= 2) else {
            continue;
        };

        let Some(url) = pair[1]
            .as_array()
            .and_then(|urls| {
                // Prefer HTTPS when a service lists several base URLs
                urls.iter()
                    .filter_map(|u| u.as_str())
                    .find(|u| u.starts_with("https://"))
                    .or_else(|| urls.first().and_then(|u| u.as_str()))
            })
        else {
            continue;
        };

        let template = format!("{}/domain/", url.trim_end_matches('/'));

        if let Some(tlds) = pair[0].as_array() {
            for tld in tlds.iter().filter_map(|t| t.as_str()) {
                endpoints.insert(tld.to_ascii_lowercase(), template.clone());
            }
        }
    }

    Ok(endpoints)
}

/// Derive a source id from an endpoint URL: its host name.
pub fn source_id_for(template: &str) -> String {
    reqwest::Url::parse(template)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| template.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_contains_common_tlds() {
        for tld in ["com", "net", "org", "io", "dev", "vn", "uk"] {
            assert!(builtin_entry(tld).is_some(), "missing {}", tld);
        }
        assert_eq!(builtin_entry("COM").unwrap().operator, "verisign");
        assert!(builtin_entry("unknowntld123").is_none());
    }

    #[test]
    fn test_all_endpoints_are_valid_https_urls() {
        for e in builtin_registries().iter().chain(alternate_registries()) {
            assert!(
                e.template.starts_with("https://"),
                "Endpoint for '{}' must use HTTPS: {}",
                e.tld,
                e.template
            );
            assert!(
                e.template.ends_with("/domain/"),
                "Endpoint for '{}' must end with /domain/: {}",
                e.tld,
                e.template
            );
        }
    }

    #[test]
    fn test_builtin_tlds_unique() {
        let mut seen = HashSet::new();
        for e in builtin_registries() {
            assert!(seen.insert(e.tld), "duplicate entry for {}", e.tld);
        }
    }

    #[test]
    fn test_alternates_differ_from_primary() {
        for alt in alternate_registries() {
            let primary = builtin_entry(alt.tld).expect("alternate without primary");
            assert_ne!(primary.template, alt.template);
            assert_ne!(primary.operator, alt.operator);
        }
    }

    #[test]
    fn test_parse_iana_bootstrap() {
        let json = serde_json::json!({
            "version": "1.0",
            "services": [
                [["example", "test"], ["http://rdap.example.net/", "https://rdap.example.net/"]],
                [["Shop"], ["https://rdap.gmoregistry.net/rdap"]],
                ["malformed"]
            ]
        });

        let endpoints = parse_iana_bootstrap(&json).unwrap();
        assert_eq!(endpoints.len(), 3);
        assert_eq!(endpoints["example"], "https://rdap.example.net/domain/");
        assert_eq!(endpoints["test"], "https://rdap.example.net/domain/");
        assert_eq!(endpoints["shop"], "https://rdap.gmoregistry.net/rdap/domain/");
    }

    #[test]
    fn test_parse_iana_bootstrap_rejects_missing_services() {
        let json = serde_json::json!({ "version": "1.0" });
        assert!(parse_iana_bootstrap(&json).is_err());
    }

    #[test]
    fn test_source_id_for() {
        assert_eq!(
            source_id_for("https://rdap.nic.fr/domain/"),
            "rdap.nic.fr"
        );
        assert_eq!(source_id_for("not a url"), "not a url");
    }
}
