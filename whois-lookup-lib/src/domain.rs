//! Domain name sanitizing and validation.
//!
//! User input often arrives as a URL or with stray decoration
//! (`https://Example.com/path`, `example.com.`). [`sanitize_input`] reduces it
//! to a bare hostname and [`Domain::parse`] enforces the hostname grammar.
//! Nothing here touches the network.

use crate::error::LookupError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

/// Longest hostname accepted, in octets.
const MAX_FQDN_LEN: usize = 253;

lazy_static! {
    static ref SCHEME: Regex = Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://").unwrap();
    static ref LABEL: Regex = Regex::new(r"^[a-z0-9]([a-z0-9\-]{0,61}[a-z0-9])?$").unwrap();
}

/// A validated, lowercase ASCII (or punycode) hostname.
///
/// Construct with [`Domain::parse`]. Once built it never changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain {
    fqdn: String,
}

impl Domain {
    /// Sanitize and validate raw input.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::InvalidDomain` if the sanitized input is not a
    /// hostname with at least two labels.
    ///
    /// # Example
    ///
    /// ```rust
    /// use whois_lookup_lib::Domain;
    ///
    /// let domain = Domain::parse("https://Example.COM/about").unwrap();
    /// assert_eq!(domain.fqdn(), "example.com");
    /// assert_eq!(domain.tld(), "com");
    /// ```
    pub fn parse(input: &str) -> Result<Self, LookupError> {
        let fqdn = sanitize_input(input);
        validate_hostname(&fqdn).map_err(|reason| LookupError::invalid_domain(input.trim(), reason))?;
        Ok(Self { fqdn })
    }

    /// The full hostname, e.g. `www.example.com`.
    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }

    /// The last label, e.g. `com`.
    pub fn tld(&self) -> &str {
        // parse() guarantees at least one dot
        self.fqdn.rsplit('.').next().unwrap_or(&self.fqdn)
    }

    /// Number of labels in the hostname.
    pub fn label_count(&self) -> usize {
        self.fqdn.split('.').count()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fqdn)
    }
}

impl Serialize for Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.fqdn)
    }
}

impl std::str::FromStr for Domain {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Reduce raw input to a bare lowercase hostname.
///
/// Strips a URL scheme, userinfo, port, path, query, fragment and a trailing
/// dot. The result is not validated.
pub fn sanitize_input(input: &str) -> String {
    let trimmed = input.trim();
    let without_scheme = SCHEME.replace(trimmed, "");

    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = host.rsplit('@').next().unwrap_or_default();
    let host = match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    };

    host.trim_end_matches('.').to_ascii_lowercase()
}

/// Check hostname grammar on an already sanitized string.
fn validate_hostname(fqdn: &str) -> Result<(), String> {
    if fqdn.is_empty() {
        return Err("Domain name cannot be empty".to_string());
    }

    if fqdn.len() > MAX_FQDN_LEN {
        return Err(format!("Domain name exceeds {} characters", MAX_FQDN_LEN));
    }

    if !fqdn.is_ascii() {
        return Err("Domain name must be ASCII (use punycode for IDNs)".to_string());
    }

    let labels: Vec<&str> = fqdn.split('.').collect();
    if labels.len() < 2 {
        return Err("Domain must contain at least one dot".to_string());
    }

    for label in &labels {
        if label.is_empty() {
            return Err("Domain contains an empty label".to_string());
        }
        if label.len() > 63 {
            return Err(format!("Label '{}' exceeds 63 characters", label));
        }
        if !LABEL.is_match(label) {
            return Err(format!(
                "Label '{}' must be alphanumeric or hyphen and cannot start or end with a hyphen",
                label
            ));
        }
    }

    if labels
        .last()
        .is_some_and(|tld| tld.chars().all(|c| c.is_ascii_digit()))
    {
        return Err("Top-level domain cannot be numeric".to_string());
    }

    Ok(())
}
