//! Core data types for registration-data lookups.
//!
//! This module defines the canonical output record, the "unknown" sentinel
//! wrapper, and the lookup configuration.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Literal rendered for any field whose value could not be determined.
pub const UNKNOWN: &str = "unknown";

/// A value that may be unknown.
///
/// Unlike `Option`, this serializes the missing case as the literal string
/// `"unknown"`, so consumers can tell "field absent" apart from an explicitly
/// empty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Known<T> {
    Value(T),
    Unknown,
}

impl<T> Default for Known<T> {
    fn default() -> Self {
        Self::Unknown
    }
}

impl<T> Known<T> {
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Unknown => None,
        }
    }
}

impl<T> From<Option<T>> for Known<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Value(v),
            None => Self::Unknown,
        }
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Known<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => v.fmt(f),
            Self::Unknown => f.write_str(UNKNOWN),
        }
    }
}

impl<T: Serialize> Serialize for Known<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => v.serialize(serializer),
            Self::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

/// The literal string `"unknown"` always reads back as [`Known::Unknown`], so a
/// `Known<String>` whose value really was `"unknown"` does not round-trip.
impl<'de, T: DeserializeOwned> Deserialize<'de> for Known<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        if raw.as_str() == Some(UNKNOWN) {
            return Ok(Self::Unknown);
        }
        serde_json::from_value(raw)
            .map(Self::Value)
            .map_err(D::Error::custom)
    }
}

/// Registration fields extracted from one upstream response.
///
/// This is what the normalizer produces. It has no provenance yet; the
/// executor turns it into a [`LookupResult`] once it is deemed usable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationData {
    /// Name of the sponsoring registrar
    pub registrar: Known<String>,

    /// Registration date
    pub created: Known<NaiveDate>,

    /// Last-changed date
    pub updated: Known<NaiveDate>,

    /// Expiration date
    pub expires: Known<NaiveDate>,

    /// Nameserver hostnames in upstream order
    pub nameservers: Vec<String>,

    /// Whether the delegation is DNSSEC-signed
    pub dnssec_enabled: Known<bool>,

    /// Registry status codes, de-duplicated, upstream order preserved
    pub status: Vec<String>,
}

impl RegistrationData {
    /// A record is usable when it names a registrar, a creation date, or at
    /// least one nameserver. Anything less is treated as a placeholder body.
    ///
    /// An explicitly empty registrar is kept in the output but does not count.
    pub fn is_usable(&self) -> bool {
        self.registrar.value().is_some_and(|r| !r.is_empty())
            || self.created.is_known()
            || !self.nameservers.is_empty()
    }

    /// Append a status code unless it is already present.
    pub fn push_status<S: Into<String>>(&mut self, code: S) {
        let code = code.into();
        if !code.is_empty() && !self.status.contains(&code) {
            self.status.push(code);
        }
    }

    /// Append a nameserver, lowercased and without a trailing dot, unless present.
    pub fn push_nameserver(&mut self, host: &str) {
        let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
        if !host.is_empty() && !self.nameservers.contains(&host) {
            self.nameservers.push(host);
        }
    }
}

/// Canonical result of a successful lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    /// The domain that was looked up (e.g., "example.com")
    pub domain: String,

    #[serde(flatten)]
    pub data: RegistrationData,

    /// Identifier of the source that produced the data
    pub source: String,

    /// When the record was assembled
    pub resolved_at: DateTime<Utc>,
}

impl LookupResult {
    pub fn new<D: Into<String>, S: Into<String>>(domain: D, data: RegistrationData, source: S) -> Self {
        Self {
            domain: domain.into(),
            data,
            source: source.into(),
            resolved_at: Utc::now(),
        }
    }
}

/// Successful outcome for a valid domain that no registry knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoRegistrationData {
    pub domain: String,
    pub registered: bool,
    pub message: String,
    /// The source whose 404 ended the chain
    pub source: String,
    pub resolved_at: DateTime<Utc>,
}

impl NoRegistrationData {
    pub fn new<D: Into<String>, S: Into<String>>(domain: D, source: S) -> Self {
        Self {
            domain: domain.into(),
            registered: false,
            message: "no registration data found".to_string(),
            source: source.into(),
            resolved_at: Utc::now(),
        }
    }
}

/// What a lookup resolves to when it does not fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LookupOutcome {
    Registered(LookupResult),
    Unregistered(NoRegistrationData),
}

impl LookupOutcome {
    pub fn domain(&self) -> &str {
        match self {
            Self::Registered(r) => &r.domain,
            Self::Unregistered(n) => &n.domain,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Self::Registered(r) => &r.source,
            Self::Unregistered(n) => &n.source,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered(_))
    }

    pub fn as_registered(&self) -> Option<&LookupResult> {
        match self {
            Self::Registered(r) => Some(r),
            Self::Unregistered(_) => None,
        }
    }
}

/// Configuration options for lookups.
///
/// Controls per-source timeouts, which optional sources the router adds,
/// and the API key for aggregator sources.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Timeout applied to every source that does not set its own
    /// Default: 10 seconds
    pub timeout: Duration,

    /// Whether the configured aggregator joins the candidate list
    /// Default: true (it is still skipped when none is configured)
    pub enable_aggregator: bool,

    /// API key sent to sources that require one
    /// Default: None
    pub api_key: Option<String>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            enable_aggregator: true,
            api_key: None,
        }
    }
}

impl LookupConfig {
    /// Set the default per-source timeout.
    ///
    /// Zero is bumped to one millisecond so every call stays bounded.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.max(Duration::from_millis(1));
        self
    }

    /// Enable or disable the aggregator source.
    pub fn with_aggregator(mut self, enabled: bool) -> Self {
        self.enable_aggregator = enabled;
        self
    }

    /// Set the API key for sources that require one.
    pub fn with_api_key<K: Into<String>>(mut self, key: K) -> Self {
        self.api_key = Some(key.into());
        self
    }
}
