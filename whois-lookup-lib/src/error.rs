//! Error handling for registration-data lookups.
//!
//! Two layers live here. [`SourceFailure`] records why a single upstream
//! could not answer; those never escape the executor on their own. They are
//! collected into [`LookupError::AllSourcesExhausted`] when the whole chain
//! runs dry. [`LookupError`] is what callers of the library actually see.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a single source attempt was abandoned.
///
/// Every variant is non-fatal: the executor records it and moves on to the
/// next candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// The call did not complete within the source's timeout.
    SourceTimeout,
    /// Connection, TLS or DNS failure before any HTTP status was received.
    SourceUnreachable,
    /// The source answered with a non-success HTTP status.
    SourceHttpError,
    /// The body of a 2xx response was not valid JSON.
    SourceUnparsable,
    /// The body parsed, but carried no registrar, creation date or nameservers.
    SourceEmpty,
    /// The source needs an API key and none is configured. No call is made.
    MissingApiKey,
}

impl FailureKind {
    /// Stable name used in logs and in the `reason` field of error bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SourceTimeout => "SourceTimeout",
            Self::SourceUnreachable => "SourceUnreachable",
            Self::SourceHttpError => "SourceHttpError",
            Self::SourceUnparsable => "SourceUnparsable",
            Self::SourceEmpty => "SourceEmpty",
            Self::MissingApiKey => "MissingApiKey",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed attempt in the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    /// Identifier of the source that was tried
    pub source: String,

    /// Classification of the failure
    #[serde(rename = "reason")]
    pub kind: FailureKind,

    /// Human-readable detail (HTTP status, transport message, ...)
    pub detail: String,
}

impl SourceFailure {
    pub fn new<S: Into<String>, D: Into<String>>(source: S, kind: FailureKind, detail: D) -> Self {
        Self {
            source: source.into(),
            kind,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.source, self.kind, self.detail)
    }
}

/// Main error type for lookup operations.
#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// The input is not a valid hostname. Raised before any network call.
    #[error("Invalid domain '{domain}': {reason}")]
    InvalidDomain { domain: String, reason: String },

    /// Every candidate source failed; `attempts` is in the order tried.
    #[error("All sources exhausted for '{domain}' after {} attempt(s)", .attempts.len())]
    AllSourcesExhausted {
        domain: String,
        attempts: Vec<SourceFailure>,
    },

    /// Configuration errors (invalid settings, unparsable files, etc.)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// File I/O errors when reading configuration or bootstrap files
    #[error("File error at '{path}': {message}")]
    File { path: String, message: String },

    /// Errors that don't fit other categories
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LookupError {
    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new exhaustion error.
    pub fn exhausted<D: Into<String>>(domain: D, attempts: Vec<SourceFailure>) -> Self {
        Self::AllSourcesExhausted {
            domain: domain.into(),
            attempts,
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True when the caller sent bad input and retrying is pointless.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidDomain { .. })
    }

    /// The domain this error is about, when there is one.
    pub fn domain(&self) -> Option<&str> {
        match self {
            Self::InvalidDomain { domain, .. } | Self::AllSourcesExhausted { domain, .. } => {
                Some(domain)
            }
            _ => None,
        }
    }

    /// Attempt history; empty for errors raised before routing.
    pub fn attempts(&self) -> &[SourceFailure] {
        match self {
            Self::AllSourcesExhausted { attempts, .. } => attempts,
            _ => &[],
        }
    }

    /// Render this error as the JSON error body returned to callers.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            domain: self.domain().unwrap_or_default().to_string(),
            attempted_sources: self.attempts().to_vec(),
            timestamp: Utc::now(),
        }
    }
}

/// JSON shape of a failed lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub domain: String,
    pub attempted_sources: Vec<SourceFailure>,
    pub timestamp: DateTime<Utc>,
}

impl From<std::io::Error> for LookupError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("I/O error: {}", err))
    }
}

impl From<toml::de::Error> for LookupError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("Failed to parse TOML configuration: {}", err))
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        Self::config(format!("JSON parsing failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_body_lists_attempts_in_order() {
        let err = LookupError::exhausted(
            "example.com",
            vec![
                SourceFailure::new("verisign-com", FailureKind::SourceTimeout, "after 10s"),
                SourceFailure::new("rdap-org", FailureKind::SourceHttpError, "HTTP 503"),
            ],
        );

        let body = err.to_body();
        assert_eq!(body.domain, "example.com");
        assert_eq!(body.attempted_sources.len(), 2);
        assert_eq!(body.attempted_sources[0].source, "verisign-com");

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["attemptedSources"][0]["reason"], "SourceTimeout");
        assert_eq!(json["attemptedSources"][1]["reason"], "SourceHttpError");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_invalid_domain_is_client_error() {
        let err = LookupError::invalid_domain("bad_domain", "label contains '_'");
        assert!(err.is_client_error());
        assert!(err.attempts().is_empty());
        assert_eq!(err.domain(), Some("bad_domain"));
        assert_eq!(err.to_string(), "Invalid domain 'bad_domain': label contains '_'");
    }

    #[test]
    fn test_exhausted_is_not_client_error() {
        let err = LookupError::exhausted("example.com", vec![]);
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("0 attempt(s)"));
    }
}
