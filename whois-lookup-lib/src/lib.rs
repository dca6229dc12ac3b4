//! # whois-lookup Library
//!
//! Resolve domain registration data (registrar, key dates, nameservers,
//! DNSSEC state, status codes) from RDAP registries and WHOIS aggregator APIs.
//!
//! A lookup runs a fixed resolution chain: the router picks an ordered list
//! of upstream sources for the domain's TLD, the executor tries them one at a
//! time under a per-source timeout, and the normalizer turns whichever body
//! comes back first with usable data into one stable record.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use whois_lookup_lib::DomainLookup;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lookup = DomainLookup::new()?;
//!     let outcome = lookup.lookup("example.com").await?;
//!
//!     println!("{}", serde_json::to_string_pretty(&outcome)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Registry first**: authoritative RDAP servers for common TLDs
//! - **Fallback chain**: aggregator, alternate registries, rdap.org bootstrap
//! - **Normalized output**: one schema whatever the upstream shape
//! - **Pluggable transport**: swap the HTTP client behind the `Fetcher` trait

// Re-export main public API types and functions
// This makes them available as whois_lookup_lib::TypeName
pub use config::{
    load_env_config, load_env_config_from, parse_timeout_string, AggregatorConfig,
    ConfigManager, DefaultsConfig, EnvConfig, FallbackConfig, FileConfig,
};
pub use domain::{sanitize_input, Domain};
pub use error::{ErrorBody, FailureKind, LookupError, SourceFailure};
pub use executor::Executor;
pub use lookup::DomainLookup;
pub use normalize::{normalize, parse_date};
pub use registry::{builtin_entry, builtin_registries, parse_iana_bootstrap, RegistryEntry};
pub use router::{aggregator_source, Router};
pub use sources::{SourceKind, SourceSpec};
pub use transport::{
    call_with_timeout, FetchRequest, FetchResponse, Fetcher, HttpFetcher, RawResponse,
    TransportError, USER_AGENT,
};
pub use types::{
    Known, LookupConfig, LookupOutcome, LookupResult, NoRegistrationData, RegistrationData,
    UNKNOWN,
};

// Internal modules - their public items are re-exported above
mod config;
mod domain;
mod error;
mod executor;
mod lookup;
mod normalize;
mod registry;
mod router;
mod sources;
mod transport;
mod types;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, LookupError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        author: AUTHOR,
        builtin_registries: builtin_registries().len(),
    }
}

/// Information about the library build
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub author: &'static str,
    /// Number of TLDs in the built-in registry table
    pub builtin_registries: usize,
}
