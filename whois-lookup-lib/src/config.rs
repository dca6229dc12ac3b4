//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and `WL_*`
//! environment variables, merging them with proper precedence rules, and
//! turning the result into a [`LookupConfig`] and a [`Router`].
//!
//! Precedence, lowest first: built-in defaults, config files, environment,
//! command line.

use crate::error::LookupError;
use crate::registry::source_id_for;
use crate::router::{aggregator_source, Router};
use crate::sources::{SourceKind, SourceSpec, DEFAULT_API_KEY_HEADER};
use crate::types::LookupConfig;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

lazy_static! {
    static ref TLD_KEY: Regex = Regex::new(r"^\.?[a-zA-Z0-9]([a-zA-Z0-9\-]*[a-zA-Z0-9])?$").unwrap();
}

/// Source id used when `[aggregator]` does not name one.
const DEFAULT_AGGREGATOR_ID: &str = "aggregator";

/// Configuration loaded from TOML files.
///
/// ```toml
/// bootstrap_file = "/var/lib/whois-lookup/dns.json"
///
/// [defaults]
/// timeout = "8s"
/// aggregator = true
///
/// [registries]
/// com = "https://rdap.verisign.com/com/v1/domain/"
///
/// [aggregator]
/// id = "whois-api"
/// endpoint = "https://api.example.net/whois?domain={domain}"
/// api_key_header = "X-API-Key"
/// api_key_env = "WHOIS_API_KEY"
///
/// [fallback]
/// default_registry = "https://rdap.example.net/domain/"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Extra or overriding TLD → RDAP endpoint templates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registries: Option<BTreeMap<String, String>>,

    /// The second-tier WHOIS aggregator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregator: Option<AggregatorConfig>,

    /// Last-resort sources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackConfig>,

    /// Locally saved IANA RDAP bootstrap document (`dns.json`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_file: Option<String>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    /// Per-source timeout (as string, e.g., "5s", "1500ms")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Whether the aggregator joins the candidate list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregator: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AggregatorConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// URL template with a `{domain}` placeholder
    pub endpoint: String,

    /// Header carrying the API key (default `X-API-Key`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_header: Option<String>,

    /// Environment variable holding the API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Whether calls need a key at all (default true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_api_key: Option<bool>,

    /// Timeout override for this source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FallbackConfig {
    /// Registry tried last for TLDs without a table entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_registry: Option<String>,

    /// Replacement for the rdap.org bootstrap redirector
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<String>,
}

impl FileConfig {
    /// Apply file settings on top of `config`.
    ///
    /// The API key is read from the environment variable named by
    /// `aggregator.api_key_env`, if any; the variable itself never lives in
    /// the file.
    pub fn apply_to(&self, mut config: LookupConfig) -> LookupConfig {
        if let Some(defaults) = &self.defaults {
            if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_timeout_string) {
                config = config.with_timeout(timeout);
            }
            if let Some(enabled) = defaults.aggregator {
                config = config.with_aggregator(enabled);
            }
        }

        if let Some(var) = self.aggregator.as_ref().and_then(|a| a.api_key_env.as_deref()) {
            match env::var(var) {
                Ok(key) if !key.trim().is_empty() => config = config.with_api_key(key),
                _ => debug!(variable = var, "aggregator API key variable not set"),
            }
        }

        config
    }

    /// Build the router described by this file, using `timeout` for every
    /// source that does not set its own.
    ///
    /// # Errors
    ///
    /// Returns an error if `bootstrap_file` cannot be read or parsed.
    pub fn build_router(&self, timeout: Duration) -> Result<Router, LookupError> {
        let mut router = Router::new(timeout);

        if let Some(path) = &self.bootstrap_file {
            let content = fs::read_to_string(path).map_err(|e| {
                LookupError::file_error(path, format!("Failed to read bootstrap file: {}", e))
            })?;
            let json: serde_json::Value = serde_json::from_str(&content)?;
            router = router.with_iana_bootstrap(&json)?;
        }

        if let Some(registries) = &self.registries {
            for (tld, template) in registries {
                let spec = SourceSpec::rdap_registry(source_id_for(template), template, timeout);
                router = router.with_registry(tld, spec);
            }
        }

        if let Some(aggregator) = &self.aggregator {
            let header = match aggregator.requires_api_key {
                Some(false) => None,
                _ => Some(
                    aggregator
                        .api_key_header
                        .clone()
                        .unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string()),
                ),
            };
            let source_timeout = aggregator
                .timeout
                .as_deref()
                .and_then(parse_timeout_string)
                .unwrap_or(timeout);
            router = router.with_aggregator(Some(aggregator_source(
                aggregator.id.as_deref().unwrap_or(DEFAULT_AGGREGATOR_ID),
                aggregator.endpoint.as_str(),
                source_timeout,
                header,
            )));
        }

        if let Some(fallback) = &self.fallback {
            if let Some(template) = &fallback.bootstrap {
                router = router.with_bootstrap(SourceSpec::new(
                    source_id_for(template),
                    SourceKind::RdapBootstrap,
                    template,
                    timeout,
                ));
            }
            router = router.with_default_registry(fallback.default_registry.as_ref().map(|t| {
                SourceSpec::rdap_registry(source_id_for(t), t, timeout)
            }));
        }

        Ok(router)
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to log which config files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, not valid TOML,
    /// or fails validation.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, LookupError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(LookupError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            LookupError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Looks in the XDG config directory, then the home directory, then the
    /// current directory; later files override earlier ones field by field.
    /// Files that fail to load are skipped with a warning.
    pub fn discover_and_load(&self) -> FileConfig {
        let mut merged_config = FileConfig::default();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    if self.verbose {
                        debug!(path = %path.display(), "loaded config file");
                    }
                    merged_config = self.merge_configs(merged_config, config);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "ignoring config file"),
            }
        }

        merged_config
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let path = Path::new("./whois-lookup.toml");
        path.exists().then(|| path.to_path_buf())
    }

    /// Get the global configuration file path in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let path = Path::new(&env::var_os("HOME")?).join(".whois-lookup.toml");
        path.exists().then_some(path)
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("whois-lookup").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Values from `higher` take precedence over values from `lower`.
    /// Registry tables are merged key by key.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower_defaults), Some(higher_defaults)) => Some(DefaultsConfig {
                    timeout: higher_defaults.timeout.or(lower_defaults.timeout),
                    aggregator: higher_defaults.aggregator.or(lower_defaults.aggregator),
                }),
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            registries: match (lower.registries, higher.registries) {
                (Some(mut lower_registries), Some(higher_registries)) => {
                    lower_registries.extend(higher_registries);
                    Some(lower_registries)
                }
                (lower_registries, higher_registries) => higher_registries.or(lower_registries),
            },
            aggregator: higher.aggregator.or(lower.aggregator),
            fallback: match (lower.fallback, higher.fallback) {
                (Some(lower_fallback), Some(higher_fallback)) => Some(FallbackConfig {
                    default_registry: higher_fallback
                        .default_registry
                        .or(lower_fallback.default_registry),
                    bootstrap: higher_fallback.bootstrap.or(lower_fallback.bootstrap),
                }),
                (lower_fallback, higher_fallback) => higher_fallback.or(lower_fallback),
            },
            bootstrap_file: higher.bootstrap_file.or(lower.bootstrap_file),
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), LookupError> {
        if let Some(timeout_str) = config.defaults.as_ref().and_then(|d| d.timeout.as_ref()) {
            validate_timeout(timeout_str)?;
        }

        if let Some(registries) = &config.registries {
            for (tld, template) in registries {
                if !TLD_KEY.is_match(tld) {
                    return Err(LookupError::config(format!(
                        "Invalid TLD '{}' in [registries]",
                        tld
                    )));
                }
                validate_template(template, &format!("registry for '{}'", tld))?;
            }
        }

        if let Some(aggregator) = &config.aggregator {
            validate_template(&aggregator.endpoint, "aggregator endpoint")?;
            if aggregator.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
                return Err(LookupError::config("Aggregator id cannot be empty"));
            }
            if let Some(timeout_str) = &aggregator.timeout {
                validate_timeout(timeout_str)?;
            }
        }

        if let Some(fallback) = &config.fallback {
            if let Some(template) = &fallback.default_registry {
                validate_template(template, "fallback default_registry")?;
            }
            if let Some(template) = &fallback.bootstrap {
                validate_template(template, "fallback bootstrap")?;
            }
        }

        Ok(())
    }
}

fn validate_timeout(timeout_str: &str) -> Result<(), LookupError> {
    match parse_timeout_string(timeout_str) {
        Some(_) => Ok(()),
        None => Err(LookupError::config(format!(
            "Invalid timeout '{}'. Use a non-zero value like '5s', '1500ms', '2m'",
            timeout_str
        ))),
    }
}

fn validate_template(template: &str, what: &str) -> Result<(), LookupError> {
    if template.starts_with("https://") || template.starts_with("http://") {
        Ok(())
    } else {
        Err(LookupError::config(format!(
            "Invalid URL template for {}: '{}' must start with https:// or http://",
            what, template
        )))
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via WL_* environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub timeout: Option<Duration>,
    pub aggregator: Option<bool>,
    pub api_key: Option<String>,
    pub config: Option<String>,
    pub json: Option<bool>,
}

impl EnvConfig {
    /// Apply environment settings on top of `config`.
    pub fn apply_to(&self, mut config: LookupConfig) -> LookupConfig {
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        if let Some(enabled) = self.aggregator {
            config = config.with_aggregator(enabled);
        }
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key.clone());
        }
        config
    }
}

/// Load configuration from the process environment.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|name| env::var(name).ok())
}

/// Load configuration through an arbitrary variable lookup.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    // WL_TIMEOUT - per-source timeout
    if let Some(val) = lookup("WL_TIMEOUT") {
        match parse_timeout_string(&val) {
            Some(timeout) => env_config.timeout = Some(timeout),
            None => warn!("Invalid WL_TIMEOUT='{}', use format like '5s', '1500ms', '2m'", val),
        }
    }

    // WL_AGGREGATOR - enable/disable the aggregator source
    if let Some(val) = lookup("WL_AGGREGATOR") {
        env_config.aggregator = parse_bool_var("WL_AGGREGATOR", &val);
    }

    // WL_API_KEY - key for sources that require one
    if let Some(key) = lookup("WL_API_KEY").filter(|k| !k.trim().is_empty()) {
        env_config.api_key = Some(key);
    }

    // WL_CONFIG - explicit config file
    if let Some(path) = lookup("WL_CONFIG").filter(|p| !p.trim().is_empty()) {
        env_config.config = Some(path);
    }

    // WL_JSON - JSON output
    if let Some(val) = lookup("WL_JSON") {
        env_config.json = parse_bool_var("WL_JSON", &val);
    }

    env_config
}

fn parse_bool_var(name: &str, val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => {
            warn!("Invalid {}='{}', use true/false", name, val);
            None
        }
    }
}

/// Parse a timeout string like "1500ms", "5s", "2m" into a duration.
///
/// A bare number means seconds. Zero and unparsable input give `None`.
pub fn parse_timeout_string(timeout_str: &str) -> Option<Duration> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let duration = if let Some(ms) = timeout_str.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(s) = timeout_str.strip_suffix('s') {
        s.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(m) = timeout_str.strip_suffix('m') {
        m.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        timeout_str.parse::<u64>().ok().map(Duration::from_secs)
    }?;

    (!duration.is_zero()).then_some(duration)
}
