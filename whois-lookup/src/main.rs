//! whois-lookup CLI Application
//!
//! A command-line interface for looking up domain registration data through
//! RDAP registries, a WHOIS aggregator and the rdap.org bootstrap service.
//! This CLI application is a thin front end to the whois-lookup-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use serde::Serialize;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use whois_lookup_lib::{
    load_env_config, parse_timeout_string, ConfigManager, DomainLookup, EnvConfig, FileConfig,
    HttpFetcher, LookupConfig, LookupError, SourceSpec,
};

/// Exit status for a lookup whose every source failed.
const EXIT_EXHAUSTED: i32 = 1;

/// Exit status for malformed domain input.
const EXIT_INVALID_DOMAIN: i32 = 2;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for whois-lookup
#[derive(Parser, Debug)]
#[command(name = "whois-lookup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Sai Dutt G.V <gvs46@protonmail.com>")]
#[command(about = "Look up domain registration data via RDAP with aggregator and bootstrap fallback")]
#[command(
    long_about = "Look up who registered a domain and when it expires.\n\nQueries the TLD's authoritative RDAP registry first, then a configured WHOIS aggregator, then the rdap.org bootstrap service, and prints one normalized record."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domain name or URL to look up (e.g. example.com, https://example.com/about)
    #[arg(
        value_name = "DOMAIN",
        required_unless_present = "list_registries",
        help_heading = "Lookup"
    )]
    pub domain: Option<String>,

    /// Per-source timeout (e.g. 5s, 1500ms, 2m)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Lookup")]
    pub timeout: Option<String>,

    /// Skip the WHOIS aggregator even when one is configured
    #[arg(long = "no-aggregator", help_heading = "Lookup")]
    pub no_aggregator: bool,

    /// Print the source order that would be tried, without querying
    #[arg(long = "dry-run", help_heading = "Lookup")]
    pub dry_run: bool,

    /// List the TLDs with a known RDAP registry and exit
    #[arg(long = "list-registries", help_heading = "Lookup")]
    pub list_registries: bool,

    /// Output the record (or error body) as JSON
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Styled output with a header and progress spinner
    #[arg(short = 'p', long = "pretty", help_heading = "Output Format")]
    pub pretty: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Log each source attempt to stderr
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Candidate as printed by `--dry-run --json`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlannedSource {
    id: String,
    kind: whois_lookup_lib::SourceKind,
    url: String,
    timeout_ms: u64,
    requires_api_key: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_tracing(args.verbose);

    match run(args).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Install the stderr log subscriber. `-v` forces debug output.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("whois_lookup=debug,whois_lookup_lib=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<i32, Box<dyn std::error::Error>> {
    let env_config = load_env_config();
    let (config, file_config) = build_config(&args, &env_config)?;
    let json = args.json || env_config.json.unwrap_or(false);

    let router = file_config.build_router(config.timeout)?;

    if args.list_registries {
        println!("{}", ui::format_registries(&router));
        return Ok(0);
    }

    let Some(input) = args.domain.as_deref() else {
        return Err("a DOMAIN argument is required".into());
    };

    let lookup = DomainLookup::with_parts(config, router, Arc::new(HttpFetcher::new()?));

    if args.dry_run {
        return match lookup.plan(input) {
            Ok((domain, candidates)) => {
                if json {
                    let planned: Vec<PlannedSource> = candidates
                        .iter()
                        .map(|spec| planned_source(&domain, spec))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&planned)?);
                } else {
                    println!("{}", ui::format_plan(&domain, &candidates));
                }
                Ok(0)
            }
            Err(e) => report_error(&e, json),
        };
    }

    if args.pretty && !json {
        ui::print_header(input);
    }

    let spinner = (args.pretty && !json).then(|| ui::Spinner::start(format!("Resolving {}...", input)));
    let result = lookup.lookup(input).await;
    if let Some(spinner) = spinner {
        spinner.stop().await;
    }

    match result {
        Ok(outcome) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", ui::format_outcome(&outcome));
            }
            Ok(0)
        }
        Err(e) => report_error(&e, json),
    }
}

fn planned_source(domain: &whois_lookup_lib::Domain, spec: &SourceSpec) -> PlannedSource {
    PlannedSource {
        id: spec.id.clone(),
        kind: spec.kind,
        url: spec.url_for(domain),
        timeout_ms: u64::try_from(spec.timeout.as_millis()).unwrap_or(u64::MAX),
        requires_api_key: spec.requires_api_key,
    }
}

/// Print a lookup failure and return the matching exit status.
///
/// In JSON mode the error body is the program's output and goes to stdout.
fn report_error(error: &LookupError, json: bool) -> Result<i32, Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(&error.to_body())?);
    } else {
        eprintln!("{}", ui::format_error(error));
    }
    Ok(exit_code_for(error))
}

fn exit_code_for(error: &LookupError) -> i32 {
    if error.is_client_error() {
        EXIT_INVALID_DOMAIN
    } else {
        EXIT_EXHAUSTED
    }
}

/// Resolve settings with precedence: defaults < config file < WL_* env < CLI.
fn build_config(
    args: &Args,
    env_config: &EnvConfig,
) -> Result<(LookupConfig, FileConfig), Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new(args.verbose);

    // Step 1: explicit file (CLI, then WL_CONFIG) or automatic discovery
    let explicit_path = args.config.as_ref().or(env_config.config.as_ref());
    let file_config = match explicit_path {
        Some(path) => {
            tracing::debug!(path = %path, "using explicit config file");
            config_manager
                .load_file(path)
                .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?
        }
        None => config_manager.discover_and_load(),
    };

    let mut config = file_config.apply_to(LookupConfig::default());

    // Step 2: environment variables (WL_*)
    config = env_config.apply_to(config);

    // Step 3: CLI arguments (highest precedence)
    config = apply_cli_args_to_config(config, args)?;

    Ok((config, file_config))
}

fn apply_cli_args_to_config(
    mut config: LookupConfig,
    args: &Args,
) -> Result<LookupConfig, Box<dyn std::error::Error>> {
    if let Some(timeout_str) = &args.timeout {
        let timeout = parse_timeout_string(timeout_str).ok_or_else(|| {
            format!(
                "Invalid timeout '{}'. Use a non-zero value like '5s', '1500ms', '2m'",
                timeout_str
            )
        })?;
        config = config.with_timeout(timeout);
    }

    // Only override when the flag is passed; absence keeps file/env values
    if args.no_aggregator {
        config = config.with_aggregator(false);
    }

    Ok(config)
}
