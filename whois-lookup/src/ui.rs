//! Human-readable output for the whois-lookup CLI.
//!
//! Everything here renders to a `String` first so the layout can be tested;
//! the `print_*` wrappers only decide where it goes. Uses only the `console`
//! crate for colors and alignment.

use console::{pad_str, style, Alignment, Term};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use whois_lookup_lib::{Domain, LookupError, LookupOutcome, LookupResult, Router, SourceSpec};

const LABEL_WIDTH: usize = 12;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
///
/// Does nothing when stderr is not a terminal.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a new spinner with the given message (e.g. "Resolving example.com...").
    pub fn start(message: String) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let term = Term::stderr();
        if !term.is_term() {
            return Self {
                running,
                handle: None,
            };
        }

        let running_clone = running.clone();
        let handle = tokio::spawn(async move {
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a pretty run.
pub fn print_header(domain: &str) {
    println!(
        "{} {} {}",
        style("whois-lookup").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!("· {}", domain)).dim(),
    );
    println!();
}

// ── Lookup outcome ───────────────────────────────────────────────────────────

fn field(label: &str, value: impl std::fmt::Display) -> String {
    format!(
        "  {}  {}",
        style(pad_str(label, LABEL_WIDTH, Alignment::Left, None)).dim(),
        value
    )
}

fn list_or_unknown(items: &[String]) -> String {
    if items.is_empty() {
        style(whois_lookup_lib::UNKNOWN).dim().to_string()
    } else {
        items.join(", ")
    }
}

/// Render a registered result as aligned label/value lines.
pub fn format_result(result: &LookupResult) -> String {
    let data = &result.data;
    let mut lines = vec![
        format!(
            "{}  {}",
            style(&result.domain).white().bold(),
            style("REGISTERED").green().bold()
        ),
        field("Registrar", &data.registrar),
        field("Created", &data.created),
        field("Updated", &data.updated),
        field("Expires", &data.expires),
        field("Nameservers", list_or_unknown(&data.nameservers)),
        field("DNSSEC", &data.dnssec_enabled),
        field("Status", list_or_unknown(&data.status)),
    ];
    lines.push(field(
        "Source",
        style(format!(
            "{} at {}",
            result.source,
            result.resolved_at.format("%Y-%m-%d %H:%M:%S UTC")
        ))
        .dim(),
    ));
    lines.join("\n")
}

/// Render any successful outcome.
pub fn format_outcome(outcome: &LookupOutcome) -> String {
    match outcome {
        LookupOutcome::Registered(result) => format_result(result),
        LookupOutcome::Unregistered(none) => format!(
            "{}  {}  {}",
            style(&none.domain).white().bold(),
            style("NOT REGISTERED").yellow().bold(),
            style(format!("({}, per {})", none.message, none.source)).dim()
        ),
    }
}

/// Render a lookup failure, one line per attempted source.
pub fn format_error(error: &LookupError) -> String {
    let mut lines = vec![format!("{} {}", style("Error:").red().bold(), error)];
    for attempt in error.attempts() {
        lines.push(format!(
            "  {} {}  {}",
            style("•").dim(),
            pad_str(&attempt.source, 24, Alignment::Left, Some("..")),
            style(format!("{} ({})", attempt.kind, attempt.detail)).dim()
        ));
    }
    lines.join("\n")
}

// ── Dry run and registry listing ─────────────────────────────────────────────

/// Render the candidate order for a domain without querying anything.
pub fn format_plan(domain: &Domain, candidates: &[SourceSpec]) -> String {
    let mut lines = vec![format!(
        "{} {}",
        style("Resolution order for").bold(),
        style(domain.fqdn()).white().bold()
    )];
    for (i, spec) in candidates.iter().enumerate() {
        let key_note = if spec.requires_api_key {
            format!(" [key: {}]", spec.api_key_header)
        } else {
            String::new()
        };
        lines.push(format!(
            "  {}. {}  {}  {}{}",
            i + 1,
            pad_str(&spec.id, 24, Alignment::Left, Some("..")),
            style(pad_str(&spec.kind.to_string(), 16, Alignment::Left, None)).dim(),
            spec.url_for(domain),
            style(key_note).dim()
        ));
    }
    lines.join("\n")
}

/// Render the registry table the router was built with.
pub fn format_registries(router: &Router) -> String {
    let tlds = router.registry_tlds();
    let mut lines = vec![format!(
        "{} {}",
        style("Known registries:").bold(),
        style(format!("({} TLDs)", tlds.len())).dim()
    )];
    for tld in &tlds {
        if let Some(spec) = router.registry_for(tld) {
            lines.push(format!(
                "  {}  {}",
                style(pad_str(&format!(".{}", tld), 10, Alignment::Left, None)).green(),
                spec.endpoint_template
            ));
        }
    }
    if let Some(aggregator) = router.aggregator() {
        lines.push(String::new());
        lines.push(format!(
            "{} {}  {}",
            style("Aggregator:").bold(),
            aggregator.id,
            aggregator.endpoint_template
        ));
    }
    lines.join("\n")
}
