//! Flat WHOIS-aggregator response extraction.
//!
//! Aggregator APIs agree on the information but not on field names, so every
//! field is looked up through a list of synonyms. Some providers wrap the
//! record in an envelope object, which is peeled off first.

use super::dates::parse_date;
use crate::types::{Known, RegistrationData};
use chrono::NaiveDate;
use serde_json::Value;

/// Envelope keys some providers nest the record under.
const WRAPPERS: &[&str] = &["WhoisRecord", "result", "data"];

const REGISTRAR_KEYS: &[&str] = &["registrar", "registrar_name", "registrarName"];
const CREATED_KEYS: &[&str] = &["created", "creation_date", "createdDate"];
const UPDATED_KEYS: &[&str] = &["updated", "updated_date", "updatedDate"];
const EXPIRES_KEYS: &[&str] = &["expires", "expiration_date", "expiry_date", "expiresDate"];
const NAMESERVER_KEYS: &[&str] = &["nameservers", "name_servers", "nameServers"];
const STATUS_KEYS: &[&str] = &["status", "domain_status", "domainStatus"];
const DNSSEC_KEYS: &[&str] = &["dnssec", "dnssec_enabled", "dnssecEnabled"];

/// Extract registration data from an aggregator body.
pub fn extract(json: &Value) -> RegistrationData {
    let record = unwrap_envelope(json);

    let mut data = RegistrationData {
        registrar: extract_registrar(record),
        created: first_date(record, CREATED_KEYS).into(),
        updated: first_date(record, UPDATED_KEYS).into(),
        expires: first_date(record, EXPIRES_KEYS).into(),
        dnssec_enabled: extract_dnssec(record),
        ..Default::default()
    };

    if let Some(nameservers) = field(record, NAMESERVER_KEYS) {
        for host in nameserver_hosts(nameservers) {
            data.push_nameserver(host);
        }
    }

    if let Some(status) = field(record, STATUS_KEYS) {
        for code in strings(status) {
            data.push_status(code.trim());
        }
    }

    data
}

/// Peel envelope objects until the record itself is reached.
fn unwrap_envelope(json: &Value) -> &Value {
    let mut current = json;
    // Bounded: a provider nesting deeper than this is not a known shape
    for _ in 0..WRAPPERS.len() {
        match WRAPPERS
            .iter()
            .find_map(|key| current.get(key).filter(|v| v.is_object()))
        {
            Some(inner) => current = inner,
            None => break,
        }
    }
    current
}

/// First non-null value among `keys`.
fn field<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(key))
        .find(|v| !v.is_null())
}

fn extract_registrar(record: &Value) -> Known<String> {
    match field(record, REGISTRAR_KEYS) {
        Some(Value::String(name)) => Known::Value(name.trim().to_string()),
        Some(Value::Object(obj)) => obj
            .get("name")
            .and_then(|n| n.as_str())
            .map(|n| n.trim().to_string())
            .into(),
        _ => Known::Unknown,
    }
}

/// First parseable date among `keys`; array values try each element.
fn first_date(record: &Value, keys: &[&str]) -> Option<NaiveDate> {
    keys.iter()
        .filter_map(|key| record.get(key))
        .flat_map(strings)
        .find_map(parse_date)
}

/// DNSSEC state from a boolean or a descriptive string.
fn extract_dnssec(record: &Value) -> Known<bool> {
    match field(record, DNSSEC_KEYS) {
        Some(Value::Bool(b)) => Known::Value(*b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "signed" | "signeddelegation" | "yes" | "true" => Known::Value(true),
            "unsigned" | "no" | "false" | "inactive" => Known::Value(false),
            _ => Known::Unknown,
        },
        _ => Known::Unknown,
    }
}

/// Nameserver hostnames from a string, an array, or `{hostNames: [...]}`.
///
/// A single string may list several hosts separated by whitespace or commas.
fn nameserver_hosts(value: &Value) -> Vec<&str> {
    match value {
        Value::Object(obj) => obj.get("hostNames").map(nameserver_hosts).unwrap_or_default(),
        Value::String(s) => s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|h| !h.is_empty())
            .collect(),
        Value::Array(items) => items.iter().flat_map(nameserver_hosts).collect(),
        _ => Vec::new(),
    }
}

/// String items of a scalar or an array value.
fn strings(value: &Value) -> Vec<&str> {
    match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(|v| v.as_str()).collect(),
        _ => Vec::new(),
    }
}
