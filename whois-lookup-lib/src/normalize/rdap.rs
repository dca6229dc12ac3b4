//! RDAP response extraction.
//!
//! RDAP (RFC 9083) responses carry registration data in nested structures:
//! the registrar is an entity with the `registrar` role whose name sits in a
//! jCard (`vcardArray`), dates are `events` keyed by `eventAction`, and the
//! DNSSEC state lives under `secureDNS`.

use super::dates::parse_date;
use crate::types::{Known, RegistrationData};
use serde_json::Value;

const EVENT_REGISTRATION: &str = "registration";
const EVENT_LAST_CHANGED: &str = "last changed";
const EVENT_EXPIRATION: &str = "expiration";

/// Extract registration data from an RDAP domain object.
pub fn extract(json: &Value) -> RegistrationData {
    let mut data = RegistrationData {
        registrar: extract_registrar(json).into(),
        created: event_date(json, EVENT_REGISTRATION).into(),
        updated: event_date(json, EVENT_LAST_CHANGED).into(),
        expires: event_date(json, EVENT_EXPIRATION).into(),
        dnssec_enabled: extract_dnssec(json),
        ..Default::default()
    };

    if let Some(nameservers) = json.get("nameservers").and_then(|ns| ns.as_array()) {
        for nameserver in nameservers {
            if let Some(name) = nameserver
                .get("ldhName")
                .or_else(|| nameserver.get("unicodeName"))
                .and_then(|n| n.as_str())
            {
                data.push_nameserver(name);
            }
        }
    }

    if let Some(statuses) = json.get("status").and_then(|s| s.as_array()) {
        for status in statuses.iter().filter_map(|s| s.as_str()) {
            data.push_status(status);
        }
    }

    data
}

/// Find the registrar entity, searching nested entities breadth-first.
fn extract_registrar(json: &Value) -> Option<String> {
    let mut queue: Vec<&Value> = json
        .get("entities")
        .and_then(|e| e.as_array())
        .map(|a| a.iter().collect())
        .unwrap_or_default();

    let mut i = 0;
    while i < queue.len() {
        let entity = queue[i];
        i += 1;

        if has_role(entity, "registrar") {
            if let Some(name) = vcard_property(entity, "fn")
                .or_else(|| vcard_property(entity, "org"))
                .or_else(|| extract_entity_identifier(entity))
            {
                return Some(name);
            }
        }

        if let Some(children) = entity.get("entities").and_then(|e| e.as_array()) {
            queue.extend(children.iter());
        }
    }

    None
}

fn has_role(entity: &Value, role: &str) -> bool {
    entity
        .get("roles")
        .and_then(|r| r.as_array())
        .is_some_and(|roles| roles.iter().any(|r| r.as_str() == Some(role)))
}

/// Read a text property from an entity's jCard.
///
/// jCard properties are `[name, params, type, value]` arrays inside
/// `vcardArray[1]`. The value may itself be an array for structured types.
fn vcard_property(entity: &Value, property: &str) -> Option<String> {
    entity
        .get("vcardArray")
        .and_then(|v| v.get(1))
        .and_then(|items| items.as_array())?
        .iter()
        .filter_map(|item| item.as_array())
        .filter(|item| item.len() >= 4 && item[0].as_str() == Some(property))
        .find_map(|item| match &item[3] {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Array(parts) => parts
                .iter()
                .filter_map(|p| p.as_str())
                .find(|p| !p.trim().is_empty())
                .map(|p| p.trim().to_string()),
            _ => None,
        })
}

/// Extract entity identifier from publicIds or handle.
fn extract_entity_identifier(entity: &Value) -> Option<String> {
    entity
        .get("publicIds")
        .and_then(|p| p.as_array())
        .and_then(|ids| ids.first())
        .and_then(|id| id.get("identifier"))
        .and_then(|i| i.as_str())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .or_else(|| {
            entity
                .get("handle")
                .and_then(|h| h.as_str())
                .map(str::trim)
                .filter(|h| !h.is_empty())
        })
        .map(String::from)
}

/// Date of the first event with the given action that parses.
fn event_date(json: &Value, action: &str) -> Option<chrono::NaiveDate> {
    json.get("events")
        .and_then(|e| e.as_array())?
        .iter()
        .filter(|event| {
            event
                .get("eventAction")
                .and_then(|a| a.as_str())
                .is_some_and(|a| a.eq_ignore_ascii_case(action))
        })
        .filter_map(|event| event.get("eventDate").and_then(|d| d.as_str()))
        .find_map(parse_date)
}

/// DNSSEC state from `secureDNS.delegationSigned`; absent means unknown.
fn extract_dnssec(json: &Value) -> Known<bool> {
    json.get("secureDNS")
        .and_then(|s| s.get("delegationSigned"))
        .and_then(|d| d.as_bool())
        .into()
}
