//! Response normalization.
//!
//! Turns an upstream JSON body into [`RegistrationData`]. Normalization
//! never fails: missing or malformed fields come out as `Known::Unknown`.
//! Whether the result is good enough to return is the executor's decision.

mod aggregator;
mod dates;
mod rdap;

pub use dates::parse_date;

use crate::sources::SourceKind;
use crate::types::RegistrationData;
use serde_json::Value;

/// Normalize a parsed body according to the shape its source speaks.
pub fn normalize(kind: SourceKind, raw: &Value) -> RegistrationData {
    if kind.speaks_rdap() {
        rdap::extract(raw)
    } else {
        aggregator::extract(raw)
    }
}
