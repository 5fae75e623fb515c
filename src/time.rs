//! Wire timestamp codec.
//!
//! The remote store represents dates with its own timestamp type
//! ([`WireTimestamp`], seconds + nanoseconds). The cache and every component
//! reading it work with plain epoch-millisecond integers. Conversion happens
//! only at the dispatcher/orchestrator boundary, through this module, so a
//! missed conversion cannot hide in an individual call site.

use serde::{Deserialize, Serialize};

use crate::remote::{Document, Fields, WireValue};

const MILLIS_PER_SECOND: i64 = 1_000;
const NANOS_PER_MILLI: i64 = 1_000_000;

/// The remote store's native timestamp representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WireTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

/// Convert an epoch-millisecond integer to the wire representation.
pub fn to_wire(epoch_ms: i64) -> WireTimestamp {
    let seconds = epoch_ms.div_euclid(MILLIS_PER_SECOND);
    let nanos = (epoch_ms.rem_euclid(MILLIS_PER_SECOND) * NANOS_PER_MILLI) as u32;
    WireTimestamp { seconds, nanos }
}

/// Convert a wire timestamp back to epoch milliseconds.
///
/// Sub-millisecond nanos are truncated; the store's effective precision for
/// this application is milliseconds.
pub fn from_wire(stamp: &WireTimestamp) -> i64 {
    stamp.seconds * MILLIS_PER_SECOND + i64::from(stamp.nanos) / NANOS_PER_MILLI
}

/// Encode the named date fields of a payload for the wire.
///
/// Returns a converted copy; the caller's payload keeps its plain integers.
/// Fields that are absent or not integers are passed through untouched.
pub fn encode_date_fields(fields: &Fields, date_fields: &[&str]) -> Fields {
    let mut encoded = fields.clone();
    for name in date_fields {
        if let Some(WireValue::Integer(ms)) = encoded.get(*name) {
            let stamp = to_wire(*ms);
            encoded.insert((*name).to_string(), WireValue::Timestamp(stamp));
        }
    }
    encoded
}

/// Decode the named date fields of a fetched document in place.
///
/// A missing or null wire value leaves the field absent rather than failing;
/// readers check for presence before use.
pub fn decode_date_fields(fields: &mut Fields, date_fields: &[&str]) {
    for name in date_fields {
        match fields.get(*name) {
            Some(WireValue::Timestamp(stamp)) => {
                let ms = from_wire(stamp);
                fields.insert((*name).to_string(), WireValue::Integer(ms));
            }
            Some(WireValue::Null) => {
                fields.remove(*name);
            }
            _ => {}
        }
    }
}

/// Decode the named date fields of a whole document.
pub fn decode_document_dates(doc: &mut Document, date_fields: &[&str]) {
    decode_date_fields(&mut doc.fields, date_fields);
}
