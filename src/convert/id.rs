//! Identifier codec: store `i64` ids <-> external string ids
//!
//! Only canonical decimal strings are accepted, so `encode(decode(s)) == s`
//! holds for every string `decode` accepts.

use super::MappingError;

/// Render a store id as its external string form
pub fn encode(id: i64) -> String {
    id.to_string()
}

/// Parse an external id, rejecting anything that is not canonical decimal
pub fn decode(raw: &str) -> Result<i64, MappingError> {
    let invalid = || MappingError::InvalidId(raw.to_string());

    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    // No leading zeros, and no negative zero
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(invalid());
    }
    if digits == "0" && raw.starts_with('-') {
        return Err(invalid());
    }
    raw.parse::<i64>().map_err(|_| invalid())
}

/// Decode an optional id, passing `None` through
pub fn decode_opt(raw: Option<&str>) -> Result<Option<i64>, MappingError> {
    raw.map(decode).transpose()
}
