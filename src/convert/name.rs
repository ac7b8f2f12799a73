//! Name qualification for records owned by a grouping
//!
//! The store keeps names unique per type, while callers only need a name to
//! be unique within its model version. Owned names are stored as
//! `<owner-id>:<display-name>`.

use super::id;

const SEPARATOR: char = ':';

/// Store-internal name of a record owned by `owner_id`
pub fn qualify(owner_id: i64, display_name: &str) -> String {
    format!("{}{}{}", id::encode(owner_id), SEPARATOR, display_name)
}

/// Split a store name into its owner id (if qualified) and display name
///
/// The prefix only counts as an owner when it is a canonical id, so names
/// that merely contain the separator are returned unchanged.
pub fn split(stored: &str) -> (Option<i64>, &str) {
    match stored.split_once(SEPARATOR) {
        Some((prefix, rest)) => match id::decode(prefix) {
            Ok(owner) => (Some(owner), rest),
            Err(_) => (None, stored),
        },
        None => (None, stored),
    }
}

/// Display name of a store name, owner prefix removed
pub fn display_name(stored: &str) -> &str {
    split(stored).1
}
