//! Generated document identifiers.

use uuid::Uuid;

/// A fresh identifier in canonical hyphenated form.
///
/// UUID v7 carries a millisecond timestamp in its high bits, so
/// identifiers generated later compare greater as strings.
pub fn generate_id() -> String {
    Uuid::now_v7().hyphenated().to_string()
}
