//! Admission rules for extension data.
//!
//! Extension members enter the payload as arbitrary `Serialize` values.
//! Conversion to a JSON value tree is fallible (custom `Serialize` impls
//! can error, maps can carry non-string keys); entries that fail are
//! dropped entirely rather than replaced with a placeholder, so a payload
//! always renders. Raw bytes are admitted through a lossy UTF-8 decode so
//! malformed sequences can never abort serialization.

use serde::Serialize;
use serde_json::Value;

/// Convert extension data to a JSON value, or `None` if it does not
/// serialize. A `None` means the whole entry is omitted from the payload.
pub fn extension_value(value: impl Serialize) -> Option<Value> {
    serde_json::to_value(value).ok()
}

/// Admit raw bytes as text, replacing invalid UTF-8 sequences.
#[must_use]
pub fn lossy_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
