//! Shared test utilities for the media-gal test suite.

use crate::options::OptionSet;
use serde_json::Value;

/// Build an [`OptionSet`] from a `json!` object literal.
///
/// ```rust
/// let options = opts(json!({"name": "test.mp4", "extension": "webm"}));
/// ```
pub fn opts(value: Value) -> OptionSet {
    match value {
        Value::Object(map) => OptionSet::from_map(map),
        other => panic!("option sets are JSON objects, got {other}"),
    }
}
