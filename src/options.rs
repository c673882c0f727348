//! Per-item transformation options and their cache-relevant form.
//!
//! Gallery settings hand every media item a loosely-typed option mapping:
//! the source path, the target encoding, display hints for the templates,
//! and whatever pass-through values a theme wants. Only a subset of those
//! keys changes the bytes of a derived artifact — the rest is presentation.
//!
//! [`OptionSet`] is the raw mapping as the settings layer delivers it.
//! [`SanitizedOptions`] is the same mapping with the display-only keys
//! stripped; it is what gets fingerprinted and what the build cache compares
//! between runs. Splitting the two types keeps "what the templates see" and
//! "what invalidates the cache" from silently drifting apart.
//!
//! ## Display-only keys
//!
//! The stripped keys are fixed: `name`, `exif`, `text`, `type`, `size`,
//! `float`, `resize`. `resize` is display-only because it only affects the
//! pixel size of template copies, and that size is already part of the
//! copy's file name — changing it renames the output instead of invalidating
//! every other artifact of the same source.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys that never affect the bytes of a derived artifact.
///
/// Stripped by [`OptionSet::sanitized`] before fingerprinting and cache
/// comparison. Everything not listed here is treated as content-affecting
/// and passed through untouched.
pub const DISPLAY_KEYS: [&str; 7] = ["name", "exif", "text", "type", "size", "float", "resize"];

/// A raw per-item (or gallery-wide) option mapping.
///
/// Thin wrapper over a JSON object so option sets deserialize directly from
/// whatever the settings layer produces. Recognized keys get typed accessors;
/// unrecognized keys ride along and end up in the fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionSet(Map<String, Value>);

impl OptionSet {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// The declared source path, if any.
    pub fn name(&self) -> Option<&str> {
        self.str_key("name")
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.0.insert("name".to_string(), Value::String(name.into()));
    }

    /// Target container/extension for re-encoded renditions.
    pub fn extension(&self) -> Option<&str> {
        self.str_key("extension")
    }

    /// Copy scaling percentage, e.g. `"50%"`.
    pub fn resize(&self) -> Option<&str> {
        self.str_key("resize")
    }

    /// Transcoding toolchain selector (`ffmpeg` or a libav equivalent).
    pub fn binary(&self) -> Option<&str> {
        self.str_key("binary")
    }

    /// Merge an item's options over the gallery-wide defaults.
    ///
    /// Shallow, key-level merge: the item's value wins wholesale, nested
    /// structures are not combined.
    pub fn merged(global: &OptionSet, item: &OptionSet) -> OptionSet {
        let mut merged = global.0.clone();
        for (key, value) in &item.0 {
            merged.insert(key.clone(), value.clone());
        }
        Self(merged)
    }

    /// Strip the [`DISPLAY_KEYS`] — absence of a key is a no-op.
    pub fn sanitized(&self) -> SanitizedOptions {
        let mut cleaned = self.0.clone();
        for key in DISPLAY_KEYS {
            cleaned.remove(key);
        }
        SanitizedOptions(cleaned)
    }

    fn str_key(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

/// An option set reduced to its content-affecting keys.
///
/// Equality is structural and value-based, so a set that has round-tripped
/// through the cache file compares equal to the freshly sanitized original.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SanitizedOptions(Map<String, Value>);

impl SanitizedOptions {
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn extension(&self) -> Option<&str> {
        self.0.get("extension").and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::opts;
    use serde_json::json;

    // =========================================================================
    // Merging
    // =========================================================================

    #[test]
    fn merged_item_overrides_global() {
        let global = opts(json!({"extension": "webm", "quality": 90}));
        let item = opts(json!({"quality": 70}));

        let merged = OptionSet::merged(&global, &item);
        assert_eq!(merged.get("quality"), Some(&json!(70)));
        assert_eq!(merged.extension(), Some("webm"));
    }

    #[test]
    fn merged_keeps_disjoint_keys_from_both() {
        let global = opts(json!({"binary": "ffmpeg"}));
        let item = opts(json!({"name": "test.mp4"}));

        let merged = OptionSet::merged(&global, &item);
        assert_eq!(merged.binary(), Some("ffmpeg"));
        assert_eq!(merged.name(), Some("test.mp4"));
    }

    #[test]
    fn merged_is_shallow() {
        let global = opts(json!({"encoder": {"preset": "slow", "crf": 23}}));
        let item = opts(json!({"encoder": {"crf": 18}}));

        let merged = OptionSet::merged(&global, &item);
        // The item's nested object replaces the default wholesale.
        assert_eq!(merged.get("encoder"), Some(&json!({"crf": 18})));
    }

    // =========================================================================
    // Sanitization
    // =========================================================================

    #[test]
    fn sanitized_strips_every_display_key() {
        let options = opts(json!({
            "name": "test",
            "exif": 1,
            "text": "alt",
            "type": "video",
            "size": 12345678,
            "float": "left",
            "resize": "30%",
            "test": 123,
            "something": "else",
        }));

        let sanitized = options.sanitized();
        assert_eq!(
            sanitized,
            opts(json!({"test": 123, "something": "else"})).sanitized()
        );
        assert_eq!(sanitized.as_map().len(), 2);
    }

    #[test]
    fn sanitized_absent_keys_are_a_noop() {
        let options = opts(json!({"quality": 90}));
        assert_eq!(options.sanitized().as_map().len(), 1);
    }

    #[test]
    fn sanitized_keeps_content_affecting_keys() {
        let options = opts(json!({"extension": "ogg", "name": "x.mp3"}));
        let sanitized = options.sanitized();
        assert_eq!(sanitized.extension(), Some("ogg"));
        assert_eq!(sanitized.as_map().get("name"), None);
    }

    #[test]
    fn sanitized_of_empty_set_is_empty() {
        assert!(OptionSet::new().sanitized().is_empty());
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[test]
    fn typed_accessors_read_string_keys() {
        let options = opts(json!({"name": "a.jpg", "resize": "50%", "binary": "ffmpeg"}));
        assert_eq!(options.name(), Some("a.jpg"));
        assert_eq!(options.resize(), Some("50%"));
        assert_eq!(options.binary(), Some("ffmpeg"));
        assert_eq!(options.extension(), None);
    }

    #[test]
    fn typed_accessors_ignore_non_string_values() {
        let options = opts(json!({"name": 42}));
        assert_eq!(options.name(), None);
    }

    #[test]
    fn set_name_replaces_declared_path() {
        let mut options = opts(json!({"name": "../shared/pic.jpg"}));
        options.set_name("shared/pic.jpg");
        assert_eq!(options.name(), Some("shared/pic.jpg"));
    }

    // =========================================================================
    // Serde round trip
    // =========================================================================

    #[test]
    fn sanitized_options_survive_json_round_trip() {
        let sanitized = opts(json!({"crop": [0, 1], "quality": 90})).sanitized();
        let json = serde_json::to_string(&sanitized).unwrap();
        let back: SanitizedOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sanitized);
    }
}
