//! Option fingerprinting: canonical encoding plus CRC-32.
//!
//! Every derived artifact's file name carries a digest of the option set that
//! produced it, so a configuration change renames the outputs instead of
//! silently overwriting them. The digest must therefore be deterministic
//! across process runs, across crate versions, and across whatever in-memory
//! representation the settings layer happened to produce — it is a durable
//! on-disk identifier, not a session-local hash.
//!
//! ## Canonical encoding (v1)
//!
//! The sanitized option set is serialized to JSON with:
//!
//! - object keys sorted lexicographically at every nesting level,
//!   independent of insertion order and of `serde_json`'s map backing;
//! - minimal separators (no whitespace);
//! - shortest-round-trip float formatting, so the integer `0` and the float
//!   `0.0` encode differently and never collide unless literally equal;
//! - UTF-8 output with escapes limited to `"`, `\` and control characters.
//!
//! The CRC-32 of those bytes is the fingerprint. Any change to this encoding
//! invalidates every published file name and must come with a cache format
//! version bump (see [`crate::cache`]).

use crate::options::{OptionSet, SanitizedOptions};
use serde_json::{Map, Value};

/// Fingerprint an option set: sanitize, canonically encode, checksum.
///
/// Pure function; equal sanitized inputs yield equal fingerprints regardless
/// of key order or how sequence values were built.
pub fn fingerprint(options: &OptionSet) -> u32 {
    digest(&options.sanitized())
}

/// Fingerprint an already-sanitized option set.
pub fn digest(options: &SanitizedOptions) -> u32 {
    let mut encoded = String::new();
    write_object(options.as_map(), &mut encoded);
    crc32fast::hash(encoded.as_bytes())
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        // serde_json formats integers bare and floats via shortest round
        // trip, keeping 0 and 0.0 distinct.
        Value::Number(number) => out.push_str(&number.to_string()),
        Value::String(string) => write_string(string, out),
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => write_object(map, out),
    }
}

fn write_object(map: &Map<String, Value>, out: &mut String) {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by_key(|(key, _)| *key);

    out.push('{');
    for (index, (key, value)) in entries.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        write_string(key, out);
        out.push(':');
        write_value(value, out);
    }
    out.push('}');
}

fn write_string(string: &str, out: &mut String) {
    out.push('"');
    for c in string.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
