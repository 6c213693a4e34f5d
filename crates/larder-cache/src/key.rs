//! Cache key normalization and fingerprinting.

use std::borrow::Cow;

use larder_types::config_defaults::MAX_KEY_CHARS;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Normalize a cache key.
///
/// Keys longer than 250 characters are replaced by their SHA-256 hex digest
/// so a single entry never holds an unbounded key.
pub fn normalize_key(key: &str) -> Cow<'_, str> {
    if key.chars().count() > MAX_KEY_CHARS {
        Cow::Owned(digest(key))
    } else {
        Cow::Borrowed(key)
    }
}

/// SHA-256 hex digest of a string.
pub fn digest(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Stable fingerprint of a serializable value.
///
/// Object keys are sorted before hashing, so two parameter maps with the
/// same contents fingerprint identically regardless of insertion order.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let value = serde_json::to_value(value)?;
    Ok(digest(&canonicalize(&value).to_string()))
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<_> = map.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
