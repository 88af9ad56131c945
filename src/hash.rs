//! Content hashing for JSON-like values
//!
//! Every row the engine produces is stamped with a `_hash` field: a
//! deterministic fingerprint of the row's contents that serves as its
//! identity, as the target of cross-table references, and as the key the
//! deduplication pass collapses on.
//!
//! The hash is computed over a canonical rendering of the value: object keys
//! sorted, existing `_hash` fields excluded, array order preserved. Two
//! values with the same content therefore hash identically regardless of
//! field order or previously attached hashes.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Field name the content hash is stored under.
pub const HASH_KEY: &str = "_hash";

/// Number of hex digits kept from the SHA-256 digest.
const HASH_LEN: usize = 22;

/// Compute the content hash of a value.
///
/// `_hash` fields at any depth are ignored, so hashing is stable whether or
/// not the value has been stamped before.
pub fn content_hash(value: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(value, &mut canonical);

    use std::fmt::Write as _;
    let digest = Sha256::digest(canonical.as_bytes());
    let mut hex = String::with_capacity(HASH_LEN + 1);
    for byte in digest.iter().take(HASH_LEN / 2 + 1) {
        write!(hex, "{byte:02x}").expect("writing to a String cannot fail");
    }
    hex.truncate(HASH_LEN);
    hex
}

/// Stamp an object row with its content hash.
///
/// Non-object values are returned unchanged; rows are always objects.
pub fn with_hash(mut row: Value) -> Value {
    let hash = content_hash(&row);
    if let Value::Object(ref mut obj) = row {
        obj.insert(HASH_KEY.to_string(), Value::String(hash));
    }
    row
}

/// Stamp every row in a batch.
pub fn hash_rows(rows: Vec<Value>) -> Vec<Value> {
    rows.into_iter().map(with_hash).collect()
}

/// Read the `_hash` field of a stamped row.
pub fn row_hash(row: &Value) -> Option<&str> {
    row.get(HASH_KEY).and_then(Value::as_str)
}

/// Render a value in canonical form: sorted object keys, `_hash` excluded.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            // serde_json's escaping is deterministic, reuse it.
            out.push_str(&serde_json::to_string(s).expect("strings always serialize"));
        }
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().filter(|k| *k != HASH_KEY).collect();
            keys.sort();
            out.push('{');
            for (idx, key) in keys.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).expect("strings always serialize"));
                out.push(':');
                write_canonical(&obj[key.as_str()], out);
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deterministic() {
        let value = json!({"model": "X", "doors": 5});
        assert_eq!(content_hash(&value), content_hash(&value));
    }

    #[test]
    fn test_field_order_independent() {
        let a = json!({"a": 1, "b": 2});
        let b = json!({"b": 2, "a": 1});
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn test_existing_hash_ignored() {
        let plain = json!({"model": "X"});
        let stamped = with_hash(plain.clone());
        assert_eq!(content_hash(&plain), content_hash(&stamped));
    }

    #[test]
    fn test_nested_hash_ignored() {
        let a = json!({"row": {"model": "X"}});
        let b = json!({"row": {"model": "X", "_hash": "abc"}});
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn test_content_sensitive() {
        assert_ne!(
            content_hash(&json!({"model": "X"})),
            content_hash(&json!({"model": "Y"}))
        );
        assert_ne!(content_hash(&json!([1, 2])), content_hash(&json!([2, 1])));
    }

    #[test]
    fn test_with_hash_stamps_row() {
        let row = with_hash(json!({"model": "X"}));
        let hash = row_hash(&row).unwrap();
        assert_eq!(hash.len(), 22);
        assert_eq!(hash, content_hash(&row));
    }
}
