use serde_json::Value;
use sha2::{Digest, Sha256};

/// Compute SHA-256 of bytes as a lowercase hex string.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Canonical JSON bytes: object keys sorted lexicographically at every
/// depth, arrays in original order, no whitespace. Two values with equal
/// content always produce identical bytes, so hashes change iff content
/// changes.
pub fn canonical_json_bytes(value: &Value) -> Vec<u8> {
    let sorted = sort_keys(value);
    serde_json::to_vec(&sorted).expect("canonical JSON serialization should not fail")
}

/// SHA-256 over the canonical serialization of a JSON value.
pub fn canonical_sha256(value: &Value) -> String {
    sha256_hex(&canonical_json_bytes(value))
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<(&String, Value)> =
                map.iter().map(|(k, v)| (k, sort_keys(v))).collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(pairs.into_iter().map(|(k, v)| (k.clone(), v)).collect())
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
