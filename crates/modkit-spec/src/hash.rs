//! Canonical hashing and deterministic identity derivation.
//!
//! - Configuration canonicalization using RFC 8785 (JCS)
//! - BLAKE3 hashing for configuration hashes
//! - UUID-shaped identifiers derived from stable names

use serde_json::Value;

/// Computes the canonical BLAKE3 hash of a JSON value.
///
/// Key order does not affect the result.
///
/// # Returns
/// * A 64-character lowercase hexadecimal string
///
/// # Example
/// ```
/// use modkit_spec::hash::canonical_value_hash;
/// use serde_json::json;
///
/// let a = canonical_value_hash(&json!({"a": 1, "b": 2}));
/// let b = canonical_value_hash(&json!({"b": 2, "a": 1}));
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn canonical_value_hash(value: &Value) -> String {
    let canonical = canonicalize_json(value);
    blake3::hash(canonical.as_bytes()).to_hex().to_string()
}

/// Canonicalizes a JSON value according to RFC 8785 (JCS).
///
/// This produces a deterministic JSON string where:
/// - Object keys are sorted lexicographically
/// - No whitespace between tokens
/// - Numbers are formatted per IEEE 754
/// - Strings use minimal escaping
pub fn canonicalize_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_jcs_number(n),
        Value::String(s) => format_jcs_string(s),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(canonicalize_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::Object(obj) => {
            let mut entries: Vec<(&String, &Value)> = obj.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let pairs: Vec<String> = entries
                .into_iter()
                .map(|(k, v)| format!("{}:{}", format_jcs_string(k), canonicalize_json(v)))
                .collect();
            format!("{{{}}}", pairs.join(","))
        }
    }
}

/// Formats a number according to JCS rules.
fn format_jcs_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_nan() || f.is_infinite() => "null".to_string(),
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => {
            let s = format!("{}", f);
            if s.contains('.') && !s.contains('e') && !s.contains('E') {
                return s.trim_end_matches('0').trim_end_matches('.').to_string();
            }
            s
        }
        None => "null".to_string(),
    }
}

/// Formats a string according to JCS rules.
fn format_jcs_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('"');
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c < '\x20' => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

/// Derives a UUID-shaped identifier from a namespace and a name.
///
/// ```text
/// uid = uuid_format(BLAKE3(namespace || ":" || name)[0..16])
/// ```
///
/// The version nibble is set to 5 and the variant bits to RFC 4122 so the
/// result is accepted wherever a UUID string is expected.
///
/// # Example
/// ```
/// use modkit_spec::hash::derive_uid;
///
/// let a = derive_uid("ui_extension", "checkout-banner");
/// assert_eq!(a, derive_uid("ui_extension", "checkout-banner"));
/// assert_ne!(a, derive_uid("ui_extension", "thank-you-banner"));
/// assert_eq!(a.len(), 36);
/// ```
pub fn derive_uid(namespace: &str, name: &str) -> String {
    let mut input = Vec::with_capacity(namespace.len() + name.len() + 1);
    input.extend_from_slice(namespace.as_bytes());
    input.push(b':');
    input.extend_from_slice(name.as_bytes());

    let hash = blake3::hash(&input);
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash.as_bytes()[..16]);
    bytes[6] = (bytes[6] & 0x0f) | 0x50;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
