//! Row values and the loose typing helpers used on them.
//!
//! Rows come from tables whose layout is only partly known, so every read of
//! a field goes through one of these helpers instead of assuming a type.

use ahash::AHashSet;
use serde_json::{Map, Value};

/// One table row. Column order is the backend's (insertion) order.
pub type Row = Map<String, Value>;

/// Read a value as display text.
///
/// Strings are trimmed; arrays contribute their non-empty string items joined
/// with `", "`. Anything else, or an empty result, is `None`.
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

/// Read a row field as display text.
pub fn field_text(row: &Row, column: &str) -> Option<String> {
    row.get(column).and_then(value_as_text)
}

/// Whether a sampled value could belong to a text column.
///
/// Nulls count as textual: a sampled row may simply have the field unset.
pub fn is_textual(value: &Value) -> bool {
    matches!(value, Value::Null | Value::String(_) | Value::Array(_))
}

/// Normalize an identifier (string or number) to trimmed lower-case text.
pub fn normalize_identifier(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    let normalized = raw.trim().to_lowercase();
    (!normalized.is_empty()).then_some(normalized)
}

/// Read a synonym list: trimmed, non-empty, deduplicated in first-seen order.
/// Non-array values read as an empty list.
pub fn sanitize_synonyms(value: &Value) -> Vec<String> {
    let Value::Array(items) = value else {
        return Vec::new();
    };
    let mut seen = AHashSet::new();
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(text.trim().to_string()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Render any scalar as text for identity keys and comparisons.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_as_text() {
        assert_eq!(value_as_text(&json!("  etxe ")), Some("etxe".to_string()));
        assert_eq!(value_as_text(&json!("   ")), None);
        assert_eq!(value_as_text(&json!(["a", " ", "b", 3])), Some("a, b".to_string()));
        assert_eq!(value_as_text(&json!([])), None);
        assert_eq!(value_as_text(&json!(12)), None);
        assert_eq!(value_as_text(&Value::Null), None);
    }

    #[test]
    fn test_is_textual() {
        assert!(is_textual(&Value::Null));
        assert!(is_textual(&json!("x")));
        assert!(is_textual(&json!(["x"])));
        assert!(!is_textual(&json!(1)));
        assert!(!is_textual(&json!(true)));
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier(&json!(42)), Some("42".to_string()));
        assert_eq!(normalize_identifier(&json!(" AbC ")), Some("abc".to_string()));
        assert_eq!(normalize_identifier(&json!("")), None);
        assert_eq!(normalize_identifier(&json!(null)), None);
    }

    #[test]
    fn test_sanitize_synonyms() {
        assert_eq!(
            sanitize_synonyms(&json!([" egoitza", "bizitoki", "egoitza", "", null])),
            vec!["egoitza".to_string(), "bizitoki".to_string()]
        );
        assert!(sanitize_synonyms(&json!("egoitza")).is_empty());
        assert_eq!(
            sanitize_synonyms(&json!(["b", "a", "b ", 7, "7"])),
            vec!["b".to_string(), "a".to_string(), "7".to_string()]
        );
    }
}
