//! Cleanup of free-text labels (amenities, tags) and the attribute decoder.

pub mod attributes;

use serde_json::Value;

/// Characters left behind when a list was stored as its JSON text
const ARTIFACTS: [char; 6] = ['[', ']', '\\', '/', '"', '\''];

/// Clean a single label, returning `None` when nothing is left
pub fn normalize_token(raw: &str) -> Option<String> {
    let stripped: String = raw.chars().filter(|c| !ARTIFACTS.contains(c)).collect();
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Same as [`normalize_token`] for values of unknown type
pub fn normalize_value(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => normalize_token(s),
        Value::Null => None,
        other => normalize_token(&other.to_string()),
    }
}

/// Normalize a collection of labels into a set, keeping first-seen order
pub fn normalize_labels<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for label in labels {
        if let Some(clean) = normalize_token(label.as_ref()) {
            if !out.contains(&clean) {
                out.push(clean);
            }
        }
    }
    out
}

/// Labels as the backend stores them: an array whose entries may each hold
/// a whole stringified list, or one comma-separated string.
pub fn split_stored_labels(raw: &Value) -> Vec<String> {
    let entries: Vec<String> = match raw {
        Value::Array(items) => items.iter().filter_map(normalize_value).collect(),
        other => normalize_value(other).into_iter().collect(),
    };

    normalize_labels(entries.iter().flat_map(|entry| entry.split(',')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strips_bracket_and_quote_artifacts() {
        assert_eq!(normalize_token(r#"["WiFi"]"#).as_deref(), Some("WiFi"));
        assert_eq!(normalize_token("  Pool  ").as_deref(), Some("Pool"));
        assert_eq!(normalize_token(r"\'Gym\'/").as_deref(), Some("Gym"));
    }

    #[test]
    fn test_empty_tokens_are_dropped() {
        assert_eq!(normalize_token(""), None);
        assert_eq!(normalize_token(r#" [""] "#), None);
        assert_eq!(normalize_labels(["", "Sauna", "  "]), vec!["Sauna"]);
    }

    #[test]
    fn test_normalizing_is_idempotent() {
        for raw in [r#"["WiFi"]"#, "  Pool ", "Free parking", "a/b\\c"] {
            let once = normalize_token(raw).unwrap();
            assert_eq!(normalize_token(&once).as_deref(), Some(once.as_str()));
        }
    }

    #[test]
    fn test_non_string_values_are_coerced() {
        assert_eq!(normalize_value(&json!(24)).as_deref(), Some("24"));
        assert_eq!(normalize_value(&json!(true)).as_deref(), Some("true"));
        assert_eq!(normalize_value(&Value::Null), None);
    }

    #[test]
    fn test_labels_form_a_set() {
        assert_eq!(normalize_labels(["WiFi", "[WiFi]", "Pool"]), vec!["WiFi", "Pool"]);
    }

    #[test]
    fn test_stored_labels_are_split() {
        let stored = json!(["[\"WiFi\",\"Pool\"]", "Parking"]);
        assert_eq!(split_stored_labels(&stored), vec!["WiFi", "Pool", "Parking"]);

        let single = json!("Breakfast, Spa");
        assert_eq!(split_stored_labels(&single), vec!["Breakfast", "Spa"]);
    }
}
