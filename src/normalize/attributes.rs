//! Listing attributes arrive in whatever shape the backend happened to store
//! them: the canonical comma-separated text, a JSON string wrapped one or
//! more times, a plain object, or a string that was saved one character per
//! key (`{"0": "a", "1": "b"}`). Decoding never fails; the worst case is the
//! value's textual form.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Upper bound on nested `JSON.stringify` layers we unwrap
const MAX_UNWRAP_ROUNDS: usize = 5;

/// Canonical attribute text, e.g. `"Bedrooms: 3, Bathrooms: 2"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Attributes(String);

impl Attributes {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(decode(&raw))
    }
}

/// The shapes a stored attributes value can take once unwrapped
#[derive(Debug, Clone, PartialEq)]
pub enum RawAttributes {
    RawString(String),
    LegacyObject(Map<String, Value>),
    CharacterIndexedLegacy(String),
}

impl RawAttributes {
    /// Classify a stored value
    pub fn classify(raw: &Value) -> Self {
        let mut rounds = MAX_UNWRAP_ROUNDS;
        Self::classify_within(raw, &mut rounds)
    }

    fn classify_within(raw: &Value, rounds: &mut usize) -> Self {
        if let Value::String(s) = raw {
            if s.contains(',') {
                return RawAttributes::RawString(s.clone());
            }
        }

        match unwrap_json(raw.clone(), rounds) {
            Value::Object(map) => match join_character_keys(&map) {
                Some(joined) => RawAttributes::CharacterIndexedLegacy(reparse(joined)),
                None => RawAttributes::LegacyObject(map),
            },
            other => RawAttributes::RawString(value_text(&other)),
        }
    }

    /// Render to the canonical string form
    pub fn into_attributes(self) -> Attributes {
        match self {
            RawAttributes::RawString(s) | RawAttributes::CharacterIndexedLegacy(s) => Attributes(s),
            RawAttributes::LegacyObject(map) => Attributes(object_keys(&map)),
        }
    }
}

/// Decode a stored attributes value into its canonical form
pub fn decode(raw: &Value) -> Attributes {
    let mut rounds = MAX_UNWRAP_ROUNDS;
    let mut text = RawAttributes::classify_within(raw, &mut rounds).into_attributes().0;

    // Rendered keys can read as JSON again (`{"[1]": true}` renders `[1]`).
    // Any pass that changes the text spends at least one unwrap round.
    while rounds > 0 {
        let next = RawAttributes::classify_within(&Value::String(text.clone()), &mut rounds)
            .into_attributes()
            .0;
        if next == text {
            break;
        }
        text = next;
    }
    Attributes(text)
}

/// Operator-entered text is already canonical
pub fn encode(text: &str) -> Attributes {
    Attributes(text.to_string())
}

/// Peel string-encoded JSON layers while `rounds` lasts. Only strings that
/// parse to another string, an object or an array are unwrapped; bare
/// scalars keep their text.
fn unwrap_json(mut current: Value, rounds: &mut usize) -> Value {
    while *rounds > 0 {
        let Value::String(text) = &current else {
            break;
        };
        match serde_json::from_str::<Value>(text) {
            Ok(parsed @ (Value::String(_) | Value::Object(_) | Value::Array(_))) => {
                current = parsed;
                *rounds -= 1;
            }
            _ => break,
        }
    }
    current
}

/// Rebuild a string stored one character per key. `None` unless the keys
/// are exactly `0..len`.
fn join_character_keys(map: &Map<String, Value>) -> Option<String> {
    if map.is_empty() {
        return None;
    }

    let mut slots: Vec<Option<String>> = vec![None; map.len()];
    for (key, value) in map {
        let index: usize = key.parse().ok()?;
        if key != &index.to_string() {
            return None;
        }
        let slot = slots.get_mut(index)?;
        *slot = Some(value_text(value));
    }

    slots.into_iter().collect::<Option<Vec<_>>>().map(|parts| parts.concat())
}

/// One more parse of a rebuilt string; keep the raw text when it is not JSON
fn reparse(joined: String) -> String {
    match serde_json::from_str::<Value>(&joined) {
        Ok(Value::String(s)) => s,
        Ok(Value::Object(map)) => object_keys(&map),
        Ok(Value::Array(items)) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        _ => joined,
    }
}

fn object_keys(map: &Map<String, Value>) -> String {
    map.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        Value::Object(map) => object_keys(map),
        other => other.to_string(),
    }
}
