use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Day of the week, ordered Monday first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Weekday::ALL
            .into_iter()
            .find(|day| day.as_str() == lower || (lower.len() == 3 && day.as_str().starts_with(&lower)))
            .ok_or_else(|| format!("unknown weekday: {}", s))
    }
}

impl TryFrom<String> for Weekday {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Weekday> for String {
    fn from(day: Weekday) -> Self {
        day.as_str().to_string()
    }
}

/// Opening and closing time for one day, both `HH:mm`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub open: String,
    pub close: String,
}

/// Days without an entry are closed
pub type BusinessHours = BTreeMap<Weekday, OpeningHours>;

/// Read stored hours, keeping only known days that have both times.
/// Anything else in the map is skipped, never an error.
pub fn from_value(raw: &Value) -> BusinessHours {
    let Value::Object(days) = raw else {
        return BusinessHours::new();
    };

    days.iter()
        .filter_map(|(key, slot)| {
            let Ok(day) = key.parse::<Weekday>() else {
                debug!("Skipping hours for unknown day {:?}", key);
                return None;
            };
            let time = |field: &str| {
                slot.get(field)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
            };
            match (time("open"), time("close")) {
                (Some(open), Some(close)) => Some((day, OpeningHours { open, close })),
                _ => {
                    debug!("Skipping {} without both opening and closing time", day);
                    None
                }
            }
        })
        .collect()
}

/// `deserialize_with` form of [`from_value`]; `null` reads as no hours
pub fn lenient<'de, D>(deserializer: D) -> Result<BusinessHours, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.map(|value| from_value(&value)).unwrap_or_default())
}
