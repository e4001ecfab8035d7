pub mod assembler;

use crate::models::{Owner, Weekday};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub use assembler::{submit_draft, ListingSubmission};

/// Where an image in the draft comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageSource {
    /// Already uploaded; sent back by URL so it is not uploaded again
    Hosted(String),
    /// `data:<mime>;base64,<payload>`
    Inline(String),
    /// A file picked from disk
    Local(PathBuf),
}

impl From<String> for ImageSource {
    fn from(raw: String) -> Self {
        let lower = raw.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ImageSource::Hosted(raw)
        } else if lower.starts_with("data:") {
            ImageSource::Inline(raw)
        } else {
            ImageSource::Local(PathBuf::from(raw))
        }
    }
}

impl From<ImageSource> for String {
    fn from(source: ImageSource) -> Self {
        match source {
            ImageSource::Hosted(url) => url,
            ImageSource::Inline(data) => data,
            ImageSource::Local(path) => path.to_string_lossy().into_owned(),
        }
    }
}

/// One day as typed into the hours tab
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayDraft {
    #[serde(default)]
    pub open: Option<String>,
    #[serde(default)]
    pub close: Option<String>,
}

/// Everything the listing form collects across its tabs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingDraft {
    // basics
    pub name: String,
    pub category: String,
    pub price: f64,
    pub rating: Option<f64>,
    pub description: String,
    pub is_featured: bool,

    // location
    pub country: String,
    pub state: String,
    pub city: String,
    pub area: String,

    // media
    pub images: Vec<ImageSource>,

    // details
    pub amenities: Vec<String>,
    pub attributes: String,
    pub tags: Vec<String>,

    pub hours: BTreeMap<Weekday, DayDraft>,

    // contact
    pub phone: String,
    pub email: String,
    pub website: String,
    pub owner: Owner,
}

/// Form tabs, in the order the form shows them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormTab {
    Basics,
    Location,
    Media,
    Hours,
    Contact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub tab: FormTab,
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Most images a listing can carry
pub const MAX_IMAGES: usize = 10;

/// Time formats accepted in the hours tab
const TIME_FORMATS: [&str; 4] = ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];

/// Parse a loosely typed time of day
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
}

impl ListingDraft {
    /// Check the draft, returning errors ordered by tab
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let mut fail = |tab, field: &str, message: &str| {
            errors.push(FieldError {
                tab,
                field: field.to_string(),
                message: message.to_string(),
            })
        };

        if self.name.trim().is_empty() {
            fail(FormTab::Basics, "name", "is required");
        }
        if self.category.trim().is_empty() {
            fail(FormTab::Basics, "category", "is required");
        }
        if !self.price.is_finite() || self.price < 0.0 {
            fail(FormTab::Basics, "price", "must be a non-negative number");
        }
        if let Some(rating) = self.rating {
            if !(0.0..=5.0).contains(&rating) {
                fail(FormTab::Basics, "rating", "must be between 0 and 5");
            }
        }

        if !self.area.trim().is_empty() && self.city.trim().is_empty() {
            fail(FormTab::Location, "city", "is required when an area is set");
        }

        if self.images.len() > MAX_IMAGES {
            fail(FormTab::Media, "images", "too many images");
        }

        for (day, draft) in &self.hours {
            for (which, value) in [("open", &draft.open), ("close", &draft.close)] {
                if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                    if parse_time(value).is_none() {
                        fail(FormTab::Hours, &format!("hours.{}.{}", day, which), "is not a valid time");
                    }
                }
            }
        }

        let email = self.email.trim();
        if !email.is_empty() && !email.contains('@') {
            fail(FormTab::Contact, "email", "is not a valid email address");
        }
        let owner_email = self.owner.email.trim();
        if !owner_email.is_empty() && !owner_email.contains('@') {
            fail(FormTab::Contact, "owner.email", "is not a valid email address");
        }

        errors.sort_by_key(|error| error.tab);
        errors
    }

    /// Tab to show first when the draft does not validate
    pub fn first_invalid_tab(&self) -> Option<FormTab> {
        self.validate().first().map(|error| error.tab)
    }
}
