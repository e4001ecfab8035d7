use crate::api::ApiError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Warning,
    Error,
}

/// A message meant for the person at the keyboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    /// Actionable text for the failures users can fix, a generic line otherwise
    pub fn from_error(error: &ApiError) -> Self {
        let (level, message) = match error {
            ApiError::Validation { message, fields } if fields.is_empty() => {
                (Level::Warning, format!("Please check the form: {}.", message))
            }
            ApiError::Validation { fields, .. } => {
                let details = fields
                    .iter()
                    .map(|(field, problem)| format!("{} {}", field, problem))
                    .collect::<Vec<_>>()
                    .join("; ");
                (Level::Warning, format!("Please fix the following fields: {}.", details))
            }
            ApiError::ReferentialConstraint(_) => (
                Level::Error,
                "This item is still in use by existing listings and cannot be deleted. \
                 Reassign or remove those listings first."
                    .to_string(),
            ),
            ApiError::NotFound(_) => (
                Level::Warning,
                "The item no longer exists. It may have been deleted already.".to_string(),
            ),
            ApiError::Unauthorized(_) => (
                Level::Warning,
                "You are not allowed to do that. Please log in with an account that has access.".to_string(),
            ),
            ApiError::Network(_) | ApiError::Server { .. } | ApiError::Decode(_) => {
                (Level::Error, GENERIC_FAILURE.to_string())
            }
        };
        Self { level, message }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = match self.level {
            Level::Success => "✅",
            Level::Warning => "⚠️",
            Level::Error => "❌",
        };
        write!(f, "{} {}", icon, self.message)
    }
}
