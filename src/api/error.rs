use reqwest::StatusCode;
use serde_json::Value;
use std::collections::BTreeMap;

/// Failures surfaced by the directory backend
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("validation failed: {message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, String>,
    },

    #[error("still referenced: {0}")]
    ReferentialConstraint(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not authorized: {0}")]
    Unauthorized(String),

    #[error("server returned {status}: {message}")]
    Server { status: StatusCode, message: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// What kind of request produced a response; deletes get their own rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Read,
    Write,
    Delete,
}

impl ApiError {
    /// Map a non-success response onto the error taxonomy
    pub fn from_response(kind: RequestKind, status: StatusCode, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let message = parsed
            .as_ref()
            .and_then(response_message)
            .unwrap_or_else(|| fallback_message(status, body));

        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation {
                fields: parsed.as_ref().map(field_errors).unwrap_or_default(),
                message,
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::CONFLICT if kind == RequestKind::Delete => {
                ApiError::ReferentialConstraint(message)
            }
            s if s.is_server_error() && kind == RequestKind::Delete => {
                ApiError::ReferentialConstraint(message)
            }
            _ => ApiError::Server { status, message },
        }
    }

    /// Validation failure raised before anything is sent
    pub fn invalid(fields: BTreeMap<String, String>) -> Self {
        ApiError::Validation {
            message: "the form has invalid fields".to_string(),
            fields,
        }
    }
}

fn response_message(body: &Value) -> Option<String> {
    ["message", "error", "msg"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() || body.len() > 200 {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

/// Field errors come either as `{"name": "required"}` or as
/// `[{"field": "name", "message": "required"}]`.
fn field_errors(body: &Value) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    match body.get("errors") {
        Some(Value::Object(map)) => {
            for (field, detail) in map {
                fields.insert(field.clone(), detail_text(detail));
            }
        }
        Some(Value::Array(items)) => {
            for item in items {
                let field = ["field", "path", "param"]
                    .iter()
                    .find_map(|key| item.get(*key).and_then(Value::as_str));
                if let Some(field) = field {
                    fields.insert(field.to_string(), detail_text(item));
                }
            }
        }
        _ => {}
    }
    fields
}

fn detail_text(detail: &Value) -> String {
    match detail {
        Value::String(s) => s.clone(),
        other => ["message", "msg"]
            .iter()
            .find_map(|key| other.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_with_references_is_distinct_from_not_found() {
        let blocked = ApiError::from_response(
            RequestKind::Delete,
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"message": "Category has 3 listings"}"#,
        );
        let missing = ApiError::from_response(RequestKind::Delete, StatusCode::NOT_FOUND, "");

        assert!(matches!(blocked, ApiError::ReferentialConstraint(ref m) if m == "Category has 3 listings"));
        assert!(matches!(missing, ApiError::NotFound(ref m) if m == "Not Found"));
    }

    #[test]
    fn test_server_error_outside_delete_is_generic() {
        let err = ApiError::from_response(RequestKind::Read, StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(err, ApiError::Server { status, ref message }
            if status == StatusCode::BAD_GATEWAY && message == "upstream down"));
    }

    #[test]
    fn test_validation_errors_as_object() {
        let body = r#"{"message": "Validation failed", "errors": {"name": "Name is required", "price": {"message": "Must be positive"}}}"#;
        let err = ApiError::from_response(RequestKind::Write, StatusCode::BAD_REQUEST, body);

        let ApiError::Validation { message, fields } = err else {
            panic!("expected validation error");
        };
        assert_eq!(message, "Validation failed");
        assert_eq!(fields["name"], "Name is required");
        assert_eq!(fields["price"], "Must be positive");
    }

    #[test]
    fn test_validation_errors_as_array() {
        let body = r#"{"errors": [{"path": "email", "msg": "Invalid email"}, {"param": "slug", "message": "Taken"}]}"#;
        let err = ApiError::from_response(RequestKind::Write, StatusCode::UNPROCESSABLE_ENTITY, body);

        let ApiError::Validation { fields, .. } = err else {
            panic!("expected validation error");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["email"], "Invalid email");
        assert_eq!(fields["slug"], "Taken");
    }

    #[test]
    fn test_unauthorized_statuses() {
        let err = ApiError::from_response(RequestKind::Read, StatusCode::FORBIDDEN, r#"{"error": "Admins only"}"#);
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Admins only"));
    }
}
