use std::collections::BTreeMap;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Field name to the list of messages attached to it, as shown next to a form.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),
    #[error("post not found: {0}")]
    PostNotFound(Uuid),
    #[error("group not found: {0}")]
    GroupNotFound(String),
    #[error("group already exists: {0}")]
    GroupAlreadyExists(String),
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid_field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.to_string()]);
        DomainError::Validation(errors)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::UserNotFound(_)
            | DomainError::PostNotFound(_)
            | DomainError::GroupNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::UserAlreadyExists(_) | DomainError::GroupAlreadyExists(_) => {
                StatusCode::CONFLICT
            }
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        let details = match self {
            DomainError::PostNotFound(resource) => Some(json!({ "resource": resource })),
            DomainError::UserNotFound(resource) | DomainError::GroupNotFound(resource) => {
                Some(json!({ "resource": resource }))
            }
            DomainError::Validation(errors) => Some(json!({ "fields": errors })),
            // store failures stay opaque to the caller
            DomainError::Internal(_) => {
                let body = ErrorBody {
                    error: "internal error",
                    details: None,
                };
                return HttpResponse::build(self.status_code()).json(body);
            }
            _ => None,
        };
        let body = ErrorBody {
            error: message.as_str(),
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_map_to_404() {
        assert_eq!(
            DomainError::GroupNotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DomainError::UserNotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DomainError::PostNotFound(Uuid::new_v4()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn invalid_field_carries_message() {
        match DomainError::invalid_field("text", "required") {
            DomainError::Validation(errors) => {
                assert_eq!(errors["text"], vec!["required".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
