//! Service error types with HTTP status code mapping.
//!
//! [`PollError`] is the central error type. Each variant maps to a specific
//! HTTP status code and a structured JSON error response. Validation,
//! not-found, forbidden, and business-rule errors are reported verbatim;
//! internal failures are logged and replaced with a generic message.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::validation::ValidationErrors;

/// Message returned in place of any internal failure detail.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "validation failed",
///     "details": [{ "field": "title", "message": "Title is required" }]
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see the code ranges on [`PollError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Field-level validation errors, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                      |
/// |-----------|-----------------|----------------------------------|
/// | 1000–1999 | Request         | 400 Bad Request / 401            |
/// | 2000–2999 | Access          | 404 Not Found / 403 Forbidden    |
/// | 3000–3999 | Server          | 500 Internal Server Error        |
/// | 4000–4999 | Business rule   | 400 Bad Request / 409 Conflict   |
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// Payload failed schema validation.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Request could not be parsed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The operation requires an identified user.
    #[error("authentication required")]
    Unauthorized,

    /// Poll with the given ID was not found (or is not visible).
    #[error("poll not found: {0}")]
    PollNotFound(uuid::Uuid),

    /// The actor is not the poll's creator.
    #[error("only the poll creator may modify this poll")]
    Forbidden,

    /// The poll's expiry instant has passed.
    #[error("poll has expired: {0}")]
    PollExpired(uuid::Uuid),

    /// The option does not belong to the poll.
    #[error("invalid option {option_id} for poll {poll_id}")]
    InvalidOption {
        /// Target poll.
        poll_id: uuid::Uuid,
        /// Rejected option.
        option_id: uuid::Uuid,
    },

    /// The voter already voted in a single-vote poll.
    #[error("you have already voted on this poll")]
    DuplicateVote,

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PollError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::InvalidRequest(_) => 1002,
            Self::Unauthorized => 1100,
            Self::PollNotFound(_) => 2001,
            Self::Forbidden => 2003,
            Self::PollExpired(_) => 4001,
            Self::InvalidOption { .. } => 4002,
            Self::DuplicateVote => 4003,
            Self::Persistence(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::InvalidRequest(_)
            | Self::PollExpired(_)
            | Self::InvalidOption { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::PollNotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateVote => StatusCode::CONFLICT,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` for unexpected faults whose detail must not reach
    /// the client.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Internal(_))
    }
}

impl From<ValidationErrors> for PollError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<JsonRejection> for PollError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for PollError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for PollError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<sqlx::Error> for PollError {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl IntoResponse for PollError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        let (message, details) = if self.is_internal() {
            tracing::error!(code, error = %self, "request failed");
            (INTERNAL_ERROR_MESSAGE.to_string(), None)
        } else {
            let details = match &self {
                Self::Validation(errors) => serde_json::to_value(errors).ok(),
                _ => None,
            };
            (self.to_string(), details)
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message,
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn business_rules_map_to_client_errors() {
        let id = uuid::Uuid::new_v4();
        assert_eq!(
            PollError::PollExpired(id).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PollError::InvalidOption {
                poll_id: id,
                option_id: id
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(PollError::DuplicateVote.status_code(), StatusCode::CONFLICT);
        assert_eq!(PollError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(PollError::PollNotFound(id).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(PollError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn internal_errors_are_flagged() {
        assert!(PollError::Internal("boom".to_string()).is_internal());
        assert!(PollError::Persistence("db down".to_string()).is_internal());
        assert!(!PollError::DuplicateVote.is_internal());
    }

    #[test]
    fn codes_fall_in_documented_ranges() {
        assert_eq!(PollError::Validation(ValidationErrors::new()).error_code(), 1001);
        assert_eq!(PollError::PollNotFound(uuid::Uuid::nil()).error_code(), 2001);
        assert_eq!(PollError::Internal(String::new()).error_code(), 3000);
        assert_eq!(PollError::DuplicateVote.error_code(), 4003);
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("failed to read body");
        };
        serde_json::from_slice(&bytes).unwrap_or_default()
    }

    #[tokio::test]
    async fn internal_response_hides_detail() {
        let response = PollError::Persistence("password=hunter2".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], 3001);
        assert_eq!(body["error"]["message"], INTERNAL_ERROR_MESSAGE);
        assert!(!body.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn validation_response_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.push("title", "Title is required");
        errors.push("options", "At least 2 options are required");
        let response = PollError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["details"][0]["field"], "title");
        assert_eq!(body["error"]["details"][1]["field"], "options");
    }
}
