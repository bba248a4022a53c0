// HTTP API error types mapped to the response envelope.
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use thiserror::Error;

/// API error taxonomy. Every handler failure is converted to one of these
/// before it reaches the wire, so no internal error ever leaks to a client.
///
/// `reason` carries a machine-readable cause (e.g. `LOCATION_LIMIT`,
/// `ALREADY_REGISTERED`) in `error.details.reason` when a client needs to
/// distinguish more than the top-level code.
#[derive(Debug, Error)]
pub enum ApiError {
    // 400 Bad Request
    #[error("{message}")]
    Validation {
        message: String,
        reason: Option<&'static str>,
    },

    // 401 Unauthorized
    #[error("{message}")]
    Authentication {
        message: String,
        reason: Option<&'static str>,
    },

    // 403 Forbidden (plan quota denials)
    #[error("{message}")]
    Forbidden {
        message: String,
        reason: Option<&'static str>,
    },

    // 404 Not Found (also covers foreign-tenant rows, deliberately)
    #[error("{0}")]
    NotFound(String),

    // 500 Internal Server Error
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation { message: message.into(), reason: None }
    }

    pub fn validation_reason(message: impl Into<String>, reason: &'static str) -> Self {
        ApiError::Validation { message: message.into(), reason: Some(reason) }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        ApiError::Authentication { message: message.into(), reason: None }
    }

    pub fn authentication_reason(message: impl Into<String>, reason: &'static str) -> Self {
        ApiError::Authentication { message: message.into(), reason: Some(reason) }
    }

    pub fn forbidden_reason(message: impl Into<String>, reason: &'static str) -> Self {
        ApiError::Forbidden { message: message.into(), reason: Some(reason) }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Authentication { .. } => "AUTHENTICATION_ERROR",
            ApiError::Forbidden { .. } => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn reason(&self) -> Option<&'static str> {
        match self {
            ApiError::Validation { reason, .. }
            | ApiError::Authentication { reason, .. }
            | ApiError::Forbidden { reason, .. } => *reason,
            _ => None,
        }
    }

    /// Build the `{success: false, error: {...}}` envelope body.
    pub fn to_json(&self) -> Value {
        let mut error = json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        if let Some(reason) = self.reason() {
            error["details"] = json!({ "reason": reason });
        }
        json!({ "success": false, "error": error })
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        // Log the real error but return a generic message to the client.
        tracing::error!("database error: {}", err);
        ApiError::internal("An error occurred while processing your request")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
