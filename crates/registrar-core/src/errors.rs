//! Application error type.
//!
//! Every handler returns `Result<_, AppError>`. The error renders as
//! `{"error": "...", "details": "..."}` with the carried status code.
//! Server errors never expose their cause: the cause is logged and the body
//! carries a generic message.

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Generic message returned for every 5xx response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
    pub details: Option<String>,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
            details: None,
        }
    }

    /// Attach a human-readable detail string to the response body.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::CONFLICT, err)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, anyhow::anyhow!(message.into()))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, anyhow::anyhow!(message.into()))
    }

    /// Validation failures from `validator`, reported as 400 with per-field details.
    pub fn validation(errors: ValidationErrors) -> Self {
        Self::bad_request(anyhow::anyhow!("Validation failed"))
            .with_details(format_validation_errors(&errors))
    }

    /// Classify a database error.
    ///
    /// Unique violations become 409 with `conflict_message`, foreign key
    /// violations become 409 with a generic message, everything else is 500.
    pub fn database(err: sqlx::Error, conflict_message: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::conflict(anyhow::anyhow!(conflict_message.to_string()));
            }
            if db_err.is_foreign_key_violation() {
                return Self::conflict(anyhow::anyhow!(
                    "Operation violates a reference to another record"
                ))
                .with_details(db_err.message().to_string());
            }
            if db_err.is_check_violation() {
                return Self::bad_request(anyhow::anyhow!("Value out of allowed range"))
                    .with_details(db_err.message().to_string());
            }
        }
        Self::internal(err)
    }

    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }
}

/// Flatten `validator` errors into `field: message` pairs.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(msg) => format!("{}: {}", field, msg),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    parts.sort();
    parts.join(", ")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = if self.is_server_error() {
            tracing::error!(status = %self.status.as_u16(), error = ?self.error, "Request failed");
            ErrorResponse {
                error: INTERNAL_ERROR_MESSAGE.to_string(),
                details: None,
            }
        } else {
            ErrorResponse {
                error: self.error.to_string(),
                details: self.details,
            }
        };

        (self.status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}
