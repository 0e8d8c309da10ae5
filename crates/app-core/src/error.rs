//! The application-wide error type and its HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use super::config::ConfigError;
use super::jwt::JwtError;
use super::password::HashingError;
use super::social::SocialError;
use super::uid::SnowflakeError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid request format: {0}")]
    RequestFormat(String),

    #[error(transparent)]
    Social(#[from] SocialError),

    #[error("User was registered via {registered} and cannot be logged via {attempted}")]
    ProviderMismatch { registered: String, attempted: String },

    #[error("Unable to register user {email}")]
    RegistrationFailed { email: String, reasons: Vec<String> },

    // Internal libraries
    #[error("JWT operation failed")]
    Jwt(#[from] JwtError),

    #[error("Config operation failed")]
    Config(#[from] ConfigError),

    #[error("Password hashing operation failed")]
    Hashing(#[from] HashingError),

    #[error("ID generation failed")]
    IdGeneration(#[from] SnowflakeError),

    // Third-party libraries
    #[error("Database operation failed")]
    Database(#[from] sea_orm::DbErr),

    #[error("An internal server error occurred")]
    Internal,
}

const INTERNAL_ERROR_MSG: &str = "An internal server error occurred";

/// The failure payload returned to callers: a headline message plus the
/// individual human-readable reasons, never raw internal detail.
#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasons: Option<Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, reasons) = match self {
            AppError::Validation(err) => {
                let reasons: Vec<String> = err
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| match &e.message {
                            Some(msg) => format!("{field} {msg}"),
                            None => format!("{field} is invalid"),
                        })
                    })
                    .collect();

                (StatusCode::BAD_REQUEST, "Validation failed".to_string(), Some(reasons))
            },
            AppError::RequestFormat(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Social(err) => match err {
                SocialError::UnsupportedProvider(_) | SocialError::InvalidToken(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string(), None)
                },
                SocialError::KeysUnavailable(source) => {
                    tracing::error!("provider signing keys unavailable: {source:?}");
                    (
                        StatusCode::BAD_GATEWAY,
                        "Provider signing keys are unavailable".to_string(),
                        None,
                    )
                },
            },
            AppError::ProviderMismatch { ref registered, ref attempted } => {
                let message =
                    format!("User was registered via {registered} and cannot be logged via {attempted}");
                (StatusCode::BAD_REQUEST, message, None)
            },
            AppError::RegistrationFailed { email, reasons } => {
                (StatusCode::BAD_REQUEST, format!("Unable to register user {email}"), Some(reasons))
            },
            AppError::Jwt(err) => {
                tracing::error!("JWT error: {err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MSG.to_string(), None)
            },
            AppError::Config(err) => {
                tracing::error!("Config error: {err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MSG.to_string(), None)
            },
            AppError::Hashing(err) => {
                tracing::error!("Password hashing error: {err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MSG.to_string(), None)
            },
            AppError::IdGeneration(err) => {
                tracing::error!("ID generation error: {err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MSG.to_string(), None)
            },
            AppError::Database(err) => {
                tracing::error!("Database error: {err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MSG.to_string(), None)
            },
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MSG.to_string(), None),
        };

        (status, Json(ErrorResponse { message, reasons })).into_response()
    }
}
