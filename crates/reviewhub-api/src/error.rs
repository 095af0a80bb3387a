//! API error type

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum ApiError {
    /// 400 with the field-keyed error map as the body
    #[error("validation failed")]
    Validation(ValidationErrors),

    /// 401 with an [`ErrorResponse`] body
    #[error("{message}")]
    Unauthorized { message: String, code: &'static str },

    /// 400 outside the validation flow (e.g. undeterminable client address)
    #[error("{message}")]
    BadRequest { message: String, code: &'static str },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            Self::Unauthorized { message, code } => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: message,
                    code: Some(code.to_string()),
                }),
            )
                .into_response(),
            Self::BadRequest { message, code } => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: message,
                    code: Some(code.to_string()),
                }),
            )
                .into_response(),
            Self::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: format!("Database error: {}", e),
                        code: None,
                    }),
                )
                    .into_response()
            }
            Self::Internal(message) => {
                error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: message,
                        code: None,
                    }),
                )
                    .into_response()
            }
        }
    }
}
