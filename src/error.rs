//! Error taxonomy shared by the services and the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Errors surfaced by the document, role and user services.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The requested entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The access policy denied the request.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed or conflicting input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The credential is missing, unknown or expired.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The persistent store could not be reached.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Short machine-readable kind used in response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Forbidden(_) => "forbidden",
            AppError::Validation(_) => "validation",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Unavailable(_) => "unavailable",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::not_found("record"),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::validation("a record with the same unique value already exists")
            }
            other => AppError::Unavailable(other.to_string()),
        }
    }
}

/// Error response body. Carries no entity attributes.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Unavailable(detail) => {
                tracing::error!(error = %detail, "store unavailable");
                "The service is temporarily unavailable".to_string()
            }
            AppError::NotFound(m)
            | AppError::Forbidden(m)
            | AppError::Validation(m)
            | AppError::Unauthorized(m) => m.clone(),
        };

        (
            self.status_code(),
            Json(ErrorBody {
                error: self.kind(),
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::unauthorized("x").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Unavailable("db down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_pool_closed_maps_to_unavailable() {
        let err: AppError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, AppError::Unavailable(_)));
    }
}
