//! Unified error handling for the API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;

/// Application-level error type for request handlers.
///
/// Every handler failure is translated to the nearest taxonomy entry before
/// it reaches the client. Ownership failures deliberately map to 401 rather
/// than 403: that is the contract this API has always exposed.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// Login failed (missing fields, unknown email, or wrong password).
    #[error("Invalid credentials")]
    BadCredentials,

    /// A uniqueness constraint would be violated (duplicate email).
    #[error("{0}")]
    Conflict(String),

    /// Missing, invalid, or expired token.
    #[error("Not authorized")]
    Unauthorized,

    /// Authenticated, but not the owner of the resource.
    #[error("Not authorized to modify this resource")]
    Forbidden,

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("Resource".to_owned()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::Database(e) => Self::Database(e),
            RepositoryError::DataCorruption(msg) => Self::Internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Validation(_) | Self::BadCredentials | Self::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            // This API reports ownership failures as 401, not 403.
            Self::Unauthorized | Self::Forbidden => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Server error".to_owned(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn errors_map_to_expected_status_codes() {
        assert_eq!(
            get_status(AppError::Validation("No order items".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(AppError::BadCredentials), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(AppError::Conflict("Email already in use".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            get_status(AppError::NotFound("Product".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn ownership_failures_report_unauthorized() {
        // Historical contract: non-owner mutations get 401, not 403.
        assert_eq!(get_status(AppError::Forbidden), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let err = AppError::Internal("connection pool exhausted".to_owned());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // Body carries only the generic message; the detail stays in the logs.
    }

    #[test]
    fn repository_errors_translate_through_the_taxonomy() {
        assert!(matches!(
            AppError::from(RepositoryError::NotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(RepositoryError::Conflict("email already exists".to_owned())),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(RepositoryError::DataCorruption("bad email".to_owned())),
            AppError::Internal(_)
        ));
    }
}
