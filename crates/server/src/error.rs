//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::platform::PlatformError;
use crate::services::{FileError, IdentityError};

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Storage platform operation failed.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Identity operation failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// File operation failed.
    #[error("File error: {0}")]
    File(#[from] FileError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error indicates a failure on our side or the
    /// platform's, as opposed to a rejected client request.
    fn is_server_class(&self) -> bool {
        match self {
            Self::Platform(_) | Self::Internal(_) => true,
            Self::Identity(IdentityError::OtpNotSent) => true,
            Self::Identity(IdentityError::Platform(e))
            | Self::File(FileError::Platform(e)) => !e.is_client_error(),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_class() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Platform(_) | Self::Identity(IdentityError::OtpNotSent) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Identity(IdentityError::Platform(e)) => {
                if e.is_client_error() {
                    StatusCode::UNAUTHORIZED
                } else {
                    StatusCode::BAD_GATEWAY
                }
            }
            Self::File(err) => match err {
                FileError::NotFound => StatusCode::NOT_FOUND,
                FileError::Forbidden => StatusCode::FORBIDDEN,
                FileError::InvalidShareEmail(_) => StatusCode::BAD_REQUEST,
                FileError::Platform(_) => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Platform(_) | Self::File(FileError::Platform(_)) => {
                "External service error".to_string()
            }
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Identity(err) => match err {
                IdentityError::OtpNotSent => "Failed to send OTP".to_string(),
                IdentityError::Platform(e) if e.is_client_error() => {
                    "Unable to verify one-time passcode".to_string()
                }
                IdentityError::Platform(_) => "External service error".to_string(),
            },
            Self::File(FileError::InvalidShareEmail(email)) => {
                format!("Invalid share email: {email}")
            }
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an account id.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(account_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(account_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user
/// actions leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("file-123".to_string());
        assert_eq!(err.to_string(), "Not found: file-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Identity(IdentityError::OtpNotSent)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::File(FileError::Forbidden)),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_rejected_verification_maps_to_unauthorized() {
        let err = AppError::Identity(IdentityError::Platform(PlatformError::Api {
            status: 401,
            message: "invalid token".to_string(),
        }));
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
