//! Unified error handling with Sentry integration.
//!
//! JSON handlers return `Result<T, AppError>`; HTML handlers return
//! `Result<T, PageError>`, which renders the same messages in the error page.
//! Server-class errors are captured to Sentry before responding, and their
//! details never reach the client.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use lost_found_core::{OwnerNameError, PhoneError};

use crate::filters;
use crate::qr::QrError;
use crate::services::ServiceError;

/// Message for every database failure without a more specific message.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Service operation failed.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// QR rendering failed.
    #[error("QR error: {0}")]
    Qr(#[from] QrError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Service(err) => match err {
                ServiceError::InvalidName(_)
                | ServiceError::InvalidPhone(_)
                | ServiceError::InvalidCode(_) => StatusCode::BAD_REQUEST,
                ServiceError::NotFound => StatusCode::NOT_FOUND,
                ServiceError::CodeExhausted(_) | ServiceError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Qr(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error is our fault rather than the caller's.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }

    /// Message safe to show to the caller.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Service(err) => service_message(err).to_string(),
            Self::BadRequest(msg) => msg.clone(),
            Self::Qr(_) => INTERNAL_MESSAGE.to_string(),
        }
    }

    /// Log and capture server-class errors.
    fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }
    }
}

fn service_message(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::InvalidName(OwnerNameError::Empty)
        | ServiceError::InvalidPhone(PhoneError::Empty) => "Name and phone are required",
        ServiceError::InvalidName(OwnerNameError::TooLong { .. }) => {
            "Name must be at most 100 characters"
        }
        ServiceError::InvalidPhone(PhoneError::TooLong { .. }) => {
            "Phone must be at most 20 characters"
        }
        ServiceError::InvalidPhone(PhoneError::InvalidCharacter(_)) => "Invalid phone format",
        ServiceError::InvalidCode(_) => "Unique code is required",
        ServiceError::NotFound => "QR code not found",
        ServiceError::CodeExhausted(_) => "Failed to create user",
        ServiceError::Store(_) => INTERNAL_MESSAGE,
    }
}

/// Error body returned by the JSON API.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();
        let body = ErrorBody {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Error page shown by the HTML views.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
struct ErrorPage {
    title: &'static str,
    message: String,
}

/// Error rendered as an HTML page.
#[derive(Debug)]
pub struct PageError {
    status: StatusCode,
    message: String,
}

impl PageError {
    /// Page error with an explicit status and message.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// HTTP status of the page.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Message shown on the page.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<AppError> for PageError {
    fn from(err: AppError) -> Self {
        err.report();
        Self::new(err.status(), err.public_message())
    }
}

impl From<ServiceError> for PageError {
    fn from(err: ServiceError) -> Self {
        AppError::from(err).into()
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let title = if self.status.is_server_error() {
            "Something went wrong"
        } else {
            "Error"
        };
        let page = ErrorPage {
            title,
            message: self.message,
        };
        (self.status, page).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::RepositoryError;

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(ServiceError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ServiceError::InvalidPhone(PhoneError::InvalidCharacter('x')).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ServiceError::CodeExhausted(5).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(crate::qr::QrError::EmptyInput.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_qr_failure_is_hidden_server_error() {
        let err = AppError::from(crate::qr::QrError::EmptyInput);
        assert!(err.is_server_error());
        assert_eq!(err.public_message(), INTERNAL_MESSAGE);
    }

    #[test]
    fn test_public_messages() {
        let message = |err: ServiceError| AppError::from(err).public_message();

        assert_eq!(
            message(ServiceError::InvalidName(OwnerNameError::Empty)),
            "Name and phone are required"
        );
        assert_eq!(
            message(ServiceError::InvalidPhone(PhoneError::Empty)),
            "Name and phone are required"
        );
        assert_eq!(
            message(ServiceError::InvalidPhone(PhoneError::InvalidCharacter('a'))),
            "Invalid phone format"
        );
        assert_eq!(message(ServiceError::NotFound), "QR code not found");
    }

    #[test]
    fn test_store_details_are_hidden() {
        let err = AppError::from(ServiceError::Store(RepositoryError::DataCorruption(
            "row 42 has secret details".to_string(),
        )));
        assert_eq!(err.public_message(), INTERNAL_MESSAGE);
    }

    #[test]
    fn test_page_error_keeps_status_and_message() {
        let page = PageError::from(ServiceError::NotFound);
        assert_eq!(page.status(), StatusCode::NOT_FOUND);
        assert_eq!(page.message(), "QR code not found");
    }
}
