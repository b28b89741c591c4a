use axum::{http::StatusCode, response::IntoResponse, response::Response};
use thiserror::Error;

/// Errors surfaced by issuance and validation flows.
///
/// Collaborator (store, transport) failures are carried through unchanged
/// as [`ActivatorError::Common`] with the status code the collaborator
/// reported. Nothing is retried internally.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActivatorError {
    /// Operation invoked before `Activator::init` completed.
    #[error("Activator Uninitialized")]
    Uninitialized,

    #[error("{0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Not Found")]
    NotFound,

    /// Generic carried error, defaults to a 500-class response.
    #[error("{message}")]
    Common { code: u16, message: String },
}

impl ActivatorError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn common(code: u16, message: impl Into<String>) -> Self {
        Self::Common {
            code,
            message: message.into(),
        }
    }

    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Uninitialized => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Common { code, .. } => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl IntoResponse for ActivatorError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
