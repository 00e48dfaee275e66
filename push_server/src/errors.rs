use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use push_engine::NotificationApiError;
use thiserror::Error;

use crate::{authority::AuthorityError, gate::GateError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    /// The detail is logged when the error is created. Callers only ever see a generic message.
    #[error("An error occurred on the backend of the server.")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Could not reach the session authority. {0}")]
    AuthorityError(#[from] AuthorityError),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The session does not carry a {0}")]
    InvalidSession(&'static str),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSession(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::AuthorityError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<GateError> for ServerError {
    fn from(e: GateError) -> Self {
        match e {
            GateError::Unauthorized => Self::Unauthorized,
            GateError::Forbidden { .. } => Self::InsufficientPermissions(e.to_string()),
        }
    }
}

impl From<NotificationApiError> for ServerError {
    fn from(e: NotificationApiError) -> Self {
        match e {
            NotificationApiError::DatabaseError(e) => {
                error!("💻️ Database error. {e}");
                Self::BackendError(e)
            },
            NotificationApiError::NotificationNotFound(id) => {
                Self::NoRecordFound(format!("Notification #{id} does not exist"))
            },
            NotificationApiError::ValidationError(e) => Self::InvalidRequestBody(e.to_string()),
        }
    }
}
