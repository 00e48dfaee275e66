use thiserror::Error;

use crate::{
    db_types::{NotificationId, ValidationError},
    store::NotificationStoreError,
};

#[derive(Debug, Clone, Error)]
pub enum NotificationApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Notification {0} does not exist")]
    NotificationNotFound(NotificationId),
    #[error("Invalid notification. {0}")]
    ValidationError(#[from] ValidationError),
}

impl From<NotificationStoreError> for NotificationApiError {
    fn from(e: NotificationStoreError) -> Self {
        match e {
            NotificationStoreError::DatabaseError(s) => Self::DatabaseError(s),
            NotificationStoreError::NotificationNotFound(id) => Self::NotificationNotFound(id),
        }
    }
}
