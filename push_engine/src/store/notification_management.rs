use thiserror::Error;

use crate::{
    db_types::{NewNotification, Notification, NotificationId, NotificationUpdate},
    store::NotificationQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum NotificationStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Notification {0} does not exist")]
    NotificationNotFound(NotificationId),
}

impl From<sqlx::Error> for NotificationStoreError {
    fn from(e: sqlx::Error) -> Self {
        NotificationStoreError::DatabaseError(e.to_string())
    }
}

/// Persistence contract for notification records.
///
/// Identifiers are assigned by the backend and are unique. No multi-record transactional guarantees are required.
#[allow(async_fn_in_trait)]
pub trait NotificationManagement {
    /// Fetch the notifications matching `filter`, oldest first.
    async fn fetch_notifications(
        &self,
        filter: NotificationQueryFilter,
    ) -> Result<Vec<Notification>, NotificationStoreError>;

    /// Fetch a single notification. Returns `None` if the id is unknown.
    async fn fetch_notification(&self, id: NotificationId) -> Result<Option<Notification>, NotificationStoreError>;

    /// Save a new notification, returning the stored record.
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, NotificationStoreError>;

    /// Apply a partial update. Fails with [`NotificationStoreError::NotificationNotFound`] if the id is unknown.
    async fn update_notification(
        &self,
        id: NotificationId,
        update: NotificationUpdate,
    ) -> Result<Notification, NotificationStoreError>;

    /// Delete a notification. Fails with [`NotificationStoreError::NotificationNotFound`] if the id is unknown.
    async fn delete_notification(&self, id: NotificationId) -> Result<(), NotificationStoreError>;
}
