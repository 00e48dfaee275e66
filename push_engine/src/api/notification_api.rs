//! Unifies API for managing notifications.
//!
//! [`NotificationApi`] is the only entry point that the HTTP routes and the broker handlers use. It validates input,
//! delegates storage to a [`NotificationManagement`] backend, and hands freshly created notifications to a
//! [`PushDelivery`] provider.
use std::{fmt::Debug, time::Duration};

use log::*;

use crate::{
    api::errors::NotificationApiError,
    db_types::{NewNotification, Notification, NotificationId, NotificationUpdate, SuccessResponse},
    push::{PushDelivery, PushMessage},
    store::{NotificationManagement, NotificationQueryFilter},
};

/// Listing every notification is capped at this many records.
pub const MAX_LISTED_NOTIFICATIONS: u32 = 100;
/// Creating a notification waits at most this long for the push provider.
pub const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct NotificationApi<B, P> {
    db: B,
    push: P,
    push_timeout: Duration,
}

impl<B: Debug, P: Debug> Debug for NotificationApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationApi ({:?}, {:?})", self.db, self.push)
    }
}

impl<B: Clone, P: Clone> Clone for NotificationApi<B, P> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), push: self.push.clone(), push_timeout: self.push_timeout }
    }
}

impl<B, P> NotificationApi<B, P>
where
    B: NotificationManagement,
    P: PushDelivery,
{
    pub fn new(db: B, push: P) -> Self {
        Self { db, push, push_timeout: DEFAULT_PUSH_TIMEOUT }
    }

    pub fn with_push_timeout(mut self, timeout: Duration) -> Self {
        self.push_timeout = timeout;
        self
    }

    /// Fetches the first [`MAX_LISTED_NOTIFICATIONS`] notifications.
    pub async fn all_notifications(&self) -> Result<Vec<Notification>, NotificationApiError> {
        debug!("🗃️ Fetching all notifications");
        let query = NotificationQueryFilter::default().with_limit(MAX_LISTED_NOTIFICATIONS);
        let result = self.db.fetch_notifications(query).await.map_err(|e| {
            error!("🗃️ Error fetching all notifications. {e}");
            NotificationApiError::from(e)
        })?;
        debug!("🗃️ Fetched {} notifications", result.len());
        Ok(result)
    }

    pub async fn notifications_for_user(&self, user_uid: &str) -> Result<Vec<Notification>, NotificationApiError> {
        debug!("🗃️ Fetching notifications for user {user_uid}");
        let query = NotificationQueryFilter::default().with_user_uid(user_uid);
        let result = self.db.fetch_notifications(query).await.map_err(|e| {
            error!("🗃️ Error fetching notifications for user {user_uid}. {e}");
            NotificationApiError::from(e)
        })?;
        debug!("🗃️ Fetched {} notifications for user {user_uid}", result.len());
        Ok(result)
    }

    pub async fn notification_by_id(&self, id: NotificationId) -> Result<Option<Notification>, NotificationApiError> {
        let result = self.db.fetch_notification(id).await?;
        match &result {
            Some(_) => debug!("🗃️ Fetched notification #{id}"),
            None => warn!("🗃️ Notification #{id} not found"),
        }
        Ok(result)
    }

    /// Saves the notification and then pushes it to the device.
    ///
    /// The push is best effort. A delivery failure, or a provider that does not answer within the push timeout, is
    /// logged and the saved record is still returned.
    pub async fn create_notification(&self, notification: NewNotification) -> Result<Notification, NotificationApiError> {
        notification.validate()?;
        info!("🗃️ Creating notification for user {}", notification.user_uid);
        let record = self.db.insert_notification(notification).await.map_err(|e| {
            error!("🗃️ Error creating notification. {e}");
            NotificationApiError::from(e)
        })?;
        info!("🗃️ Created notification #{} for user {}", record.id, record.user_uid);
        self.send_push(&record).await;
        Ok(record)
    }

    pub async fn update_notification(
        &self,
        id: NotificationId,
        update: NotificationUpdate,
    ) -> Result<Notification, NotificationApiError> {
        update.validate()?;
        debug!("🗃️ Updating notification #{id}");
        let record = self.db.update_notification(id, update).await.map_err(|e| {
            error!("🗃️ Error updating notification #{id}. {e}");
            NotificationApiError::from(e)
        })?;
        debug!("🗃️ Updated notification #{id}");
        Ok(record)
    }

    pub async fn delete_notification(&self, id: NotificationId) -> Result<SuccessResponse, NotificationApiError> {
        debug!("🗃️ Deleting notification #{id}");
        self.db.delete_notification(id).await.map_err(|e| {
            error!("🗃️ Error deleting notification #{id}. {e}");
            NotificationApiError::from(e)
        })?;
        info!("🗃️ Deleted notification #{id}");
        Ok(SuccessResponse::ok())
    }

    pub async fn mark_viewed(&self, id: NotificationId) -> Result<SuccessResponse, NotificationApiError> {
        debug!("🗃️ Marking notification #{id} as viewed");
        self.db.update_notification(id, NotificationUpdate::mark_viewed()).await.map_err(|e| {
            error!("🗃️ Error marking notification #{id} as viewed. {e}");
            NotificationApiError::from(e)
        })?;
        debug!("🗃️ Marked notification #{id} as viewed");
        Ok(SuccessResponse::ok())
    }

    async fn send_push(&self, notification: &Notification) {
        let message = PushMessage::new(&notification.title, &notification.message, &notification.device_token);
        debug!("📲️ Sending push notification #{} to device token {}", notification.id, notification.device_token);
        match tokio::time::timeout(self.push_timeout, self.push.send(&message)).await {
            Ok(Ok(receipt)) => info!("📲️ Push notification #{} sent: {}", notification.id, receipt.message_id),
            Ok(Err(e)) => error!("📲️ Error sending push notification #{}. {e}", notification.id),
            Err(_) => error!(
                "📲️ Gave up on push notification #{} after {} ms",
                notification.id,
                self.push_timeout.as_millis()
            ),
        }
    }
}
