//! Push Notification Engine
//!
//! This library holds the core of the push notification service. It is transport-agnostic: neither HTTP nor the
//! message broker appear here.
//!
//! The library is divided into three sections:
//! 1. Storage ([`mod@store`] and [`mod@sqlite`]). The [`NotificationManagement`] trait is the persistence contract;
//!    [`SqliteDatabase`] is the production backend.
//! 2. Push delivery ([`mod@push`]). The [`PushDelivery`] trait abstracts the third-party provider; [`FcmClient`] talks
//!    to Firebase Cloud Messaging.
//! 3. The public API ([`NotificationApi`]), which combines the two and is what the entry points call.
mod api;

pub mod db_types;
pub mod push;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod store;

pub use api::{
    errors::NotificationApiError,
    notification_api::{NotificationApi, DEFAULT_PUSH_TIMEOUT, MAX_LISTED_NOTIFICATIONS},
};
pub use push::{DeliveryReceipt, FcmClient, PushDelivery, PushDeliveryError, PushMessage};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use store::{NotificationManagement, NotificationQueryFilter, NotificationStoreError};
