//! # Notification store contracts
//!
//! Backends that persist notifications implement [`NotificationManagement`]. The service layer
//! ([`crate::NotificationApi`]) only ever talks to a backend through this trait, so a mock can stand in for the
//! database in tests.
mod notification_management;
mod query;

pub use notification_management::{NotificationManagement, NotificationStoreError};
pub use query::NotificationQueryFilter;
