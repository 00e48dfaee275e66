//! SQLite backend for the notification store.
//!
//! [`SqliteDatabase`] implements [`crate::NotificationManagement`] on top of a `sqlx` connection pool. The low-level
//! queries live in [`db`].
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
