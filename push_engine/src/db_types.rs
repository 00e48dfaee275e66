//! Data types that are persisted in, or passed into, the notification store.
//!
//! The JSON representation uses camelCase field names, since that is what producers on the message broker and the
//! mobile clients expect.
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// Store-assigned notification identifier.
pub type NotificationId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_uid: String,
    pub title: String,
    pub message: String,
    pub device_token: String,
    pub is_view: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: &'static str,
}

impl ValidationError {
    fn empty(field: &'static str) -> Self {
        Self { field, reason: "must not be empty" }
    }
}

/// A notification that has not been saved yet.
///
/// Every field is required and must be non-empty. Unknown fields in the payload are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub device_token: String,
    pub user_uid: String,
}

impl NewNotification {
    pub fn new<S: Display>(user_uid: S, title: S, message: S, device_token: S) -> Self {
        Self {
            user_uid: user_uid.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            device_token: device_token.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        non_empty("title", &self.title)?;
        non_empty("message", &self.message)?;
        non_empty("deviceToken", &self.device_token)?;
        non_empty("userUid", &self.user_uid)?;
        Ok(())
    }
}

/// A partial update to an existing notification. Only the supplied fields are changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_view: Option<bool>,
}

impl NotificationUpdate {
    pub fn mark_viewed() -> Self {
        Self { is_view: Some(true), ..Default::default() }
    }

    pub fn with_title<S: Display>(mut self, title: S) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_message<S: Display>(mut self, message: S) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() &&
            self.message.is_none() &&
            self.device_token.is_none() &&
            self.user_uid.is_none() &&
            self.is_view.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(v) = &self.title {
            non_empty("title", v)?;
        }
        if let Some(v) = &self.message {
            non_empty("message", v)?;
        }
        if let Some(v) = &self.device_token {
            non_empty("deviceToken", v)?;
        }
        if let Some(v) = &self.user_uid {
            non_empty("userUid", v)?;
        }
        Ok(())
    }
}

fn non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::empty(field))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
