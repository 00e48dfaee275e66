//! # Push delivery
//!
//! The [`PushDelivery`] trait is the contract for handing a notification to a third-party push provider. Delivery is
//! best effort: callers log failures, they never fail the request that created the notification.
//!
//! [`FcmClient`] implements the trait against the Firebase Cloud Messaging HTTP v1 API.
mod fcm;

use std::fmt::Display;

pub use fcm::{FcmClient, ServiceAccountKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PushDeliveryError {
    #[error("Push delivery is not configured")]
    NotConfigured,
    #[error("Could not load the push provider credentials. {0}")]
    InvalidCredentials(String),
    #[error("Could not obtain an access token from the push provider. {0}")]
    TokenError(String),
    #[error("The push provider rejected the message. Status {status}. {message}")]
    Rejected { status: u16, message: String },
    #[error("Could not reach the push provider. {0}")]
    Transport(String),
}

/// A single message addressed to one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub device_token: String,
}

impl PushMessage {
    pub fn new<S: Display>(title: S, body: S, device_token: S) -> Self {
        Self { title: title.to_string(), body: body.to_string(), device_token: device_token.to_string() }
    }
}

/// The provider's acknowledgement of an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub message_id: String,
}

#[allow(async_fn_in_trait)]
pub trait PushDelivery {
    async fn send(&self, message: &PushMessage) -> Result<DeliveryReceipt, PushDeliveryError>;
}
