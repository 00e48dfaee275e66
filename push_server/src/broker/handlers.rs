//! Message handlers for the `push.*` topics.
//!
//! Each topic is declared once in [`TOPIC_HANDLERS`], together with the handler's name and the roles it requires.
//! [`MessageRouter::dispatch`] looks the topic up, runs the call through the session gate as an internal call, and
//! hands the payload to the notification API.
use std::fmt::Debug;

use log::*;
use push_engine::{
    db_types::{NewNotification, NotificationId},
    NotificationApi,
    NotificationApiError,
    NotificationManagement,
    PushDelivery,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::gate::{GateError, IncomingCall, RequiredRoles, SessionGate, ROLE_ALL};

pub const CREATE_TOPIC: &str = "push.create";
pub const VIEW_TOPIC: &str = "push.view";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerAction {
    CreateNotification,
    MarkViewed,
}

#[derive(Debug, Clone, Copy)]
pub struct TopicHandler {
    pub topic: &'static str,
    pub handler: &'static str,
    pub required_roles: RequiredRoles,
    pub action: BrokerAction,
}

pub static TOPIC_HANDLERS: [TopicHandler; 2] = [
    TopicHandler {
        topic: CREATE_TOPIC,
        handler: "kafka_create_notification",
        required_roles: RequiredRoles::new(&[ROLE_ALL]),
        action: BrokerAction::CreateNotification,
    },
    TopicHandler {
        topic: VIEW_TOPIC,
        handler: "kafka_mark_viewed",
        required_roles: RequiredRoles::new(&[ROLE_ALL]),
        action: BrokerAction::MarkViewed,
    },
];

/// The topics that have a handler.
pub fn topics() -> Vec<&'static str> {
    TOPIC_HANDLERS.iter().map(|h| h.topic).collect()
}

pub fn topic_handler(topic: &str) -> Option<&'static TopicHandler> {
    TOPIC_HANDLERS.iter().find(|h| h.topic == topic)
}

/// The payload of a `push.view` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewPayload {
    pub id: NotificationId,
}

#[derive(Debug, Clone, Error)]
pub enum BrokerHandlerError {
    #[error("No handler is registered for topic {0}")]
    UnknownTopic(String),
    #[error("Could not deserialize the message payload. {0}")]
    InvalidPayload(String),
    #[error("The call was refused. {0}")]
    Refused(#[from] GateError),
    #[error("{0}")]
    ApiError(#[from] NotificationApiError),
}

impl BrokerHandlerError {
    /// Only backend failures are worth another attempt. Bad payloads and missing records fail the same way every time.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::ApiError(NotificationApiError::DatabaseError(_)))
    }
}

pub struct MessageRouter<B, P> {
    api: NotificationApi<B, P>,
    gate: SessionGate,
}

impl<B: Debug, P: Debug> Debug for MessageRouter<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MessageRouter ({:?}, {:?})", self.api, self.gate)
    }
}

impl<B, P> MessageRouter<B, P>
where
    B: NotificationManagement,
    P: PushDelivery,
{
    pub fn new(api: NotificationApi<B, P>, gate: SessionGate) -> Self {
        Self { api, gate }
    }

    /// Handles one message and returns the value to reply with.
    pub async fn dispatch(&self, topic: &str, payload: &[u8]) -> Result<Value, BrokerHandlerError> {
        let entry = topic_handler(topic).ok_or_else(|| BrokerHandlerError::UnknownTopic(topic.to_string()))?;
        let call = IncomingCall::internal(entry.handler, entry.required_roles);
        self.gate.authorize(&call).await?;
        match entry.action {
            BrokerAction::CreateNotification => {
                let notification: NewNotification = parse(payload)?;
                let record = self.api.create_notification(notification).await?;
                to_value(&record)
            },
            BrokerAction::MarkViewed => {
                let ViewPayload { id } = parse(payload)?;
                let result = self.api.mark_viewed(id).await?;
                to_value(&result)
            },
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(payload: &[u8]) -> Result<T, BrokerHandlerError> {
    serde_json::from_slice(payload).map_err(|e| {
        warn!("📨️ Could not deserialize message payload. {e}");
        BrokerHandlerError::InvalidPayload(e.to_string())
    })
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, BrokerHandlerError> {
    serde_json::to_value(value).map_err(|e| BrokerHandlerError::InvalidPayload(e.to_string()))
}
