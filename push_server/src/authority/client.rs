//! Request/reply calls over a publish/subscribe transport.
//!
//! [`AuthorityClient::request`] publishes a message tagged with a fresh correlation id and waits for the reply carrying
//! the same id. A single dispatcher task reads the transport's event channel and completes the matching waiter, so
//! replies may arrive in any order.
use std::time::Duration;

use log::*;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::authority::{
    correlation::{CorrelationIds, PendingReplies},
    transport::{reply_topic, OutboundRequest, RequestTransport, TransportEvent},
    AuthorityError,
};

pub struct AuthorityClient<T> {
    transport: T,
    pending: PendingReplies,
    ids: CorrelationIds,
    timeout: Duration,
}

impl<T: RequestTransport> AuthorityClient<T> {
    /// Wraps a connected transport. `events` is the stream of replies (and failures) produced by that transport.
    ///
    /// Must be called from within a tokio runtime, since it spawns the reply dispatcher.
    pub fn new(transport: T, events: UnboundedReceiver<TransportEvent>, timeout: Duration) -> Self {
        let pending = PendingReplies::default();
        tokio::spawn(dispatch_replies(events, pending.clone()));
        Self { transport, pending, ids: CorrelationIds::default(), timeout }
    }

    /// Publishes `payload` on `topic` and waits for the correlated reply.
    ///
    /// An empty or `null` reply yields `Ok(None)`.
    pub async fn request<Req, Rep>(&self, topic: &str, payload: &Req) -> Result<Option<Rep>, AuthorityError>
    where
        Req: Serialize,
        Rep: DeserializeOwned,
    {
        let payload = serde_json::to_vec(payload).map_err(|e| AuthorityError::Serialization(e.to_string()))?;
        let correlation_id = self.ids.next_id();
        let (_guard, reply) = self.pending.register(&correlation_id)?;
        let request = OutboundRequest {
            topic: topic.to_string(),
            reply_topic: reply_topic(topic),
            correlation_id: correlation_id.clone(),
            payload,
        };
        trace!("🔐️ Publishing request {correlation_id} on {topic}");
        // The deadline covers the publish as well, since a producer can wait on broker acks for much longer
        let exchange = async {
            self.transport.publish(request).await?;
            reply.await.map_err(|_| AuthorityError::Unavailable("The reply dispatcher has stopped".into()))?
        };
        let reply = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                debug!("🔐️ Request {correlation_id} on {topic} timed out");
                return Err(AuthorityError::Timeout(self.timeout));
            },
        };
        trace!("🔐️ Received reply for request {correlation_id}");
        if let Some(err) = reply.error {
            return Err(AuthorityError::Remote(err));
        }
        match reply.payload {
            Some(bytes) if !bytes.is_empty() => {
                serde_json::from_slice(&bytes).map_err(|e| AuthorityError::Serialization(e.to_string()))
            },
            _ => Ok(None),
        }
    }

    /// The number of requests still waiting for a reply.
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }
}

async fn dispatch_replies(mut events: UnboundedReceiver<TransportEvent>, pending: PendingReplies) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Reply(reply) => {
                pending.resolve(reply);
            },
            TransportEvent::Disconnected(reason) => {
                warn!("🔐️ Lost the connection to the authority. {reason}");
                pending.fail_all(AuthorityError::Unavailable(reason));
            },
        }
    }
    info!("🔐️ Authority reply stream has closed");
    pending.close("The reply stream has closed");
}
