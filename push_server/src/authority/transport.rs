use futures::future::BoxFuture;

use crate::authority::AuthorityError;

/// A request ready to be published. The payload is already serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub topic: String,
    pub reply_topic: String,
    pub correlation_id: String,
    pub payload: Vec<u8>,
}

/// A message received on a reply topic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundReply {
    pub correlation_id: String,
    pub payload: Option<Vec<u8>>,
    /// Set when the remote side failed to handle the request.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Reply(InboundReply),
    /// The connection to the broker was lost. Requests in flight cannot be answered.
    Disconnected(String),
}

/// The publishing half of a request/reply transport.
///
/// The receiving half is a channel of [`TransportEvent`]s handed to
/// [`AuthorityClient::new`](crate::authority::AuthorityClient::new) together with the transport.
pub trait RequestTransport: Send + Sync + 'static {
    fn publish(&self, request: OutboundRequest) -> BoxFuture<'_, Result<(), AuthorityError>>;
}

/// Replies to requests published on `topic` arrive on this topic.
pub fn reply_topic(topic: &str) -> String {
    format!("{topic}.reply")
}
