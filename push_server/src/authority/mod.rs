//! Client for the remote session authority, spoken to by request/reply over the message broker.
mod client;
mod correlation;
mod errors;
mod kafka;
mod transport;

pub use client::AuthorityClient;
pub use correlation::{CorrelationIds, PendingGuard, PendingReplies};
pub use errors::AuthorityError;
pub use kafka::KafkaTransport;
pub use transport::{reply_topic, InboundReply, OutboundRequest, RequestTransport, TransportEvent};
