//! The Kafka consumer that serves the `push.*` topics.
//!
//! Messages are handled one at a time. A handler that fails with a retriable error is tried again with exponential
//! backoff, up to the configured number of retries, after which the message is logged and skipped. The offset is
//! committed once a message has been dealt with either way. Messages that carry a correlation id and a reply topic get
//! the handler's result (or error) published back.
use std::time::{Duration, Instant};

use log::*;
use push_engine::{NotificationManagement, PushDelivery};
use rdkafka::{
    consumer::{CommitMode, Consumer, StreamConsumer},
    message::BorrowedMessage,
    producer::{FutureProducer, FutureRecord},
    Message,
};
use serde_json::Value;

use crate::{
    broker::handlers::{topic_handler, topics, BrokerHandlerError, MessageRouter},
    config::{BrokerConfig, KafkaConfig},
    errors::ServerError,
    kafka::{
        consumer_config,
        headers::{find_header, reply_headers, CORRELATION_ID, REPLY_TOPIC},
        producer_config,
    },
};

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);
const RECV_ERROR_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32) -> Self {
        Self { retries, initial_backoff: Duration::from_millis(300), max_backoff: Duration::from_secs(30) }
    }

    /// The delay before retry number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

/// Dispatches a message, retrying retriable failures according to `policy`.
pub async fn handle_with_retries<B, P>(
    router: &MessageRouter<B, P>,
    topic: &str,
    payload: &[u8],
    policy: &RetryPolicy,
) -> Result<Value, BrokerHandlerError>
where
    B: NotificationManagement,
    P: PushDelivery,
{
    let mut attempt = 0;
    loop {
        match router.dispatch(topic, payload).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retriable() && attempt < policy.retries => {
                let delay = policy.backoff(attempt);
                attempt += 1;
                warn!(
                    "📨️ Message on {topic} failed. {e}. Retrying in {} ms ({attempt}/{})",
                    delay.as_millis(),
                    policy.retries
                );
                tokio::time::sleep(delay).await;
            },
            Err(e) => return Err(e),
        }
    }
}

pub struct BrokerConsumer<B, P> {
    consumer: StreamConsumer,
    producer: FutureProducer,
    router: MessageRouter<B, P>,
    policy: RetryPolicy,
}

impl<B, P> BrokerConsumer<B, P>
where
    B: NotificationManagement,
    P: PushDelivery,
{
    pub fn new(kafka: &KafkaConfig, broker: &BrokerConfig, router: MessageRouter<B, P>) -> Result<Self, ServerError> {
        let init_error = |e: rdkafka::error::KafkaError| ServerError::InitializeError(format!("Kafka: {e}"));
        let consumer: StreamConsumer =
            consumer_config(kafka, &broker.client_id, &broker.group_id).create().map_err(init_error)?;
        let producer: FutureProducer = producer_config(kafka, &broker.client_id).create().map_err(init_error)?;
        consumer.subscribe(&topics()).map_err(init_error)?;
        info!("📨️ Subscribed to {} in group {}", topics().join(", "), broker.group_id);
        Ok(Self { consumer, producer, router, policy: RetryPolicy::new(broker.retries) })
    }

    /// Consumes messages until the process stops.
    pub async fn run(self) {
        loop {
            match self.consumer.recv().await {
                Ok(msg) => self.process(&msg).await,
                Err(e) => {
                    error!("📨️ Error receiving a message. {e}");
                    tokio::time::sleep(RECV_ERROR_PAUSE).await;
                },
            }
        }
    }

    async fn process(&self, msg: &BorrowedMessage<'_>) {
        let topic = msg.topic();
        let handler = topic_handler(topic).map(|h| h.handler).unwrap_or("unknown");
        let payload = msg.payload().unwrap_or_default();
        info!("📨️ Incoming RPC {handler} on {topic} [{}:{}]", msg.partition(), msg.offset());
        let start = Instant::now();
        let result = handle_with_retries(&self.router, topic, payload, &self.policy).await;
        let elapsed = start.elapsed().as_millis();
        match &result {
            Ok(_) => info!("📨️ Outgoing RPC {handler} ({elapsed} ms)"),
            Err(e) => error!("📨️ RPC {handler} failed after {elapsed} ms. {e}. The message is skipped."),
        }
        let correlation_id = find_header(msg.headers(), CORRELATION_ID);
        let reply_topic = find_header(msg.headers(), REPLY_TOPIC);
        if let (Some(correlation_id), Some(reply_topic)) = (correlation_id, reply_topic) {
            self.reply(&reply_topic, &correlation_id, result).await;
        }
        if let Err(e) = self.consumer.commit_message(msg, CommitMode::Async) {
            error!("📨️ Could not commit offset {} on {topic}. {e}", msg.offset());
        }
    }

    async fn reply(&self, reply_topic: &str, correlation_id: &str, result: Result<Value, BrokerHandlerError>) {
        let (payload, error) = match result {
            Ok(value) => (serde_json::to_vec(&value).unwrap_or_default(), None),
            Err(e) => (b"null".to_vec(), Some(e.to_string())),
        };
        let headers = reply_headers(correlation_id, error.as_deref());
        let record = FutureRecord::<(), Vec<u8>>::to(reply_topic).payload(&payload).headers(headers);
        match self.producer.send(record, REPLY_TIMEOUT).await {
            Ok(_) => trace!("📨️ Replied to {correlation_id} on {reply_topic}"),
            Err((e, _)) => error!("📨️ Could not reply to {correlation_id} on {reply_topic}. {e}"),
        }
    }
}
