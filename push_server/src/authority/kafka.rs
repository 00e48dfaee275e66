use std::time::Duration;

use futures::{future::BoxFuture, FutureExt};
use log::*;
use rdkafka::{
    consumer::{Consumer, StreamConsumer},
    producer::{FutureProducer, FutureRecord},
    Message,
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{
    authority::{
        transport::{reply_topic, InboundReply, OutboundRequest, RequestTransport, TransportEvent},
        AuthorityError,
    },
    config::{AuthConfig, KafkaConfig},
    kafka::{
        headers::{find_header, request_headers, CORRELATION_ID, NEST_ERR},
        producer_config,
        reply_consumer_config,
    },
};

const METADATA_TIMEOUT: Duration = Duration::from_secs(10);
const SEND_TIMEOUT: Duration = Duration::from_secs(5);
// Pause after a consumer error so that a dead broker does not turn the reply loop into a busy loop
const RECONNECT_PAUSE: Duration = Duration::from_secs(1);

/// Publishes authority requests with a [`FutureProducer`] and reads replies with a [`StreamConsumer`].
pub struct KafkaTransport {
    producer: FutureProducer,
}

impl KafkaTransport {
    /// Connects to the broker and subscribes to the reply topic of `auth.topic`.
    ///
    /// Fails with [`AuthorityError::ConnectionError`] when the broker cannot be reached.
    pub fn connect(
        kafka: &KafkaConfig,
        auth: &AuthConfig,
    ) -> Result<(Self, UnboundedReceiver<TransportEvent>), AuthorityError> {
        let connection_error = |e: rdkafka::error::KafkaError| AuthorityError::ConnectionError(e.to_string());
        let producer: FutureProducer = producer_config(kafka, &auth.client_id).create().map_err(connection_error)?;
        let instance = format!("{:08x}", rand::random::<u32>());
        let consumer_settings = reply_consumer_config(kafka, &auth.client_id, &auth.group_id, &instance);
        let consumer: StreamConsumer = consumer_settings.create().map_err(connection_error)?;
        consumer.fetch_metadata(None, METADATA_TIMEOUT).map_err(connection_error)?;
        let replies = reply_topic(&auth.topic);
        consumer.subscribe(&[replies.as_str()]).map_err(connection_error)?;
        info!(
            "🔐️ Connected to {} and listening for replies on {replies} in group {}-{instance}",
            kafka.brokers,
            auth.group_id
        );
        let (tx, rx) = unbounded_channel();
        tokio::spawn(forward_replies(consumer, tx));
        Ok((Self { producer }, rx))
    }
}

impl RequestTransport for KafkaTransport {
    fn publish(&self, request: OutboundRequest) -> BoxFuture<'_, Result<(), AuthorityError>> {
        async move {
            let headers = request_headers(&request.correlation_id, &request.reply_topic);
            let record = FutureRecord::<(), Vec<u8>>::to(&request.topic).payload(&request.payload).headers(headers);
            match self.producer.send(record, SEND_TIMEOUT).await {
                Ok((partition, offset)) => {
                    trace!("🔐️ Request {} stored at {partition}:{offset}", request.correlation_id);
                    Ok(())
                },
                Err((e, _)) => Err(AuthorityError::Unavailable(format!("Could not publish request. {e}"))),
            }
        }
        .boxed()
    }
}

async fn forward_replies(consumer: StreamConsumer, events: UnboundedSender<TransportEvent>) {
    loop {
        let event = match consumer.recv().await {
            Ok(msg) => {
                let Some(correlation_id) = find_header(msg.headers(), CORRELATION_ID) else {
                    warn!("🔐️ Ignoring a reply on {} without a correlation id", msg.topic());
                    continue;
                };
                TransportEvent::Reply(InboundReply {
                    correlation_id,
                    payload: msg.payload().map(|p| p.to_vec()),
                    error: find_header(msg.headers(), NEST_ERR),
                })
            },
            Err(e) => {
                error!("🔐️ Error reading authority replies. {e}");
                TransportEvent::Disconnected(e.to_string())
            },
        };
        let disconnected = matches!(event, TransportEvent::Disconnected(_));
        if events.send(event).is_err() {
            debug!("🔐️ Nobody is listening for authority replies any more");
            break;
        }
        if disconnected {
            tokio::time::sleep(RECONNECT_PAUSE).await;
        }
    }
}
