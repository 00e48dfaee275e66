//! Entry points for notifications arriving over the message broker.
mod consumer;
mod handlers;

pub use consumer::{handle_with_retries, BrokerConsumer, RetryPolicy};
pub use handlers::{
    topic_handler,
    topics,
    BrokerAction,
    BrokerHandlerError,
    MessageRouter,
    TopicHandler,
    ViewPayload,
    CREATE_TOPIC,
    TOPIC_HANDLERS,
    VIEW_TOPIC,
};
