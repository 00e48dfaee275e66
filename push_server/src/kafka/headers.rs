//! Header names used for request/reply messaging. They follow the convention of the NestJS Kafka transport, which the
//! other services on the broker speak.
use rdkafka::message::{Header, Headers, OwnedHeaders};

pub const CORRELATION_ID: &str = "kafka_correlationId";
pub const REPLY_TOPIC: &str = "kafka_replyTopic";
pub const NEST_ERR: &str = "kafka_nest-err";
pub const NEST_IS_DISPOSED: &str = "kafka_nest-is-disposed";

/// Returns the value of header `key` as a string, if it is present and valid UTF-8.
pub fn find_header<H: Headers>(headers: Option<&H>, key: &str) -> Option<String> {
    headers?
        .iter()
        .find(|h| h.key == key)
        .and_then(|h| h.value)
        .and_then(|v| std::str::from_utf8(v).ok())
        .map(String::from)
}

pub fn request_headers(correlation_id: &str, reply_topic: &str) -> OwnedHeaders {
    OwnedHeaders::new()
        .insert(Header { key: CORRELATION_ID, value: Some(correlation_id) })
        .insert(Header { key: REPLY_TOPIC, value: Some(reply_topic) })
}

/// Headers for a final reply. `error` is set when the handler failed.
pub fn reply_headers(correlation_id: &str, error: Option<&str>) -> OwnedHeaders {
    let headers = OwnedHeaders::new()
        .insert(Header { key: CORRELATION_ID, value: Some(correlation_id) })
        .insert(Header { key: NEST_IS_DISPOSED, value: Some("1") });
    match error {
        Some(err) => headers.insert(Header { key: NEST_ERR, value: Some(err) }),
        None => headers,
    }
}
