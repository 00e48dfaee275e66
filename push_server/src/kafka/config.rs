use log::*;
use rdkafka::config::ClientConfig;

use crate::config::KafkaConfig;

/// Builds the settings shared by every producer and consumer in the service: the bootstrap servers, the client id,
/// and the security protocol (TLS and/or SASL).
pub fn create_client_config(config: &KafkaConfig, client_id: &str) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    client_config.set("bootstrap.servers", &config.brokers).set("client.id", client_id);
    let protocol = match (config.ssl_enabled, &config.sasl) {
        (false, None) => "plaintext",
        (true, None) => "ssl",
        (false, Some(_)) => "sasl_plaintext",
        (true, Some(_)) => "sasl_ssl",
    };
    client_config.set("security.protocol", protocol);
    if let Some(sasl) = &config.sasl {
        debug!("📨️ Using SASL {} authentication for {client_id}", sasl.mechanism);
        client_config
            .set("sasl.mechanism", &sasl.mechanism)
            .set("sasl.username", &sasl.username)
            .set("sasl.password", sasl.password.reveal());
    }
    client_config
}

/// Settings for a consumer in `group_id` that commits its offsets explicitly.
pub fn consumer_config(config: &KafkaConfig, client_id: &str, group_id: &str) -> ClientConfig {
    let mut client_config = create_client_config(config, client_id);
    client_config
        .set("group.id", group_id)
        .set("enable.auto.commit", "false")
        .set("auto.offset.reset", "earliest")
        .set("allow.auto.create.topics", "true")
        .set("session.timeout.ms", "30000")
        .set("heartbeat.interval.ms", "3000");
    client_config
}

/// Settings for the consumer that reads authority replies.
///
/// Every service instance must see every reply addressed to it, so each one joins its own group: `group_id` suffixed
/// with `instance`. Replies are only useful while a caller still waits for them, so old ones are never replayed.
pub fn reply_consumer_config(config: &KafkaConfig, client_id: &str, group_id: &str, instance: &str) -> ClientConfig {
    let mut client_config = consumer_config(config, client_id, &format!("{group_id}-{instance}"));
    client_config.set("enable.auto.commit", "true").set("auto.offset.reset", "latest");
    client_config
}

pub fn producer_config(config: &KafkaConfig, client_id: &str) -> ClientConfig {
    let mut client_config = create_client_config(config, client_id);
    client_config.set("acks", "all").set("message.timeout.ms", "30000");
    client_config
}
