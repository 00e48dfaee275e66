mod config;
pub mod headers;

pub use config::{consumer_config, create_client_config, producer_config, reply_consumer_config};
