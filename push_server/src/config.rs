//! Server configuration.
//!
//! Everything is read from environment variables once, at start-up. A `.env` file in the working directory is loaded
//! first, if present. Invalid values are logged and replaced with their defaults.
//!
//! | Variable                     | Default                        |
//! |------------------------------|--------------------------------|
//! | `PUSH_HOST`                  | 127.0.0.1                      |
//! | `PUSH_PORT`                  | 5007                           |
//! | `PUSH_DATABASE_URL`          | sqlite://data/push_store.db    |
//! | `PUSH_KAFKA_BROKERS`         | localhost:9092                 |
//! | `PUSH_KAFKA_SSL`             | false                          |
//! | `PUSH_KAFKA_SASL_MECHANISM`  | (unset, no SASL)               |
//! | `PUSH_KAFKA_SASL_USERNAME`   |                                |
//! | `PUSH_KAFKA_SASL_PASSWORD`   |                                |
//! | `PUSH_KAFKA_CLIENT_ID`       | push-service                   |
//! | `PUSH_KAFKA_GROUP_ID`        | push-consumer                  |
//! | `PUSH_BROKER_RETRIES`        | 5                              |
//! | `PUSH_AUTH_CLIENT_ID`        | auth-service                   |
//! | `PUSH_AUTH_GROUP_ID`         | auth-consumer-10               |
//! | `PUSH_AUTH_TOPIC`            | auth.session                   |
//! | `PUSH_AUTH_TIMEOUT_MS`       | 5000                           |
//! | `PUSH_DISTINGUISH_FORBIDDEN` | false                          |
//! | `PUSH_FCM_SERVICE_ACCOUNT`   | (unset, push delivery is off)  |
use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use log::*;
use push_common::{parse_boolean_flag, parse_env_value, Secret};

const DEFAULT_PUSH_HOST: &str = "127.0.0.1";
const DEFAULT_PUSH_PORT: u16 = 5007;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/push_store.db";
const DEFAULT_KAFKA_BROKERS: &str = "localhost:9092";
const DEFAULT_KAFKA_CLIENT_ID: &str = "push-service";
const DEFAULT_KAFKA_GROUP_ID: &str = "push-consumer";
const DEFAULT_BROKER_RETRIES: u32 = 5;
const DEFAULT_AUTH_CLIENT_ID: &str = "auth-service";
const DEFAULT_AUTH_GROUP_ID: &str = "auth-consumer-10";
const DEFAULT_AUTH_TOPIC: &str = "auth.session";
const DEFAULT_AUTH_TIMEOUT_MS: u64 = 5000;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub kafka: KafkaConfig,
    pub broker: BrokerConfig,
    pub auth: AuthConfig,
    pub push: PushConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PUSH_HOST.to_string(),
            port: DEFAULT_PUSH_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            kafka: KafkaConfig::default(),
            broker: BrokerConfig::default(),
            auth: AuthConfig::default(),
            push: PushConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("PUSH_HOST").ok().unwrap_or_else(|| DEFAULT_PUSH_HOST.into());
        let port = env_or_default("PUSH_PORT", DEFAULT_PUSH_PORT);
        let database_url = env::var("PUSH_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ PUSH_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.into()
        });
        Self {
            host,
            port,
            database_url,
            kafka: KafkaConfig::from_env_or_default(),
            broker: BrokerConfig::from_env_or_default(),
            auth: AuthConfig::from_env_or_default(),
            push: PushConfig::from_env_or_default(),
        }
    }
}

//-------------------------------------------------  KafkaConfig  ------------------------------------------------------
/// Connection settings shared by every Kafka client in the service.
#[derive(Clone, Debug)]
pub struct KafkaConfig {
    /// Comma-separated list of bootstrap servers.
    pub brokers: String,
    pub ssl_enabled: bool,
    pub sasl: Option<SaslConfig>,
}

#[derive(Clone, Debug)]
pub struct SaslConfig {
    pub mechanism: String,
    pub username: String,
    pub password: Secret<String>,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self { brokers: DEFAULT_KAFKA_BROKERS.to_string(), ssl_enabled: false, sasl: None }
    }
}

impl KafkaConfig {
    pub fn from_env_or_default() -> Self {
        let brokers = env::var("PUSH_KAFKA_BROKERS").ok().unwrap_or_else(|| {
            info!("🪛️ PUSH_KAFKA_BROKERS is not set. Using {DEFAULT_KAFKA_BROKERS}");
            DEFAULT_KAFKA_BROKERS.into()
        });
        let ssl_enabled = parse_boolean_flag(env::var("PUSH_KAFKA_SSL").ok(), false);
        let sasl = env::var("PUSH_KAFKA_SASL_MECHANISM").ok().and_then(|mechanism| {
            let username = env::var("PUSH_KAFKA_SASL_USERNAME").ok();
            let password = env::var("PUSH_KAFKA_SASL_PASSWORD").ok();
            match (username, password) {
                (Some(username), Some(password)) => {
                    Some(SaslConfig { mechanism, username, password: Secret::new(password) })
                },
                _ => {
                    warn!(
                        "🪛️ PUSH_KAFKA_SASL_MECHANISM is set, but PUSH_KAFKA_SASL_USERNAME or \
                         PUSH_KAFKA_SASL_PASSWORD is missing. SASL authentication is disabled."
                    );
                    None
                },
            }
        });
        Self { brokers, ssl_enabled, sasl }
    }
}

//-------------------------------------------------  BrokerConfig  -----------------------------------------------------
/// Settings for the consumer that serves the `push.*` topics.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    pub client_id: String,
    pub group_id: String,
    /// How many times a failed message is retried before it is skipped.
    pub retries: u32,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_KAFKA_CLIENT_ID.to_string(),
            group_id: DEFAULT_KAFKA_GROUP_ID.to_string(),
            retries: DEFAULT_BROKER_RETRIES,
        }
    }
}

impl BrokerConfig {
    pub fn from_env_or_default() -> Self {
        let client_id = env::var("PUSH_KAFKA_CLIENT_ID").ok().unwrap_or_else(|| DEFAULT_KAFKA_CLIENT_ID.into());
        let group_id = env::var("PUSH_KAFKA_GROUP_ID").ok().unwrap_or_else(|| DEFAULT_KAFKA_GROUP_ID.into());
        let retries = env_or_default("PUSH_BROKER_RETRIES", DEFAULT_BROKER_RETRIES);
        Self { client_id, group_id, retries }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
/// Settings for the session authority client.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub client_id: String,
    /// Each instance reads replies in its own group, named `<group_id>-<random suffix>`.
    pub group_id: String,
    /// Session checks are published here. Replies arrive on `<topic>.reply`.
    pub topic: String,
    pub timeout: Duration,
    /// When true, an authenticated caller without the required role gets a 403 rather than a 401.
    pub distinguish_forbidden: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_AUTH_CLIENT_ID.to_string(),
            group_id: DEFAULT_AUTH_GROUP_ID.to_string(),
            topic: DEFAULT_AUTH_TOPIC.to_string(),
            timeout: Duration::from_millis(DEFAULT_AUTH_TIMEOUT_MS),
            distinguish_forbidden: false,
        }
    }
}

impl AuthConfig {
    pub fn from_env_or_default() -> Self {
        let client_id = env::var("PUSH_AUTH_CLIENT_ID").ok().unwrap_or_else(|| DEFAULT_AUTH_CLIENT_ID.into());
        let group_id = env::var("PUSH_AUTH_GROUP_ID").ok().unwrap_or_else(|| DEFAULT_AUTH_GROUP_ID.into());
        let topic = env::var("PUSH_AUTH_TOPIC").ok().unwrap_or_else(|| DEFAULT_AUTH_TOPIC.into());
        let timeout = Duration::from_millis(env_or_default("PUSH_AUTH_TIMEOUT_MS", DEFAULT_AUTH_TIMEOUT_MS));
        let distinguish_forbidden = parse_boolean_flag(env::var("PUSH_DISTINGUISH_FORBIDDEN").ok(), false);
        if distinguish_forbidden {
            info!("🪛️ Insufficient roles will be reported as 403 Forbidden");
        }
        Self { client_id, group_id, topic, timeout, distinguish_forbidden }
    }
}

//-------------------------------------------------  PushConfig  -------------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct PushConfig {
    /// Path to the Firebase service account key. Push delivery is disabled when this is not set.
    pub service_account: Option<PathBuf>,
}

impl PushConfig {
    pub fn from_env_or_default() -> Self {
        let service_account = env::var("PUSH_FCM_SERVICE_ACCOUNT").ok().filter(|s| !s.is_empty()).map(PathBuf::from);
        if service_account.is_none() {
            warn!("🪛️ PUSH_FCM_SERVICE_ACCOUNT is not set. Notifications will be saved, but not pushed to devices.");
        }
        Self { service_account }
    }
}

fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display + Copy,
    T::Err: Display,
{
    match parse_env_value::<T>(name, env::var(name).ok()) {
        Ok(Some(v)) => v,
        Ok(None) => default,
        Err(e) => {
            error!("🪛️ {e} Using the default, {default}, instead.");
            default
        },
    }
}
