//! Small helpers shared by the push notification engine and server crates.
mod helpers;
mod secret;

pub use helpers::{parse_boolean_flag, parse_env_value, EnvParseError};
pub use secret::Secret;
