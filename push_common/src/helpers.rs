use std::{fmt::Display, str::FromStr};

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{value} is not a valid value for {name}. {reason}")]
pub struct EnvParseError {
    pub name: String,
    pub value: String,
    pub reason: String,
}

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parse an optional environment value into `T`. `Ok(None)` means the variable was not set.
pub fn parse_env_value<T>(name: &str, value: Option<String>) -> Result<Option<T>, EnvParseError>
where
    T: FromStr,
    T::Err: Display,
{
    match value {
        None => Ok(None),
        Some(v) => v.trim().parse::<T>().map(Some).map_err(|e| EnvParseError {
            name: name.to_string(),
            value: v,
            reason: e.to_string(),
        }),
    }
}
