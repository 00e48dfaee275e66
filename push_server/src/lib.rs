//! # Push notification server
//! This crate hosts the entry points of the push notification service. It is responsible for:
//! * Serving the notification CRUD routes over HTTP.
//! * Consuming `push.create` and `push.view` messages from Kafka.
//! * Checking every HTTP caller's session with the remote authority, over Kafka request/reply, before any handler runs.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/session`: Returns the caller's session.
//! * `/`, `/{id}`, `/user_uid` and `/view/{id}`: Notification management. See [routes](routes/index.html).
pub mod authority;
pub mod broker;
pub mod cli;
pub mod config;
pub mod errors;
pub mod gate;
pub mod kafka;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
