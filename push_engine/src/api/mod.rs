pub mod errors;
pub mod notification_api;
