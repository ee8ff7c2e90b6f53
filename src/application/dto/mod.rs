//! Data Transfer Objects - For API boundaries
//!
//! DTOs live in the application layer so infrastructure (HTTP/WebSocket) can
//! serialize/deserialize protocol messages without reaching into services.

pub mod approval_messages;

pub use approval_messages::*;
