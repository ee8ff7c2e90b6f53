//! Application layer - Character creation use cases
//!
//! Services here depend only on the outbound ports; the infrastructure layer
//! supplies the adapters.

pub mod dto;
pub mod ports;
pub mod services;
