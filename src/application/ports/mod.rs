//! Ports - Boundaries between the application and the host

pub mod outbound;
