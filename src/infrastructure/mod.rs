//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Compendium: JSON pack files served through the compendium port
//! - Persistence: SQLite settings and drafts, in-process actor store
//! - HTTP: REST API routes
//! - WebSocket: Real-time communication with host clients
//! - Session: Connected clients and the host-facing ports they back
//! - Config / State: Application configuration and shared state

pub mod compendium;
pub mod config;
pub mod http;
pub mod persistence;
pub mod session;
pub mod session_adapter;
pub mod state;
pub mod websocket;
