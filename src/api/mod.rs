//! HTTP and WebSocket surface for the caregiving backend.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;
pub mod websocket;
