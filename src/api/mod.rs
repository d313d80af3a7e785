//! HTTP API module for routemark
//!
//! This module serves the current route snapshot to renderers over HTTP and
//! streams refresh events over WebSocket.

pub mod routes;
pub mod server;
pub mod websocket;

pub use routes::create_router;
pub use server::{ApiServer, AppState};
pub use websocket::WebSocketHandler;
