//! HTTP / WebSocket request handlers.

mod http;
mod websocket;

pub use http::{create_room, health_check, join_room, list_rooms};
pub use websocket::websocket_handler;
