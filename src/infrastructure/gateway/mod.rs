//! EventPusher の具体的な実装

pub mod websocket;

pub use websocket::WebSocketEventPusher;
