//! Data Transfer Objects (DTOs) for the quiz application.
//!
//! DTOs are organized by protocol:
//! - `ws`: WebSocket frame envelope and request payloads
//! - `http`: HTTP API request / response DTOs

pub mod conversion;
pub mod http;
pub mod ws;
