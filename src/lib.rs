//! Real-time quiz game server library.
//!
//! This library provides a WebSocket-based quiz session engine: rooms, players,
//! timed questions, speed-based scoring and live leaderboard broadcasts.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// shared library
pub mod common;
