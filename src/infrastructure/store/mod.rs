//! RoomStore の具体的な実装

pub mod memory;
pub mod retry;

pub use memory::InMemoryRoomStore;
pub use retry::{RetryPolicy, RetryingStore, with_retry};
