//! InMemory PresenceRegistry 実装
//!
//! 接続 ID → (user_id, room_id) の束縛を保持する。切断時に
//! 「どのユーザーがどのルームに居たか」を復元するためだけの索引で、
//! ルーム状態そのものは RoomStore 側が持つ。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, PresenceBinding, PresenceRegistry, RoomId, UserId};

/// インメモリ PresenceRegistry 実装
#[derive(Default)]
pub struct InMemoryPresenceRegistry {
    bindings: Mutex<HashMap<ConnectionId, PresenceBinding>>,
}

impl InMemoryPresenceRegistry {
    /// 新しい InMemoryPresenceRegistry を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresenceRegistry for InMemoryPresenceRegistry {
    async fn bind(&self, connection_id: ConnectionId, user_id: UserId, room_id: RoomId) {
        let mut bindings = self.bindings.lock().await;
        bindings.insert(connection_id, PresenceBinding { user_id, room_id });
    }

    async fn lookup(&self, connection_id: &ConnectionId) -> Option<PresenceBinding> {
        let bindings = self.bindings.lock().await;
        bindings.get(connection_id).cloned()
    }

    async fn unbind(&self, connection_id: &ConnectionId) {
        let mut bindings = self.bindings.lock().await;
        bindings.remove(connection_id);
    }
}
