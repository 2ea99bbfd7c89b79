//! InMemory RoomStore 実装
//!
//! ドメイン層が定義する RoomStore trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## 技術的負債
//!
//! 現在、ドメインモデル（`Room`）をそのままスナップショットとして保持
//! しています。InMemory 実装では許容される妥協ですが、将来 Redis などの
//! 外部ストアを実装する際は、以下の変換層が必要になります：
//!
//! ```text
//! シリアライズ済み JSON → RoomData (DTO) → Room (ドメインモデル)
//! ```

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{JoinCode, Room, RoomId, RoomStore, StoreError};

/// インメモリ RoomStore 実装
///
/// ルームスナップショット・参加コード索引・アクティブルーム索引を保持し、
/// ドメイン層の RoomStore trait を実装します（依存性の逆転）。
#[derive(Default)]
pub struct InMemoryRoomStore {
    /// ルームスナップショット（room_id → Room）
    rooms: Mutex<HashMap<RoomId, Room>>,
    /// 参加コード索引（code → room_id）
    codes: Mutex<HashMap<JoinCode, RoomId>>,
    /// アクティブルーム索引
    active: Mutex<HashSet<RoomId>>,
}

impl InMemoryRoomStore {
    /// 新しい InMemoryRoomStore を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn get_room(&self, room_id: &RoomId) -> Result<Option<Room>, StoreError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms.get(room_id).cloned())
    }

    async fn save_room(&self, room: &Room) -> Result<(), StoreError> {
        let mut rooms = self.rooms.lock().await;
        rooms.insert(room.room_id.clone(), room.clone());
        Ok(())
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<(), StoreError> {
        let mut rooms = self.rooms.lock().await;
        rooms.remove(room_id);
        Ok(())
    }

    async fn save_room_code(&self, code: &JoinCode, room_id: &RoomId) -> Result<(), StoreError> {
        let mut codes = self.codes.lock().await;
        codes.insert(code.clone(), room_id.clone());
        Ok(())
    }

    async fn get_room_id_by_code(&self, code: &JoinCode) -> Result<Option<RoomId>, StoreError> {
        let codes = self.codes.lock().await;
        Ok(codes.get(code).cloned())
    }

    async fn delete_room_code(&self, code: &JoinCode) -> Result<(), StoreError> {
        let mut codes = self.codes.lock().await;
        codes.remove(code);
        Ok(())
    }

    async fn add_active_room(&self, room_id: &RoomId) -> Result<(), StoreError> {
        let mut active = self.active.lock().await;
        active.insert(room_id.clone());
        Ok(())
    }

    async fn remove_active_room(&self, room_id: &RoomId) -> Result<(), StoreError> {
        let mut active = self.active.lock().await;
        active.remove(room_id);
        Ok(())
    }

    async fn get_active_room_ids(&self) -> Result<Vec<RoomId>, StoreError> {
        let active = self.active.lock().await;
        let mut ids: Vec<RoomId> = active.iter().cloned().collect();
        // HashSet の走査順に依存しないよう ID で安定させる
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(ids)
    }
}
