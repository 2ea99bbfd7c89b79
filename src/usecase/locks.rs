//! ルーム単位の排他ロック
//!
//! ルームの状態遷移（read-modify-write）を直列化するためのロックレジストリ。
//! ロックはルームごとに独立しており、あるルームの操作が他のルームを
//! ブロックすることはない。
//!
//! ## ライフサイクル
//!
//! - ロックは初回アクセス時に遅延生成される
//! - ルーム解体時に `remove` で破棄される
//! - `remove` 後に同じ RoomId で `acquire` すると新しいロックが生成される

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::RoomId;

/// ルームごとの排他ロックのレジストリ
#[derive(Default)]
pub struct LockRegistry {
    /// RoomId → ロックのマップ。マップ自体のロックは短時間のみ保持する
    locks: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    /// 新しい LockRegistry を作成
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// ルームのロックを取得する（存在しなければ生成する）
    ///
    /// 返されたガードを drop するまで、同じルームに対する他の `acquire` は
    /// 待機する。別のルームのロック取得は待機しない。
    pub async fn acquire(&self, room_id: &RoomId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(room_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// ルームのロックを破棄する（ルーム解体時）
    ///
    /// 取得済みのガードはそのまま有効。破棄後の `acquire` は新しい
    /// ロックを生成するため、解体後の操作は改めてルームの存在確認で弾かれる。
    pub async fn remove(&self, room_id: &RoomId) {
        let mut locks = self.locks.lock().await;
        locks.remove(room_id);
    }

    /// 登録されているロック数
    pub async fn count(&self) -> usize {
        self.locks.lock().await.len()
    }
}
