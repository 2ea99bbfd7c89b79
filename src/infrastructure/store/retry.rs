//! RoomStore のリトライデコレータ
//!
//! 一時的なストア障害（StoreError::Unavailable）を指数バックオフ付きで
//! 再試行してから呼び出し元へ返す。上限まで失敗したら最後のエラーを
//! そのまま返し、扱いは呼び出し側（SessionCoordinator など）に任せる。

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{JoinCode, Room, RoomId, RoomStore, StoreError};

/// リトライ方針
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 初回失敗後に再試行する回数
    pub max_retries: u32,
    /// バックオフの基準待ち時間（試行ごとに 2 倍）
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(50),
        }
    }
}

/// ストア操作をリトライ付きで実行
///
/// `operation` は試行のたびに呼び直される（FnMut）。成功したらその値を、
/// リトライ上限まで失敗したら最後のエラーを返す。
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_retries => {
                let delay = policy.base_delay * 2_u32.pow(attempt);
                tracing::warn!(
                    "Store operation failed (attempt {}/{}), retrying in {:?}: {}",
                    attempt + 1,
                    policy.max_retries + 1,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// RoomStore のリトライデコレータ
///
/// 内側の実装（InMemory / 将来の Redis など）を包み、全操作に同じ
/// リトライ方針を適用する。
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingStore<S> {
    /// 新しい RetryingStore を作成
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<S: RoomStore> RoomStore for RetryingStore<S> {
    async fn get_room(&self, room_id: &RoomId) -> Result<Option<Room>, StoreError> {
        with_retry(&self.policy, || self.inner.get_room(room_id)).await
    }

    async fn save_room(&self, room: &Room) -> Result<(), StoreError> {
        with_retry(&self.policy, || self.inner.save_room(room)).await
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<(), StoreError> {
        with_retry(&self.policy, || self.inner.delete_room(room_id)).await
    }

    async fn save_room_code(&self, code: &JoinCode, room_id: &RoomId) -> Result<(), StoreError> {
        with_retry(&self.policy, || self.inner.save_room_code(code, room_id)).await
    }

    async fn get_room_id_by_code(&self, code: &JoinCode) -> Result<Option<RoomId>, StoreError> {
        with_retry(&self.policy, || self.inner.get_room_id_by_code(code)).await
    }

    async fn delete_room_code(&self, code: &JoinCode) -> Result<(), StoreError> {
        with_retry(&self.policy, || self.inner.delete_room_code(code)).await
    }

    async fn add_active_room(&self, room_id: &RoomId) -> Result<(), StoreError> {
        with_retry(&self.policy, || self.inner.add_active_room(room_id)).await
    }

    async fn remove_active_room(&self, room_id: &RoomId) -> Result<(), StoreError> {
        with_retry(&self.policy, || self.inner.remove_active_room(room_id)).await
    }

    async fn get_active_room_ids(&self) -> Result<Vec<RoomId>, StoreError> {
        with_retry(&self.policy, || self.inner.get_active_room_ids()).await
    }
}
