//! RoomStore trait 定義
//!
//! ドメイン層が必要とするゲーム状態ストアのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    entity::Room,
    error::StoreError,
    value_object::{JoinCode, RoomId},
};

/// Room Store trait
///
/// ルームスナップショットと二次インデックス（参加コード・アクティブルーム集合）
/// を保持する共有ステートストアへのインターフェース。
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
///
/// ## 読み取り・書き込みのモデル
///
/// - `get_room` は独立したディープコピーを返す（呼び出し側の変更はストアに影響しない）
/// - `save_room` はスナップショット全体を置き換える
/// - 同一ルームへの並行書き込みの直列化はロック層（UseCase 側）の責務
///
/// ## 依存性の逆転（DIP）
///
/// - ドメイン層が必要とするインターフェースをドメイン層自身が定義
/// - Infrastructure 層がドメイン層のインターフェースに依存
/// - ドメイン層は Infrastructure 層に依存しない
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Room スナップショットを取得（存在しない場合は None）
    async fn get_room(&self, room_id: &RoomId) -> Result<Option<Room>, StoreError>;

    /// Room スナップショット全体を保存（置き換え）
    async fn save_room(&self, room: &Room) -> Result<(), StoreError>;

    /// Room スナップショットを削除
    async fn delete_room(&self, room_id: &RoomId) -> Result<(), StoreError>;

    /// 参加コード → RoomId のマッピングを保存
    async fn save_room_code(&self, code: &JoinCode, room_id: &RoomId) -> Result<(), StoreError>;

    /// 参加コードから RoomId を取得（存在しない場合は None）
    async fn get_room_id_by_code(&self, code: &JoinCode) -> Result<Option<RoomId>, StoreError>;

    /// 参加コードのマッピングを削除
    async fn delete_room_code(&self, code: &JoinCode) -> Result<(), StoreError>;

    /// アクティブルーム集合に追加
    async fn add_active_room(&self, room_id: &RoomId) -> Result<(), StoreError>;

    /// アクティブルーム集合から削除
    async fn remove_active_room(&self, room_id: &RoomId) -> Result<(), StoreError>;

    /// アクティブルーム集合の全 RoomId を取得
    async fn get_active_room_ids(&self) -> Result<Vec<RoomId>, StoreError>;
}
