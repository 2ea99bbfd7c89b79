//! 外部コラボレータの trait 定義
//!
//! ゲームエンジンの外側にあるサービス（ユーザー情報・問題ソース・
//! 終了ゲームの永続化）へのインターフェース。具体的な実装は
//! Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    entity::{Question, Room},
    error::PortError,
    value_object::UserId,
};

/// ユーザーのプロフィール情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: String,
}

/// User Directory trait
///
/// user_id から表示名を解決する。認証自体は上流で済んでいる前提。
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// ユーザーを取得（存在しない場合は None）
    async fn get_user(&self, user_id: &UserId) -> Result<Option<UserProfile>, PortError>;
}

/// Question Source trait
///
/// ルーム作成時に出題する問題を取得する。
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// 指定カテゴリから問題を取得する
    ///
    /// `category_ids` が空の場合は全カテゴリが対象。
    async fn get_questions(
        &self,
        count: usize,
        category_ids: &[String],
    ) -> Result<Vec<Question>, PortError>;
}

/// Game Archive trait
///
/// 終了したゲームの結果を履歴として永続化する。
/// アーカイブの失敗はゲーム進行を妨げない（ログに記録して続行する）。
#[async_trait]
pub trait GameArchive: Send + Sync {
    /// 終了したルームのスナップショットを保存する
    async fn save_finished_game(&self, room: &Room) -> Result<(), PortError>;
}
