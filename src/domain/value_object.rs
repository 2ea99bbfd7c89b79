//! Value Object 定義
//!
//! ドメイン層の値オブジェクト。生成時にバリデーションを行い、
//! 不正な値がドメイン層に入り込むことを防ぎます。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::GameError;

/// ルーム ID（UUID 文字列）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    /// 新しい RoomId を作成（空文字列は拒否）
    pub fn new(value: String) -> Result<Self, GameError> {
        if value.trim().is_empty() {
            return Err(GameError::InvalidInput(
                "room_id must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// RoomId のファクトリ
pub struct RoomIdFactory;

impl RoomIdFactory {
    /// ランダムな RoomId を生成（UUID v4）
    pub fn generate() -> Result<RoomId, GameError> {
        RoomId::new(Uuid::new_v4().to_string())
    }
}

/// ユーザー ID
///
/// 認証レイヤーで解決済みの識別子。このサーバーは user_id を信頼して受け取る。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// 新しい UserId を作成（空文字列は拒否）
    pub fn new(value: String) -> Result<Self, GameError> {
        if value.trim().is_empty() {
            return Err(GameError::InvalidInput(
                "user_id must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// WebSocket 接続 ID
///
/// 1 ユーザーが複数の接続を持ち得るため、UserId とは別の識別子として扱う。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// 新しい ConnectionId を作成（空文字列は拒否）
    pub fn new(value: String) -> Result<Self, GameError> {
        if value.trim().is_empty() {
            return Err(GameError::InvalidInput(
                "connection_id must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// ConnectionId のファクトリ
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// ランダムな ConnectionId を生成（UUID v4）
    pub fn generate() -> Result<ConnectionId, GameError> {
        ConnectionId::new(Uuid::new_v4().to_string())
    }
}

/// ルーム参加コード（6 文字の英大文字・数字）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinCode(String);

impl JoinCode {
    pub const LENGTH: usize = 6;

    /// 新しい JoinCode を作成
    ///
    /// 入力は大文字に正規化される。6 文字の英数字以外は拒否。
    pub fn new(value: String) -> Result<Self, GameError> {
        let normalized = value.trim().to_uppercase();
        if normalized.len() != Self::LENGTH
            || !normalized.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(GameError::InvalidInput(format!(
                "join code must be {} alphanumeric characters",
                Self::LENGTH
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for JoinCode {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// JoinCode のファクトリ
pub struct JoinCodeFactory;

impl JoinCodeFactory {
    /// ランダムな JoinCode を生成
    ///
    /// UUID v4 の先頭 6 桁（16 進）を大文字化して使用する。
    /// 衝突チェックは呼び出し側（ルーム作成処理）が行う。
    pub fn generate() -> Result<JoinCode, GameError> {
        let hex = Uuid::new_v4().simple().to_string();
        JoinCode::new(hex[..JoinCode::LENGTH].to_uppercase())
    }
}

/// Unix タイムスタンプ（ミリ秒）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
