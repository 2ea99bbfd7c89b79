//! ドメイン層のエラー定義
//!
//! ゲーム操作のエラー（`GameError`）と、境界インターフェースごとの
//! エラー（`StoreError` / `PushError` / `PortError`）を定義します。

use thiserror::Error;

/// 共有ステートストアのエラー
///
/// ストア障害は一時的なものとして扱い、リトライ対象となる。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("state store unavailable: {0}")]
    Unavailable(String),
}

/// イベント配信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),
    #[error("failed to push event: {0}")]
    PushFailed(String),
}

/// 外部コラボレータ（ユーザー情報・問題ソース・アーカイブ）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("external service unavailable: {0}")]
    Unavailable(String),
    #[error("invalid response from external service: {0}")]
    InvalidResponse(String),
}

/// ゲーム操作のエラー
///
/// UI 層はこのエラーを HTTP ステータスや WebSocket のエラーイベントに
/// 変換して呼び出し元へ返す。他の参加者には伝播しない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("room not found")]
    RoomNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("player is not in the room")]
    PlayerNotInRoom,
    #[error("no questions available")]
    NoQuestionsAvailable,
    #[error("invalid state for operation")]
    InvalidState,
    #[error("not authorized")]
    NotAuthorized,
    #[error("room is full")]
    RoomFull,
    #[error("player already in the room")]
    AlreadyJoined,
    #[error("answer already submitted")]
    AlreadyAnswered,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Port(#[from] PortError),
}
