//! ドメイン層
//!
//! クイズセッションのドメインモデル（エンティティ・値オブジェクト・
//! 採点ロジック）と、他レイヤーへのインターフェース（trait）を定義します。
//!
//! ## モジュール構成
//!
//! - `entity`: Room / Player / Question（集約とその不変条件）
//! - `value_object`: RoomId / UserId / JoinCode などの値オブジェクト
//! - `scoring`: 速度ボーナス採点の純粋関数
//! - `error`: ドメインエラー定義
//! - `store` / `presence` / `gateway` / `ports`: Infrastructure 層が実装する trait

pub mod entity;
pub mod error;
pub mod gateway;
pub mod ports;
pub mod presence;
pub mod scoring;
pub mod store;
pub mod value_object;

pub use entity::{DEFAULT_MAX_PLAYERS, Player, Question, Room, RoomStatus};
pub use error::{GameError, PortError, PushError, StoreError};
pub use gateway::{EventPusher, PusherChannel};
pub use ports::{GameArchive, QuestionSource, UserDirectory, UserProfile};
pub use presence::{PresenceBinding, PresenceRegistry};
pub use scoring::{AnswerOutcome, UntimedPolicy, score_answer, speed_bonus};
pub use store::RoomStore;
pub use value_object::{
    ConnectionId, ConnectionIdFactory, JoinCode, JoinCodeFactory, RoomId, RoomIdFactory,
    Timestamp, UserId,
};

#[cfg(test)]
pub use store::MockRoomStore;
