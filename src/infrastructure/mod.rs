//! Infrastructure 層
//!
//! ドメイン層で定義された trait（RoomStore / EventPusher / PresenceRegistry /
//! UserDirectory / QuestionSource / GameArchive）の具体的な実装と、
//! プロトコル境界で使う DTO を提供します。
//!
//! ## モジュール構成
//!
//! - `store`: RoomStore 実装（インメモリ + リトライデコレータ）
//! - `gateway`: EventPusher 実装（WebSocket ブロードキャスト）
//! - `presence`: PresenceRegistry 実装
//! - `collaborators`: UserDirectory / QuestionSource / GameArchive のインメモリ実装
//! - `generative`: 外部 LLM API を使った QuestionSource 実装
//! - `dto`: WebSocket / HTTP の Data Transfer Object

pub mod collaborators;
pub mod dto;
pub mod gateway;
pub mod generative;
pub mod presence;
pub mod store;
