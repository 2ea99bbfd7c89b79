//! Quiz protocol event vocabulary.
//!
//! Event name constants and payload shapes shared by the session engine
//! (which broadcasts them) and the UI layer (which dispatches on them).
//! Payloads are plain serializable structs; the wire envelope
//! `{ "event": ..., "data": ... }` is applied by the gateway implementation.

use serde::{Deserialize, Serialize};

use crate::common::time::timestamp_to_rfc3339;
use crate::domain::{Player, Question, Room, RoomStatus};

// Client -> server requests. `room_status` and `update_leaderboard` are
// answered with a room broadcast of the same event name.
pub const JOIN_ROOM: &str = "join_room";
pub const LEAVE_ROOM: &str = "leave_room";
pub const START_QUIZ: &str = "start_quiz";
pub const ANSWER: &str = "answer";
pub const ROOM_STATUS: &str = "room_status";
pub const SHOW_RESULT: &str = "show_result";
pub const UPDATE_LEADERBOARD: &str = "update_leaderboard";

// Server -> client events.
pub const MESSAGE: &str = "message";
pub const ERROR: &str = "error";
pub const ALL_PLAYERS_IN_LOBBY: &str = "all_players_in_lobby";
pub const START_GAME: &str = "startGame";
pub const GET_QUEST: &str = "get_quest";
pub const ANSWERED: &str = "answered";
pub const SHOW_CORRECT_ANSWER: &str = "show_correct_answer";
pub const NEED_UPDATE_LEADERBOARD: &str = "need_update_leaderboard";
pub const RESULT: &str = "result";
pub const END_OF_GAME: &str = "endOfGame";

/// Player as exposed to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPayload {
    pub user_id: String,
    pub username: String,
    pub score: u32,
    pub correct: u32,
    pub answered: bool,
    pub answer: Option<String>,
    /// RFC 3339 timestamp
    pub joined_at: String,
}

impl From<&Player> for PlayerPayload {
    fn from(player: &Player) -> Self {
        Self {
            user_id: player.user_id.as_str().to_string(),
            username: player.username.clone(),
            score: player.score,
            correct: player.correct,
            answered: player.answered,
            answer: player.answer.clone(),
            joined_at: timestamp_to_rfc3339(player.joined_at.value()),
        }
    }
}

/// Question as exposed to clients.
///
/// The correct answer is deliberately not part of this payload; it is only
/// revealed through `show_correct_answer` after the question closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPayload {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub time_limit: i64,
    pub category_id: Option<String>,
    /// 1-based position of the question within the quiz
    pub position: usize,
}

impl QuestionPayload {
    pub fn new(question: &Question, position: usize) -> Self {
        Self {
            id: question.id.clone(),
            text: question.text.clone(),
            options: question.options.clone(),
            time_limit: question.time_limit,
            category_id: question.category_id.clone(),
            position,
        }
    }
}

/// `all_players_in_lobby` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyPayload {
    pub players: Vec<PlayerPayload>,
    pub owner: Option<PlayerPayload>,
}

impl LobbyPayload {
    /// Build a lobby snapshot with a stable player ordering (join time,
    /// then user_id).
    pub fn from_room(room: &Room) -> Self {
        let mut players: Vec<&Player> = room.players.values().collect();
        players.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.user_id.as_str().cmp(b.user_id.as_str()))
        });
        Self {
            players: players.into_iter().map(PlayerPayload::from).collect(),
            owner: room.owner().map(PlayerPayload::from),
        }
    }
}

/// `answered` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsweredPayload {
    pub user_id: String,
    /// 1 if the submitted answer was correct, 0 otherwise
    pub correct_answered: u8,
}

/// `show_correct_answer` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealPayload {
    pub correct_answer: String,
    /// Seconds until the next question (or the end of the game)
    pub sleep_timer: u64,
}

/// `room_status` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomStatusPayload {
    pub status: RoomStatus,
    /// The current question, absent while waiting or after the game finished
    pub question: Option<QuestionPayload>,
}

impl RoomStatusPayload {
    pub fn from_room(room: &Room) -> Self {
        let question = room
            .current_question()
            .map(|q| QuestionPayload::new(q, room.current_question_index as usize + 1));
        Self {
            status: room.status,
            question,
        }
    }
}

/// Entry of the `result` / `update_leaderboard` payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub username: String,
    pub score: u32,
}

/// Build the leaderboard payload, sorted by score descending.
pub fn leaderboard_of(room: &Room) -> Vec<LeaderboardEntry> {
    room.leaderboard()
        .into_iter()
        .map(|player| LeaderboardEntry {
            user_id: player.user_id.as_str().to_string(),
            username: player.username.clone(),
            score: player.score,
        })
        .collect()
}

/// `message` / `error` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub message: String,
}
