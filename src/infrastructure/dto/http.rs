//! HTTP API request / response DTOs.

use serde::{Deserialize, Serialize};

/// `POST /api/rooms` のリクエストボディ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub user_id: String,
    /// 省略時はデフォルトの出題数になる
    #[serde(default)]
    pub count_questions: Option<usize>,
    /// 省略時は全カテゴリから出題される
    #[serde(default)]
    pub category_ids: Option<Vec<String>>,
}

/// `POST /api/rooms` のレスポンスボディ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room_id: String,
    pub room_code: String,
}

/// `POST /api/rooms/join` のリクエストボディ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    pub user_id: String,
    pub code: String,
}

/// `POST /api/rooms/join` のレスポンスボディ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    pub room_id: String,
}

/// `GET /api/rooms` の 1 件分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub room_id: String,
    pub owner: String,
    pub player_count: usize,
    pub max_players: usize,
    pub room_code: String,
}

/// エラーレスポンスの共通ボディ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_room_request_optional_fields_default_to_none() {
        // テスト項目: count_questions / category_ids は省略可能
        // given (前提条件):
        let json = r#"{"user_id":"alice"}"#;

        // when (操作):
        let request: CreateRoomRequest = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(request.user_id, "alice");
        assert_eq!(request.count_questions, None);
        assert_eq!(request.category_ids, None);
    }

    #[test]
    fn test_create_room_request_with_all_fields() {
        // テスト項目: 全フィールドを指定したリクエストがパースできる
        // given (前提条件):
        let json = r#"{"user_id":"alice","count_questions":5,"category_ids":["geo","sci"]}"#;

        // when (操作):
        let request: CreateRoomRequest = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(request.count_questions, Some(5));
        assert_eq!(
            request.category_ids,
            Some(vec!["geo".to_string(), "sci".to_string()])
        );
    }
}
