//! Conversion logic between use case results and HTTP DTOs.

use crate::infrastructure::dto::http as dto;
use crate::usecase::{CreatedRoom, RoomSummary};

// ========================================
// UseCase Result → DTO
// ========================================

impl From<CreatedRoom> for dto::CreateRoomResponse {
    fn from(created: CreatedRoom) -> Self {
        Self {
            room_id: created.room_id.into_string(),
            room_code: created.join_code.as_str().to_string(),
        }
    }
}

impl From<RoomSummary> for dto::RoomSummaryDto {
    fn from(summary: RoomSummary) -> Self {
        Self {
            room_id: summary.room_id.into_string(),
            owner: summary.owner_username,
            player_count: summary.player_count,
            max_players: summary.max_players,
            room_code: summary.join_code.as_str().to_string(),
        }
    }
}
