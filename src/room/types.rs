use serde::{Deserialize, Serialize};

use super::models::{Participant, Room, RoomCode, RoomStatus};
use crate::shared::AppError;

/// Request payload for creating a new room
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomCreateRequest {
    pub team_name: Option<String>,
    pub host_name: Option<String>,
}

/// Request payload for joining a room
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinRoomRequest {
    pub participant_name: Option<String>,
}

/// Request payload identifying the acting participant (leave, start)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantRequest {
    pub participant_id: Option<String>,
}

/// Request payload for casting a vote
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoteRequest {
    pub participant_id: Option<String>,
    pub category_id: Option<String>,
    pub vote: Option<String>,
}

/// Response for room creation and joining
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMembershipResponse {
    pub room: Room,
    pub participant: Participant,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// How far each participant got through the category list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VotingProgress {
    pub code: RoomCode,
    pub status: RoomStatus,
    pub participants: Vec<ParticipantProgress>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantProgress {
    pub participant_id: String,
    pub participant_name: String,
    pub votes_cast: usize,
}

impl VotingProgress {
    pub fn from_room(room: &Room) -> Self {
        Self {
            code: room.code.clone(),
            status: room.status,
            participants: room
                .participants
                .iter()
                .map(|p| ParticipantProgress {
                    participant_id: p.id.clone(),
                    participant_name: p.name.clone(),
                    votes_cast: room.votes_by(&p.id),
                })
                .collect(),
        }
    }

    /// Whether every participant has voted on at least `category_count` categories
    pub fn all_voted(&self, category_count: usize) -> bool {
        self.participants
            .iter()
            .all(|p| p.votes_cast >= category_count)
    }
}

/// Extracts a required, non-blank string field
pub fn required_field(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{} is required", field)))
}
