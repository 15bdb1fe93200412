use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::room::models::{Participant, VoteValue};

/// Kind-specific payload of a room event.
///
/// Serializes adjacently tagged, so a `RoomEvent` renders as
/// `{"type": "vote_cast", "data": {...}, "timestamp": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum EventData {
    /// Sent only to a freshly registered subscriber
    Connected { message: String },

    ParticipantJoined {
        participant: Participant,
        total_participants: usize,
    },

    ParticipantLeft {
        participant_id: String,
        participant_name: String,
    },

    /// Carries the latest value for the (participant, category) pair
    VoteCast {
        participant_id: String,
        participant_name: String,
        category_id: String,
        vote: VoteValue,
    },

    VotingStarted {},

    VotingCompleted {},

    RoomClosed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

/// A state change notification pushed to the subscribers of one room.
///
/// Events are facts about things that already happened. They are never
/// persisted and never replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEvent {
    #[serde(flatten)]
    pub data: EventData,
    pub timestamp: DateTime<Utc>,
}

impl RoomEvent {
    pub fn new(data: EventData) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn connected() -> Self {
        Self::new(EventData::Connected {
            message: "Connected to room".to_string(),
        })
    }

    pub fn participant_joined(participant: Participant, total_participants: usize) -> Self {
        Self::new(EventData::ParticipantJoined {
            participant,
            total_participants,
        })
    }

    pub fn participant_left(participant: &Participant) -> Self {
        Self::new(EventData::ParticipantLeft {
            participant_id: participant.id.clone(),
            participant_name: participant.name.clone(),
        })
    }

    pub fn vote_cast(participant: &Participant, category_id: &str, vote: VoteValue) -> Self {
        Self::new(EventData::VoteCast {
            participant_id: participant.id.clone(),
            participant_name: participant.name.clone(),
            category_id: category_id.to_string(),
            vote,
        })
    }

    pub fn voting_started() -> Self {
        Self::new(EventData::VotingStarted {})
    }

    pub fn voting_completed() -> Self {
        Self::new(EventData::VotingCompleted {})
    }

    pub fn room_closed(reason: Option<String>) -> Self {
        Self::new(EventData::RoomClosed { reason })
    }

    /// Get the wire name of the event kind
    pub fn event_type(&self) -> &'static str {
        match self.data {
            EventData::Connected { .. } => "connected",
            EventData::ParticipantJoined { .. } => "participant_joined",
            EventData::ParticipantLeft { .. } => "participant_left",
            EventData::VoteCast { .. } => "vote_cast",
            EventData::VotingStarted {} => "voting_started",
            EventData::VotingCompleted {} => "voting_completed",
            EventData::RoomClosed { .. } => "room_closed",
        }
    }
}
