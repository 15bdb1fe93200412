use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::shared::AppError;

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Short room identifier: six characters from `[A-Z0-9]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    pub const LENGTH: usize = 6;

    /// Samples a random code. Uniqueness is the registry's concern.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = (0..Self::LENGTH)
            .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Normalizes user input to uppercase and checks the code shape
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_ascii_uppercase();
        let valid = normalized.len() == Self::LENGTH
            && normalized
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());

        valid.then_some(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle phase of a room. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Voting,
    Completed,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Voting => "voting",
            RoomStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteValue {
    Green,
    Yellow,
    Red,
}

impl VoteValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteValue::Green => "green",
            VoteValue::Yellow => "yellow",
            VoteValue::Red => "red",
        }
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteValue {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "green" => Ok(VoteValue::Green),
            "yellow" => Ok(VoteValue::Yellow),
            "red" => Ok(VoteValue::Red),
            _ => Err(AppError::BadRequest(
                "vote must be 'green', 'yellow' or 'red'".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    /// Creates a participant with a fresh opaque identifier
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            joined_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomVote {
    pub participant_id: String,
    /// Name of the participant at the time the vote was cast
    pub participant_name: String,
    pub category_id: String,
    pub vote: VoteValue,
    pub timestamp: DateTime<Utc>,
}

/// Authoritative in-memory state of one voting session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub code: RoomCode,
    pub team_name: String,
    pub host_id: String,
    pub participants: Vec<Participant>,
    pub votes: Vec<RoomVote>,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Creates a waiting room whose only participant is the host
    pub fn new(code: RoomCode, team_name: impl Into<String>, host: Participant) -> Self {
        Self {
            code,
            team_name: team_name.into(),
            host_id: host.id.clone(),
            participants: vec![host],
            votes: Vec::new(),
            status: RoomStatus::Waiting,
            created_at: Utc::now(),
        }
    }

    pub fn participant(&self, participant_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }

    pub fn has_participant(&self, participant_id: &str) -> bool {
        self.participant(participant_id).is_some()
    }

    pub fn is_host(&self, participant_id: &str) -> bool {
        self.host_id == participant_id
    }

    pub fn add_participant(&mut self, participant: Participant) {
        if !self.has_participant(&participant.id) {
            self.participants.push(participant);
        }
    }

    /// Removes a participant together with their votes.
    ///
    /// When the host leaves and others remain, the remaining participant with
    /// the earliest `joined_at` becomes host (join order breaks ties).
    pub fn remove_participant(&mut self, participant_id: &str) -> Option<Participant> {
        let index = self
            .participants
            .iter()
            .position(|p| p.id == participant_id)?;
        let removed = self.participants.remove(index);
        self.votes.retain(|v| v.participant_id != participant_id);

        if self.host_id == participant_id {
            if let Some(new_host) = self.participants.iter().min_by_key(|p| p.joined_at) {
                self.host_id = new_host.id.clone();
            }
        }

        Some(removed)
    }

    /// Inserts a vote or overwrites the existing one for the same
    /// (participant, category) pair in place
    pub fn upsert_vote(&mut self, vote: RoomVote) {
        match self.votes.iter_mut().find(|v| {
            v.participant_id == vote.participant_id && v.category_id == vote.category_id
        }) {
            Some(existing) => *existing = vote,
            None => self.votes.push(vote),
        }
    }

    pub fn vote_for(&self, participant_id: &str, category_id: &str) -> Option<&RoomVote> {
        self.votes
            .iter()
            .find(|v| v.participant_id == participant_id && v.category_id == category_id)
    }

    pub fn votes_by(&self, participant_id: &str) -> usize {
        self.votes
            .iter()
            .filter(|v| v.participant_id == participant_id)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Time elapsed since creation, zero if the clock went backwards
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).to_std().unwrap_or_default()
    }
}
