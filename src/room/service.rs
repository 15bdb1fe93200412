use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::{
    models::{Participant, Room, RoomCode, RoomStatus, RoomVote, VoteValue},
    repository::{InsertRoomResult, RoomHandle, RoomRepository},
    types::{required_field, VotingProgress},
};
use crate::event::{EventBus, RoomEvent, RoomSubscription};
use crate::shared::AppError;

/// Reason attached to `room_closed` when the expiry sweep removes a room
pub const INACTIVITY_REASON: &str = "inactivity";

/// Result of a participant leaving a room
#[derive(Debug, Clone)]
pub enum LeaveRoomResult {
    /// The participant left, returns the updated room
    Success(Room),
    /// The last participant left and the room was deleted
    RoomDeleted,
}

/// Room lifecycle controller: `waiting → voting → completed`.
///
/// Every mutation runs under the room's own lock and emits its event before
/// the lock is released, so subscribers observe events in mutation order and
/// a rejected operation never leaves a partial change behind.
pub struct RoomService {
    repository: Arc<dyn RoomRepository + Send + Sync>,
    event_bus: EventBus,
}

fn room_not_found(code: &RoomCode) -> AppError {
    AppError::NotFound(format!("Room {} not found", code))
}

fn participant_not_found(participant_id: &str) -> AppError {
    AppError::NotFound(format!("Participant {} not found in room", participant_id))
}

impl RoomService {
    pub fn new(repository: Arc<dyn RoomRepository + Send + Sync>, event_bus: EventBus) -> Self {
        Self {
            repository,
            event_bus,
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    async fn handle(&self, code: &RoomCode) -> Result<RoomHandle, AppError> {
        self.repository
            .get_handle(code)
            .await?
            .ok_or_else(|| room_not_found(code))
    }

    /// Emits `room_closed`, then deletes the room and its subscriber set.
    /// Must be called with the room's lock held.
    async fn close_room(
        &self,
        slot: &mut Option<Room>,
        code: &RoomCode,
        reason: Option<String>,
    ) -> Result<(), AppError> {
        self.event_bus
            .emit_to_room(code, RoomEvent::room_closed(reason));
        *slot = None;
        self.event_bus.close_room(code);
        self.repository.remove_room(code).await?;
        Ok(())
    }

    /// Creates a new room with a fresh code; the host is its first participant
    #[instrument(skip(self))]
    pub async fn create_room(
        &self,
        team_name: &str,
        host_name: &str,
    ) -> Result<(Room, Participant), AppError> {
        let team_name = required_field(Some(team_name.to_string()), "teamName")?;
        let host_name = required_field(Some(host_name.to_string()), "hostName")?;

        let host = Participant::new(host_name);
        let mut room = Room::new(RoomCode::generate(), team_name, host.clone());

        loop {
            let snapshot = room.clone();
            match self.repository.insert_room(room).await? {
                InsertRoomResult::Inserted(_) => {
                    info!(
                        room_code = %snapshot.code,
                        host_id = %host.id,
                        "Room created successfully"
                    );
                    return Ok((snapshot, host));
                }
                InsertRoomResult::CodeTaken(mut taken) => {
                    debug!(room_code = %taken.code, "Room code collision, resampling");
                    taken.code = RoomCode::generate();
                    room = taken;
                }
            }
        }
    }

    /// Gets a consistent snapshot of the room
    #[instrument(skip(self))]
    pub async fn get_room(&self, code: &RoomCode) -> Result<Room, AppError> {
        let handle = self.handle(code).await?;
        let slot = handle.lock().await;
        slot.clone().ok_or_else(|| room_not_found(code))
    }

    /// Lists snapshots of every live room
    #[instrument(skip(self))]
    pub async fn list_rooms(&self) -> Result<Vec<Room>, AppError> {
        let mut rooms = Vec::new();
        for code in self.repository.list_codes().await? {
            if let Some(handle) = self.repository.get_handle(&code).await? {
                if let Some(room) = handle.lock().await.clone() {
                    rooms.push(room);
                }
            }
        }

        debug!(room_count = rooms.len(), "Rooms listed");
        Ok(rooms)
    }

    /// Adds a participant to a waiting room
    #[instrument(skip(self))]
    pub async fn join_room(
        &self,
        code: &RoomCode,
        participant_name: &str,
    ) -> Result<(Room, Participant), AppError> {
        let participant_name = required_field(Some(participant_name.to_string()), "participantName")?;

        let handle = self.handle(code).await?;
        let mut slot = handle.lock().await;
        let room = slot.as_mut().ok_or_else(|| room_not_found(code))?;

        if room.status != RoomStatus::Waiting {
            debug!(room_code = %code, status = %room.status, "Join rejected, voting already started");
            return Err(AppError::InvalidState(format!(
                "Room {} is no longer accepting participants",
                code
            )));
        }

        let participant = Participant::new(participant_name);
        room.add_participant(participant.clone());

        self.event_bus.emit_to_room(
            code,
            RoomEvent::participant_joined(participant.clone(), room.participants.len()),
        );

        info!(
            room_code = %code,
            participant_id = %participant.id,
            participant_count = room.participants.len(),
            "Participant joined room"
        );

        Ok((room.clone(), participant))
    }

    /// Removes a participant and their votes.
    ///
    /// Deletes the room when the last participant leaves.
    #[instrument(skip(self))]
    pub async fn leave_room(
        &self,
        code: &RoomCode,
        participant_id: &str,
    ) -> Result<LeaveRoomResult, AppError> {
        let handle = self.handle(code).await?;
        let mut slot = handle.lock().await;
        let room = slot.as_mut().ok_or_else(|| room_not_found(code))?;

        let was_host = room.is_host(participant_id);
        let departed = room
            .remove_participant(participant_id)
            .ok_or_else(|| participant_not_found(participant_id))?;

        if room.is_empty() {
            info!(room_code = %code, "Last participant left, deleting room");
            self.close_room(&mut slot, code, None).await?;
            return Ok(LeaveRoomResult::RoomDeleted);
        }

        if was_host {
            info!(
                room_code = %code,
                old_host = %departed.id,
                new_host = %room.host_id,
                "Host left, assigned new host"
            );
        }

        self.event_bus
            .emit_to_room(code, RoomEvent::participant_left(&departed));

        info!(
            room_code = %code,
            participant_id = %departed.id,
            participant_count = room.participants.len(),
            "Participant left room"
        );

        Ok(LeaveRoomResult::Success(room.clone()))
    }

    /// Records a vote, overwriting any earlier vote for the same category
    #[instrument(skip(self))]
    pub async fn submit_vote(
        &self,
        code: &RoomCode,
        participant_id: &str,
        category_id: &str,
        vote: VoteValue,
    ) -> Result<RoomVote, AppError> {
        let category_id = required_field(Some(category_id.to_string()), "categoryId")?;

        let handle = self.handle(code).await?;
        let mut slot = handle.lock().await;
        let room = slot.as_mut().ok_or_else(|| room_not_found(code))?;

        if room.status != RoomStatus::Voting {
            debug!(room_code = %code, status = %room.status, "Vote rejected, room is not voting");
            return Err(AppError::InvalidState(format!(
                "Room {} is not accepting votes",
                code
            )));
        }

        let participant = room
            .participant(participant_id)
            .cloned()
            .ok_or_else(|| participant_not_found(participant_id))?;

        let room_vote = RoomVote {
            participant_id: participant.id.clone(),
            participant_name: participant.name.clone(),
            category_id: category_id.clone(),
            vote,
            timestamp: Utc::now(),
        };
        room.upsert_vote(room_vote.clone());

        self.event_bus.emit_to_room(
            code,
            RoomEvent::vote_cast(&participant, &category_id, vote),
        );

        debug!(
            room_code = %code,
            participant_id = %participant.id,
            category_id = %category_id,
            vote = %vote,
            "Vote recorded"
        );

        Ok(room_vote)
    }

    /// Moves a waiting room into voting. Only the host may do this.
    #[instrument(skip(self))]
    pub async fn start_voting(&self, code: &RoomCode, requester_id: &str) -> Result<(), AppError> {
        let handle = self.handle(code).await?;
        let mut slot = handle.lock().await;
        let room = slot.as_mut().ok_or_else(|| room_not_found(code))?;

        if !room.is_host(requester_id) {
            warn!(room_code = %code, requester_id = %requester_id, "Non-host tried to start voting");
            return Err(AppError::Unauthorized(
                "Only the host can start voting".to_string(),
            ));
        }

        if room.status != RoomStatus::Waiting {
            return Err(AppError::InvalidState(format!(
                "Room {} has already started voting",
                code
            )));
        }

        room.status = RoomStatus::Voting;
        self.event_bus
            .emit_to_room(code, RoomEvent::voting_started());

        info!(
            room_code = %code,
            participant_count = room.participants.len(),
            "Voting started"
        );
        Ok(())
    }

    /// Marks voting as finished
    #[instrument(skip(self))]
    pub async fn complete_voting(&self, code: &RoomCode) -> Result<(), AppError> {
        let handle = self.handle(code).await?;
        let mut slot = handle.lock().await;
        let room = slot.as_mut().ok_or_else(|| room_not_found(code))?;

        if room.status != RoomStatus::Voting {
            return Err(AppError::InvalidState(format!(
                "Room {} is not voting",
                code
            )));
        }

        room.status = RoomStatus::Completed;
        self.event_bus
            .emit_to_room(code, RoomEvent::voting_completed());

        info!(room_code = %code, vote_count = room.votes.len(), "Voting completed");
        Ok(())
    }

    /// Deletes every room older than `max_age`, returns how many were removed
    #[instrument(skip(self))]
    pub async fn cleanup_expired(&self, max_age: Duration) -> Result<usize, AppError> {
        let now = Utc::now();
        let mut deleted_count = 0;

        for code in self.repository.list_codes().await? {
            let Some(handle) = self.repository.get_handle(&code).await? else {
                continue;
            };
            let mut slot = handle.lock().await;
            let expired = slot
                .as_ref()
                .is_some_and(|room| room.age_at(now) > max_age);

            if expired {
                self.close_room(&mut slot, &code, Some(INACTIVITY_REASON.to_string()))
                    .await?;
                deleted_count += 1;
                info!(room_code = %code, "Deleted inactive room");
            }
        }

        Ok(deleted_count)
    }

    /// Registers a live subscriber for a room.
    ///
    /// The snapshot and the registration are taken under the room's lock, so
    /// each mutation is either in the snapshot or delivered as an event.
    #[instrument(skip(self))]
    pub async fn subscribe(&self, code: &RoomCode) -> Result<(Room, RoomSubscription), AppError> {
        let handle = self.handle(code).await?;
        let slot = handle.lock().await;
        let room = slot.clone().ok_or_else(|| room_not_found(code))?;

        let subscription = self.event_bus.subscribe_to_room(code);
        debug!(
            room_code = %code,
            subscriber_id = subscription.subscriber_id(),
            "Subscribed to room events"
        );

        Ok((room, subscription))
    }

    /// Per-participant vote counts for deciding when voting is complete
    #[instrument(skip(self))]
    pub async fn voting_progress(&self, code: &RoomCode) -> Result<VotingProgress, AppError> {
        let room = self.get_room(code).await?;
        Ok(VotingProgress::from_room(&room))
    }
}
