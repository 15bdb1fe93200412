use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, error, instrument, warn};

use super::models::{Room, RoomCode};
use crate::shared::AppError;

/// Exclusive access point to one room's state.
///
/// `None` marks a room that was deleted while someone still held the handle;
/// such a room must be treated as not found.
pub type RoomHandle = Arc<Mutex<Option<Room>>>;

/// Result of attempting to register a new room
#[derive(Debug)]
pub enum InsertRoomResult {
    /// The room is stored under its code
    Inserted(RoomHandle),
    /// Another live room already uses the code; the room is handed back
    CodeTaken(Room),
}

/// Trait for room registry operations
///
/// The registry only stores rooms; lifecycle rules live in the room service.
#[async_trait]
pub trait RoomRepository {
    async fn insert_room(&self, room: Room) -> Result<InsertRoomResult, AppError>;
    async fn get_handle(&self, code: &RoomCode) -> Result<Option<RoomHandle>, AppError>;
    async fn list_codes(&self) -> Result<Vec<RoomCode>, AppError>;

    /// Removes the room stored under `code`, returns whether one was present
    async fn remove_room(&self, code: &RoomCode) -> Result<bool, AppError>;
}

/// In-memory implementation of RoomRepository
///
/// The map lock is only held to look up or swap handles. Room mutations go
/// through the per-room mutex, so unrelated rooms never contend.
pub struct InMemoryRoomRepository {
    rooms: RwLock<HashMap<RoomCode, RoomHandle>>,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the current number of rooms in the repository
    pub fn room_count(&self) -> usize {
        self.rooms.read().map(|rooms| rooms.len()).unwrap_or(0)
    }
}

fn poisoned() -> AppError {
    error!("Room registry lock poisoned");
    AppError::Internal
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self, room), fields(room_code = %room.code))]
    async fn insert_room(&self, room: Room) -> Result<InsertRoomResult, AppError> {
        let mut rooms = self.rooms.write().map_err(|_| poisoned())?;
        if rooms.contains_key(&room.code) {
            warn!("Room code already in use");
            return Ok(InsertRoomResult::CodeTaken(room));
        }

        let code = room.code.clone();
        let handle: RoomHandle = Arc::new(Mutex::new(Some(room)));
        rooms.insert(code, Arc::clone(&handle));

        debug!(room_count = rooms.len(), "Room stored in memory");
        Ok(InsertRoomResult::Inserted(handle))
    }

    #[instrument(skip(self))]
    async fn get_handle(&self, code: &RoomCode) -> Result<Option<RoomHandle>, AppError> {
        let rooms = self.rooms.read().map_err(|_| poisoned())?;
        let handle = rooms.get(code).cloned();

        if handle.is_none() {
            debug!(room_code = %code, "Room not found in memory");
        }
        Ok(handle)
    }

    #[instrument(skip(self))]
    async fn list_codes(&self) -> Result<Vec<RoomCode>, AppError> {
        let rooms = self.rooms.read().map_err(|_| poisoned())?;
        Ok(rooms.keys().cloned().collect())
    }

    #[instrument(skip(self))]
    async fn remove_room(&self, code: &RoomCode) -> Result<bool, AppError> {
        let mut rooms = self.rooms.write().map_err(|_| poisoned())?;
        let removed = rooms.remove(code).is_some();

        debug!(room_code = %code, removed, "Room removed from memory");
        Ok(removed)
    }
}
