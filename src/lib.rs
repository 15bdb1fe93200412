// Library crate for the team health check server
// This file exposes the public API for integration tests

pub mod config;
pub mod event;
pub mod room;
pub mod routes;
pub mod shared;
pub mod stream;

// Re-export commonly used types for easier access in tests
pub use config::ServerConfig;
pub use event::{EventBus, EventData, RoomEvent, RoomSubscription};
pub use room::{
    models::{Participant, Room, RoomCode, RoomStatus, RoomVote, VoteValue},
    repository::{InMemoryRoomRepository, RoomRepository},
    LeaveRoomResult, RoomService,
};
pub use routes::build_router;
pub use shared::{AppError, AppState};
pub use stream::StreamSession;
