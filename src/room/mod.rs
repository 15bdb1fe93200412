// Public API - what other modules can use
pub use cleanup_task::{start_cleanup_task, CleanupConfig};
pub use handlers::{
    complete_voting, create_room, get_room, join_room, leave_room, start_voting, submit_vote,
    voting_progress,
};
pub use service::{LeaveRoomResult, RoomService, INACTIVITY_REASON};

// Internal modules
mod cleanup_task;
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;

pub(crate) use handlers::parse_room_code;
