// Live per-participant event streams over Server-Sent Events

// Public API
pub use handler::{room_events, EventStreamQuery};
pub use session::StreamSession;

// Internal modules
mod handler;
mod session;
