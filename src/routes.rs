use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::room;
use crate::shared::AppState;
use crate::stream;

/// Builds the HTTP surface over the room service
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/rooms", post(room::create_room))
        .route("/api/rooms/:code", get(room::get_room))
        .route("/api/rooms/:code/join", post(room::join_room))
        .route("/api/rooms/:code/leave", post(room::leave_room))
        .route("/api/rooms/:code/start", post(room::start_voting))
        .route("/api/rooms/:code/vote", post(room::submit_vote))
        .route("/api/rooms/:code/complete", post(room::complete_voting))
        .route("/api/rooms/:code/progress", get(room::voting_progress))
        .route("/api/rooms/:code/events", get(stream::room_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
