use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName},
    response::{
        sse::{KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::session::StreamSession;
use crate::room::parse_room_code;
use crate::shared::{AppError, AppState};

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStreamQuery {
    /// When set, closing the stream removes this participant from the room
    pub participant_id: Option<String>,
}

/// Server-Sent-Events endpoint streaming a room's events
///
/// GET /api/rooms/:code/events
/// The first frame is always a `connected` event for this stream only.
#[instrument(name = "room_events", skip(state))]
pub async fn room_events(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<EventStreamQuery>,
) -> Result<Response, AppError> {
    let code = parse_room_code(&code)?;
    let (room, subscription) = state.room_service.subscribe(&code).await?;

    let participant_id = query.participant_id.filter(|id| !id.is_empty());
    if let Some(id) = &participant_id {
        if !room.has_participant(id) {
            warn!(room_code = %code, participant_id = %id, "Event stream requested for unknown participant");
            return Err(AppError::NotFound(format!(
                "Participant {} not found in room",
                id
            )));
        }
    }

    info!(
        room_code = %code,
        participant_count = room.participants.len(),
        status = %room.status,
        "Event stream opened"
    );

    let mut session = StreamSession::new(subscription);
    if let Some(participant_id) = participant_id {
        session = session.leave_on_disconnect(Arc::clone(&state.room_service), participant_id);
    }

    let sse = Sse::new(session.into_sse_stream())
        .keep_alive(KeepAlive::new().interval(state.keep_alive));

    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (X_ACCEL_BUFFERING, "no"),
        ],
        sse,
    )
        .into_response())
}
