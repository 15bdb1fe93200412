use axum::response::sse::Event;
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::event::{RoomEvent, RoomSubscription};
use crate::room::{models::RoomCode, RoomService};

/// Participant to remove from the room once the connection goes away
struct Departure {
    room_service: Arc<RoomService>,
    participant_id: String,
}

/// One participant's live connection to a room's events.
///
/// Dropping the session unsubscribes from the event bus immediately. If the
/// session was bound to a participant, the participant also leaves the room.
pub struct StreamSession {
    subscription: RoomSubscription,
    departure: Option<Departure>,
}

impl StreamSession {
    pub fn new(subscription: RoomSubscription) -> Self {
        Self {
            subscription,
            departure: None,
        }
    }

    /// Treats a lost connection the same as an explicit leave
    pub fn leave_on_disconnect(
        mut self,
        room_service: Arc<RoomService>,
        participant_id: String,
    ) -> Self {
        self.departure = Some(Departure {
            room_service,
            participant_id,
        });
        self
    }

    pub fn room_code(&self) -> &RoomCode {
        self.subscription.room_code()
    }

    /// Next event for this participant, `None` once the room is gone
    pub async fn next_event(&mut self) -> Option<RoomEvent> {
        self.subscription.recv().await
    }

    /// Turns the session into an SSE body: one `data:` frame per event
    pub fn into_sse_stream(self) -> impl Stream<Item = Result<Event, Infallible>> + Send {
        stream::unfold(self, |mut session| async move {
            loop {
                let event = session.next_event().await?;
                match Event::default().json_data(&event) {
                    Ok(frame) => return Some((Ok(frame), session)),
                    Err(e) => warn!(
                        room_code = %session.room_code(),
                        event_type = event.event_type(),
                        error = %e,
                        "Failed to serialize room event, skipping"
                    ),
                }
            }
        })
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        let room_code = self.subscription.room_code().clone();
        debug!(
            room_code = %room_code,
            subscriber_id = self.subscription.subscriber_id(),
            "Stream session ended"
        );

        let Some(departure) = self.departure.take() else {
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!(room_code = %room_code, "No runtime to process disconnect, participant kept");
            return;
        };

        runtime.spawn(async move {
            match departure
                .room_service
                .leave_room(&room_code, &departure.participant_id)
                .await
            {
                Ok(_) => info!(
                    room_code = %room_code,
                    participant_id = %departure.participant_id,
                    "Participant removed after disconnect"
                ),
                // Already left explicitly, or the room is gone
                Err(e) => debug!(
                    room_code = %room_code,
                    participant_id = %departure.participant_id,
                    error = %e,
                    "No leave needed after disconnect"
                ),
            }
        });
    }
}
