use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use super::events::RoomEvent;
use crate::room::models::RoomCode;

/// Default queue capacity of a single subscriber
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 256;

type RoomSubscribers = HashMap<u64, mpsc::Sender<RoomEvent>>;

/// Event bus fanning room events out to every subscriber of that room.
///
/// Each subscriber owns a bounded queue. Emission never waits on a
/// subscriber: a full queue drops the event for that subscriber only and a
/// closed queue is pruned.
#[derive(Debug, Clone)]
pub struct EventBus {
    /// Room-specific subscriber queues: room code -> subscriber id -> sender
    room_channels: Arc<Mutex<HashMap<RoomCode, RoomSubscribers>>>,
    next_subscriber_id: Arc<AtomicU64>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_CAPACITY)
    }
}

impl EventBus {
    /// Creates a new event bus with the specified per-subscriber capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            room_channels: Arc::new(Mutex::new(HashMap::new())),
            next_subscriber_id: Arc::new(AtomicU64::new(1)),
            capacity: capacity.max(1),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<RoomCode, RoomSubscribers>> {
        // Critical sections never panic midway, the map is always consistent
        self.room_channels
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new subscriber for a room.
    ///
    /// The returned subscription already holds a `connected` event; nobody
    /// else sees it. Dropping the subscription unsubscribes.
    pub fn subscribe_to_room(&self, room_code: &RoomCode) -> RoomSubscription {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let subscriber_id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);

        // Capacity is at least one, so the greeting always fits
        if sender.try_send(RoomEvent::connected()).is_err() {
            warn!(room_code = %room_code, subscriber_id, "Failed to queue connected event");
        }

        let mut channels = self.channels();
        let subscribers = channels.entry(room_code.clone()).or_default();
        subscribers.insert(subscriber_id, sender);

        debug!(
            room_code = %room_code,
            subscriber_id,
            subscribers = subscribers.len(),
            "Subscriber registered"
        );

        RoomSubscription {
            room_code: room_code.clone(),
            subscriber_id,
            receiver,
            event_bus: self.clone(),
        }
    }

    /// Removes a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, room_code: &RoomCode, subscriber_id: u64) {
        let mut channels = self.channels();
        let Some(subscribers) = channels.get_mut(room_code) else {
            return;
        };

        if subscribers.remove(&subscriber_id).is_some() {
            debug!(room_code = %room_code, subscriber_id, "Subscriber removed");
        }
        if subscribers.is_empty() {
            channels.remove(room_code);
        }
    }

    /// Emits an event to all current subscribers of a specific room
    ///
    /// Returns the number of subscribers the event was queued for.
    pub fn emit_to_room(&self, room_code: &RoomCode, event: RoomEvent) -> usize {
        let mut channels = self.channels();
        let Some(subscribers) = channels.get_mut(room_code) else {
            debug!(
                room_code = %room_code,
                event_type = event.event_type(),
                "Room event emitted with no subscribers"
            );
            return 0;
        };

        let mut delivered = 0;
        subscribers.retain(|subscriber_id, sender| match sender.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(
                    room_code = %room_code,
                    subscriber_id = *subscriber_id,
                    event_type = event.event_type(),
                    "Subscriber queue full, dropping event"
                );
                true
            }
            Err(TrySendError::Closed(_)) => {
                debug!(
                    room_code = %room_code,
                    subscriber_id = *subscriber_id,
                    "Subscriber disconnected, pruning"
                );
                false
            }
        });

        debug!(
            room_code = %room_code,
            event_type = event.event_type(),
            receivers = delivered,
            "Room event emitted"
        );

        if subscribers.is_empty() {
            channels.remove(room_code);
        }
        delivered
    }

    /// Drops every subscriber of a room.
    ///
    /// Events already queued are still delivered; afterwards each
    /// subscription sees the end of its stream.
    pub fn close_room(&self, room_code: &RoomCode) {
        if let Some(subscribers) = self.channels().remove(room_code) {
            debug!(
                room_code = %room_code,
                subscribers = subscribers.len(),
                "Room channel closed"
            );
        }
    }

    pub fn subscriber_count(&self, room_code: &RoomCode) -> usize {
        self.channels().get(room_code).map_or(0, HashMap::len)
    }
}

/// Receiving end of one subscriber's queue
#[derive(Debug)]
pub struct RoomSubscription {
    room_code: RoomCode,
    subscriber_id: u64,
    receiver: mpsc::Receiver<RoomEvent>,
    event_bus: EventBus,
}

impl RoomSubscription {
    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    pub fn subscriber_id(&self) -> u64 {
        self.subscriber_id
    }

    /// Waits for the next event, `None` once the room channel is closed
    pub async fn recv(&mut self) -> Option<RoomEvent> {
        self.receiver.recv().await
    }

    /// Returns the next queued event without waiting
    pub fn try_recv(&mut self) -> Option<RoomEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        self.event_bus
            .unsubscribe(&self.room_code, self.subscriber_id);
    }
}
