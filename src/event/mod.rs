// Event distribution for room state changes
//
// The bus is the only link between the room lifecycle and the live streams:
// mutations emit events here and every subscriber of the room gets a copy.

// Public API - what other modules can use
pub use bus::{EventBus, RoomSubscription, DEFAULT_SUBSCRIBER_CAPACITY};
pub use events::{EventData, RoomEvent};

// Internal modules
mod bus;
mod events;
