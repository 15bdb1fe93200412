//! Test assertion helpers - fluent API for verifying streamed events
#![allow(dead_code)] // Test utilities may not all be used in every test

use teamhealth::{EventData, RoomEvent};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct EventAssertion<'a> {
    setup: &'a mut TestSetup,
    names: Vec<String>,
}

impl<'a> EventAssertion<'a> {
    /// Create an assertion for every connected stream
    pub fn for_all_streams(setup: &'a mut TestSetup) -> Self {
        let mut names: Vec<String> = setup.streams.keys().cloned().collect();
        names.sort();
        Self { setup, names }
    }

    /// Create an assertion for specific streams
    pub fn for_streams(setup: &'a mut TestSetup, names: Vec<&str>) -> Self {
        let names = names.into_iter().map(|s| s.to_string()).collect();
        Self { setup, names }
    }

    /// Assert that every stream's next event has the given type (consumes it)
    pub fn received_event_type(self, expected_type: &str) -> EventData {
        let mut events: Vec<RoomEvent> = vec![];

        for name in &self.names {
            let stream = self
                .setup
                .streams
                .get_mut(name)
                .unwrap_or_else(|| panic!("{} has no stream", name));
            let event = stream.try_recv();
            assert!(event.is_some(), "{} should have received an event", name);

            let event = event.unwrap();
            assert_eq!(
                event.event_type(),
                expected_type,
                "{} received wrong event type",
                name
            );
            events.push(event);
        }

        // Fan-out delivers the same event to everyone
        for (i, event) in events.iter().enumerate().skip(1) {
            assert_eq!(
                event, &events[0],
                "{} event differs from {}",
                self.names[i], self.names[0]
            );
        }

        events
            .into_iter()
            .next()
            .map(|e| e.data)
            .expect("at least one stream to assert on")
    }

    /// Assert that no stream has a pending event
    pub fn received_no_events(self) {
        for name in &self.names {
            let stream = self.setup.streams.get_mut(name).unwrap();
            let pending = stream.try_recv();
            assert!(
                pending.is_none(),
                "{} should not have received any events, got {:?}",
                name,
                pending
            );
        }
    }
}
