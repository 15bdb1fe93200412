#![allow(dead_code)] // Test utilities may not all be used in every test

use std::collections::HashMap;
use std::sync::Arc;

use teamhealth::{
    EventBus, InMemoryRoomRepository, Participant, Room, RoomCode, RoomService, RoomSubscription,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub service: Arc<RoomService>,
    pub code: RoomCode,
    /// Host first, then everyone else in join order
    pub participants: Vec<Participant>,
    /// One live event stream per participant name
    pub streams: HashMap<String, RoomSubscription>,
}

pub struct TestSetupBuilder {
    team_name: String,
    host_name: String,
    guests: Vec<String>,
    with_streams: bool,
    subscriber_buffer: usize,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            team_name: "Platform".to_string(),
            host_name: "H".to_string(),
            guests: vec![],
            with_streams: true,
            subscriber_buffer: 64,
        }
    }

    pub fn with_guests(mut self, guests: Vec<&str>) -> Self {
        self.guests = guests.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_guests(self) -> Self {
        self.with_guests(vec!["P1", "P2"])
    }

    pub fn without_streams(mut self) -> Self {
        self.with_streams = false;
        self
    }

    pub fn with_subscriber_buffer(mut self, capacity: usize) -> Self {
        self.subscriber_buffer = capacity;
        self
    }

    pub async fn build(self) -> TestSetup {
        let service = Arc::new(RoomService::new(
            Arc::new(InMemoryRoomRepository::new()),
            EventBus::new(self.subscriber_buffer),
        ));

        let (room, host) = service
            .create_room(&self.team_name, &self.host_name)
            .await
            .unwrap();

        let mut participants = vec![host];
        for guest in &self.guests {
            let (_, participant) = service.join_room(&room.code, guest).await.unwrap();
            participants.push(participant);
        }

        let mut setup = TestSetup {
            service,
            code: room.code,
            participants,
            streams: HashMap::new(),
        };

        if self.with_streams {
            let names: Vec<String> = setup.participants.iter().map(|p| p.name.clone()).collect();
            for name in names {
                setup.connect(&name).await;
                // Drop the per-stream greeting so assertions start clean
                let greeting = setup.streams.get_mut(&name).unwrap().try_recv();
                assert_eq!(greeting.unwrap().event_type(), "connected");
            }
        }

        setup
    }
}

impl TestSetup {
    pub fn participant(&self, name: &str) -> &Participant {
        self.participants
            .iter()
            .find(|p| p.name == name)
            .unwrap_or_else(|| panic!("no participant named {}", name))
    }

    pub fn id_of(&self, name: &str) -> String {
        self.participant(name).id.clone()
    }

    pub async fn room(&self) -> Room {
        self.service.get_room(&self.code).await.unwrap()
    }

    /// Opens an event stream for `name`, replacing any previous one
    pub async fn connect(&mut self, name: &str) {
        let (_, subscription) = self.service.subscribe(&self.code).await.unwrap();
        self.streams.insert(name.to_string(), subscription);
    }

    pub fn disconnect(&mut self, name: &str) {
        self.streams.remove(name);
    }
}
