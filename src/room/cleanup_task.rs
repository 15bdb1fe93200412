use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, instrument};

use super::service::RoomService;

/// Configuration for the cleanup task
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupConfig {
    /// How often to run the cleanup task
    pub cleanup_interval: Duration,
    /// How old a room must be before deletion
    pub max_room_age: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(60 * 60), // 1 hour
            max_room_age: Duration::from_secs(24 * 60 * 60), // 24 hours
        }
    }
}

/// Starts the background cleanup task that periodically removes expired rooms
#[instrument(skip(room_service))]
pub async fn start_cleanup_task(room_service: Arc<RoomService>, config: CleanupConfig) {
    info!(
        cleanup_interval_secs = config.cleanup_interval.as_secs(),
        max_room_age_secs = config.max_room_age.as_secs(),
        "Starting room cleanup background task"
    );

    let mut cleanup_interval = interval(config.cleanup_interval);
    cleanup_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; nothing can be expired at startup
    cleanup_interval.tick().await;

    loop {
        cleanup_interval.tick().await;
        run_cleanup(&room_service, config.max_room_age).await;
    }
}

/// Runs one sweep, returns how many rooms were deleted
async fn run_cleanup(room_service: &RoomService, max_room_age: Duration) -> usize {
    info!("Running room cleanup task");

    match room_service.cleanup_expired(max_room_age).await {
        Ok(deleted_count) => {
            info!(deleted_count = deleted_count, "Room cleanup completed");
            deleted_count
        }
        Err(e) => {
            error!(error = %e, "Room cleanup task failed");
            0
        }
    }
}
