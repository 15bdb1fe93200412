use teamhealth::{AppError, LeaveRoomResult, Participant, VoteValue};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Join a new participant and remember them
    pub async fn join(&mut self, name: &str) -> Result<Participant, AppError> {
        let (_, participant) = self.service.join_room(&self.code, name).await?;
        self.participants.push(participant.clone());
        Ok(participant)
    }

    pub async fn leave(&self, name: &str) -> Result<LeaveRoomResult, AppError> {
        self.service.leave_room(&self.code, &self.id_of(name)).await
    }

    pub async fn start_voting(&self, name: &str) -> Result<(), AppError> {
        self.service.start_voting(&self.code, &self.id_of(name)).await
    }

    pub async fn vote(&self, name: &str, category_id: &str, vote: VoteValue) -> Result<(), AppError> {
        self.service
            .submit_vote(&self.code, &self.id_of(name), category_id, vote)
            .await
            .map(|_| ())
    }

    pub async fn complete_voting(&self) -> Result<(), AppError> {
        self.service.complete_voting(&self.code).await
    }
}
