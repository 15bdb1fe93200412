use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::{
    models::{Room, RoomCode, VoteValue},
    types::{
        required_field, JoinRoomRequest, ParticipantRequest, RoomCreateRequest,
        RoomMembershipResponse, SuccessResponse, VoteRequest, VotingProgress,
    },
};
use crate::shared::{AppError, AppState};

/// Normalizes a room code taken from the URL; malformed codes cannot exist
pub(crate) fn parse_room_code(raw: &str) -> Result<RoomCode, AppError> {
    RoomCode::parse(raw).ok_or_else(|| AppError::NotFound(format!("Room {} not found", raw)))
}

/// HTTP handler for creating a new room
///
/// POST /api/rooms
/// Returns the room and the host participant
#[instrument(name = "create_room", skip(state))]
pub async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<RoomCreateRequest>,
) -> Result<Json<RoomMembershipResponse>, AppError> {
    let (room, participant) = state
        .room_service
        .create_room(
            request.team_name.as_deref().unwrap_or_default(),
            request.host_name.as_deref().unwrap_or_default(),
        )
        .await?;

    info!(room_code = %room.code, "Room created via API");
    Ok(Json(RoomMembershipResponse { room, participant }))
}

/// GET /api/rooms/:code
#[instrument(name = "get_room", skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Room>, AppError> {
    let code = parse_room_code(&code)?;
    let room = state.room_service.get_room(&code).await?;
    Ok(Json(room))
}

/// POST /api/rooms/:code/join
#[instrument(name = "join_room", skip(state))]
pub async fn join_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<RoomMembershipResponse>, AppError> {
    let code = parse_room_code(&code)?;

    let (room, participant) = state
        .room_service
        .join_room(&code, request.participant_name.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(RoomMembershipResponse { room, participant }))
}

/// POST /api/rooms/:code/leave
#[instrument(name = "leave_room", skip(state))]
pub async fn leave_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<ParticipantRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let participant_id = required_field(request.participant_id, "participantId")?;
    let code = parse_room_code(&code)?;

    state
        .room_service
        .leave_room(&code, &participant_id)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/rooms/:code/start
///
/// The requester must be the current host.
#[instrument(name = "start_voting", skip(state))]
pub async fn start_voting(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<ParticipantRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let requester_id = required_field(request.participant_id, "participantId")?;
    let code = parse_room_code(&code)?;

    state
        .room_service
        .start_voting(&code, &requester_id)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/rooms/:code/vote
#[instrument(name = "submit_vote", skip(state))]
pub async fn submit_vote(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let participant_id = required_field(request.participant_id, "participantId")?;
    let vote: VoteValue = required_field(request.vote, "vote")?.parse()?;
    let code = parse_room_code(&code)?;

    state
        .room_service
        .submit_vote(
            &code,
            &participant_id,
            request.category_id.as_deref().unwrap_or_default(),
            vote,
        )
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/rooms/:code/complete
#[instrument(name = "complete_voting", skip(state))]
pub async fn complete_voting(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let code = parse_room_code(&code)?;
    state.room_service.complete_voting(&code).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// GET /api/rooms/:code/progress
#[instrument(name = "voting_progress", skip(state))]
pub async fn voting_progress(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<VotingProgress>, AppError> {
    let code = parse_room_code(&code)?;
    let progress = state.room_service.voting_progress(&code).await?;
    Ok(Json(progress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::models::RoomStatus;
    use crate::room::repository::InMemoryRoomRepository;
    use crate::routes::build_router;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    fn app() -> (Router, AppState) {
        let state = AppStateBuilder::new().build();
        (build_router(state.clone()), state)
    }

    async fn post(app: &Router, uri: &str, body: Value) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn get(app: &Router, uri: &str) -> Response {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn create(app: &Router) -> RoomMembershipResponse {
        let response = post(
            app,
            "/api/rooms",
            json!({ "teamName": "Platform", "hostName": "Hana" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        serde_json::from_value(body_json(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_create_room_handler() {
        let (app, _) = app();
        let created = create(&app).await;

        assert_eq!(created.room.team_name, "Platform");
        assert_eq!(created.room.host_id, created.participant.id);
        assert_eq!(created.participant.name, "Hana");
        assert_eq!(created.room.status, RoomStatus::Waiting);
    }

    #[tokio::test]
    async fn test_create_room_handler_missing_fields() {
        let (app, _) = app();

        let response = post(&app, "/api/rooms", json!({ "teamName": "Platform" })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "hostName is required" })
        );
    }

    #[tokio::test]
    async fn test_create_room_handler_stores_room_in_repository() {
        let repository = Arc::new(InMemoryRoomRepository::new());
        let state = AppStateBuilder::new()
            .with_room_repository(repository.clone())
            .build();
        let app = build_router(state);

        create(&app).await;
        assert_eq!(repository.room_count(), 1);

        let response = post(&app, "/api/rooms", json!({ "teamName": " ", "hostName": "Hana" })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(repository.room_count(), 1);
    }

    #[tokio::test]
    async fn test_join_and_vote_handlers_reject_blank_fields() {
        let (app, _) = app();
        let created = create(&app).await;
        let code = created.room.code.clone();

        let response = post(&app, &format!("/api/rooms/{}/join", code), json!({})).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "participantName is required" })
        );

        let response = post(
            &app,
            &format!("/api/rooms/{}/vote", code),
            json!({ "participantId": created.participant.id, "categoryId": "", "vote": "red" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "categoryId is required" })
        );
    }

    #[tokio::test]
    async fn test_create_room_handler_malformed_json() {
        let (app, _) = app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/rooms")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"teamName": "x"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_room_normalizes_code() {
        let (app, _) = app();
        let created = create(&app).await;
        let lower = created.room.code.as_str().to_ascii_lowercase();

        let response = get(&app, &format!("/api/rooms/{}", lower)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let room: Room = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(room.code, created.room.code);
    }

    #[tokio::test]
    async fn test_get_unknown_room_is_404() {
        let (app, _) = app();
        assert_eq!(get(&app, "/api/rooms/ZZZZZZ").await.status(), StatusCode::NOT_FOUND);
        assert_eq!(get(&app, "/api/rooms/bad").await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_join_and_leave_handlers() {
        let (app, state) = app();
        let created = create(&app).await;
        let code = created.room.code.clone();

        let response = post(
            &app,
            &format!("/api/rooms/{}/join", code),
            json!({ "participantName": "Pia" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let joined: RoomMembershipResponse =
            serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(joined.room.participants.len(), 2);

        let response = post(
            &app,
            &format!("/api/rooms/{}/leave", code),
            json!({ "participantId": joined.participant.id }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "success": true }));

        let room = state.room_service.get_room(&code).await.unwrap();
        assert_eq!(room.participants.len(), 1);
    }

    #[tokio::test]
    async fn test_leave_unknown_participant_is_404() {
        let (app, _) = app();
        let created = create(&app).await;

        let response = post(
            &app,
            &format!("/api/rooms/{}/leave", created.room.code),
            json!({ "participantId": "ghost" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_start_voting_handler_rejects_non_host() {
        let (app, _) = app();
        let created = create(&app).await;
        let code = created.room.code.clone();
        let joined = post(
            &app,
            &format!("/api/rooms/{}/join", code),
            json!({ "participantName": "Pia" }),
        )
        .await;
        let joined: RoomMembershipResponse =
            serde_json::from_value(body_json(joined).await).unwrap();

        let response = post(
            &app,
            &format!("/api/rooms/{}/start", code),
            json!({ "participantId": joined.participant.id }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = post(
            &app,
            &format!("/api/rooms/{}/start", code),
            json!({ "participantId": created.participant.id }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        // Joining a room that is already voting conflicts with its state
        let response = post(
            &app,
            &format!("/api/rooms/{}/join", code),
            json!({ "participantName": "Late" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_vote_handler_validates_vote_value() {
        let (app, _) = app();
        let created = create(&app).await;
        let code = created.room.code.clone();
        post(
            &app,
            &format!("/api/rooms/{}/start", code),
            json!({ "participantId": created.participant.id }),
        )
        .await;

        let response = post(
            &app,
            &format!("/api/rooms/{}/vote", code),
            json!({
                "participantId": created.participant.id,
                "categoryId": "fun",
                "vote": "purple"
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = post(
            &app,
            &format!("/api/rooms/{}/vote", code),
            json!({
                "participantId": created.participant.id,
                "categoryId": "fun",
                "vote": "green"
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get(&app, &format!("/api/rooms/{}/progress", code)).await;
        let progress: VotingProgress =
            serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(progress.participants[0].votes_cast, 1);
    }

    #[tokio::test]
    async fn test_vote_before_start_conflicts() {
        let (app, _) = app();
        let created = create(&app).await;

        let response = post(
            &app,
            &format!("/api/rooms/{}/vote", created.room.code),
            json!({
                "participantId": created.participant.id,
                "categoryId": "fun",
                "vote": "red"
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_complete_voting_handler() {
        let (app, state) = app();
        let created = create(&app).await;
        let code = created.room.code.clone();

        let response = post(&app, &format!("/api/rooms/{}/complete", code), json!({})).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        state
            .room_service
            .start_voting(&code, &created.participant.id)
            .await
            .unwrap();
        let response = post(&app, &format!("/api/rooms/{}/complete", code), json!({})).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            state.room_service.get_room(&code).await.unwrap().status,
            RoomStatus::Completed
        );
    }
}
