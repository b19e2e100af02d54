//! HTTP handlers.
//!
//! Each handler parses its inputs, calls the [`SessionGateway`] and maps
//! the outcome to JSON. Failures are always an [`ApiError`].

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection, QueryRejection};
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use bricktopia_protocol::api::{
    ActionRequest, ActionResult, CreateRoomRequest, HealthResponse,
    LeaveResponse, PollQuery, PollResponse, PostChatRequest,
    PostChatResponse, RoomListResponse,
};
use bricktopia_protocol::{RoomCode, RoomDetail};
use bricktopia_session::{Identity, IdentityService, ProfileStore};
use serde::Deserialize;

use crate::ApiError;
use crate::gateway::SessionGateway;

/// Shared handler state.
pub struct AppState<I, P> {
    pub gateway: Arc<SessionGateway<I, P>>,
}

impl<I, P> AppState<I, P> {
    pub fn new(gateway: SessionGateway<I, P>) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}

// Derived Clone would require I: Clone and P: Clone.
impl<I, P> Clone for AppState<I, P> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

/// The authenticated caller of a request.
///
/// Reads `Authorization: Bearer <token>`, falling back to a `token` query
/// parameter for WebSocket upgrades, where browsers can't set headers.
pub struct Caller(pub Identity);

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    header.or_else(|| {
        Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.token)
    })
}

impl<I, P> FromRequestParts<AppState<I, P>> for Caller
where
    I: IdentityService,
    P: ProfileStore,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<I, P>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts);
        let identity = state.gateway.authenticate(token.as_deref()).await?;
        Ok(Caller(identity))
    }
}

/// Parses a room code path segment. Malformed codes are `InvalidInput`.
pub(crate) fn room_code(raw: &str) -> Result<RoomCode, ApiError> {
    Ok(RoomCode::parse(raw)?)
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

/// `POST /room`. An empty body means a public room.
pub async fn create_room<I: IdentityService, P: ProfileStore>(
    State(state): State<AppState<I, P>>,
    Caller(caller): Caller,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<RoomDetail>, ApiError> {
    let body = body?;
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CreateRoomRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::invalid_input(format!("invalid request body: {e}")))?
    };
    let room = state.gateway.create_room(&caller, request.visibility).await?;
    Ok(Json(room))
}

pub async fn quick_join<I: IdentityService, P: ProfileStore>(
    State(state): State<AppState<I, P>>,
    Caller(caller): Caller,
) -> Result<Json<RoomDetail>, ApiError> {
    Ok(Json(state.gateway.quick_join(&caller).await?))
}

pub async fn join_room<I: IdentityService, P: ProfileStore>(
    State(state): State<AppState<I, P>>,
    Caller(caller): Caller,
    Path(code): Path<String>,
) -> Result<Json<RoomDetail>, ApiError> {
    let code = room_code(&code)?;
    Ok(Json(state.gateway.join_room(&caller, &code).await?))
}

/// `POST /room/{code}/leave`. Always 200 for a well-formed code.
pub async fn leave_room<I: IdentityService, P: ProfileStore>(
    State(state): State<AppState<I, P>>,
    Caller(caller): Caller,
    Path(code): Path<String>,
) -> Result<Json<LeaveResponse>, ApiError> {
    let code = room_code(&code)?;
    let left = state.gateway.leave_room(&caller, &code).await;
    Ok(Json(LeaveResponse { left }))
}

/// `GET /rooms`. No authentication.
pub async fn list_rooms<I: IdentityService, P: ProfileStore>(
    State(state): State<AppState<I, P>>,
) -> Json<RoomListResponse> {
    Json(RoomListResponse {
        rooms: state.gateway.list_rooms().await,
    })
}

pub async fn room_detail<I: IdentityService, P: ProfileStore>(
    State(state): State<AppState<I, P>>,
    Caller(caller): Caller,
    Path(code): Path<String>,
) -> Result<Json<RoomDetail>, ApiError> {
    let code = room_code(&code)?;
    Ok(Json(state.gateway.room_detail(&caller, &code).await?))
}

pub async fn room_action<I: IdentityService, P: ProfileStore>(
    State(state): State<AppState<I, P>>,
    Caller(caller): Caller,
    Path(code): Path<String>,
    body: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<ActionResult>, ApiError> {
    let code = room_code(&code)?;
    let Json(request) = body?;
    Ok(Json(state.gateway.act(&caller, &code, request).await?))
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

pub async fn post_chat<I: IdentityService, P: ProfileStore>(
    State(state): State<AppState<I, P>>,
    Caller(caller): Caller,
    Path(code): Path<String>,
    body: Result<Json<PostChatRequest>, JsonRejection>,
) -> Result<Json<PostChatResponse>, ApiError> {
    let code = room_code(&code)?;
    let Json(request) = body?;
    Ok(Json(state.gateway.post_chat(&caller, &code, request).await?))
}

pub async fn poll_chat<I: IdentityService, P: ProfileStore>(
    State(state): State<AppState<I, P>>,
    Caller(caller): Caller,
    Path(code): Path<String>,
    query: Result<Query<PollQuery>, QueryRejection>,
) -> Result<Json<PollResponse>, ApiError> {
    let code = room_code(&code)?;
    let Query(query) = query?;
    let poll = state
        .gateway
        .poll_chat(&caller, &code, query.after, query.limit)
        .await?;
    Ok(Json(poll))
}

pub async fn health<I: IdentityService, P: ProfileStore>(
    State(state): State<AppState<I, P>>,
) -> Json<HealthResponse> {
    Json(state.gateway.health().await)
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(uri: &str, auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_prefers_header() {
        let p = parts("/room/abcdef/chat/ws?token=from-query", Some("Bearer from-header"));
        assert_eq!(bearer_token(&p).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_bearer_token_falls_back_to_query() {
        let p = parts("/room/abcdef/chat/ws?token=from-query", None);
        assert_eq!(bearer_token(&p).as_deref(), Some("from-query"));
    }

    #[test]
    fn test_bearer_token_ignores_other_schemes() {
        let p = parts("/rooms", Some("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&p), None);
    }

    #[test]
    fn test_room_code_rejects_malformed() {
        let err = room_code("no!").unwrap_err();
        assert_eq!(err.kind(), bricktopia_protocol::ErrorKind::InvalidInput);
        assert!(room_code("ABCDEF").is_ok());
    }
}
