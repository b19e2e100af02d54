//! The session gateway: authenticated callers in, registry and chat calls
//! out.
//!
//! Handlers never touch the registry directly. Every operation here takes
//! an [`Identity`] that was already validated by [`SessionGateway::authenticate`]
//! and returns an [`ApiError`] carrying a machine-readable kind on failure.

use bricktopia_chat::{Author, ChatConfig, PushSender, SubscriberId};
use bricktopia_protocol::api::{
    ActionRequest, ActionResult, HealthResponse, PollResponse,
    PostChatRequest, PostChatResponse,
};
use bricktopia_protocol::{
    ChatKind, ChatMessage, RoomCode, RoomDetail, RoomSummary, Visibility,
};
use bricktopia_room::{
    ChatChannel, Matchmaker, Member, RoomError, SharedRegistry,
};
use bricktopia_session::{Collaborators, Identity, IdentityService, ProfileStore};

use crate::ApiError;

/// Name reported by the health endpoint.
pub const SERVICE_NAME: &str = "bricktopia";

pub struct SessionGateway<I, P> {
    collaborators: Collaborators<I, P>,
    registry: SharedRegistry,
    matchmaker: Matchmaker,
    chat: ChatChannel,
    chat_config: ChatConfig,
}

impl<I: IdentityService, P: ProfileStore> SessionGateway<I, P> {
    pub fn new(
        collaborators: Collaborators<I, P>,
        registry: SharedRegistry,
        chat_config: ChatConfig,
    ) -> Self {
        Self {
            collaborators,
            matchmaker: Matchmaker::new(registry.clone()),
            chat: ChatChannel::new(registry.clone()),
            registry,
            chat_config,
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn chat_config(&self) -> &ChatConfig {
        &self.chat_config
    }

    /// Validates a bearer token. A missing token is `Unauthorized`; an
    /// identity service that is slow or down is `CollaboratorUnavailable`.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Identity, ApiError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
        Ok(self.collaborators.authenticate(token).await?)
    }

    /// Builds the member record for a caller. The display name comes from
    /// the profile store, not from anything the client sent, and is
    /// resolved before the registry lock is taken.
    async fn member(&self, caller: &Identity) -> Member {
        let name = self
            .collaborators
            .display_name_or_placeholder(&caller.user_id)
            .await;
        Member::new(caller.user_id.clone(), name)
    }

    pub async fn create_room(
        &self,
        caller: &Identity,
        visibility: Visibility,
    ) -> Result<RoomDetail, ApiError> {
        let member = self.member(caller).await;
        Ok(self.matchmaker.create_room(member, visibility).await?)
    }

    pub async fn join_room(
        &self,
        caller: &Identity,
        code: &RoomCode,
    ) -> Result<RoomDetail, ApiError> {
        let member = self.member(caller).await;
        Ok(self.matchmaker.join_room(code, member).await?)
    }

    pub async fn quick_join(&self, caller: &Identity) -> Result<RoomDetail, ApiError> {
        let member = self.member(caller).await;
        Ok(self.matchmaker.quick_join(member).await?)
    }

    /// Leaves `code`. `false` means the caller was not a member, which is
    /// not an error.
    pub async fn leave_room(&self, caller: &Identity, code: &RoomCode) -> bool {
        self.matchmaker.leave(code, &caller.user_id).await
    }

    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        self.registry.lock().await.list_public_open()
    }

    /// Public rooms are visible to anyone, private rooms only to members.
    pub async fn room_detail(
        &self,
        caller: &Identity,
        code: &RoomCode,
    ) -> Result<RoomDetail, ApiError> {
        let registry = self.registry.lock().await;
        let room = registry.get(code)?;
        if !room.visibility().is_public() && !room.is_member(&caller.user_id) {
            return Err(RoomError::Forbidden(format!("room {code} is private")).into());
        }
        Ok(room.detail())
    }

    /// Records a member's action and echoes it back with the resulting
    /// state. The payload is passed through untouched.
    pub async fn act(
        &self,
        caller: &Identity,
        code: &RoomCode,
        request: ActionRequest,
    ) -> Result<ActionResult, ApiError> {
        let state = self.registry.lock().await.apply_action(
            code,
            &caller.user_id,
            &request.kind,
            request.payload.clone(),
        )?;
        Ok(ActionResult {
            room_id: code.clone(),
            actor: caller.user_id.clone(),
            kind: request.kind,
            payload: request.payload,
            state,
        })
    }

    /// Resolves the chat author for a caller inside `code`, using the name
    /// stored on the room.
    ///
    /// # Errors
    /// `NotFound` for a missing room, `Forbidden` for a non-member.
    pub async fn chat_author(
        &self,
        caller: &Identity,
        code: &RoomCode,
    ) -> Result<Author, ApiError> {
        let registry = self.registry.lock().await;
        let room = registry.get(code)?;
        let member = room
            .member(&caller.user_id)
            .ok_or_else(|| ApiError::forbidden(format!("not a member of room {code}")))?;
        Ok(Author::player(&member.id, member.display_name.clone()))
    }

    pub async fn post_chat(
        &self,
        caller: &Identity,
        code: &RoomCode,
        request: PostChatRequest,
    ) -> Result<PostChatResponse, ApiError> {
        let message = self
            .post_as(caller, code, &request.body, request.kind, request.color.as_deref())
            .await?;
        Ok(PostChatResponse {
            id: message.id,
            timestamp: message.timestamp,
        })
    }

    /// Posts on behalf of a member.
    pub async fn post_as(
        &self,
        caller: &Identity,
        code: &RoomCode,
        body: &str,
        kind: ChatKind,
        color: Option<&str>,
    ) -> Result<ChatMessage, ApiError> {
        if kind == ChatKind::System {
            return Err(ApiError::invalid_input("system messages are reserved for the server"));
        }
        let author = self.chat_author(caller, code).await?;
        Ok(self.chat.post(code, &author, body, kind, color).await?)
    }

    pub async fn poll_chat(
        &self,
        caller: &Identity,
        code: &RoomCode,
        after: u64,
        limit: Option<usize>,
    ) -> Result<PollResponse, ApiError> {
        let poll = self
            .chat
            .poll(code, &caller.user_id, after, self.chat_config.poll_limit(limit))
            .await?;
        Ok(PollResponse {
            messages: poll.messages,
            latest_timestamp: poll.latest_timestamp,
        })
    }

    /// Registers a push connection. The sender receives a `history` frame
    /// first, then live frames.
    pub async fn subscribe(
        &self,
        code: &RoomCode,
        author: &Author,
        sender: PushSender,
    ) -> Result<SubscriberId, ApiError> {
        Ok(self.chat.subscribe(code, author, sender).await?)
    }

    pub async fn unsubscribe(&self, code: &RoomCode, id: SubscriberId, author: &Author) -> bool {
        self.chat.unsubscribe(code, id, author).await
    }

    pub async fn health(&self) -> HealthResponse {
        let registry = self.registry.lock().await;
        HealthResponse {
            status: "ok".to_string(),
            service: SERVICE_NAME.to_string(),
            active_rooms: registry.room_count(),
            active_players: registry.player_count(),
        }
    }
}
