//! The push chat endpoint, `GET /room/{code}/chat/ws`.
//!
//! Authentication and membership are checked before the upgrade, so a
//! rejected caller gets a normal HTTP error. After the upgrade the socket
//! is split: a writer task drains the connection's push queue into the
//! sink while the read loop posts incoming frames to the room.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use bricktopia_chat::{Author, SubscriberId};
use bricktopia_protocol::api::ClientChatFrame;
use bricktopia_protocol::{ChatKind, Codec, JsonCodec, PushFrame, RoomCode};
use bricktopia_session::{Identity, IdentityService, ProfileStore};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::ApiError;
use crate::api::{AppState, Caller, room_code};

pub async fn chat_socket<I: IdentityService, P: ProfileStore>(
    State(state): State<AppState<I, P>>,
    Caller(caller): Caller,
    Path(code): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let code = room_code(&code)?;
    let author = state.gateway.chat_author(&caller, &code).await?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, caller, code, author)))
}

async fn handle_socket<I: IdentityService, P: ProfileStore>(
    socket: WebSocket,
    state: AppState<I, P>,
    caller: Identity,
    code: RoomCode,
    author: Author,
) {
    let (tx, rx) = mpsc::channel(state.gateway.chat_config().subscriber_buffer);
    let id = match state.gateway.subscribe(&code, &author, tx).await {
        Ok(id) => id,
        Err(e) => {
            // The room went away between the upgrade check and now.
            tracing::debug!(room = %code, error = %e, "push subscribe failed");
            return;
        }
    };

    let (sink, mut stream) = socket.split();
    let mut writer = tokio::spawn(write_frames(sink, rx));

    loop {
        tokio::select! {
            // The queue closed: unsubscribed elsewhere, or the room is gone.
            _ = &mut writer => break,
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    handle_client_frame(&state, &caller, &code, id, text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.gateway.unsubscribe(&code, id, &author).await;
    writer.abort();
    tracing::debug!(room = %code, player = %caller.user_id, subscriber = %id, "push connection closed");
}

async fn write_frames(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<PushFrame>,
) {
    while let Some(frame) = rx.recv().await {
        let text = match JsonCodec.encode_text(&frame) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode push frame");
                continue;
            }
        };
        if sink.send(Message::Text(text.into())).await.is_err() {
            return;
        }
    }
    let _ = sink.close().await;
}

/// Posts one client frame. Malformed or empty frames are dropped; the
/// connection stays open.
async fn handle_client_frame<I: IdentityService, P: ProfileStore>(
    state: &AppState<I, P>,
    caller: &Identity,
    code: &RoomCode,
    id: SubscriberId,
    text: &str,
) {
    let frame: ClientChatFrame = match JsonCodec.decode(text.as_bytes()) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(room = %code, subscriber = %id, error = %e, "ignoring malformed chat frame");
            return;
        }
    };
    let posted = state
        .gateway
        .post_as(caller, code, &frame.message, ChatKind::Chat, frame.color.as_deref())
        .await;
    if let Err(e) = posted {
        tracing::debug!(room = %code, subscriber = %id, error = %e, "chat frame rejected");
    }
}
