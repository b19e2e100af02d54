//! Error types for the Bricktopia service.
//!
//! Two layers:
//!
//! - [`BricktopiaError`] wraps every crate's error for code that drives
//!   the server (startup, config, binding).
//! - [`ApiError`] is what a request handler returns. It carries an
//!   [`ErrorKind`] and renders as a status code plus an [`ErrorBody`].

use axum::Json;
use axum::extract::rejection::{BytesRejection, JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bricktopia_chat::ChatError;
use bricktopia_protocol::ErrorKind;
use bricktopia_protocol::ProtocolError;
use bricktopia_protocol::api::ErrorBody;
use bricktopia_room::RoomError;
use bricktopia_session::SessionError;

use crate::config::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BricktopiaError {
    /// A protocol-level error (encode, decode, invalid room code).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An identity or profile collaborator error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (full, not found, forbidden).
    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Binding or serving failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A failed request, as the client sees it.
#[derive(Debug)]
pub struct ApiError {
    kind: ErrorKind,
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: status_for(kind),
            message: message.into(),
        }
    }

    /// An unexpected fault. The detail is logged; the client only sees a
    /// generic message.
    pub fn internal(context: &str, detail: impl std::fmt::Display) -> Self {
        tracing::error!(context, error = %detail, "internal error");
        Self::new(ErrorKind::Internal, "internal error")
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Full | ErrorKind::AlreadyInRoom | ErrorKind::NotInRoom => {
            StatusCode::CONFLICT
        }
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::UnknownAction => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::EmptyBody | ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::CollaboratorUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody::new(self.kind, self.message))).into_response()
    }
}

impl From<RoomError> for ApiError {
    fn from(err: RoomError) -> Self {
        let kind = match &err {
            RoomError::NotFound(_) => ErrorKind::NotFound,
            RoomError::Full(_) => ErrorKind::Full,
            RoomError::AlreadyInRoom { .. } => ErrorKind::AlreadyInRoom,
            RoomError::NotInRoom(_) => ErrorKind::NotInRoom,
            RoomError::Forbidden(_) => ErrorKind::Forbidden,
            RoomError::UnknownAction(_) => ErrorKind::UnknownAction,
            RoomError::Chat(ChatError::EmptyBody) => ErrorKind::EmptyBody,
            RoomError::Chat(ChatError::InvalidColor(_)) => ErrorKind::InvalidInput,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        if err.is_rejection() {
            return Self::unauthorized(err.to_string());
        }
        tracing::warn!(error = %err, "collaborator failure");
        Self::new(ErrorKind::CollaboratorUnavailable, err.to_string())
    }
}

impl From<ProtocolError> for ApiError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Encode(e) => Self::internal("encode", e),
            other => Self::invalid_input(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Keeps the rejection's status, e.g. 413 for an oversized body.
        Self {
            kind: ErrorKind::InvalidInput,
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid_input(rejection.body_text())
    }
}
