//! `BricktopiaServer` builder and serve loop.
//!
//! Ties the layers together: collaborators → gateway → HTTP/WebSocket
//! routes, with the reaper running beside the listener.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use bricktopia_room::{Reaper, RoomRegistry, SharedRegistry};
use bricktopia_session::{Collaborators, IdentityService, ProfileStore};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::{self, AppState};
use crate::config::{LimitsConfig, ServerConfig};
use crate::gateway::SessionGateway;
use crate::{BricktopiaError, ws};

/// Builds the router for a gateway. Exposed so tests can drive it
/// in-process without binding a socket.
pub fn build_app<I: IdentityService, P: ProfileStore>(
    state: AppState<I, P>,
    limits: &LimitsConfig,
) -> Router {
    Router::new()
        .route("/health", get(api::health::<I, P>))
        .route("/rooms", get(api::list_rooms::<I, P>))
        .route("/room", post(api::create_room::<I, P>))
        .route("/room/quick-join", post(api::quick_join::<I, P>))
        .route("/room/{code}", get(api::room_detail::<I, P>))
        .route("/room/{code}/join", post(api::join_room::<I, P>))
        .route("/room/{code}/leave", post(api::leave_room::<I, P>))
        .route("/room/{code}/action", post(api::room_action::<I, P>))
        .route(
            "/room/{code}/chat",
            post(api::post_chat::<I, P>).get(api::poll_chat::<I, P>),
        )
        .route("/room/{code}/chat/ws", get(ws::chat_socket::<I, P>))
        .layer(DefaultBodyLimit::max(limits.max_payload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Builder for configuring and starting a Bricktopia server.
///
/// # Example
///
/// ```rust,ignore
/// let server = BricktopiaServerBuilder::new()
///     .config(config)
///     .build(identity, profiles)
///     .await?;
/// server.run().await
/// ```
pub struct BricktopiaServerBuilder {
    config: ServerConfig,
}

impl BricktopiaServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides only the listen address.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.listen_addr = addr.to_string();
        self
    }

    /// Validates the config, binds the listener and assembles the
    /// registry, collaborators and gateway.
    pub async fn build<I: IdentityService, P: ProfileStore>(
        self,
        identity: I,
        profiles: P,
    ) -> Result<BricktopiaServer<I, P>, BricktopiaError> {
        let config = self.config;
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).await?;
        let registry =
            RoomRegistry::new(config.rooms.clone(), config.chat.clone()).shared();
        let collaborators = Collaborators::new(identity, profiles, &config.collaborators);
        let gateway =
            SessionGateway::new(collaborators, registry.clone(), config.chat.clone());

        Ok(BricktopiaServer {
            listener,
            registry,
            state: AppState::new(gateway),
            config,
        })
    }
}

impl Default for BricktopiaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Bricktopia server. Call [`run`](Self::run) to start serving.
pub struct BricktopiaServer<I, P> {
    listener: TcpListener,
    registry: SharedRegistry,
    state: AppState<I, P>,
    config: ServerConfig,
}

impl<I: IdentityService, P: ProfileStore> BricktopiaServer<I, P> {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Serves until Ctrl-C.
    pub async fn run(self) -> Result<(), BricktopiaError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await
    }

    /// Serves until `shutdown` resolves, then stops the reaper.
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), BricktopiaError> {
        let reaper = Reaper::spawn(self.registry.clone(), self.config.rooms.reaper());
        let app = build_app(self.state, &self.config.limits);

        tracing::info!(addr = %self.listener.local_addr()?, "Bricktopia server running");
        let served = axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        reaper.shutdown().await;
        tracing::info!("Bricktopia server stopped");
        Ok(served?)
    }
}
