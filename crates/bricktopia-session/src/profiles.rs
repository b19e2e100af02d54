//! The profile collaborator: what name to show for a member.
//!
//! Room member lists are labelled with names from the [`ProfileStore`],
//! never with names the client sent.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use bricktopia_protocol::PlayerId;
use tokio::sync::RwLock;

use crate::SessionError;

/// Looks up a player's display name.
pub trait ProfileStore: Send + Sync + 'static {
    fn display_name(
        &self,
        user_id: &PlayerId,
    ) -> impl Future<Output = Result<String, SessionError>> + Send;
}

/// An in-process profile directory.
///
/// Cheap to clone: clones share the same map. Pair it with
/// [`SignedTokenIdentity::with_profiles`](crate::SignedTokenIdentity::with_profiles)
/// to learn names as callers authenticate.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfiles {
    names: Arc<RwLock<HashMap<PlayerId, String>>>,
}

impl MemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user_id: PlayerId, display_name: String) {
        self.names.write().await.insert(user_id, display_name);
    }
}

impl ProfileStore for MemoryProfiles {
    async fn display_name(
        &self,
        user_id: &PlayerId,
    ) -> Result<String, SessionError> {
        self.names
            .read()
            .await
            .get(user_id)
            .cloned()
            .ok_or_else(|| SessionError::ProfileNotFound(user_id.clone()))
    }
}
