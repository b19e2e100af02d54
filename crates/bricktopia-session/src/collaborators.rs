//! Bounded calls to the external collaborators.
//!
//! Every identity and profile lookup goes through [`Collaborators`], which
//! puts a deadline on it. A slow collaborator becomes a
//! [`SessionError::Timeout`], never a hung request.

use std::time::Duration;

use bricktopia_protocol::PlayerId;
use serde::Deserialize;

use crate::{Identity, IdentityService, ProfileStore, SessionError};

/// Collaborator call settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollaboratorConfig {
    /// Upper bound on any single identity or profile call.
    pub timeout_ms: u64,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self { timeout_ms: 3000 }
    }
}

impl CollaboratorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// An identity service and a profile store, with timeouts applied.
pub struct Collaborators<I, P> {
    identity: I,
    profiles: P,
    timeout: Duration,
}

impl<I: IdentityService, P: ProfileStore> Collaborators<I, P> {
    pub fn new(identity: I, profiles: P, config: &CollaboratorConfig) -> Self {
        Self {
            identity,
            profiles,
            timeout: config.timeout(),
        }
    }

    /// Validates a bearer token.
    ///
    /// # Errors
    /// - [`SessionError::AuthFailed`] / [`SessionError::InvalidToken`]
    ///   when the token is rejected
    /// - [`SessionError::Timeout`] when the identity service is too slow
    /// - whatever else the identity service reports
    pub async fn authenticate(
        &self,
        token: &str,
    ) -> Result<Identity, SessionError> {
        match tokio::time::timeout(self.timeout, self.identity.validate(token))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "identity service timed out"
                );
                Err(SessionError::Timeout {
                    collaborator: "identity service",
                })
            }
        }
    }

    /// Resolves the name to show for `user_id`.
    ///
    /// Never fails: if the profile store errors or times out, the visibly
    /// synthetic [`PlayerId::placeholder_name`] is returned instead and a
    /// warning is logged.
    pub async fn display_name_or_placeholder(&self, user_id: &PlayerId) -> String {
        let lookup =
            tokio::time::timeout(self.timeout, self.profiles.display_name(user_id))
                .await;
        match lookup {
            Ok(Ok(name)) => name,
            Ok(Err(e)) => {
                tracing::warn!(
                    player = %user_id,
                    error = %e,
                    "profile lookup failed, using placeholder name"
                );
                user_id.placeholder_name()
            }
            Err(_) => {
                tracing::warn!(
                    player = %user_id,
                    "profile lookup timed out, using placeholder name"
                );
                user_id.placeholder_name()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryProfiles, SignedTokenIdentity};

    /// A collaborator that never answers.
    struct Stalled;

    impl IdentityService for Stalled {
        async fn validate(&self, _token: &str) -> Result<Identity, SessionError> {
            std::future::pending().await
        }
    }

    impl ProfileStore for Stalled {
        async fn display_name(
            &self,
            _user_id: &PlayerId,
        ) -> Result<String, SessionError> {
            std::future::pending().await
        }
    }

    fn config() -> CollaboratorConfig {
        CollaboratorConfig { timeout_ms: 50 }
    }

    #[tokio::test(start_paused = true)]
    async fn test_authenticate_stalled_identity_times_out() {
        let collaborators = Collaborators::new(Stalled, MemoryProfiles::new(), &config());

        let result = collaborators.authenticate("anything").await;

        assert!(matches!(result, Err(SessionError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_authenticate_passes_rejection_through() {
        let collaborators = Collaborators::new(
            SignedTokenIdentity::new("k"),
            MemoryProfiles::new(),
            &config(),
        );

        let err = collaborators.authenticate("bogus").await.unwrap_err();

        assert!(err.is_rejection());
    }

    #[tokio::test(start_paused = true)]
    async fn test_display_name_stalled_store_falls_back_to_placeholder() {
        let collaborators =
            Collaborators::new(SignedTokenIdentity::new("k"), Stalled, &config());
        let id = PlayerId::new("abcdef0123456789");

        let name = collaborators.display_name_or_placeholder(&id).await;

        assert_eq!(name, "player-abcdef01");
    }

    #[tokio::test]
    async fn test_display_name_missing_profile_falls_back_to_placeholder() {
        let collaborators = Collaborators::new(
            SignedTokenIdentity::new("k"),
            MemoryProfiles::new(),
            &config(),
        );
        let name = collaborators
            .display_name_or_placeholder(&PlayerId::new("u-9"))
            .await;
        assert_eq!(name, "player-u-9");
    }

    #[tokio::test]
    async fn test_display_name_known_profile_is_used() {
        let profiles = MemoryProfiles::new();
        profiles.insert(PlayerId::new("u-1"), "alice".into()).await;
        let collaborators =
            Collaborators::new(SignedTokenIdentity::new("k"), profiles, &config());

        let name = collaborators
            .display_name_or_placeholder(&PlayerId::new("u-1"))
            .await;

        assert_eq!(name, "alice");
    }
}
