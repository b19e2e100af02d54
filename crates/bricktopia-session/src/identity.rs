//! The identity collaborator: who is making this request?
//!
//! Bricktopia doesn't authenticate players itself. It calls an
//! [`IdentityService`] with the caller's bearer token and trusts the
//! [`Identity`] that comes back. [`SignedTokenIdentity`] is the bundled
//! implementation: HMAC-SHA256 signed tokens minted by whatever account
//! service shares the secret.

use std::future::Future;

use bricktopia_protocol::PlayerId;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{MemoryProfiles, SessionError};

type HmacSha256 = Hmac<Sha256>;

/// A validated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: PlayerId,
    pub display_name: String,
}

/// Validates a caller's token and returns their identity.
///
/// `Send + Sync + 'static` because one instance is shared by every request
/// handler for the lifetime of the server.
///
/// # Example
///
/// ```rust
/// use bricktopia_protocol::PlayerId;
/// use bricktopia_session::{Identity, IdentityService, SessionError};
///
/// /// Accepts any non-empty token and uses it as the player id.
/// /// Development only.
/// struct DevIdentity;
///
/// impl IdentityService for DevIdentity {
///     async fn validate(&self, token: &str) -> Result<Identity, SessionError> {
///         if token.is_empty() {
///             return Err(SessionError::InvalidToken);
///         }
///         Ok(Identity {
///             user_id: PlayerId::new(token),
///             display_name: token.to_string(),
///         })
///     }
/// }
/// ```
pub trait IdentityService: Send + Sync + 'static {
    /// # Returns
    /// - `Ok(Identity)`: the token is valid
    /// - `Err(SessionError::AuthFailed | InvalidToken)`: the caller is
    ///   not who they claim to be
    /// - any other error: the service itself failed
    fn validate(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Identity, SessionError>> + Send;
}

/// Stateless HMAC-SHA256 tokens of the form
/// `hex(user_id).hex(display_name).hex(signature)`.
///
/// The signature covers the first two segments. Hex keeps the separator
/// unambiguous whatever characters the id or name contain.
#[derive(Clone)]
pub struct SignedTokenIdentity {
    secret: Vec<u8>,
    profiles: Option<MemoryProfiles>,
}

impl SignedTokenIdentity {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            profiles: None,
        }
    }

    /// Records the display name of every validated caller in `profiles`,
    /// so the profile store knows everyone who has ever authenticated.
    pub fn with_profiles(mut self, profiles: MemoryProfiles) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Mints a token for `user_id`. Used by account tooling and tests.
    ///
    /// # Errors
    /// [`SessionError::Unavailable`] if the secret is unusable as a key.
    pub fn issue(
        &self,
        user_id: &PlayerId,
        display_name: &str,
    ) -> Result<String, SessionError> {
        let claims = format!(
            "{}.{}",
            hex::encode(user_id.as_str()),
            hex::encode(display_name)
        );
        let mut mac = self.mac()?;
        mac.update(claims.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(format!("{claims}.{signature}"))
    }

    /// A bad key is the service's fault, never the caller's.
    fn mac(&self) -> Result<HmacSha256, SessionError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|e| {
            SessionError::Unavailable {
                collaborator: "identity service",
                reason: format!("unusable signing key: {e}"),
            }
        })
    }

    fn verify(&self, token: &str) -> Result<Identity, SessionError> {
        let (claims, signature) =
            token.rsplit_once('.').ok_or(SessionError::InvalidToken)?;
        let (id_hex, name_hex) =
            claims.split_once('.').ok_or(SessionError::InvalidToken)?;
        let signature =
            hex::decode(signature).map_err(|_| SessionError::InvalidToken)?;

        let mut mac = self.mac()?;
        mac.update(claims.as_bytes());
        mac.verify_slice(&signature).map_err(|_| {
            SessionError::AuthFailed("signature mismatch".into())
        })?;

        let user_id = decode_utf8(id_hex)?;
        let display_name = decode_utf8(name_hex)?;
        if user_id.is_empty() {
            return Err(SessionError::AuthFailed("empty user id".into()));
        }
        Ok(Identity {
            user_id: PlayerId::new(user_id),
            display_name,
        })
    }
}

fn decode_utf8(segment: &str) -> Result<String, SessionError> {
    let bytes = hex::decode(segment).map_err(|_| SessionError::InvalidToken)?;
    String::from_utf8(bytes).map_err(|_| SessionError::InvalidToken)
}

impl IdentityService for SignedTokenIdentity {
    async fn validate(&self, token: &str) -> Result<Identity, SessionError> {
        let identity = self.verify(token.trim())?;
        if let Some(profiles) = &self.profiles {
            profiles
                .insert(identity.user_id.clone(), identity.display_name.clone())
                .await;
        }
        Ok(identity)
    }
}
