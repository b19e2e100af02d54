//! Caller identity for Bricktopia.
//!
//! Bricktopia doesn't store credentials or profiles. It talks to two
//! external collaborators:
//!
//! 1. **[`IdentityService`]**: turns a bearer token into a [`Identity`]
//! 2. **[`ProfileStore`]**: resolves the display name shown for a member
//!
//! Both are traits so production, development and test backends plug in
//! without touching the room or chat layers. [`Collaborators`] wraps a
//! pair of them and adds the bounded timeouts every call must have.
//!
//! # How it fits in the stack
//!
//! ```text
//! Gateway (above)  ← authenticates every request, labels new members
//!     ↕
//! Session Layer (this crate)  ← identity + profile lookups, with timeouts
//!     ↕
//! Protocol Layer (below)  ← provides PlayerId
//! ```

mod collaborators;
mod error;
mod identity;
mod profiles;

pub use collaborators::{CollaboratorConfig, Collaborators};
pub use error::SessionError;
pub use identity::{Identity, IdentityService, SignedTokenIdentity};
pub use profiles::{MemoryProfiles, ProfileStore};
