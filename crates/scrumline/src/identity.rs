//! Contract for the external identity/organisation provider.
//!
//! The surrounding web application authenticates requests against a hosted
//! identity service; this crate only consumes the result. The provider
//! resolves an opaque session token into an [`ActorContext`] and answers
//! membership queries used for assignee selection and admin checks.
//!
//! # Test Utilities
//!
//! [`StaticIdentity`] is a deterministic in-memory implementation available
//! in tests or behind the `test-util` feature, so downstream code can
//! exercise the service without a real identity backend.

use crate::domain::{ActorContext, Member, OrgId};
use crate::error::Result;
use async_trait::async_trait;

/// Identity/organisation collaborator.
///
/// Implementations must be `Send + Sync`; the service holds one as a trait
/// object.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a session token into the acting user and their role in the
    /// currently selected organisation.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Unauthenticated`] when no actor can
    /// be resolved for the token.
    async fn resolve(&self, session_token: &str) -> Result<ActorContext>;

    /// List the members of an organisation (`user id -> role`), used for
    /// assignee dropdowns and admin checks.
    async fn organisation_members(&self, org: &OrgId) -> Result<Vec<Member>>;
}

#[cfg(any(test, feature = "test-util"))]
pub use test_util::StaticIdentity;

#[cfg(any(test, feature = "test-util"))]
mod test_util {
    use super::{ActorContext, IdentityProvider, Member, OrgId, Result};
    use crate::error::Error;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Deterministic [`IdentityProvider`] backed by fixed maps.
    ///
    /// Unknown session tokens resolve to `Unauthenticated`; unknown
    /// organisations have no members.
    #[derive(Debug, Default)]
    pub struct StaticIdentity {
        sessions: HashMap<String, ActorContext>,
        members: HashMap<OrgId, Vec<Member>>,
    }

    impl StaticIdentity {
        /// Create an empty provider.
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a session token resolving to the given actor, and add
        /// the actor to their organisation's membership list.
        pub fn with_session(mut self, token: &str, actor: ActorContext) -> Self {
            self.members
                .entry(actor.organisation_id.clone())
                .or_default()
                .push(Member {
                    user_id: actor.user_id.clone(),
                    role: actor.role,
                });
            self.sessions.insert(token.to_string(), actor);
            self
        }
    }

    #[async_trait]
    impl IdentityProvider for StaticIdentity {
        async fn resolve(&self, session_token: &str) -> Result<ActorContext> {
            self.sessions
                .get(session_token)
                .cloned()
                .ok_or(Error::Unauthenticated)
        }

        async fn organisation_members(&self, org: &OrgId) -> Result<Vec<Member>> {
            Ok(self.members.get(org).cloned().unwrap_or_default())
        }
    }
}
