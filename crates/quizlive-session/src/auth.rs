//! Authentication hook for resolving connection tokens to identities.
//!
//! Quizlive doesn't implement authentication itself — that belongs to your
//! auth provider (JWT validation, an auth API, a database lookup). The
//! engine defines the [`Authenticator`] trait and calls it once per
//! connection during the handshake; everything after that works with the
//! returned [`Identity`].

use std::sync::atomic::{AtomicU64, Ordering};

use quizlive_protocol::PlayerId;

use crate::SessionError;

/// A resolved connection identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Per-connection player id, minted by the session layer.
    pub player_id: PlayerId,

    /// Stable user identity, when the token carries one. `None` for
    /// anonymous/guest connections. Rooms use this to re-attach a
    /// returning player to their existing record instead of creating a
    /// duplicate.
    pub user_id: Option<String>,
}

/// Validates a client's handshake token and returns who they are.
///
/// `Send + Sync + 'static`: the authenticator is shared across connection
/// handler tasks for the lifetime of the server.
pub trait Authenticator: Send + Sync + 'static {
    /// Resolves the handshake token to an [`Identity`], or rejects it.
    ///
    /// `token` is `None` when the client connected without a credential;
    /// implementations decide whether guests are allowed.
    ///
    /// # Errors
    /// [`SessionError::AuthFailed`] when the token is invalid, expired, or
    /// guests are not accepted.
    fn authenticate(
        &self,
        token: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Identity, SessionError>> + Send;
}

/// Counter backing [`GuestAuthenticator`] player ids.
static NEXT_PLAYER_ID: AtomicU64 = AtomicU64::new(1);

/// Accepts every connection and mints a fresh [`PlayerId`] for it.
///
/// A non-empty token is used verbatim as the stable user id, which is
/// enough for development and for exercising the re-join path in tests.
/// Never use this in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuestAuthenticator;

impl Authenticator for GuestAuthenticator {
    async fn authenticate(&self, token: Option<&str>) -> Result<Identity, SessionError> {
        let player_id = PlayerId(NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed));
        let user_id = token
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string());
        Ok(Identity { player_id, user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guest_authenticate_mints_unique_player_ids() {
        let auth = GuestAuthenticator;
        let a = auth.authenticate(None).await.unwrap();
        let b = auth.authenticate(None).await.unwrap();
        assert_ne!(a.player_id, b.player_id);
    }

    #[tokio::test]
    async fn test_guest_authenticate_without_token_is_anonymous() {
        let auth = GuestAuthenticator;
        let id = auth.authenticate(None).await.unwrap();
        assert_eq!(id.user_id, None);
    }

    #[tokio::test]
    async fn test_guest_authenticate_token_becomes_user_id() {
        let auth = GuestAuthenticator;
        let id = auth.authenticate(Some("ada")).await.unwrap();
        assert_eq!(id.user_id.as_deref(), Some("ada"));
    }

    #[tokio::test]
    async fn test_guest_authenticate_empty_token_is_anonymous() {
        let auth = GuestAuthenticator;
        let id = auth.authenticate(Some("")).await.unwrap();
        assert_eq!(id.user_id, None);
    }
}
