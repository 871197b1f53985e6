//! Authentication gate — per-request credential resolution.
//!
//! The gate never fails a request: every way a credential can be wrong
//! (missing, malformed, bad signature, expired, revoked, dangling subject)
//! collapses to [`AuthContext::Anonymous`]. Operations that need an identity
//! call [`AuthContext::require`] and reject explicitly.

use std::sync::Arc;

use crate::account::User;
use crate::error::{AuthError, Result};
use crate::revocation::RevocationStore;
use crate::store::CredentialStore;
use crate::token::TokenCodec;

/// Outcome of credential resolution for one request.
#[derive(Debug, Clone)]
pub enum AuthContext {
    Authenticated {
        user: User,
        /// The exact token string presented, kept for logout revocation.
        token: String,
    },
    Anonymous,
}

impl AuthContext {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated { user, .. } => Some(user),
            Self::Anonymous => None,
        }
    }

    /// The resolved identity and its token, or [`AuthError::AuthenticationRequired`].
    pub fn require(&self) -> Result<(&User, &str)> {
        match self {
            Self::Authenticated { user, token } => Ok((user, token)),
            Self::Anonymous => Err(AuthError::AuthenticationRequired),
        }
    }
}

/// Read-only pipeline turning a raw `Authorization` header value into an
/// [`AuthContext`].
pub struct AuthGate {
    codec: TokenCodec,
    store: Arc<dyn CredentialStore>,
    revocations: Arc<dyn RevocationStore>,
}

impl AuthGate {
    pub fn new(
        codec: TokenCodec,
        store: Arc<dyn CredentialStore>,
        revocations: Arc<dyn RevocationStore>,
    ) -> Self {
        Self {
            codec,
            store,
            revocations,
        }
    }

    /// Resolve an optional `Authorization` header into an identity context.
    ///
    /// Reads the revocation and credential stores; writes nothing.
    pub async fn authenticate(&self, authorization: Option<&str>) -> AuthContext {
        let Some(header) = authorization else {
            return AuthContext::Anonymous;
        };
        let Some(token) = bearer_token(header) else {
            return AuthContext::Anonymous;
        };
        let Ok(claims) = self.codec.verify(token) else {
            return AuthContext::Anonymous;
        };
        match self.revocations.is_revoked(token).await {
            Ok(false) => {}
            // Revoked, or the store could not answer: stay anonymous.
            _ => return AuthContext::Anonymous,
        }
        match self.store.find_by_id(&claims.sub).await {
            Ok(Some(user)) => AuthContext::Authenticated {
                user,
                token: token.to_string(),
            },
            _ => AuthContext::Anonymous,
        }
    }
}

/// Extract the token from a `Bearer <token>` header value.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
