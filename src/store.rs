//! Credential store — the persistence collaborator for user records.
//!
//! The trait is the contract an application backs with its real database; the
//! important parts are the unique email index and one explicit method per
//! meaningful state transition, each atomic over a single record. Loose
//! partial updates are deliberately not part of the contract: the transition
//! methods are what keep "consume token + apply side effect" a single write.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::account::{Locale, NewUser, User, VerificationState};
use crate::clock::Clock;
use crate::error::{AuthError, Result};

/// User-record persistence. All read-modify-write sequences are scoped to a
/// single record; implementations must make each method atomic per record and
/// enforce a unique index on email.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    async fn find_by_verification_token(&self, token: &str) -> Result<Option<User>>;

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>>;

    /// Create an unverified user. Fails with [`AuthError::EmailTaken`] when
    /// the email is already registered.
    async fn create(&self, new_user: NewUser) -> Result<User>;

    /// Install a fresh verification token, overwriting any prior one.
    async fn set_verification_token(
        &self,
        id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Mark the user verified and clear the verification token fields, as one
    /// update.
    async fn mark_verified(&self, id: &str) -> Result<()>;

    /// Install a fresh reset token, overwriting any prior one.
    async fn set_reset_token(&self, id: &str, token: &str, expires_at: DateTime<Utc>)
        -> Result<()>;

    /// Store a new password hash and clear the reset token fields, as one
    /// update.
    async fn accept_new_password(&self, id: &str, password_hash: &str) -> Result<()>;

    /// Store a new password hash (change-password path).
    async fn set_password(&self, id: &str, password_hash: &str) -> Result<()>;

    /// Update email and names. Fails with [`AuthError::EmailTaken`] when the
    /// new email belongs to another user.
    async fn update_profile(
        &self,
        id: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User>;

    async fn set_locale(&self, id: &str, locale: Locale) -> Result<User>;
}

/// In-memory credential store — the reference implementation backing the test
/// suite and single-process deployments.
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, User>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCredentialStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }

    fn update<T>(&self, id: &str, apply: impl FnOnce(&mut User) -> T) -> Result<T> {
        let mut users = self.users.write();
        let user = users.get_mut(id).ok_or(AuthError::UserNotFound)?;
        Ok(apply(user))
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.read().get(id).cloned())
    }

    async fn find_by_verification_token(&self, token: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.verification.token.as_deref() == Some(token))
            .cloned())
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.reset_password.token.as_deref() == Some(token))
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User> {
        let mut users = self.users.write();
        if users.values().any(|u| u.email == new_user.email) {
            return Err(AuthError::EmailTaken);
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            locale: new_user.locale,
            verification: VerificationState::default(),
            reset_password: Default::default(),
            created_at: self.clock.now(),
        };
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn set_verification_token(
        &self,
        id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.update(id, |user| {
            user.verification.token = Some(token.to_string());
            user.verification.expires_at = Some(expires_at);
        })
    }

    async fn mark_verified(&self, id: &str) -> Result<()> {
        self.update(id, |user| {
            user.verification.verified = true;
            user.verification.token = None;
            user.verification.expires_at = None;
        })
    }

    async fn set_reset_token(
        &self,
        id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.update(id, |user| {
            user.reset_password.token = Some(token.to_string());
            user.reset_password.expires_at = Some(expires_at);
        })
    }

    async fn accept_new_password(&self, id: &str, password_hash: &str) -> Result<()> {
        self.update(id, |user| {
            user.password_hash = password_hash.to_string();
            user.reset_password.token = None;
            user.reset_password.expires_at = None;
        })
    }

    async fn set_password(&self, id: &str, password_hash: &str) -> Result<()> {
        self.update(id, |user| {
            user.password_hash = password_hash.to_string();
        })
    }

    async fn update_profile(
        &self,
        id: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User> {
        let mut users = self.users.write();
        if users.values().any(|u| u.email == email && u.id != id) {
            return Err(AuthError::EmailTaken);
        }
        let user = users.get_mut(id).ok_or(AuthError::UserNotFound)?;
        user.email = email.to_string();
        user.first_name = first_name.to_string();
        user.last_name = last_name.to_string();
        Ok(user.clone())
    }

    async fn set_locale(&self, id: &str, locale: Locale) -> Result<User> {
        self.update(id, |user| {
            user.locale = locale;
            user.clone()
        })
    }
}
