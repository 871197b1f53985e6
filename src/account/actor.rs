//! AccountActor — Tokio actor for credential-lifecycle operations
//!
//! All mutations are processed sequentially via an mpsc channel; the
//! [`crate::gate::AuthGate`] reads the same collaborators concurrently. Each
//! operation is a short transaction over a single user record.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use identity_core::{
//!     AccountActor, AuthConfig, MemoryCredentialStore, MemoryRevocationStore,
//!     NullMailer, SystemClock,
//! };
//! use identity_core::account::SignUpRequest;
//!
//! #[tokio::main]
//! async fn main() -> identity_core::Result<()> {
//!     let config = AuthConfig::new().with_jwt_secret("my-production-secret");
//!     let clock = Arc::new(SystemClock);
//!     let store = Arc::new(MemoryCredentialStore::new(clock.clone()));
//!     let revocations = Arc::new(MemoryRevocationStore::new(clock.clone()));
//!
//!     let handle = AccountActor::spawn(&config, store, revocations, Arc::new(NullMailer));
//!
//!     let (token, user) = handle
//!         .sign_up(SignUpRequest {
//!             email: "alice@example.com".into(),
//!             password: "SecureP@ss1".into(),
//!             first_name: "Alice".into(),
//!             last_name: "Smith".into(),
//!             locale: Default::default(),
//!         })
//!         .await?;
//!     assert!(!token.is_empty());
//!     assert!(!user.verification.verified);
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::gate::AuthContext;
use crate::mail::MailSender;
use crate::revocation::RevocationStore;
use crate::store::CredentialStore;
use crate::token::{opaque_token, TokenCodec};

use super::types::*;

// ─── Actor Messages ───

enum AccountMsg {
    SignUp {
        req: SignUpRequest,
        reply: oneshot::Sender<Result<(String, User)>>,
    },
    SignIn {
        req: SignInRequest,
        reply: oneshot::Sender<Result<(String, User)>>,
    },
    Logout {
        token: String,
        reply: oneshot::Sender<Result<()>>,
    },
    RequestVerification {
        user_id: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Verify {
        token: String,
        reply: oneshot::Sender<Result<(String, User)>>,
    },
    RequestPasswordReset {
        email: String,
        reply: oneshot::Sender<Result<()>>,
    },
    ApplyNewPassword {
        token: String,
        new_password: String,
        reply: oneshot::Sender<Result<(String, User)>>,
    },
    ChangePassword {
        user_id: String,
        req: ChangePasswordRequest,
        reply: oneshot::Sender<Result<()>>,
    },
    UpdateProfile {
        user_id: String,
        req: UpdateProfileRequest,
        reply: oneshot::Sender<Result<User>>,
    },
    SwitchLocale {
        user_id: String,
        locale: Locale,
        reply: oneshot::Sender<Result<User>>,
    },
}

// ─── Actor ───

/// Credential lifecycle actor — processes account operations sequentially
pub struct AccountActor {
    store: Arc<dyn CredentialStore>,
    revocations: Arc<dyn RevocationStore>,
    mailer: Arc<dyn MailSender>,
    codec: TokenCodec,
    clock: Arc<dyn Clock>,
    verification_ttl: chrono::Duration,
    reset_ttl: chrono::Duration,
    revocation_retention: chrono::Duration,
    rx: mpsc::Receiver<AccountMsg>,
}

impl AccountActor {
    /// Spawn the actor with the system clock and return a handle.
    pub fn spawn(
        config: &AuthConfig,
        store: Arc<dyn CredentialStore>,
        revocations: Arc<dyn RevocationStore>,
        mailer: Arc<dyn MailSender>,
    ) -> AccountHandle {
        Self::spawn_with_clock(config, store, revocations, mailer, Arc::new(SystemClock))
    }

    /// Spawn with an explicit clock (tests drive expiry through this).
    pub fn spawn_with_clock(
        config: &AuthConfig,
        store: Arc<dyn CredentialStore>,
        revocations: Arc<dyn RevocationStore>,
        mailer: Arc<dyn MailSender>,
        clock: Arc<dyn Clock>,
    ) -> AccountHandle {
        let codec = TokenCodec::new(&config.jwt_secret, config.session_ttl(), clock.clone());

        let (tx, rx) = mpsc::channel(256);
        let actor = Self {
            store,
            revocations,
            mailer,
            codec,
            clock,
            verification_ttl: config.verification_ttl(),
            reset_ttl: config.reset_ttl(),
            revocation_retention: config.revocation_retention(),
            rx,
        };

        tokio::spawn(actor.run());
        info!("AccountActor spawned");
        AccountHandle { tx }
    }

    /// Main event loop
    async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                AccountMsg::SignUp { req, reply } => {
                    let _ = reply.send(self.handle_sign_up(req).await);
                }
                AccountMsg::SignIn { req, reply } => {
                    let _ = reply.send(self.handle_sign_in(req).await);
                }
                AccountMsg::Logout { token, reply } => {
                    let _ = reply.send(self.handle_logout(&token).await);
                }
                AccountMsg::RequestVerification { user_id, reply } => {
                    let _ = reply.send(self.handle_request_verification(&user_id).await);
                }
                AccountMsg::Verify { token, reply } => {
                    let _ = reply.send(self.handle_verify(&token).await);
                }
                AccountMsg::RequestPasswordReset { email, reply } => {
                    let _ = reply.send(self.handle_request_password_reset(&email).await);
                }
                AccountMsg::ApplyNewPassword { token, new_password, reply } => {
                    let _ = reply.send(self.handle_apply_new_password(&token, &new_password).await);
                }
                AccountMsg::ChangePassword { user_id, req, reply } => {
                    let _ = reply.send(self.handle_change_password(&user_id, req).await);
                }
                AccountMsg::UpdateProfile { user_id, req, reply } => {
                    let _ = reply.send(self.handle_update_profile(&user_id, req).await);
                }
                AccountMsg::SwitchLocale { user_id, locale, reply } => {
                    let _ = reply.send(self.handle_switch_locale(&user_id, locale).await);
                }
            }
        }
        info!("AccountActor stopped");
    }

    // ─── Handler Implementations ───

    async fn handle_sign_up(&self, req: SignUpRequest) -> Result<(String, User)> {
        req.validate()?;

        if self.store.find_by_email(&req.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(&req.password)?;
        let user = self
            .store
            .create(NewUser {
                email: req.email,
                password_hash,
                first_name: req.first_name,
                last_name: req.last_name,
                locale: req.locale,
            })
            .await?;

        let session = self.codec.issue(&user.id)?;
        self.issue_verification_token(&user).await?;

        info!(user_id = %user.id, "user signed up");
        Ok((session, user))
    }

    async fn handle_sign_in(&self, req: SignInRequest) -> Result<(String, User)> {
        let user = self
            .store
            .find_by_email(&req.email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(&req.password, &user.password_hash)? {
            return Err(AuthError::IncorrectPassword);
        }

        let session = self.codec.issue(&user.id)?;
        info!(user_id = %user.id, "sign in successful");
        Ok((session, user))
    }

    async fn handle_logout(&self, token: &str) -> Result<()> {
        // Pin the entry's lifetime to the token's own expiry; a token whose
        // expiry cannot be read falls back to the configured retention.
        let expires_at = match self.codec.verify(token) {
            Ok(claims) => DateTime::<Utc>::from_timestamp(claims.exp, 0)
                .unwrap_or_else(|| self.clock.now() + self.revocation_retention),
            Err(_) => self.clock.now() + self.revocation_retention,
        };

        self.revocations.revoke(token, expires_at).await?;
        info!("session revoked");
        Ok(())
    }

    async fn handle_request_verification(&self, user_id: &str) -> Result<()> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.issue_verification_token(&user).await
    }

    async fn handle_verify(&self, token: &str) -> Result<(String, User)> {
        let user = self
            .store
            .find_by_verification_token(token)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        self.check_token_expiry(user.verification.expires_at)?;

        self.store.mark_verified(&user.id).await?;
        let user = self
            .store
            .find_by_id(&user.id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let session = self.codec.issue(&user.id)?;
        info!(user_id = %user.id, "email verified");
        Ok((session, user))
    }

    async fn handle_request_password_reset(&self, email: &str) -> Result<()> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let token = opaque_token();
        let expires_at = self.clock.now() + self.reset_ttl;
        self.store
            .set_reset_token(&user.id, &token, expires_at)
            .await?;

        if let Err(e) = self.mailer.send_password_reset(&user.email, &token).await {
            warn!(user_id = %user.id, error = %e, "password reset mail failed");
        }
        info!(user_id = %user.id, "password reset requested");
        Ok(())
    }

    async fn handle_apply_new_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(String, User)> {
        validate_password(new_password)?;

        let user = self
            .store
            .find_by_reset_token(token)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        self.check_token_expiry(user.reset_password.expires_at)?;

        let password_hash = hash_password(new_password)?;
        self.store
            .accept_new_password(&user.id, &password_hash)
            .await?;
        let user = self
            .store
            .find_by_id(&user.id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let session = self.codec.issue(&user.id)?;
        info!(user_id = %user.id, "password reset applied");
        Ok((session, user))
    }

    async fn handle_change_password(
        &self,
        user_id: &str,
        req: ChangePasswordRequest,
    ) -> Result<()> {
        req.validate()?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(&req.current_password, &user.password_hash)? {
            return Err(AuthError::IncorrectPassword);
        }

        let password_hash = hash_password(&req.new_password)?;
        self.store.set_password(&user.id, &password_hash).await?;
        info!(user_id = %user.id, "password changed");
        Ok(())
    }

    async fn handle_update_profile(
        &self,
        user_id: &str,
        req: UpdateProfileRequest,
    ) -> Result<User> {
        req.validate()?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.email != req.email && self.store.find_by_email(&req.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        self.store
            .update_profile(&user.id, &req.email, &req.first_name, &req.last_name)
            .await
    }

    async fn handle_switch_locale(&self, user_id: &str, locale: Locale) -> Result<User> {
        self.store.set_locale(user_id, locale).await
    }

    // ─── Helpers ───

    async fn issue_verification_token(&self, user: &User) -> Result<()> {
        let token = opaque_token();
        let expires_at = self.clock.now() + self.verification_ttl;
        self.store
            .set_verification_token(&user.id, &token, expires_at)
            .await?;

        if let Err(e) = self.mailer.send_verification(&user.email, &token).await {
            warn!(user_id = %user.id, error = %e, "verification mail failed");
        }
        Ok(())
    }

    fn check_token_expiry(&self, expires_at: Option<DateTime<Utc>>) -> Result<()> {
        match expires_at {
            Some(expires_at) if self.clock.now() < expires_at => Ok(()),
            // Expired, or a token with no recorded expiry: never honored.
            _ => Err(AuthError::TokenNotFound),
        }
    }
}

// ─── Password Hashing ───

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(e.to_string()))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::Internal(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// ─── Handle (client-facing API) ───

/// Thread-safe handle to communicate with the AccountActor
#[derive(Clone)]
pub struct AccountHandle {
    tx: mpsc::Sender<AccountMsg>,
}

impl AccountHandle {
    /// Register a new account. Returns a session token and the created user;
    /// a verification token is issued and mailed as a side effect.
    pub async fn sign_up(&self, req: SignUpRequest) -> Result<(String, User)> {
        self.request(|reply| AccountMsg::SignUp { req, reply }).await
    }

    /// Exchange email + password for a session token.
    pub async fn sign_in(&self, req: SignInRequest) -> Result<(String, User)> {
        self.request(|reply| AccountMsg::SignIn { req, reply }).await
    }

    /// Revoke the presented session token. Idempotent.
    pub async fn logout(&self, ctx: &AuthContext) -> Result<()> {
        let (_, token) = ctx.require()?;
        let token = token.to_string();
        self.request(|reply| AccountMsg::Logout { token, reply })
            .await
    }

    /// Issue a fresh verification token (overwriting any prior one) and mail it.
    pub async fn request_verification(&self, ctx: &AuthContext) -> Result<()> {
        let (user, _) = ctx.require()?;
        let user_id = user.id.clone();
        self.request(|reply| AccountMsg::RequestVerification { user_id, reply })
            .await
    }

    /// Consume a verification token: marks the account verified and returns a
    /// fresh session token.
    pub async fn verify(&self, token: &str) -> Result<(String, User)> {
        let token = token.to_string();
        self.request(|reply| AccountMsg::Verify { token, reply })
            .await
    }

    /// Issue a reset token for the given email and mail it.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let email = email.to_string();
        self.request(|reply| AccountMsg::RequestPasswordReset { email, reply })
            .await
    }

    /// Consume a reset token: stores the new password and returns a fresh
    /// session token.
    pub async fn apply_new_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(String, User)> {
        let token = token.to_string();
        let new_password = new_password.to_string();
        self.request(|reply| AccountMsg::ApplyNewPassword { token, new_password, reply })
            .await
    }

    /// Change the password of the authenticated user; requires the current one.
    pub async fn change_password(
        &self,
        ctx: &AuthContext,
        req: ChangePasswordRequest,
    ) -> Result<()> {
        let (user, _) = ctx.require()?;
        let user_id = user.id.clone();
        self.request(|reply| AccountMsg::ChangePassword { user_id, req, reply })
            .await
    }

    /// Update email and names of the authenticated user.
    pub async fn update_profile(
        &self,
        ctx: &AuthContext,
        req: UpdateProfileRequest,
    ) -> Result<User> {
        let (user, _) = ctx.require()?;
        let user_id = user.id.clone();
        self.request(|reply| AccountMsg::UpdateProfile { user_id, req, reply })
            .await
    }

    /// Switch the locale of the authenticated user.
    pub async fn switch_locale(&self, ctx: &AuthContext, locale: Locale) -> Result<User> {
        let (user, _) = ctx.require()?;
        let user_id = user.id.clone();
        self.request(|reply| AccountMsg::SwitchLocale { user_id, locale, reply })
            .await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> AccountMsg,
    ) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| AuthError::ActorUnavailable("AccountActor".into()))?;
        rx.await
            .map_err(|_| AuthError::ActorUnavailable("AccountActor dropped".into()))?
    }
}
