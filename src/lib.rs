//! # Identity Core
//!
//! Authentication and credential-lifecycle core for a user-facing backend —
//! signed bearer session tokens, logout revocation, and single-use tokens for
//! email verification and password reset.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │              identity-core                │
//! ├──────────────┬──────────────┬─────────────┤
//! │   AuthGate   │ AccountActor │ Revocation  │
//! │ (per-request │ (lifecycle   │  Sweeper    │
//! │  identity)   │  operations) │ (pruning)   │
//! ├──────────────┴──────────────┴─────────────┤
//! │  TokenCodec (HS256) · opaque tokens       │
//! ├───────────────────────────────────────────┤
//! │ CredentialStore · RevocationStore · Mail  │
//! │ (collaborator traits + in-memory impls)   │
//! └───────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use identity_core::{
//!     AccountActor, AuthConfig, AuthGate, Clock, MemoryCredentialStore,
//!     MemoryRevocationStore, NullMailer, SystemClock, TokenCodec,
//!     account::SignUpRequest, Locale,
//! };
//!
//! #[tokio::main]
//! async fn main() -> identity_core::Result<()> {
//!     let config = AuthConfig::new().with_jwt_secret("my-production-secret");
//!     let clock: Arc<dyn Clock> = Arc::new(SystemClock);
//!     let store = Arc::new(MemoryCredentialStore::new(clock.clone()));
//!     let revocations = Arc::new(MemoryRevocationStore::new(clock.clone()));
//!
//!     let handle = AccountActor::spawn(
//!         &config,
//!         store.clone(),
//!         revocations.clone(),
//!         Arc::new(NullMailer),
//!     );
//!
//!     // Sign up → session token + verification mail
//!     let (token, user) = handle
//!         .sign_up(SignUpRequest {
//!             email: "alice@example.com".into(),
//!             password: "StrongP@ss123".into(),
//!             first_name: "Alice".into(),
//!             last_name: "Smith".into(),
//!             locale: Locale::En,
//!         })
//!         .await?;
//!
//!     // Resolve identity on each request
//!     let codec = TokenCodec::new(&config.jwt_secret, config.session_ttl(), clock);
//!     let gate = AuthGate::new(codec, store, revocations);
//!     let ctx = gate.authenticate(Some(&format!("Bearer {token}"))).await;
//!     assert_eq!(ctx.user().map(|u| u.id.as_str()), Some(user.id.as_str()));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Design stance
//!
//! - **Stateless sessions**: tokens carry `{sub, iat, exp}` and verify by
//!   signature alone; revocation is layered on top, never baked into the codec.
//! - **Silent gate**: authentication failure collapses to
//!   [`AuthContext::Anonymous`]; operations that need an identity call
//!   [`AuthContext::require`] and fail explicitly.
//! - **Single-use tokens**: verification and reset tokens are cleared in the
//!   same store update as their side effect, so they can never replay.
//! - **Railway programming**: every fallible operation returns
//!   `Result<T, AuthError>`.

pub mod account;
pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod mail;
pub mod maintenance;
pub mod revocation;
pub mod store;
pub mod token;

// Re-exports for convenience
pub use account::{AccountActor, AccountHandle, Locale, User};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthConfig, SmtpConfig};
pub use error::{AuthError, Result};
pub use gate::{AuthContext, AuthGate};
pub use mail::{MailSender, NullMailer};
pub use maintenance::RevocationSweeper;
pub use revocation::{MemoryRevocationStore, RevocationStore};
pub use store::{CredentialStore, MemoryCredentialStore};
pub use token::{opaque_token, SessionClaims, TokenCodec};

#[cfg(feature = "smtp")]
pub use mail::SmtpMailer;
