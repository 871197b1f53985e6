//! Error types for identity-core — Railway Programming
//!
//! All operations return `Result<T, AuthError>`.
//! No panics, no unwraps in production code paths.

use thiserror::Error;

/// Unified error type for all identity operations
#[derive(Error, Debug)]
pub enum AuthError {
    // ─── Domain Errors ───

    #[error("email has already been taken")]
    EmailTaken,

    #[error("user not found")]
    UserNotFound,

    /// Deliberately ambiguous: never confirms whether a verification or reset
    /// token ever existed, only that it cannot be honored now.
    #[error("token is not valid or has expired")]
    TokenNotFound,

    #[error("password is incorrect")]
    IncorrectPassword,

    #[error("authentication required")]
    AuthenticationRequired,

    // ─── Validation Errors ───

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("password too weak: {0}")]
    PasswordTooWeak(String),

    // ─── Session Token Errors ───

    #[error("token expired")]
    TokenExpired,

    #[error("token invalid: {0}")]
    TokenInvalid(String),

    // ─── Infrastructure Errors ───

    #[error("credential store error: {0}")]
    Store(String),

    #[error("mail dispatch error: {0}")]
    Mail(String),

    #[error("actor unavailable: {0}")]
    ActorUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(err.to_string()),
        }
    }
}

/// Result type alias for identity operations
pub type Result<T> = std::result::Result<T, AuthError>;
