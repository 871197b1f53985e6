//! Account domain types — users, locales, and typed operation requests.
//!
//! Serializable, cloneable, and cheap to pass around.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// Supported interface locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Fr,
    De,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
            Self::De => "de",
        }
    }

    /// Strict parse — unknown values are a validation error, not a default.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "en" => Some(Self::En),
            "fr" => Some(Self::Fr),
            "de" => Some(Self::De),
            _ => None,
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::En
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Email verification state carried on the user record.
///
/// At most one outstanding token; consuming it clears both fields in the same
/// update that marks the user verified.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationState {
    pub verified: bool,
    pub token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Password reset state carried on the user record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetState {
    pub token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// User record — the identity document owned by the credential store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub locale: Locale,
    pub verification: VerificationState,
    pub reset_password: ResetState,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Full display name, falling back to the email address
    pub fn display_name(&self) -> String {
        if !self.first_name.is_empty() || !self.last_name.is_empty() {
            format!("{} {}", self.first_name, self.last_name)
                .trim()
                .to_string()
        } else {
            self.email.clone()
        }
    }
}

/// Fields required to create a user record
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub locale: Locale,
}

// ─── Operation Requests ───

/// Sign-up input
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub locale: Locale,
}

impl SignUpRequest {
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// Sign-in input
#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Profile update input — email changes re-check uniqueness
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)
    }
}

/// Password change input — requires the current password
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<()> {
        validate_password(&self.new_password)
    }
}

pub(crate) fn validate_email(email: &str) -> Result<()> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(AuthError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

pub(crate) fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(AuthError::PasswordTooWeak(
            "must be at least 8 characters".into(),
        ));
    }
    Ok(())
}
