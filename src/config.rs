//! Configuration for Identity Core

use chrono::Duration;

/// Core configuration — signing secret and the lifetimes of everything that
/// expires.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Symmetric secret for session token signing (HS256)
    pub jwt_secret: String,

    /// Session token time-to-live in hours (default: 168 = 7 days)
    pub session_ttl_hours: u64,

    /// Email verification token time-to-live in days
    pub verification_ttl_days: u32,

    /// Password reset token time-to-live in days
    pub reset_ttl_days: u32,

    /// Fallback retention for revocation entries whose token expiry cannot be
    /// read, in hours (default: 168 = 7 days)
    pub revocation_retention_hours: u64,
}

impl AuthConfig {
    /// Create config with sensible defaults.
    ///
    /// The signing secret falls back to `IDENTITY_JWT_SECRET` from the
    /// environment; the placeholder default must be overridden in production.
    pub fn new() -> Self {
        Self {
            jwt_secret: std::env::var("IDENTITY_JWT_SECRET")
                .unwrap_or_else(|_| "identity-core-default-secret-change-me".to_string()),
            session_ttl_hours: 168,
            verification_ttl_days: 7,
            reset_ttl_days: 7,
            revocation_retention_hours: 168,
        }
    }

    /// Read every field from the environment, keeping defaults for anything
    /// unset or unparseable: `IDENTITY_JWT_SECRET`,
    /// `IDENTITY_SESSION_TTL_HOURS`, `IDENTITY_VERIFICATION_TTL_DAYS`,
    /// `IDENTITY_RESET_TTL_DAYS`, `IDENTITY_REVOCATION_RETENTION_HOURS`.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Some(hours) = env_parse("IDENTITY_SESSION_TTL_HOURS") {
            config.session_ttl_hours = hours;
        }
        if let Some(days) = env_parse("IDENTITY_VERIFICATION_TTL_DAYS") {
            config.verification_ttl_days = days;
        }
        if let Some(days) = env_parse("IDENTITY_RESET_TTL_DAYS") {
            config.reset_ttl_days = days;
        }
        if let Some(hours) = env_parse("IDENTITY_REVOCATION_RETENTION_HOURS") {
            config.revocation_retention_hours = hours;
        }
        config
    }

    /// Override the signing secret
    pub fn with_jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = secret.into();
        self
    }

    /// Override the session token lifetime
    pub fn with_session_ttl_hours(mut self, hours: u64) -> Self {
        self.session_ttl_hours = hours;
        self
    }

    /// Override the verification token lifetime
    pub fn with_verification_ttl_days(mut self, days: u32) -> Self {
        self.verification_ttl_days = days;
        self
    }

    /// Override the reset token lifetime
    pub fn with_reset_ttl_days(mut self, days: u32) -> Self {
        self.reset_ttl_days = days;
        self
    }

    /// Override the fallback revocation retention
    pub fn with_revocation_retention_hours(mut self, hours: u64) -> Self {
        self.revocation_retention_hours = hours;
        self
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours as i64)
    }

    pub fn verification_ttl(&self) -> Duration {
        Duration::days(self.verification_ttl_days as i64)
    }

    pub fn reset_ttl(&self) -> Duration {
        Duration::days(self.reset_ttl_days as i64)
    }

    pub fn revocation_retention(&self) -> Duration {
        Duration::hours(self.revocation_retention_hours as i64)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Outbound SMTP settings for the mailer (`smtp` feature)
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender mailbox, e.g. `"Accounts <no-reply@example.com>"`
    pub sender: String,
}

impl SmtpConfig {
    /// Read from `IDENTITY_SMTP_HOST`, `IDENTITY_SMTP_PORT`,
    /// `IDENTITY_SMTP_USERNAME`, `IDENTITY_SMTP_PASSWORD`,
    /// `IDENTITY_SMTP_SENDER`.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("IDENTITY_SMTP_HOST").unwrap_or_default(),
            port: env_parse("IDENTITY_SMTP_PORT").unwrap_or(587),
            username: std::env::var("IDENTITY_SMTP_USERNAME").unwrap_or_default(),
            password: std::env::var("IDENTITY_SMTP_PASSWORD").unwrap_or_default(),
            sender: std::env::var("IDENTITY_SMTP_SENDER")
                .unwrap_or_else(|_| "no-reply@localhost".to_string()),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
