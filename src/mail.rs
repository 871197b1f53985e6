//! Outbound mail — verification and password-reset notifications.
//!
//! Dispatch is fire-and-forget from the lifecycle service's perspective: a
//! mail failure is logged and never rolls back the token issuance it
//! accompanies.

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;

#[cfg(feature = "smtp")]
use crate::config::SmtpConfig;
#[cfg(feature = "smtp")]
use crate::error::AuthError;

/// Outbound mail collaborator.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send_verification(&self, email: &str, token: &str) -> Result<()>;

    async fn send_password_reset(&self, email: &str, token: &str) -> Result<()>;
}

/// Discards all mail. Useful for wiring without SMTP and in tests.
pub struct NullMailer;

#[async_trait]
impl MailSender for NullMailer {
    async fn send_verification(&self, email: &str, _token: &str) -> Result<()> {
        debug!(email, "verification mail discarded (null mailer)");
        Ok(())
    }

    async fn send_password_reset(&self, email: &str, _token: &str) -> Result<()> {
        debug!(email, "password reset mail discarded (null mailer)");
        Ok(())
    }
}

/// SMTP mailer backed by lettre's async transport.
#[cfg(feature = "smtp")]
pub struct SmtpMailer {
    transport: lettre::AsyncSmtpTransport<lettre::Tokio1Executor>,
    sender: lettre::message::Mailbox,
}

#[cfg(feature = "smtp")]
impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        use lettre::transport::smtp::authentication::Credentials;
        use lettre::{AsyncSmtpTransport, Tokio1Executor};

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| AuthError::Mail(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        let sender = config
            .sender
            .parse()
            .map_err(|e: lettre::address::AddressError| AuthError::Mail(e.to_string()))?;

        Ok(Self { transport, sender })
    }

    async fn dispatch(&self, to: &str, subject: &str, body: String) -> Result<()> {
        use lettre::message::header::ContentType;
        use lettre::{AsyncTransport, Message};

        let message = Message::builder()
            .from(self.sender.clone())
            .to(to
                .parse()
                .map_err(|e: lettre::address::AddressError| AuthError::Mail(e.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AuthError::Mail(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AuthError::Mail(e.to_string()))?;
        Ok(())
    }
}

#[cfg(feature = "smtp")]
#[async_trait]
impl MailSender for SmtpMailer {
    async fn send_verification(&self, email: &str, token: &str) -> Result<()> {
        self.dispatch(
            email,
            "Verify your email address",
            format!("Use this token to verify your email address: {token}"),
        )
        .await
    }

    async fn send_password_reset(&self, email: &str, token: &str) -> Result<()> {
        self.dispatch(
            email,
            "Reset your password",
            format!("Use this token to reset your password: {token}"),
        )
        .await
    }
}
