//! Session token codec and opaque token generation.
//!
//! Session tokens are HS256 JWTs carrying exactly `{sub, iat, exp}`: a pure
//! function of secret + claims + clock, with no knowledge of revocation.
//! Opaque tokens (email verification, password reset) are unstructured
//! 48-character URL-safe strings whose validity lives on the user record.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{AuthError, Result};

/// Random bytes per opaque token; 36 bytes encode to 48 URL-safe characters.
const OPAQUE_TOKEN_BYTES: usize = 36;

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user id)
    pub sub: String,
    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,
    /// Expiry (Unix timestamp, seconds)
    pub exp: i64,
}

/// Signs and verifies session tokens against a shared symmetric secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl: chrono::Duration, clock: Arc<dyn Clock>) -> Self {
        // Expiry is checked against the injected clock below, not against
        // jsonwebtoken's wall clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            clock,
        }
    }

    /// Issue a signed token for `subject_id` expiring after the configured TTL.
    pub fn issue(&self, subject_id: &str) -> Result<String> {
        let now = self.clock.now();
        let claims = SessionClaims {
            sub: subject_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Verify signature and expiry, returning the embedded claims.
    ///
    /// Fails with [`AuthError::TokenInvalid`] on a malformed payload or bad
    /// signature, [`AuthError::TokenExpired`] once the current time reaches
    /// the embedded expiry. Nothing else is checked at this layer.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation)?;
        if self.clock.now().timestamp() >= data.claims.exp {
            return Err(AuthError::TokenExpired);
        }
        Ok(data.claims)
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }
}

/// Generate a cryptographically random, URL-safe opaque token (48 chars).
pub fn opaque_token() -> String {
    let mut buf = [0u8; OPAQUE_TOKEN_BYTES];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}
