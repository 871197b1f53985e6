//! Revocation store — tokens that must be rejected before their natural expiry.
//!
//! Entries are keyed by the SHA-256 digest of the exact token string (raw
//! bearer tokens are never retained) and carry a per-entry expiry equal to
//! the token's own embedded expiry. Once a token has outlived its expiry the
//! codec rejects it anyway, so its entry is dead weight and is dropped lazily
//! on writes or by the [`crate::maintenance::RevocationSweeper`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use crate::clock::Clock;
use crate::error::Result;

/// Membership store for revoked session tokens.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Record `token` as revoked until `expires_at`. Idempotent.
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()>;

    /// Exact-match membership query.
    async fn is_revoked(&self, token: &str) -> Result<bool>;

    /// Drop entries whose expiry has passed. Returns the number removed.
    async fn prune(&self) -> Result<usize>;
}

pub(crate) fn token_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// In-memory revocation store — digest-keyed map with per-entry expiry.
///
/// Read-your-writes by construction, so a logout is visible to the very next
/// gate check in the same process.
pub struct MemoryRevocationStore {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryRevocationStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries.read().values().filter(|exp| **exp > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        // Lazy prune keeps the map bounded by the live-revocation count.
        entries.retain(|_, exp| *exp > now);
        entries.insert(token_digest(token), expires_at);
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool> {
        let now = self.clock.now();
        Ok(self
            .entries
            .read()
            .get(&token_digest(token))
            .map(|exp| *exp > now)
            .unwrap_or(false))
    }

    async fn prune(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, exp| *exp > now);
        Ok(before - entries.len())
    }
}
