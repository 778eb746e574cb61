//! Process-wide ephemeral temp token state.
//!
//! Temp tokens gate download/stream endpoints where session cookies are
//! unsuitable (cross-origin media elements). Entries live in a shared,
//! synchronized map keyed by token value; they are never persisted and do not
//! survive a restart. Expired entries are treated as absent on lookup and
//! pruned opportunistically, so no background sweep is needed.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::constants::TOKEN_BYTES;
use crate::error::AppError;

/// Scope attached to an issued temp token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempTokenClaims {
    pub user_id: Uuid,
    /// When set, the token only authorizes reads of this file.
    pub file_id: Option<Uuid>,
    /// Client instance that requested the token; revocation is scoped to it
    /// so one client's logout leaves the user's other sessions intact.
    pub instance_id: Option<String>,
}

#[derive(Debug, Clone)]
struct TempTokenEntry {
    claims: TempTokenClaims,
    expires_at: DateTime<Utc>,
    single_use: bool,
}

/// Generate random token material, hex-encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Shared in-process store of temp download/stream tokens.
#[derive(Clone, Default)]
pub struct TempTokenStore {
    inner: Arc<RwLock<HashMap<String, TempTokenEntry>>>,
}

impl TempTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token scoped to a user and optionally one file.
    pub fn issue(
        &self,
        user_id: Uuid,
        file_id: Option<Uuid>,
        instance_id: Option<String>,
        ttl: Duration,
        single_use: bool,
    ) -> String {
        let token = generate_token();
        let entry = TempTokenEntry {
            claims: TempTokenClaims {
                user_id,
                file_id,
                instance_id,
            },
            expires_at: Utc::now() + ttl,
            single_use,
        };

        let mut map = self.inner.write().expect("temp token lock poisoned");
        let now = Utc::now();
        map.retain(|_, e| e.expires_at > now);
        map.insert(token.clone(), entry);
        token
    }

    /// Validate a presented token against the current time.
    pub fn validate(
        &self,
        token: &str,
        file_id: Option<Uuid>,
    ) -> Result<TempTokenClaims, AppError> {
        self.validate_at(token, file_id, Utc::now())
    }

    /// Validate at an explicit instant. Expired entries are removed and
    /// reported as if they never existed; single-use entries are consumed by
    /// a successful validation.
    pub fn validate_at(
        &self,
        token: &str,
        file_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<TempTokenClaims, AppError> {
        let mut map = self.inner.write().expect("temp token lock poisoned");

        let entry = match map.get(token) {
            Some(entry) => entry.clone(),
            None => return Err(AppError::Forbidden("Invalid temp token".to_string())),
        };

        if entry.expires_at <= now {
            map.remove(token);
            return Err(AppError::Forbidden("Invalid temp token".to_string()));
        }

        if let (Some(scoped), Some(requested)) = (entry.claims.file_id, file_id) {
            if scoped != requested {
                return Err(AppError::Forbidden("Invalid temp token".to_string()));
            }
        }

        if entry.single_use {
            map.remove(token);
        }

        Ok(entry.claims)
    }

    /// Revoke a token for this user. The instance id must match the one the
    /// token was issued with so other client sessions are unaffected.
    pub fn revoke(&self, user_id: Uuid, token: &str, instance_id: Option<&str>) {
        let mut map = self.inner.write().expect("temp token lock poisoned");
        if let Some(entry) = map.get(token) {
            if entry.claims.user_id == user_id
                && entry.claims.instance_id.as_deref() == instance_id
            {
                map.remove(token);
            }
        }
    }

    /// Drop every token scoped to a file (called when the file is deleted).
    pub fn revoke_file(&self, file_id: Uuid) {
        let mut map = self.inner.write().expect("temp token lock poisoned");
        map.retain(|_, e| e.claims.file_id != Some(file_id));
    }

    /// Number of live (non-expired) entries; test and diagnostics helper.
    pub fn len_at(&self, now: DateTime<Utc>) -> usize {
        let map = self.inner.read().expect("temp token lock poisoned");
        map.values().filter(|e| e.expires_at > now).count()
    }
}
