//! Signed session tokens.
//!
//! Payload: user_id (16 bytes) || flags (1 byte) || expiry_ts (u64 BE) = 25
//! bytes. Token = base64url(payload || HMAC-SHA256(secret, payload)).
//! Session issuance itself lives in the external auth service; this module
//! only verifies (and mints for tests and tooling).

use base64::Engine;
use cubby_core::{AppError, Identity};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const PAYLOAD_LEN: usize = 16 + 1 + 8;
const MAC_LEN: usize = 32;
const TOKEN_LEN: usize = PAYLOAD_LEN + MAC_LEN;

const FLAG_EMAIL_VERIFIED: u8 = 0b01;
const FLAG_STORAGE_BACKEND: u8 = 0b10;

fn invalid() -> AppError {
    AppError::Unauthorized("Invalid session token".to_string())
}

/// Build a signed session token for the identity.
pub fn create(identity: &Identity, expires_in: Duration, secret: &[u8]) -> String {
    let expiry_ts = SystemTime::now()
        .checked_add(expires_in)
        .unwrap_or(SystemTime::UNIX_EPOCH)
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let mut flags = 0u8;
    if identity.email_verified {
        flags |= FLAG_EMAIL_VERIFIED;
    }
    if identity.storage_backend_enabled {
        flags |= FLAG_STORAGE_BACKEND;
    }

    let mut payload = [0u8; PAYLOAD_LEN];
    payload[0..16].copy_from_slice(identity.id.as_bytes());
    payload[16] = flags;
    payload[17..25].copy_from_slice(&expiry_ts.to_be_bytes());

    let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts any key size");
    mac.update(&payload);
    let tag = mac.finalize().into_bytes();

    let mut token_bytes = [0u8; TOKEN_LEN];
    token_bytes[0..PAYLOAD_LEN].copy_from_slice(&payload);
    token_bytes[PAYLOAD_LEN..].copy_from_slice(&tag);

    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}

/// Verify a session token and return the identity it carries.
pub fn verify(token: &str, secret: &[u8]) -> Result<Identity, AppError> {
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| invalid())?;
    if decoded.len() != TOKEN_LEN {
        return Err(invalid());
    }

    let (payload, tag) = decoded.split_at(PAYLOAD_LEN);
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts any key size");
    mac.update(payload);
    mac.verify_slice(tag).map_err(|_| invalid())?;

    let expiry_ts = u64::from_be_bytes(payload[17..25].try_into().expect("fixed slice"));
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    if now > expiry_ts {
        return Err(invalid());
    }

    let id = Uuid::from_bytes(payload[0..16].try_into().expect("fixed slice"));
    let flags = payload[16];

    Ok(Identity {
        id,
        email_verified: flags & FLAG_EMAIL_VERIFIED != 0,
        storage_backend_enabled: flags & FLAG_STORAGE_BACKEND != 0,
    })
}
