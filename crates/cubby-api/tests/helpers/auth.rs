//! Session token helpers for tests.

use cubby_api::auth::session;
use cubby_core::Identity;
use std::time::Duration;
use uuid::Uuid;

pub const TEST_SESSION_SECRET: &[u8] = b"cubby-test-session-secret";

/// A registered test user: identity plus a valid bearer token.
pub struct TestUser {
    pub identity: Identity,
    pub token: String,
}

pub fn test_user() -> TestUser {
    let identity = Identity {
        id: Uuid::new_v4(),
        email_verified: true,
        storage_backend_enabled: false,
    };
    let token = session::create(&identity, Duration::from_secs(3600), TEST_SESSION_SECRET);
    TestUser { identity, token }
}

pub fn bearer(user: &TestUser) -> String {
    format!("Bearer {}", user.token)
}
