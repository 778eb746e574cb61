use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated user identity resolved by the auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email_verified: bool,
    /// Whether this account may upload to the non-default (object storage)
    /// backend. Resolved by the auth layer together with the session.
    pub storage_backend_enabled: bool,
}

impl Identity {
    pub fn new(id: Uuid) -> Self {
        Identity {
            id,
            email_verified: true,
            storage_backend_enabled: false,
        }
    }
}
