use crate::models::Identity;

/// Proof of authorization presented with a file operation.
///
/// Every read path is gated on one of these; the guard resolves the variant
/// against the file's current link state and the temp-token table before any
/// chunk is touched.
#[derive(Debug, Clone)]
pub enum AccessCredential {
    /// Authenticated session matching the record owner. Authorized for all
    /// operations.
    Owner(Identity),
    /// Public or one-time link token. Read-only; one-time tokens are consumed
    /// atomically on first successful authorization.
    Link { token: String },
    /// Short-lived token from the process-wide temp token store. Read-only,
    /// scoped to one user and optionally one file.
    Temp { token: String },
}

impl AccessCredential {
    /// True for credentials that may mutate or delete the file.
    pub fn can_write(&self) -> bool {
        matches!(self, AccessCredential::Owner(_))
    }
}
