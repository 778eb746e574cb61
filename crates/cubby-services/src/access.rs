//! Access guarding for every read and write path.
//!
//! State machine per access attempt: Unverified -> {Owner | PublicLink |
//! OneTimeLink | TempToken} -> Authorized, or Denied. Denied surfaces as
//! `NotFound` wherever the caller is not a proven session holder, so an
//! unauthenticated probe cannot distinguish "wrong token" from "no such
//! file"; expired or mis-scoped temp tokens from a known user surface as
//! `Forbidden`.

use cubby_core::{
    AccessCredential, AppError, FileCatalog, FileRecord, Identity, LinkState, TempTokenStore,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

fn not_found() -> AppError {
    AppError::NotFound("File not found".to_string())
}

fn token_matches(presented: &str, stored: Option<&str>) -> bool {
    match stored {
        Some(stored) if stored.len() == presented.len() => {
            stored.as_bytes().ct_eq(presented.as_bytes()).into()
        }
        _ => false,
    }
}

/// Validates a presented credential against a file's current access policy
/// before any chunk store operation is permitted.
#[derive(Clone)]
pub struct AccessGuard {
    catalog: Arc<dyn FileCatalog>,
    temp_tokens: TempTokenStore,
}

impl AccessGuard {
    pub fn new(catalog: Arc<dyn FileCatalog>, temp_tokens: TempTokenStore) -> Self {
        AccessGuard {
            catalog,
            temp_tokens,
        }
    }

    /// Authorize a read of the file and return its record.
    ///
    /// One-time link credentials are consumed here: of two concurrent
    /// presentations of the same token, exactly one passes.
    pub async fn authorize_read(
        &self,
        credential: &AccessCredential,
        file_id: Uuid,
    ) -> Result<FileRecord, AppError> {
        let record = self
            .catalog
            .get(file_id)
            .await?
            .filter(|r| !r.tombstoned)
            .ok_or_else(not_found)?;

        match credential {
            AccessCredential::Owner(identity) => {
                if identity.id == record.owner_id {
                    Ok(record)
                } else {
                    Err(not_found())
                }
            }
            AccessCredential::Link { token } => match record.link_state {
                LinkState::Public => {
                    if token_matches(token, record.link_token.as_deref()) {
                        Ok(record)
                    } else {
                        Err(not_found())
                    }
                }
                LinkState::OneTime => {
                    // Single atomic check-and-invalidate; a second
                    // presentation (even concurrent) loses.
                    if self.catalog.consume_one_time_link(file_id, token).await? {
                        tracing::debug!(file_id = %file_id, "One-time link consumed");
                        Ok(record)
                    } else {
                        Err(not_found())
                    }
                }
                LinkState::None => Err(not_found()),
            },
            AccessCredential::Temp { token } => {
                let claims = self.temp_tokens.validate(token, Some(file_id))?;
                if claims.user_id == record.owner_id {
                    Ok(record)
                } else {
                    Err(not_found())
                }
            }
        }
    }

    /// Authorize an owner-only operation (link management, info).
    pub async fn authorize_owner(
        &self,
        owner: &Identity,
        file_id: Uuid,
    ) -> Result<FileRecord, AppError> {
        self.catalog
            .get(file_id)
            .await?
            .filter(|r| !r.tombstoned && r.owner_id == owner.id)
            .ok_or_else(not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MemoryCatalog;
    use chrono::Duration;
    use cubby_core::{NewFileRecord, StorageBackend};

    async fn seed(catalog: &MemoryCatalog, owner: Uuid) -> FileRecord {
        catalog
            .create_record(NewFileRecord {
                id: Uuid::new_v4(),
                owner_id: owner,
                filename: "a.bin".to_string(),
                content_type: "application/octet-stream".to_string(),
                size: 4,
                chunk_count: 1,
                backend: StorageBackend::Filesystem,
                content_hash: None,
                folder_id: None,
            })
            .await
    }

    fn guard(catalog: &MemoryCatalog) -> (AccessGuard, TempTokenStore) {
        let tokens = TempTokenStore::new();
        (
            AccessGuard::new(Arc::new(catalog.clone()), tokens.clone()),
            tokens,
        )
    }

    #[tokio::test]
    async fn test_owner_authorized_for_own_file_only() {
        let catalog = MemoryCatalog::default();
        let owner = Uuid::new_v4();
        let record = seed(&catalog, owner).await;
        let (guard, _) = guard(&catalog);

        let me = AccessCredential::Owner(Identity::new(owner));
        assert!(guard.authorize_read(&me, record.id).await.is_ok());

        let stranger = AccessCredential::Owner(Identity::new(Uuid::new_v4()));
        assert!(matches!(
            guard.authorize_read(&stranger, record.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_public_link_reusable() {
        let catalog = MemoryCatalog::default();
        let owner = Uuid::new_v4();
        let record = seed(&catalog, owner).await;
        catalog
            .set_link(
                owner,
                record.id,
                LinkState::Public,
                Some("tok".to_string()),
            )
            .await
            .unwrap();
        let (guard, _) = guard(&catalog);

        let cred = AccessCredential::Link {
            token: "tok".to_string(),
        };
        assert!(guard.authorize_read(&cred, record.id).await.is_ok());
        assert!(guard.authorize_read(&cred, record.id).await.is_ok());

        let wrong = AccessCredential::Link {
            token: "nope".to_string(),
        };
        assert!(guard.authorize_read(&wrong, record.id).await.is_err());
    }

    #[tokio::test]
    async fn test_one_time_link_consumed() {
        let catalog = MemoryCatalog::default();
        let owner = Uuid::new_v4();
        let record = seed(&catalog, owner).await;
        catalog
            .set_link(
                owner,
                record.id,
                LinkState::OneTime,
                Some("once".to_string()),
            )
            .await
            .unwrap();
        let (guard, _) = guard(&catalog);

        let cred = AccessCredential::Link {
            token: "once".to_string(),
        };
        assert!(guard.authorize_read(&cred, record.id).await.is_ok());
        assert!(matches!(
            guard.authorize_read(&cred, record.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_temp_token_scope_and_expiry() {
        let catalog = MemoryCatalog::default();
        let owner = Uuid::new_v4();
        let record = seed(&catalog, owner).await;
        let other = seed(&catalog, owner).await;
        let (guard, tokens) = guard(&catalog);

        let token = tokens.issue(
            owner,
            Some(record.id),
            None,
            Duration::seconds(60),
            false,
        );
        let cred = AccessCredential::Temp {
            token: token.clone(),
        };
        assert!(guard.authorize_read(&cred, record.id).await.is_ok());

        // Scoped to record, not other
        assert!(matches!(
            guard.authorize_read(&cred, other.id).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_temp_token_for_foreign_owner_denied() {
        let catalog = MemoryCatalog::default();
        let record = seed(&catalog, Uuid::new_v4()).await;
        let (guard, tokens) = guard(&catalog);

        // Valid token for a user who does not own the file
        let token = tokens.issue(Uuid::new_v4(), None, None, Duration::seconds(60), false);
        let cred = AccessCredential::Temp { token };
        assert!(matches!(
            guard.authorize_read(&cred, record.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_tombstoned_record_invisible() {
        let catalog = MemoryCatalog::default();
        let owner = Uuid::new_v4();
        let record = seed(&catalog, owner).await;
        catalog.tombstone(owner, record.id).await.unwrap();
        let (guard, _) = guard(&catalog);

        let me = AccessCredential::Owner(Identity::new(owner));
        assert!(matches!(
            guard.authorize_read(&me, record.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
