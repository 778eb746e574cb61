//! Link management: public and one-time share tokens.

use cubby_core::tokens::generate_token;
use cubby_core::{AppError, FileCatalog, Identity, LinkState, PublicFileInfo};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

fn not_found() -> AppError {
    AppError::NotFound("File not found".to_string())
}

/// Owner-facing link state transitions plus the public info lookup.
#[derive(Clone)]
pub struct LinkService {
    catalog: Arc<dyn FileCatalog>,
}

impl LinkService {
    pub fn new(catalog: Arc<dyn FileCatalog>) -> Self {
        LinkService { catalog }
    }

    /// Make the file publicly readable via a reusable token.
    pub async fn make_public(&self, owner: &Identity, file_id: Uuid) -> Result<String, AppError> {
        self.set_link(owner, file_id, LinkState::Public).await
    }

    /// Issue a token that authorizes exactly one read.
    pub async fn make_one_time(&self, owner: &Identity, file_id: Uuid) -> Result<String, AppError> {
        self.set_link(owner, file_id, LinkState::OneTime).await
    }

    async fn set_link(
        &self,
        owner: &Identity,
        file_id: Uuid,
        state: LinkState,
    ) -> Result<String, AppError> {
        let token = generate_token();
        self.catalog
            .set_link(owner.id, file_id, state, Some(token.clone()))
            .await?
            .ok_or_else(not_found)?;

        tracing::info!(file_id = %file_id, owner_id = %owner.id, state = ?state, "Link state updated");
        Ok(token)
    }

    /// Revoke any link on the file.
    pub async fn remove_link(&self, owner: &Identity, file_id: Uuid) -> Result<(), AppError> {
        self.catalog
            .set_link(owner.id, file_id, LinkState::None, None)
            .await?
            .ok_or_else(not_found)?;

        tracing::info!(file_id = %file_id, owner_id = %owner.id, "Link removed");
        Ok(())
    }

    /// Sanitized metadata for a share landing page. Validates the token but
    /// does not consume one-time links; only the content read consumes.
    pub async fn public_info(
        &self,
        file_id: Uuid,
        token: &str,
    ) -> Result<PublicFileInfo, AppError> {
        let record = self
            .catalog
            .get(file_id)
            .await?
            .filter(|r| !r.tombstoned && r.link_state != LinkState::None)
            .ok_or_else(not_found)?;

        let matches = match record.link_token.as_deref() {
            Some(stored) if stored.len() == token.len() => {
                bool::from(stored.as_bytes().ct_eq(token.as_bytes()))
            }
            _ => false,
        };
        if !matches {
            return Err(not_found());
        }

        Ok(PublicFileInfo::from(&record))
    }
}
