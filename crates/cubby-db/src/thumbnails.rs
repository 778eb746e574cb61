use async_trait::async_trait;
use bytes::Bytes;
use cubby_core::catalog::{ThumbnailArtifact, ThumbnailStore};
use cubby_core::{AppError, ThumbnailTier};
use sqlx::PgPool;
use uuid::Uuid;

/// Thumbnail cache repository over the `thumbnails` table.
#[derive(Clone)]
pub struct ThumbnailRepository {
    pool: PgPool,
}

impl ThumbnailRepository {
    pub fn new(pool: PgPool) -> Self {
        ThumbnailRepository { pool }
    }
}

#[async_trait]
impl ThumbnailStore for ThumbnailRepository {
    async fn get(
        &self,
        file_id: Uuid,
        tier: ThumbnailTier,
    ) -> Result<Option<ThumbnailArtifact>, AppError> {
        let row: Option<(String, Vec<u8>)> = sqlx::query_as(
            "SELECT content_type, data FROM thumbnails WHERE file_id = $1 AND tier = $2",
        )
        .bind(file_id)
        .bind(tier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(content_type, data)| ThumbnailArtifact {
            content_type,
            data: Bytes::from(data),
        }))
    }

    #[tracing::instrument(skip(self, artifact), fields(db.table = "thumbnails", db.operation = "upsert", file_id = %file_id))]
    async fn put(
        &self,
        file_id: Uuid,
        tier: ThumbnailTier,
        artifact: ThumbnailArtifact,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO thumbnails (file_id, tier, content_type, data)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (file_id, tier)
            DO UPDATE SET content_type = EXCLUDED.content_type, data = EXCLUDED.data
            "#,
        )
        .bind(file_id)
        .bind(tier)
        .bind(&artifact.content_type)
        .bind(artifact.data.as_ref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn invalidate(&self, file_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM thumbnails WHERE file_id = $1")
            .bind(file_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
