use async_trait::async_trait;
use cubby_core::{AppError, FileCatalog, FileRecord, LinkState, NewFileRecord};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// File record repository
///
/// Owns the `files` table. Records become visible only through `create`,
/// which runs after an upload completed, so readers never observe a partial
/// file. Link-state transitions that must be atomic (one-time consumption)
/// are single UPDATE statements with the full predicate in the WHERE clause.
#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        FileRepository { pool }
    }
}

#[async_trait]
impl FileCatalog for FileRepository {
    async fn get(&self, file_id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, FileRecord>(
            "SELECT * FROM files WHERE id = $1",
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self, record), fields(db.table = "files", db.operation = "insert", file_id = %record.id))]
    async fn create(&self, record: NewFileRecord) -> Result<FileRecord, AppError> {
        let row = sqlx::query_as::<Postgres, FileRecord>(
            r#"
            INSERT INTO files (
                id, owner_id, filename, content_type, size, chunk_count,
                backend, content_hash, folder_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(record.owner_id)
        .bind(&record.filename)
        .bind(&record.content_type)
        .bind(record.size)
        .bind(record.chunk_count)
        .bind(record.backend)
        .bind(&record.content_hash)
        .bind(record.folder_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self, token), fields(db.table = "files", db.operation = "update", file_id = %file_id))]
    async fn set_link(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
        state: LinkState,
        token: Option<String>,
    ) -> Result<Option<FileRecord>, AppError> {
        let row = sqlx::query_as::<Postgres, FileRecord>(
            r#"
            UPDATE files
            SET link_state = $3, link_token = $4
            WHERE id = $1 AND owner_id = $2 AND NOT tombstoned
            RETURNING *
            "#,
        )
        .bind(file_id)
        .bind(owner_id)
        .bind(state)
        .bind(&token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn consume_one_time_link(&self, file_id: Uuid, token: &str) -> Result<bool, AppError> {
        // Atomic check-and-clear: of two concurrent presentations, exactly
        // one UPDATE matches the predicate.
        let result = sqlx::query(
            r#"
            UPDATE files
            SET link_state = 'none', link_token = NULL
            WHERE id = $1
              AND link_state = 'one_time'
              AND link_token = $2
              AND NOT tombstoned
            "#,
        )
        .bind(file_id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "update", file_id = %file_id))]
    async fn tombstone(
        &self,
        owner_id: Uuid,
        file_id: Uuid,
    ) -> Result<Option<FileRecord>, AppError> {
        let row = sqlx::query_as::<Postgres, FileRecord>(
            r#"
            UPDATE files
            SET tombstoned = TRUE
            WHERE id = $1 AND owner_id = $2
            RETURNING *
            "#,
        )
        .bind(file_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "delete", file_id = %file_id))]
    async fn delete(&self, file_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(file_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn mark_small_thumbnail(&self, file_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE files SET has_small_thumbnail = TRUE WHERE id = $1")
            .bind(file_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
