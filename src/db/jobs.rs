//! Job queue.

use crate::{Error, Result};
use sqlx::SqliteConnection;

use super::{Database, DocumentId, Job};

/// Job asking a worker to split a stored document into chunks
pub const JOB_CHUNK_DOCUMENT: &str = "JOB_CHUNK_DOCUMENT";

impl Database {
    /// Enqueue a [`JOB_CHUNK_DOCUMENT`] job for `document_id`
    pub async fn enqueue_chunk_document_job(&self, document_id: DocumentId) -> Result<i64> {
        let mut conn = self.pool.acquire().await.map_err(Error::Sqlx)?;
        Self::enqueue_chunk_document_job_on(&mut *conn, document_id).await
    }

    pub(super) async fn enqueue_chunk_document_job_on(
        conn: &mut SqliteConnection,
        document_id: DocumentId,
    ) -> Result<i64> {
        let data = serde_json::json!({ "documentId": document_id }).to_string();

        let result = sqlx::query("INSERT INTO jobs (name, data, created_at) VALUES (?, ?, ?)")
            .bind(JOB_CHUNK_DOCUMENT)
            .bind(data)
            .bind(chrono::Utc::now().timestamp())
            .execute(&mut *conn)
            .await
            .map_err(Error::Sqlx)?;

        Ok(result.last_insert_rowid())
    }

    /// Jobs named `name` that no worker has picked up, oldest first
    pub async fn pending_jobs(&self, name: &str) -> Result<Vec<Job>> {
        sqlx::query_as::<_, Job>(
            r#"
            SELECT id, name, data, state, created_at
            FROM jobs
            WHERE name = ? AND state = 'created'
            ORDER BY id ASC
            "#,
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Sqlx)
    }
}
