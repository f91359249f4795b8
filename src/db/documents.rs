//! Document upsert and checksum lookup.

use crate::{Error, Result};
use sqlx::SqliteConnection;

use super::{Database, Document, DocumentId, NewDocument};

impl Database {
    /// Insert a document or refresh it when its checksum changed
    ///
    /// Rows are keyed by `(source_type, source_id)`. Returns the row id when a
    /// row was inserted or updated and `None` when the stored checksum already
    /// matched, so callers only enqueue follow-up work for real changes.
    pub async fn upsert_document(&self, doc: &NewDocument) -> Result<Option<DocumentId>> {
        let mut conn = self.pool.acquire().await.map_err(Error::Sqlx)?;
        Self::upsert_document_on(&mut *conn, doc).await
    }

    /// [`upsert_document`](Self::upsert_document) on a caller-provided
    /// connection, so it can share a transaction with follow-up writes
    pub(super) async fn upsert_document_on(
        conn: &mut SqliteConnection,
        doc: &NewDocument,
    ) -> Result<Option<DocumentId>> {
        let now = chrono::Utc::now().timestamp();

        let id: Option<DocumentId> = sqlx::query_scalar(
            r#"
            INSERT INTO documents (
                source_type, source_id, url, title, mime_type, checksum,
                status, raw_path, last_error, parsed_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (source_type, source_id) DO UPDATE SET
                url = excluded.url,
                title = excluded.title,
                mime_type = excluded.mime_type,
                checksum = excluded.checksum,
                status = excluded.status,
                raw_path = excluded.raw_path,
                last_error = excluded.last_error,
                parsed_at = excluded.parsed_at,
                updated_at = excluded.updated_at
            WHERE documents.checksum IS NOT excluded.checksum
            RETURNING id
            "#,
        )
        .bind(&doc.source_type)
        .bind(&doc.source_id)
        .bind(&doc.url)
        .bind(&doc.title)
        .bind(&doc.mime_type)
        .bind(&doc.checksum)
        .bind(&doc.status)
        .bind(&doc.raw_path)
        .bind(&doc.last_error)
        .bind(doc.parsed_at)
        .bind(now)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await
        .map_err(Error::Sqlx)?;

        if let Some(id) = id {
            tracing::debug!(id, source_id = %doc.source_id, "Document written");
        }

        Ok(id)
    }

    /// Stored checksum for a document, if any
    pub async fn document_checksum(
        &self,
        source_type: &str,
        source_id: &str,
    ) -> Result<Option<String>> {
        sqlx::query_scalar(
            "SELECT checksum FROM documents WHERE source_type = ? AND source_id = ? LIMIT 1",
        )
        .bind(source_type)
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Sqlx)
    }

    /// Get a document by ID
    pub async fn get_document(&self, id: DocumentId) -> Result<Option<Document>> {
        sqlx::query_as::<_, Document>(
            r#"
            SELECT id, source_type, source_id, url, title, mime_type, checksum,
                   status, raw_path, last_error, parsed_at, created_at, updated_at
            FROM documents
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Sqlx)
    }

    /// Number of stored documents
    pub async fn count_documents(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Sqlx)
    }
}
