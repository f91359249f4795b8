//! Call schedule text.

use crate::{Error, Result};

use super::Database;

/// Shown to bot users before any bell schedule has been crawled
pub const CALL_SCHEDULE_PLACEHOLDER: &str = "⚠️ This information is missing from the database!";

impl Database {
    /// Save the bell schedule as one text block
    ///
    /// Lines are joined with newlines and trimmed. Returns `false` without
    /// touching the table when nothing but whitespace remains.
    pub async fn save_call_schedule(&self, lines: &[String]) -> Result<bool> {
        let content = lines.join("\n");
        let content = content.trim();
        if content.is_empty() {
            return Ok(false);
        }

        sqlx::query("INSERT INTO call_schedule (content, created_at) VALUES (?, ?)")
            .bind(content)
            .bind(chrono::Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .map_err(Error::Sqlx)?;

        Ok(true)
    }

    /// Most recently saved bell schedule
    pub async fn latest_call_schedule(&self) -> Result<Option<String>> {
        // id breaks ties between saves within the same second
        sqlx::query_scalar(
            "SELECT content FROM call_schedule ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Sqlx)
    }

    /// Latest bell schedule, or [`CALL_SCHEDULE_PLACEHOLDER`] when none exists
    pub async fn call_schedule_or_placeholder(&self) -> Result<String> {
        Ok(self
            .latest_call_schedule()
            .await?
            .unwrap_or_else(|| CALL_SCHEDULE_PLACEHOLDER.to_string()))
    }
}
