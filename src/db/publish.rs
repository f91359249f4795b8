//! Hand-off of a finished run into the database.

use crate::{Error, Result};
use crate::tasks::TaskData;
use crate::types::{Manifest, RunReport, TaskOutcome};

use super::{Database, NewDocument, PublishSummary, document_status};

impl Database {
    /// Persist every artifact a run stored
    ///
    /// Each manifest becomes a document row; documents whose checksum changed
    /// (or that are new) get a chunk job in the same transaction, so a failed
    /// enqueue leaves the stored checksum untouched for the next publish.
    /// Inline text from a bell schedule task is also saved as the current call
    /// schedule. Failed tasks contribute nothing. Dry-run reports are not
    /// published.
    pub async fn publish_report(&self, report: &RunReport) -> Result<PublishSummary> {
        let mut summary = PublishSummary::default();

        if report.dry_run {
            tracing::info!(run_id = %report.run_id, "Dry run, nothing published");
            return Ok(summary);
        }

        for (name, outcome) in &report.tasks {
            let TaskOutcome::Succeeded {
                data, artifacts, ..
            } = outcome
            else {
                continue;
            };

            for manifest in artifacts {
                let doc = new_document(name, data, manifest);
                // A checksum must never advance without its chunk job
                let mut tx = self.pool.begin().await.map_err(Error::Sqlx)?;
                let written = match Self::upsert_document_on(&mut *tx, &doc).await? {
                    Some(id) => {
                        Self::enqueue_chunk_document_job_on(&mut *tx, id).await?;
                        true
                    }
                    None => false,
                };
                tx.commit().await.map_err(Error::Sqlx)?;

                if written {
                    summary.documents_written += 1;
                    summary.jobs_enqueued += 1;
                } else {
                    summary.documents_unchanged += 1;
                }
            }

            if let Some(lines) = data.text_lines()
                && self.save_call_schedule(lines).await?
            {
                summary.call_schedule_saved = true;
            }
        }

        tracing::info!(
            run_id = %report.run_id,
            written = summary.documents_written,
            unchanged = summary.documents_unchanged,
            jobs = summary.jobs_enqueued,
            "Run published"
        );

        Ok(summary)
    }
}

fn new_document(task: &str, data: &TaskData, manifest: &Manifest) -> NewDocument {
    let title = data
        .title_for(&manifest.source.url)
        .unwrap_or(task)
        .to_string();

    NewDocument {
        source_type: manifest.source_type.as_str().to_string(),
        source_id: manifest.source.source_id.clone(),
        url: Some(manifest.source.url.clone()),
        title: Some(title),
        mime_type: Some(manifest.source.mime_type.clone()),
        checksum: manifest.checksum.clone(),
        status: document_status::FETCHED.to_string(),
        raw_path: manifest.raw_path.clone(),
        last_error: None,
        parsed_at: Some(manifest.created_at.timestamp()),
    }
}
