//! Artifact store
//!
//! Turns a fetched payload into a content-addressed artifact:
//! - [`atomic`]: crash-safe temp-write-then-rename
//! - [`index`]: latest manifest per artifact key
//!
//! A payload whose checksum matches the stored manifest is a no-op and the
//! stored manifest comes back untouched, `createdAt` included.

use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::classify::{self, GuardVerdict};
use crate::config::Config;
use crate::error::Result;
use crate::key::{ArtifactKey, sha256_hex};
use crate::normalize::normalize_url;
use crate::types::{MANIFEST_VERSION, Manifest, ManifestSource, RunId};

pub mod atomic;
pub mod index;

pub use atomic::write_atomic;
pub use index::{FsManifestIndex, ManifestIndex, MemoryManifestIndex};

/// One payload ready to be stored
#[derive(Clone, Debug)]
pub struct Payload {
    /// Raw bytes
    pub bytes: Vec<u8>,
    /// MIME type as declared by upstream (may carry parameters, may be empty)
    pub mime_type: String,
    /// Source URL the payload came from
    pub source_url: String,
    /// Whether the payload is expected to be plain text
    ///
    /// Text payloads are sniffed for HTML whatever they declare; others only
    /// when declared as HTML.
    pub expect_text: bool,
}

impl Payload {
    /// Payload for a remote file
    pub fn remote(bytes: Vec<u8>, mime_type: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            source_url: source_url.into(),
            expect_text: false,
        }
    }

    /// Plain-text payload
    pub fn text(bytes: Vec<u8>, source_url: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: "text/plain".to_string(),
            source_url: source_url.into(),
            expect_text: true,
        }
    }
}

type LockMap = HashMap<ArtifactKey, Arc<Mutex<()>>>;

/// Per-key async locks serializing check-then-write
///
/// Entries live only while some save holds or waits on them, so a long-lived
/// store does not accumulate one lock per artifact ever seen.
#[derive(Default)]
struct KeyLocks {
    locks: Arc<StdMutex<LockMap>>,
}

impl KeyLocks {
    async fn acquire(&self, key: ArtifactKey) -> KeyGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(key).or_default().clone()
        };
        KeyGuard {
            key,
            guard: Some(lock.lock_owned().await),
            locks: Arc::clone(&self.locks),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Held lock for one key; prunes the map entry on release
struct KeyGuard {
    key: ArtifactKey,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<StdMutex<LockMap>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the map's own handle left means nobody holds or awaits the lock
        if locks
            .get(&self.key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.key);
        }
    }
}

/// Content-addressed artifact store
///
/// Raw payloads go to `{raw_dir}/{key}.{ext}`; manifests go through a
/// [`ManifestIndex`]. Safe to share between concurrent tasks.
pub struct ArtifactStore {
    raw_dir: PathBuf,
    index: Arc<dyn ManifestIndex>,
    dry_run: bool,
    locks: KeyLocks,
}

impl ArtifactStore {
    /// Create a store over an explicit raw directory and manifest index
    pub fn new(raw_dir: impl Into<PathBuf>, index: Arc<dyn ManifestIndex>, dry_run: bool) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            index,
            dry_run,
            locks: KeyLocks::default(),
        }
    }

    /// Filesystem store under `{artifacts_dir}/raw` and `{artifacts_dir}/parsed`
    pub fn on_disk(artifacts_dir: &Path, dry_run: bool) -> Self {
        Self::new(
            artifacts_dir.join("raw"),
            Arc::new(FsManifestIndex::new(artifacts_dir.join("parsed"))),
            dry_run,
        )
    }

    /// Filesystem store as described by the configuration
    pub fn from_config(config: &Config) -> Self {
        Self::on_disk(&config.artifacts_dir, config.dry_run)
    }

    /// Whether writes are suppressed
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Store a payload and return its manifest
    ///
    /// Returns `Ok(None)` when the HTML guard rejects the payload; nothing is
    /// written in that case. When the stored manifest already carries the same
    /// checksum it is returned as-is and no file is touched. In dry-run mode
    /// the candidate manifest is returned without writing.
    ///
    /// # Errors
    ///
    /// Fails on an unparseable source URL or when the raw payload or the
    /// manifest cannot be written.
    pub async fn save(&self, payload: &Payload, run_id: &RunId) -> Result<Option<Manifest>> {
        let normalized = normalize_url(&payload.source_url)?;

        let declared = match classify::guard(&payload.bytes, &payload.mime_type, payload.expect_text)
        {
            GuardVerdict::Accept(mime) => mime,
            GuardVerdict::Reject => {
                tracing::warn!(
                    url = %payload.source_url,
                    mime = %payload.mime_type,
                    "Skipping HTML page served in place of an artifact"
                );
                return Ok(None);
            }
        };

        let source_type = classify::classify(&declared);
        let effective_mime = if declared.is_empty() {
            source_type.mime_type().to_string()
        } else {
            declared
        };

        let key = ArtifactKey::derive(source_type, &normalized);
        let file_name = format!("{}.{}", key, source_type.extension());
        let raw_path = self.raw_dir.join(&file_name);

        let candidate = Manifest {
            source_type,
            version: MANIFEST_VERSION,
            run_id: run_id.clone(),
            source: ManifestSource {
                url: payload.source_url.clone(),
                source_id: normalized,
                mime_type: effective_mime,
            },
            raw_path: format!("raw/{}", file_name),
            checksum: sha256_hex(&payload.bytes),
            created_at: Utc::now(),
        };

        let _guard = self.locks.acquire(key).await;

        if let Some(existing) = self.index.get(&key).await
            && existing.checksum == candidate.checksum
        {
            tracing::info!(url = %payload.source_url, %key, "Unchanged artifact skipped");
            return Ok(Some(existing));
        }

        if self.dry_run {
            tracing::info!(url = %payload.source_url, %key, "Dry-run: skipping writes");
            return Ok(Some(candidate));
        }

        write_atomic(&raw_path, &payload.bytes).await?;
        self.index.put(&key, &candidate).await?;
        tracing::info!(
            url = %payload.source_url,
            raw = ?raw_path,
            checksum = %candidate.checksum,
            "Saved artifact"
        );

        Ok(Some(candidate))
    }
}
