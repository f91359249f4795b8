//! Manifest persistence keyed by artifact key

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use super::atomic::write_atomic;
use crate::error::Result;
use crate::key::ArtifactKey;
use crate::types::Manifest;

/// Key/value store of the latest manifest per artifact
///
/// Implementations must replace values atomically and treat missing or
/// unreadable entries as absent.
#[async_trait]
pub trait ManifestIndex: Send + Sync {
    /// Latest manifest for `key`, if one can be read
    async fn get(&self, key: &ArtifactKey) -> Option<Manifest>;

    /// Replace the manifest stored for `key`
    async fn put(&self, key: &ArtifactKey, manifest: &Manifest) -> Result<()>;
}

/// Manifests as pretty-printed JSON files, `{dir}/{key}.json`
#[derive(Debug, Clone)]
pub struct FsManifestIndex {
    dir: PathBuf,
}

impl FsManifestIndex {
    /// Index rooted at `dir` (usually `{artifacts_dir}/parsed`)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the manifest files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a key's manifest lives in
    pub fn manifest_path(&self, key: &ArtifactKey) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl ManifestIndex for FsManifestIndex {
    async fn get(&self, key: &ArtifactKey) -> Option<Manifest> {
        let path = self.manifest_path(key);
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Failed to read existing manifest");
                return None;
            }
        };

        match serde_json::from_slice(&content) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Existing manifest is not valid, ignoring it");
                None
            }
        }
    }

    async fn put(&self, key: &ArtifactKey, manifest: &Manifest) -> Result<()> {
        let json = serde_json::to_vec_pretty(manifest)?;
        write_atomic(&self.manifest_path(key), &json).await
    }
}

/// In-memory index, for tests and throwaway validation runs
#[derive(Debug, Default)]
pub struct MemoryManifestIndex {
    entries: RwLock<HashMap<ArtifactKey, Manifest>>,
}

impl MemoryManifestIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored manifests
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the index holds no manifests
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ManifestIndex for MemoryManifestIndex {
    async fn get(&self, key: &ArtifactKey) -> Option<Manifest> {
        self.entries.read().await.get(key).cloned()
    }

    async fn put(&self, key: &ArtifactKey, manifest: &Manifest) -> Result<()> {
        self.entries.write().await.insert(*key, manifest.clone());
        Ok(())
    }
}
