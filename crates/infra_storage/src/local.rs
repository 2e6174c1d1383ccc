//! Filesystem-backed blob store

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument};

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_claims::BlobStore;

use crate::error::StorageError;

const ADAPTER_ID: &str = "local-blob-store";

/// Stores blobs as plain files under a media root
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// # Arguments
    ///
    /// * `root` - Media directory; blob keys resolve below it
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a storage key onto a file under the root
    ///
    /// Only normal path components are accepted: no `..`, no absolute
    /// paths, no drive prefixes.
    pub fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let mut resolved = self.root.clone();
        let mut depth = 0;

        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                _ => return Err(StorageError::InvalidPath(key.to_string())),
            }
        }

        if depth == 0 {
            return Err(StorageError::InvalidPath(key.to_string()));
        }
        Ok(resolved)
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io(key, e))?;
        }

        // Readers never see a partially written file
        let mut partial = path.clone().into_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);
        fs::write(&partial, bytes)
            .await
            .map_err(|e| StorageError::io(key, e))?;
        fs::rename(&partial, &path)
            .await
            .map_err(|e| StorageError::io(key, e))
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(key)?;
        fs::read(&path).await.map_err(|e| StorageError::io(key, e))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }
}

impl DomainPort for LocalBlobStore {}

#[async_trait]
impl HealthCheckable for LocalBlobStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = fs::metadata(&self.root).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(meta) if meta.is_dir() => HealthCheckResult::healthy(ADAPTER_ID, latency_ms),
            Ok(_) => HealthCheckResult::unhealthy(
                ADAPTER_ID,
                latency_ms,
                format!("{} is not a directory", self.root.display()),
            ),
            Err(e) => HealthCheckResult::unhealthy(
                ADAPTER_ID,
                latency_ms,
                format!("Media root unavailable: {}", e),
            ),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<(), PortError> {
        self.write(path, &bytes).await?;
        debug!("Stored blob");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, path: &str) -> Result<Vec<u8>, PortError> {
        Ok(self.read(path).await?)
    }

    #[instrument(skip(self))]
    async fn delete(&self, path: &str) -> Result<(), PortError> {
        self.remove(path).await?;
        debug!("Removed blob");
        Ok(())
    }
}
