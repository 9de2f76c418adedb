use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::db::write_atomic;
use crate::{AppError, AppResult};

/// Progress callback for uploads: (bytes_sent, bytes_total).
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Cooperative cancellation for in-flight uploads.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        CancelFlag(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Credential operations backed by an external identity provider.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<()>;
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<()>;
    async fn send_password_reset(&self, email: &str) -> AppResult<()>;
    async fn confirm_password_reset(&self, token: &str, new_password: &str) -> AppResult<()>;
}

/// File storage for attachments, avatars and media. `upload` returns the URL
/// the stored record should carry.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        progress: Option<ProgressFn>,
        cancel: &CancelFlag,
    ) -> AppResult<String>;
}

/// Blob store rooted at a local directory. Uploads land under `base` and are
/// addressed as `file://` URLs.
pub struct LocalBlobStore {
    base: PathBuf,
}

const UPLOAD_CHUNK: usize = 64 * 1024;

impl LocalBlobStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        LocalBlobStore { base: base.into() }
    }

    fn sanitize_rel_path(path: &str) -> AppResult<PathBuf> {
        let rel = Path::new(path);
        if path.is_empty()
            || rel.is_absolute()
            || rel
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::new("UPLOAD/PATH", "Invalid upload path")
                .with_context("path", path.to_string()));
        }
        Ok(rel.to_path_buf())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        progress: Option<ProgressFn>,
        cancel: &CancelFlag,
    ) -> AppResult<String> {
        let rel = Self::sanitize_rel_path(path)?;
        let dest = self.base.join(rel);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                AppError::from(err)
                    .with_context("operation", "upload")
                    .with_context("path", path.to_string())
            })?;
        }

        let total = bytes.len() as u64;
        let mut staged: Vec<u8> = Vec::with_capacity(bytes.len());
        for chunk in bytes.chunks(UPLOAD_CHUNK.max(1)) {
            if cancel.is_cancelled() {
                return Err(AppError::new("UPLOAD/CANCELLED", "Upload cancelled")
                    .with_context("path", path.to_string()));
            }
            staged.extend_from_slice(chunk);
            if let Some(report) = &progress {
                report(staged.len() as u64, total);
            }
        }
        if cancel.is_cancelled() {
            return Err(AppError::new("UPLOAD/CANCELLED", "Upload cancelled")
                .with_context("path", path.to_string()));
        }

        write_atomic(&dest, &staged).map_err(|err| {
            AppError::from(err)
                .with_context("operation", "upload")
                .with_context("path", path.to_string())
        })?;
        info!(target: "autovault", event = "blob_stored", path, size = total);
        Ok(format!("file://{}", dest.display()))
    }
}
