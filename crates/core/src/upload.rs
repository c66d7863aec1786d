//! Upload collaborator for `file` fields.
//!
//! The form engine only ever sees the returned [`UploadedFile`]; the URL is
//! treated as an opaque string.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::form::field::UploadedFile;

/// Default maximum upload size (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Longest file extension kept from the original name.
const MAX_EXTENSION_LEN: usize = 10;

#[async_trait]
pub trait UploadService: Send + Sync {
    /// Store `data` and return where it can be fetched.
    ///
    /// Fails with [`CoreError::UploadFailed`]; callers leave the affected
    /// field unset rather than aborting the whole form.
    async fn upload(&self, file_name: &str, data: &[u8]) -> Result<UploadedFile, CoreError>;
}

/// Stores uploads on local disk under uuid names.
#[derive(Debug, Clone)]
pub struct LocalUploadService {
    root: PathBuf,
    /// URL prefix the stored files are served under, e.g. `/files`.
    public_base: String,
    max_bytes: usize,
}

impl LocalUploadService {
    pub fn new(root: impl Into<PathBuf>, public_base: &str, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

/// Lowercased extension of `file_name`, if it has a short alphanumeric one.
fn safe_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > MAX_EXTENSION_LEN {
        return None;
    }
    ext.chars()
        .all(|c| c.is_ascii_alphanumeric())
        .then(|| ext.to_ascii_lowercase())
}

#[async_trait]
impl UploadService for LocalUploadService {
    async fn upload(&self, file_name: &str, data: &[u8]) -> Result<UploadedFile, CoreError> {
        if data.is_empty() {
            return Err(CoreError::UploadFailed(format!("'{file_name}' is empty")));
        }
        if data.len() > self.max_bytes {
            return Err(CoreError::UploadFailed(format!(
                "'{file_name}' is {} bytes (max {})",
                data.len(),
                self.max_bytes
            )));
        }

        let stored_name = match safe_extension(file_name) {
            Some(ext) => format!("{}.{ext}", uuid::Uuid::new_v4()),
            None => uuid::Uuid::new_v4().to_string(),
        };

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CoreError::UploadFailed(e.to_string()))?;
        tokio::fs::write(self.root.join(&stored_name), data)
            .await
            .map_err(|e| CoreError::UploadFailed(e.to_string()))?;

        tracing::debug!(file_name, stored_name = %stored_name, bytes = data.len(), "Upload stored");

        Ok(UploadedFile {
            url: format!("{}/{stored_name}", self.public_base),
            name: file_name.to_string(),
        })
    }
}
