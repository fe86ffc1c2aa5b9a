//! Receipt attachments for expenses.
//!
//! A receipt is validated before it reaches a [`ReceiptStore`]. The store
//! hands back a public URL that is saved on the expense, plus a key used to
//! remove the file again when the expense could not be written.

use std::path::Path;

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;

pub use cloudinary::{CloudinaryConfig, CloudinaryReceipts, DEFAULT_FOLDER as DEFAULT_CLOUDINARY_FOLDER};
pub use local::LocalReceipts;

mod cloudinary;
mod local;

pub const MAX_RECEIPT_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "pdf"];

#[derive(Debug, Error)]
pub enum UploadError {
    /// The file itself is not acceptable.
    #[error("{0}")]
    Invalid(String),
    #[error("receipt storage rejected the file: {0}")]
    Rejected(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// A file received in the `file` field of a multipart form.
#[derive(Debug, Clone)]
pub struct ReceiptUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

impl ReceiptUpload {
    /// Lowercased extension of the file name.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Checks type and size; returns the normalized extension.
    pub fn validate(&self) -> Result<String, UploadError> {
        let ext = self
            .extension()
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| {
                UploadError::Invalid(format!(
                    "unsupported file type, allowed: {}",
                    ALLOWED_EXTENSIONS.join(", ")
                ))
            })?;
        if self.bytes.is_empty() {
            return Err(UploadError::Invalid("file is empty".to_string()));
        }
        if self.bytes.len() > MAX_RECEIPT_BYTES {
            return Err(UploadError::Invalid(
                "file exceeds the 5 MiB limit".to_string(),
            ));
        }
        Ok(ext)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReceipt {
    pub url: String,
    /// Provider specific handle for [`ReceiptStore::remove`].
    pub key: String,
}

#[async_trait]
pub trait ReceiptStore: Send + Sync {
    async fn put(&self, upload: ReceiptUpload) -> Result<StoredReceipt, UploadError>;

    async fn remove(&self, receipt: &StoredReceipt) -> Result<(), UploadError>;

    /// Directory to serve under `/receipts`, for stores that keep files locally.
    fn serve_dir(&self) -> Option<&Path> {
        None
    }
}

impl From<StoredReceipt> for engine::Receipt {
    fn from(value: StoredReceipt) -> Self {
        Self {
            url: value.url,
            key: value.key,
        }
    }
}

impl From<engine::Receipt> for StoredReceipt {
    fn from(value: engine::Receipt) -> Self {
        Self {
            url: value.url,
            key: value.key,
        }
    }
}

/// Best effort removal of a receipt no expense references: one whose
/// expense was not saved, was replaced or was deleted.
pub(crate) async fn discard(
    store: &dyn ReceiptStore,
    receipt: Option<impl Into<StoredReceipt>>,
) {
    let Some(receipt) = receipt.map(Into::into) else {
        return;
    };
    match store.remove(&receipt).await {
        Ok(()) => tracing::debug!(key = %receipt.key, "discarded orphan receipt"),
        Err(err) => tracing::warn!(key = %receipt.key, "failed to discard receipt: {err}"),
    }
}
