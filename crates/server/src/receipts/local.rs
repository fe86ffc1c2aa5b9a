use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use super::{ReceiptStore, ReceiptUpload, StoredReceipt, UploadError};

/// Keeps receipts in a directory served by the app under `/receipts`.
#[derive(Debug, Clone)]
pub struct LocalReceipts {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalReceipts {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, UploadError> {
        // Keys are generated file names, never paths.
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(UploadError::Rejected(format!("bad receipt key '{key}'")));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl ReceiptStore for LocalReceipts {
    async fn put(&self, upload: ReceiptUpload) -> Result<StoredReceipt, UploadError> {
        let ext = upload.validate()?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let key = format!("{}.{ext}", Uuid::new_v4());
        tokio::fs::write(self.path_for(&key)?, &upload.bytes).await?;
        tracing::debug!(%key, bytes = upload.bytes.len(), "receipt stored");

        Ok(StoredReceipt {
            url: format!("{}/receipts/{key}", self.public_base_url),
            key,
        })
    }

    async fn remove(&self, receipt: &StoredReceipt) -> Result<(), UploadError> {
        match tokio::fs::remove_file(self.path_for(&receipt.key)?).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn serve_dir(&self) -> Option<&Path> {
        Some(&self.dir)
    }
}
