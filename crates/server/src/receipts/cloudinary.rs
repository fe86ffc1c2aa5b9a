use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use uuid::Uuid;

use super::{ReceiptStore, ReceiptUpload, StoredReceipt, UploadError};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
pub const DEFAULT_FOLDER: &str = "trackonomy/expenses";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    resource_type: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// Signed uploads to Cloudinary's REST API.
#[derive(Debug, Clone)]
pub struct CloudinaryReceipts {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

/// Cloudinary request signature: the sorted `key=value` pairs joined by `&`,
/// followed by the API secret, hashed with SHA-1.
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut params = params.to_vec();
    params.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl CloudinaryReceipts {
    pub fn new(config: CloudinaryConfig, timeout: Duration) -> Result<Self, UploadError> {
        if config.cloud_name.is_empty() || config.api_key.is_empty() || config.api_secret.is_empty()
        {
            return Err(UploadError::Rejected(
                "cloudinary cloud_name, api_key and api_secret are required".to_string(),
            ));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, resource_type: &str, action: &str) -> String {
        format!(
            "{API_BASE}/{}/{resource_type}/{action}",
            self.config.cloud_name
        )
    }

    async fn rejected(res: reqwest::Response) -> UploadError {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        UploadError::Rejected(format!("{status}: {body}"))
    }
}

#[async_trait]
impl ReceiptStore for CloudinaryReceipts {
    async fn put(&self, upload: ReceiptUpload) -> Result<StoredReceipt, UploadError> {
        upload.validate()?;

        let public_id = Uuid::new_v4().to_string();
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(
            &[
                ("folder", self.config.folder.as_str()),
                ("public_id", public_id.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            &self.config.api_secret,
        );

        let part = Part::bytes(upload.bytes.to_vec()).file_name(upload.file_name);
        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("folder", self.config.folder.clone())
            .text("public_id", public_id)
            .text("timestamp", timestamp)
            .text("signature", signature);

        let res = self
            .client
            .post(self.endpoint("auto", "upload"))
            .multipart(form)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::rejected(res).await);
        }
        let uploaded: UploadResponse = res.json().await?;
        tracing::debug!(public_id = %uploaded.public_id, "receipt uploaded to cloudinary");

        Ok(StoredReceipt {
            url: uploaded.secure_url,
            key: format!("{}/{}", uploaded.resource_type, uploaded.public_id),
        })
    }

    async fn remove(&self, receipt: &StoredReceipt) -> Result<(), UploadError> {
        let (resource_type, public_id) = receipt
            .key
            .split_once('/')
            .ok_or_else(|| UploadError::Rejected(format!("bad receipt key '{}'", receipt.key)))?;

        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(
            &[("public_id", public_id), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );
        let form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("public_id", public_id.to_string())
            .text("timestamp", timestamp)
            .text("signature", signature);

        let res = self
            .client
            .post(self.endpoint(resource_type, "destroy"))
            .multipart(form)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(Self::rejected(res).await);
        }
        let destroyed: DestroyResponse = res.json().await?;
        match destroyed.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(UploadError::Rejected(format!("destroy returned '{other}'"))),
        }
    }
}
