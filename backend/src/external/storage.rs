//! Client for the hosted file storage

use chrono::{DateTime, Utc};
use reqwest::Client;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
    service_key: String,
    tax_docs_bucket: String,
}

/// Object path of a user's W-9 upload inside the tax document bucket
pub fn w9_object_path(user_id: Uuid, at: DateTime<Utc>) -> String {
    format!("{}/w9-{}.pdf", user_id, at.timestamp_millis())
}

impl StorageClient {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
            tax_docs_bucket: config.tax_docs_bucket.clone(),
        }
    }

    /// Upload an object, replacing any existing one at `path`
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<()> {
        let url = format!("{}/object/{}/{}", self.base_url, bucket, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::StorageError(format!("{} - {}", status, body)));
        }
        Ok(())
    }

    /// Store a W-9 PDF and return its object path
    pub async fn upload_w9(&self, user_id: Uuid, bytes: Vec<u8>) -> AppResult<String> {
        let path = w9_object_path(user_id, Utc::now());
        self.upload(&self.tax_docs_bucket, &path, "application/pdf", bytes)
            .await?;
        tracing::info!(user_id = %user_id, bucket = %self.tax_docs_bucket, "W-9 uploaded");
        Ok(path)
    }
}
