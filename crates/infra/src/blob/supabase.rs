//! Supabase-storage HTTP adapter for the ticket bucket.
//!
//! Talks to the storage REST API with the service-role key: object upload
//! (with upsert), signed-URL creation, and object deletion.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::config::StorageConfig;

use super::{BlobError, TicketBucket};

pub struct SupabaseTicketBucket {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseTicketBucket {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url,
            service_key: config.service_key,
            bucket: config.bucket,
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }

    fn sign_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

#[async_trait]
impl TicketBucket for SupabaseTicketBucket {
    async fn upload(&self, path: &str, png: Vec<u8>) -> Result<(), BlobError> {
        let response = self
            .http
            .post(self.object_url(path))
            .bearer_auth(&self.service_key)
            .header("x-upsert", "true")
            .header(CONTENT_TYPE, "image/png")
            .body(png)
            .send()
            .await
            .map_err(|e| BlobError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BlobError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    async fn signed_url(&self, path: &str, expires_in_secs: u64) -> Result<String, BlobError> {
        let response = self
            .http
            .post(self.sign_url(path))
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "expiresIn": expires_in_secs }))
            .send()
            .await
            .map_err(|e| BlobError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BlobError::Status(response.status().as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BlobError::Malformed(e.to_string()))?;
        let signed = body
            .get("signedURL")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BlobError::Malformed("missing signedURL".to_string()))?;

        // The API returns a path relative to /storage/v1.
        if signed.starts_with("http") {
            Ok(signed.to_string())
        } else {
            Ok(format!("{}/storage/v1{signed}", self.base_url))
        }
    }

    async fn remove(&self, path: &str) -> Result<(), BlobError> {
        let response = self
            .http
            .delete(self.object_url(path))
            .bearer_auth(&self.service_key)
            .send()
            .await
            .map_err(|e| BlobError::Transport(e.to_string()))?;

        // A vanished object is an acceptable outcome for a compensating delete.
        if !response.status().is_success() && response.status().as_u16() != 404 {
            return Err(BlobError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
