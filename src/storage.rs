//! Object storage gateway.
//!
//! Binary blobs (uploaded files, generated PDFs, decorative images) live in a
//! Supabase Storage bucket. Everything goes through the [`ObjectStorage`]
//! trait so handlers and services can run against a fake gateway in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Errors returned by the storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("storage responded with status {status}: {body}")]
    Response { status: u16, body: String },
}

/// A single object listed under a path prefix.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct StorageObject {
    #[schema(example = "Proposal_12-2024.pdf")]
    pub name: String,
}

/// Storage operations are single-attempt fallible network calls; callers
/// decide whether a failure is fatal.
#[async_trait]
pub trait ObjectStorage {
    /// Upload `content` to `path`, returning the stored path.
    async fn upload(
        &self,
        path: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Issue a time-limited URL granting read access to `path`.
    async fn signed_url(&self, path: &str, expires_in_secs: u32) -> Result<String, StorageError>;

    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// List objects directly under `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<StorageObject>, StorageError>;
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub bucket_name: String,
}

impl SupabaseConfig {
    pub fn from_env() -> Result<Self, std::env::VarError> {
        Ok(Self {
            supabase_url: std::env::var("SUPABASE_URL")?,
            supabase_anon_key: std::env::var("SUPABASE_ANON_KEY")?,
            bucket_name: std::env::var("SUPABASE_BUCKET")
                .unwrap_or_else(|_| "easydocs-bucket".to_string()),
        })
    }
}

/// Supabase Storage REST client.
pub struct SupabaseStorage {
    config: SupabaseConfig,
    client: reqwest::Client,
}

impl SupabaseStorage {
    pub fn new(config: SupabaseConfig, client: reqwest::Client) -> Self {
        log::info!("Supabase storage initialised - bucket: {}", config.bucket_name);
        Self { config, client }
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.supabase_url, self.config.bucket_name, path
        )
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Response { status, body })
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        path: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError> {
        let response = self
            .client
            .post(self.object_url(path))
            .bearer_auth(&self.config.supabase_anon_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(content.to_vec())
            .send()
            .await?;
        Self::check(response).await?;
        log::debug!("Uploaded {} bytes to storage path {}", content.len(), path);
        Ok(path.to_string())
    }

    async fn signed_url(&self, path: &str, expires_in_secs: u32) -> Result<String, StorageError> {
        #[derive(Deserialize)]
        struct SignResponse {
            #[serde(rename = "signedURL")]
            signed_url: String,
        }

        let url = format!(
            "{}/storage/v1/object/sign/{}/{}",
            self.config.supabase_url, self.config.bucket_name, path
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.supabase_anon_key)
            .json(&serde_json::json!({ "expiresIn": expires_in_secs }))
            .send()
            .await?;
        let sign: SignResponse = Self::check(response).await?.json().await?;
        Ok(format!(
            "{}/storage/v1{}",
            self.config.supabase_url, sign.signed_url
        ))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        log::debug!("Deleting storage object {}", path);
        let response = self
            .client
            .delete(self.object_url(path))
            .bearer_auth(&self.config.supabase_anon_key)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StorageObject>, StorageError> {
        let url = format!(
            "{}/storage/v1/object/list/{}",
            self.config.supabase_url, self.config.bucket_name
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.supabase_anon_key)
            .json(&serde_json::json!({ "prefix": prefix, "limit": 1000 }))
            .send()
            .await?;
        let objects: Vec<StorageObject> = Self::check(response).await?.json().await?;
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SupabaseConfig {
        SupabaseConfig {
            supabase_url: "https://test.supabase.co".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            bucket_name: "easydocs-bucket".to_string(),
        }
    }

    #[test]
    fn test_object_url_includes_bucket_and_path() {
        let storage = SupabaseStorage::new(test_config(), reqwest::Client::new());
        assert_eq!(
            storage.object_url("42/header.png"),
            "https://test.supabase.co/storage/v1/object/easydocs-bucket/42/header.png"
        );
    }

    #[test]
    fn test_config_clone_and_debug() {
        let config = test_config();
        let copy = config.clone();
        assert_eq!(copy.bucket_name, "easydocs-bucket");
        assert!(format!("{:?}", config).contains("test.supabase.co"));
    }
}
