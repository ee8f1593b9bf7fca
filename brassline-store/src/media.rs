use std::collections::HashMap;

use async_trait::async_trait;
use brassline_core::{ImageHost, RepoResult, RepositoryError, UploadedImage};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Keep letters, digits, dots and dashes; everything else becomes `-`.
fn object_key(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('-');
    if cleaned.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        format!("{}-{}", Uuid::new_v4(), cleaned)
    }
}

/// Pushes images to an HTTP object store with an authenticated `PUT`.
pub struct CdnImageHost {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CdnImageHost {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ImageHost for CdnImageHost {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> RepoResult<UploadedImage> {
        let url = format!("{}/{}", self.base_url, object_key(file_name));
        let size_bytes = bytes.len();

        self.client
            .put(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| RepositoryError::Backend(format!("image upload failed: {}", e)))?;

        info!("Uploaded {} ({} bytes)", url, size_bytes);

        Ok(UploadedImage {
            url,
            content_type: content_type.to_string(),
            size_bytes,
        })
    }
}

/// Holds uploads in process memory under `memory://images/`.
#[derive(Default)]
pub struct InMemoryImageHost {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, url: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(url).cloned()
    }
}

#[async_trait]
impl ImageHost for InMemoryImageHost {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> RepoResult<UploadedImage> {
        let url = format!("memory://images/{}", object_key(file_name));
        let size_bytes = bytes.len();
        self.objects.write().await.insert(url.clone(), bytes);

        Ok(UploadedImage {
            url,
            content_type: content_type.to_string(),
            size_bytes,
        })
    }
}
