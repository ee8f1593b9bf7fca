use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::repository::RepoResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedImage {
    pub url: String,
    pub content_type: String,
    pub size_bytes: usize,
}

/// Where product and finish images end up.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> RepoResult<UploadedImage>;
}
