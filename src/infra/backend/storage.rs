use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;

use crate::application::auth::Session;
use crate::application::uploads::{ImageStore, UploadError};

use super::BackendClient;

const SERVICE: &str = "storage";

/// Public bucket in the hosted object storage.
pub struct RemoteImageStore {
    client: BackendClient,
    bucket: String,
}

impl RemoteImageStore {
    pub fn new(client: BackendClient, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }

    pub fn public_url(&self, path: &str) -> Result<String, UploadError> {
        self.client
            .url(&format!("storage/v1/object/public/{}/{path}", self.bucket))
            .map(String::from)
            .map_err(|err| UploadError::Storage(err.to_string()))
    }
}

#[async_trait]
impl ImageStore for RemoteImageStore {
    async fn put(
        &self,
        session: &Session,
        path: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<String, UploadError> {
        if path.is_empty() || path.starts_with('/') || path.split('/').any(|part| part == "..") {
            return Err(UploadError::InvalidPath);
        }

        let request = self
            .client
            .request(
                Method::POST,
                &format!("storage/v1/object/{}/{path}", self.bucket),
                &[],
                Some(&session.access_token),
            )
            .map_err(|err| UploadError::Storage(err.to_string()))?
            .header(CONTENT_TYPE, content_type)
            .body(bytes);

        self.client
            .send(SERVICE, request)
            .await
            .map_err(|err| UploadError::Storage(err.to_string()))?;

        self.public_url(path)
    }
}
