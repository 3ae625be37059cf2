//! Adapters for the hosted backend: a PostgREST table API, a GoTrue-style
//! auth service, and object storage, all behind one project URL.

mod auth;
mod client;
mod posts;
mod storage;

use std::sync::Arc;

use reqwest::StatusCode;

pub use auth::RemoteAuth;
pub use client::{BackendClient, BackendError};
pub use posts::RemotePosts;
pub use storage::RemoteImageStore;

use crate::application::repos::RepoError;
use crate::config::{BackendSettings, RemoteBackendSettings};
use crate::infra::error::InfraError;

/// All three remote adapters sharing one HTTP client.
#[derive(Clone)]
pub struct RemoteBackend {
    pub posts: Arc<RemotePosts>,
    pub auth: Arc<RemoteAuth>,
    pub images: Arc<RemoteImageStore>,
}

impl RemoteBackend {
    pub fn connect(
        remote: &RemoteBackendSettings,
        settings: &BackendSettings,
    ) -> Result<Self, InfraError> {
        let client = BackendClient::new(&remote.url, remote.anon_key.clone(), remote.timeout)
            .map_err(|err| InfraError::backend(err.to_string()))?;

        Ok(Self {
            posts: Arc::new(RemotePosts::new(client.clone(), &settings.posts_table)),
            auth: Arc::new(RemoteAuth::new(client.clone())),
            images: Arc::new(RemoteImageStore::new(client, &settings.images_bucket)),
        })
    }
}

pub(crate) fn repo_error(err: BackendError) -> RepoError {
    if err.is_timeout() {
        return RepoError::Timeout;
    }
    match err.status() {
        Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => RepoError::Unauthorized,
        Some(StatusCode::NOT_FOUND) => RepoError::NotFound,
        Some(StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY) => {
            RepoError::InvalidInput {
                message: err.to_string(),
            }
        }
        _ => RepoError::from_persistence(err),
    }
}
