//! Filesystem-backed image storage, served under `/uploads/`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{fs, io::AsyncWriteExt};

use crate::application::auth::Session;
use crate::application::uploads::{ImageStore, UploadError};

#[derive(Debug)]
pub struct LocalImageStore {
    root: PathBuf,
    public_base: String,
}

impl LocalImageStore {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf, public_base: &str) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            public_base: public_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn public_url(&self, stored_path: &str) -> String {
        format!("{}/{stored_path}", self.public_base)
    }

    pub async fn read(&self, stored_path: &str) -> Result<Bytes, UploadError> {
        let absolute = self.resolve(stored_path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadError> {
        let relative = Path::new(stored_path);
        if stored_path.is_empty()
            || relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(UploadError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(
        &self,
        _session: &Session,
        path: &str,
        _content_type: &str,
        bytes: Bytes,
    ) -> Result<String, UploadError> {
        let absolute = self.resolve(path)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        Ok(self.public_url(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::auth::AuthUser;
    use uuid::Uuid;

    fn session() -> Session {
        Session {
            access_token: "local".into(),
            user: AuthUser {
                id: Uuid::nil(),
                email: None,
                is_admin: true,
            },
        }
    }

    #[tokio::test]
    async fn stored_images_can_be_read_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalImageStore::new(dir.path().to_path_buf(), "/uploads/").expect("store");

        let url = store
            .put(&session(), "abc-1.png", "image/png", Bytes::from_static(b"png"))
            .await
            .expect("put");
        assert_eq!(url, "/uploads/abc-1.png");
        assert_eq!(
            store.read("abc-1.png").await.expect("read"),
            Bytes::from_static(b"png")
        );
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalImageStore::new(dir.path().to_path_buf(), "/uploads").expect("store");

        for path in ["../secret", "/etc/passwd", ""] {
            assert!(matches!(
                store.read(path).await,
                Err(UploadError::InvalidPath)
            ));
        }
    }
}
