//! Image uploads for post content and cover images.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::application::auth::Session;
use crate::domain::markdown::image_markdown;
use crate::infra::telemetry::METRIC_IMAGE_UPLOADS;

const RANDOM_PREFIX_LEN: usize = 12;
const FALLBACK_EXTENSION: &str = "bin";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please upload an image file")]
    NotAnImage { content_type: String },
    #[error("No image files found in drop")]
    NoImages,
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error("invalid stored path")]
    InvalidPath,
    #[error("image storage rejected the upload: {0}")]
    Storage(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Object storage receiving uploaded images. Returns the public URL.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put(
        &self,
        session: &Session,
        path: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<String, UploadError>;
}

/// A file received from the editor.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedImage {
    pub name: String,
    pub url: String,
    pub markdown: String,
}

#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn ImageStore>,
}

impl UploadService {
    pub fn new(store: Arc<dyn ImageStore>) -> Self {
        Self { store }
    }

    pub async fn upload(
        &self,
        session: &Session,
        file: ImageFile,
    ) -> Result<UploadedImage, UploadError> {
        if !file.is_image() {
            return Err(UploadError::NotAnImage {
                content_type: file.content_type,
            });
        }
        if file.bytes.is_empty() {
            return Err(UploadError::EmptyPayload);
        }

        let stored_name = stored_file_name(&file.file_name, &file.content_type);
        let url = self
            .store
            .put(session, &stored_name, &file.content_type, file.bytes)
            .await?;

        counter!(METRIC_IMAGE_UPLOADS).increment(1);
        info!(
            target = "bloghub::uploads",
            user_id = %session.user.id,
            stored_name = %stored_name,
            "image uploaded"
        );

        Ok(UploadedImage {
            markdown: image_markdown(&file.file_name, &url),
            name: file.file_name,
            url,
        })
    }

    /// Upload every image of a drop in order, skipping other files.
    pub async fn upload_all(
        &self,
        session: &Session,
        files: Vec<ImageFile>,
    ) -> Result<Vec<UploadedImage>, UploadError> {
        let images: Vec<ImageFile> = files.into_iter().filter(ImageFile::is_image).collect();
        if images.is_empty() {
            return Err(UploadError::NoImages);
        }

        let mut uploaded = Vec::with_capacity(images.len());
        for image in images {
            uploaded.push(self.upload(session, image).await?);
        }
        Ok(uploaded)
    }
}

/// `{random}-{unix millis}.{ext}`, keeping the extension of the original name.
pub fn stored_file_name(original_name: &str, content_type: &str) -> String {
    let random: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(RANDOM_PREFIX_LEN)
        .collect();
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let extension = file_extension(original_name, content_type);
    format!("{random}-{millis}.{extension}")
}

fn file_extension(original_name: &str, content_type: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| {
            value
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|value| !value.is_empty())
        .or_else(|| {
            mime_guess::get_mime_extensions_str(content_type)
                .and_then(|extensions| extensions.first())
                .map(|ext| ext.to_string())
        })
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::auth::AuthUser;
    use crate::infra::uploads::LocalImageStore;

    fn session() -> Session {
        Session {
            access_token: "token".into(),
            user: AuthUser {
                id: Uuid::from_u128(1),
                email: Some("admin@bloghub.dev".into()),
                is_admin: true,
            },
        }
    }

    fn file(name: &str, content_type: &str) -> ImageFile {
        ImageFile {
            file_name: name.into(),
            content_type: content_type.into(),
            bytes: Bytes::from_static(b"\x89PNG"),
        }
    }

    fn service(dir: &Path) -> UploadService {
        let store = LocalImageStore::new(dir.to_path_buf(), "/uploads").expect("store");
        UploadService::new(Arc::new(store))
    }

    #[test]
    fn stored_name_keeps_extension_and_timestamp() {
        let name = stored_file_name("Holiday Photo.JPG", "image/jpeg");
        let (stem, ext) = name.rsplit_once('.').expect("extension");
        assert_eq!(ext, "jpg");
        let (random, millis) = stem.split_once('-').expect("separator");
        assert_eq!(random.len(), RANDOM_PREFIX_LEN);
        assert!(millis.parse::<i128>().expect("millis") > 0);
    }

    #[test]
    fn extension_falls_back_to_content_type() {
        assert_eq!(file_extension("clipboard", "image/png"), "png");
        assert_eq!(file_extension("clipboard", "image/x-unknown"), "bin");
    }

    #[tokio::test]
    async fn upload_returns_url_and_markdown() {
        let dir = tempfile::tempdir().expect("tempdir");
        let uploaded = service(dir.path())
            .upload(&session(), file("diagram.png", "image/png"))
            .await
            .expect("uploaded");

        assert!(uploaded.url.starts_with("/uploads/"));
        assert_eq!(
            uploaded.markdown,
            format!("![diagram.png]({})", uploaded.url)
        );
    }

    #[tokio::test]
    async fn non_images_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = service(dir.path())
            .upload(&session(), file("notes.txt", "text/plain"))
            .await
            .expect_err("not an image");
        assert_eq!(err.to_string(), "Please upload an image file");
    }

    #[tokio::test]
    async fn drop_without_images_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = service(dir.path())
            .upload_all(&session(), vec![file("a.txt", "text/plain")])
            .await
            .expect_err("no images");
        assert_eq!(err.to_string(), "No image files found in drop");
    }

    #[tokio::test]
    async fn drop_uploads_images_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let uploaded = service(dir.path())
            .upload_all(
                &session(),
                vec![
                    file("one.png", "image/png"),
                    file("skip.pdf", "application/pdf"),
                    file("two.gif", "image/gif"),
                ],
            )
            .await
            .expect("uploaded");
        let names: Vec<_> = uploaded.iter().map(|image| image.name.as_str()).collect();
        assert_eq!(names, vec!["one.png", "two.gif"]);
    }
}
