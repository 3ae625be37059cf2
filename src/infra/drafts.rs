//! Draft store adapters.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use crate::application::drafts::{DraftStore, DraftStoreError};
use crate::domain::drafts::{Draft, DraftKey};

/// One JSON document per draft under `{root}/{owner}/blog-draft-{post}.json`.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    root: PathBuf,
}

impl FileDraftStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &DraftKey) -> PathBuf {
        self.root
            .join(key.owner.to_string())
            .join(format!("{}.json", key.storage_name()))
    }
}

#[async_trait]
impl DraftStore for FileDraftStore {
    async fn load(&self, key: &DraftKey) -> Result<Option<Draft>, DraftStoreError> {
        let path = self.path_for(key);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice(&raw) {
            Ok(draft) => Ok(Some(draft)),
            Err(err) => {
                warn!(
                    target = "bloghub::drafts",
                    path = %path.display(),
                    error = %err,
                    "ignoring unreadable draft"
                );
                Ok(None)
            }
        }
    }

    async fn save(&self, key: &DraftKey, draft: &Draft) -> Result<(), DraftStoreError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let encoded = serde_json::to_vec(draft).map_err(|source| DraftStoreError::Encode {
            key: key.to_string(),
            source,
        })?;

        let staging = path.with_extension("json.tmp");
        fs::write(&staging, encoded).await?;
        fs::rename(&staging, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &DraftKey) -> Result<(), DraftStoreError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Process-local draft store counting the writes it receives.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<HashMap<DraftKey, Draft>>,
    writes: AtomicUsize,
}

impl MemoryDraftStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn with_drafts<T>(&self, f: impl FnOnce(&mut HashMap<DraftKey, Draft>) -> T) -> T {
        let mut guard = match self.drafts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn load(&self, key: &DraftKey) -> Result<Option<Draft>, DraftStoreError> {
        Ok(self.with_drafts(|drafts| drafts.get(key).cloned()))
    }

    async fn save(&self, key: &DraftKey, draft: &Draft) -> Result<(), DraftStoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.with_drafts(|drafts| drafts.insert(key.clone(), draft.clone()));
        Ok(())
    }

    async fn remove(&self, key: &DraftKey) -> Result<(), DraftStoreError> {
        self.with_drafts(|drafts| drafts.remove(key));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::drafts::PostKey;
    use crate::domain::posts::PostInput;
    use time::macros::datetime;
    use uuid::Uuid;

    fn sample() -> (DraftKey, Draft) {
        let key = DraftKey::new(Uuid::from_u128(1), PostKey::Existing(Uuid::from_u128(2)));
        let input = PostInput {
            title: "Stored".into(),
            tags: "a, b".into(),
            ..PostInput::default()
        };
        (key, Draft::capture(&input, datetime!(2024-03-15 10:00 UTC)))
    }

    #[tokio::test]
    async fn file_store_persists_drafts_per_owner() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileDraftStore::new(dir.path());
        let (key, draft) = sample();

        assert!(store.load(&key).await.expect("load").is_none());
        store.save(&key, &draft).await.expect("save");

        let path = dir
            .path()
            .join(key.owner.to_string())
            .join(format!("blog-draft-{}.json", Uuid::from_u128(2)));
        assert!(path.exists());
        assert_eq!(store.load(&key).await.expect("load"), Some(draft));

        store.remove(&key).await.expect("remove");
        assert!(store.load(&key).await.expect("load").is_none());
        store.remove(&key).await.expect("removing twice is fine");
    }

    #[tokio::test]
    async fn corrupt_draft_reads_as_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileDraftStore::new(dir.path());
        let (key, _) = sample();

        let path = store.path_for(&key);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, b"{not json").expect("write");

        assert!(store.load(&key).await.expect("load").is_none());
    }
}
