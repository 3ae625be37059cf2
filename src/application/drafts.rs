//! Debounced draft auto-save.
//!
//! Every editor change is handed to [`DraftAutosaver::schedule`], which
//! replaces the pending state for that draft and restarts its quiet window.
//! A write only happens once the window elapses without a newer change, so a
//! burst of keystrokes costs a single store write carrying the last state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::domain::drafts::{Draft, DraftKey, SaveStatus};
use crate::infra::telemetry::{
    METRIC_DRAFT_EDITS, METRIC_DRAFT_WRITE_FAILURES, METRIC_DRAFT_WRITES,
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2000);

#[derive(Debug, Error)]
pub enum DraftStoreError {
    #[error("draft storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("draft `{key}` could not be encoded: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Key-value cache holding at most one draft per key.
#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn load(&self, key: &DraftKey) -> Result<Option<Draft>, DraftStoreError>;

    async fn save(&self, key: &DraftKey, draft: &Draft) -> Result<(), DraftStoreError>;

    async fn remove(&self, key: &DraftKey) -> Result<(), DraftStoreError>;
}

#[derive(Default)]
struct Slot {
    generation: u64,
    pending: Option<Draft>,
    in_flight: usize,
}

#[derive(Default)]
struct State {
    next_generation: u64,
    slots: HashMap<DraftKey, Slot>,
}

impl State {
    fn bump(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

#[derive(Clone)]
pub struct DraftAutosaver {
    store: Arc<dyn DraftStore>,
    window: Duration,
    state: Arc<Mutex<State>>,
}

impl DraftAutosaver {
    pub fn new(store: Arc<dyn DraftStore>, window: Duration) -> Self {
        Self {
            store,
            window,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record the latest editor state and (re)start the quiet window.
    pub async fn schedule(&self, key: DraftKey, draft: Draft) -> SaveStatus {
        let generation = {
            let mut state = self.state.lock().await;
            let generation = state.bump();
            let slot = state.slots.entry(key.clone()).or_default();
            slot.generation = generation;
            slot.pending = Some(draft);
            generation
        };
        counter!(METRIC_DRAFT_EDITS).increment(1);

        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(this.window).await;
            this.write_if_current(key, generation).await;
        });

        SaveStatus::Unsaved
    }

    /// Write the pending draft for `key` now instead of waiting for the window.
    pub async fn flush(&self, key: &DraftKey) -> Result<SaveStatus, DraftStoreError> {
        let draft = {
            let mut state = self.state.lock().await;
            let generation = state.bump();
            let Some(slot) = state.slots.get_mut(key) else {
                return Ok(SaveStatus::Saved);
            };
            slot.generation = generation;
            match slot.pending.take() {
                Some(draft) => {
                    slot.in_flight += 1;
                    draft
                }
                None => return Ok(self.status_of(slot)),
            }
        };

        let result = self.store.save(key, &draft).await;
        self.finish_write(key, draft, result.as_ref().err()).await;
        result?;
        Ok(self.status(key).await)
    }

    /// Write every draft still waiting out its quiet window. Returns how many
    /// were written; failures are logged and left pending.
    pub async fn flush_all(&self) -> usize {
        let keys: Vec<DraftKey> = {
            let state = self.state.lock().await;
            state
                .slots
                .iter()
                .filter(|(_, slot)| slot.pending.is_some())
                .map(|(key, _)| key.clone())
                .collect()
        };

        let mut written = 0;
        for key in keys {
            if self.flush(&key).await.is_ok() {
                written += 1;
            }
        }
        written
    }

    /// Drop any pending write and delete the stored draft.
    pub async fn discard(&self, key: &DraftKey) -> Result<(), DraftStoreError> {
        self.state.lock().await.slots.remove(key);
        self.store.remove(key).await?;
        debug!(target = "bloghub::drafts", key = %key, "draft discarded");
        Ok(())
    }

    pub async fn status(&self, key: &DraftKey) -> SaveStatus {
        let state = self.state.lock().await;
        state
            .slots
            .get(key)
            .map(|slot| self.status_of(slot))
            .unwrap_or(SaveStatus::Saved)
    }

    /// Latest known state of the draft: the pending edit if any, else the
    /// stored copy.
    pub async fn load(&self, key: &DraftKey) -> Result<Option<Draft>, DraftStoreError> {
        let pending = {
            let state = self.state.lock().await;
            state
                .slots
                .get(key)
                .and_then(|slot| slot.pending.clone())
        };
        match pending {
            Some(draft) => Ok(Some(draft)),
            None => self.store.load(key).await,
        }
    }

    /// Stored draft worth offering for restoration, given when the post was
    /// last modified (`None` for a post that does not exist yet).
    pub async fn recoverable(
        &self,
        key: &DraftKey,
        post_modified: Option<OffsetDateTime>,
    ) -> Result<Option<Draft>, DraftStoreError> {
        Ok(self
            .load(key)
            .await?
            .filter(|draft| draft.is_recoverable(post_modified)))
    }

    fn status_of(&self, slot: &Slot) -> SaveStatus {
        if slot.pending.is_some() {
            SaveStatus::Unsaved
        } else if slot.in_flight > 0 {
            SaveStatus::Saving
        } else {
            SaveStatus::Saved
        }
    }

    async fn write_if_current(&self, key: DraftKey, generation: u64) {
        let draft = {
            let mut state = self.state.lock().await;
            let Some(slot) = state.slots.get_mut(&key) else {
                return;
            };
            if slot.generation != generation {
                return;
            }
            let Some(draft) = slot.pending.take() else {
                return;
            };
            slot.in_flight += 1;
            draft
        };

        let result = self.store.save(&key, &draft).await;
        self.finish_write(&key, draft, result.as_ref().err()).await;
    }

    async fn finish_write(&self, key: &DraftKey, draft: Draft, failure: Option<&DraftStoreError>) {
        let discarded = {
            let mut state = self.state.lock().await;
            let idle = match state.slots.get_mut(key) {
                Some(slot) => {
                    slot.in_flight = slot.in_flight.saturating_sub(1);
                    if failure.is_some() && slot.pending.is_none() {
                        slot.pending = Some(draft);
                    }
                    Some(slot.pending.is_none() && slot.in_flight == 0)
                }
                None => None,
            };
            if idle == Some(true) {
                state.slots.remove(key);
            }
            idle.is_none()
        };

        match failure {
            Some(err) => {
                counter!(METRIC_DRAFT_WRITE_FAILURES).increment(1);
                error!(target = "bloghub::drafts", key = %key, error = %err, "draft write failed");
            }
            None => {
                counter!(METRIC_DRAFT_WRITES).increment(1);
                debug!(target = "bloghub::drafts", key = %key, "draft written");
            }
        }

        // A discard raced with the write; the stored copy must not survive it.
        if discarded && failure.is_none() {
            if let Err(err) = self.store.remove(key).await {
                error!(target = "bloghub::drafts", key = %key, error = %err, "stale draft removal failed");
            }
        }
    }
}
