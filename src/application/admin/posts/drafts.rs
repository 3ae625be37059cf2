use time::OffsetDateTime;

use crate::application::auth::Session;
use crate::domain::drafts::{Draft, DraftKey, PostKey, SaveStatus};
use crate::domain::posts::PostInput;

use super::commands::ensure_admin;
use super::service::AdminPostService;
use super::types::AdminPostError;

impl AdminPostService {
    /// Hand the current form to the auto-saver.
    pub async fn autosave(
        &self,
        session: &Session,
        key: PostKey,
        input: &PostInput,
    ) -> Result<SaveStatus, AdminPostError> {
        ensure_admin(session)?;
        let draft = Draft::capture(input, OffsetDateTime::now_utc());
        Ok(self
            .drafts
            .schedule(DraftKey::new(session.user.id, key), draft)
            .await)
    }

    pub async fn draft_status(&self, session: &Session, key: PostKey) -> SaveStatus {
        self.drafts
            .status(&DraftKey::new(session.user.id, key))
            .await
    }

    /// Write every draft still inside its quiet window, as at shutdown.
    pub async fn flush_drafts(&self) -> usize {
        self.drafts.flush_all().await
    }
}
