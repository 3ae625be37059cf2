use tracing::info;
use uuid::Uuid;

use crate::application::auth::Session;
use crate::domain::drafts::{DraftKey, PostKey};
use crate::domain::posts::{BlogPost, PostInput};

use super::service::AdminPostService;
use super::types::AdminPostError;

impl AdminPostService {
    /// Validate and persist the editor form, then drop its draft.
    pub async fn save_post(
        &self,
        session: &Session,
        key: PostKey,
        input: PostInput,
    ) -> Result<BlogPost, AdminPostError> {
        ensure_admin(session)?;
        let payload = input.into_new_post(session.user.email.as_deref())?;

        let post = match key {
            PostKey::New => self.posts.create_post(session, payload).await?,
            PostKey::Existing(id) => self.posts.update_post(session, id, payload).await?,
        };

        self.drafts
            .discard(&DraftKey::new(session.user.id, key))
            .await?;

        info!(
            target = "bloghub::admin::posts",
            post_id = %post.id,
            created = key.is_new(),
            is_published = post.is_published,
            "post saved"
        );
        Ok(post)
    }

    pub async fn delete_post(&self, session: &Session, id: Uuid) -> Result<(), AdminPostError> {
        ensure_admin(session)?;
        self.posts.delete_post(session, id).await?;
        self.drafts
            .discard(&DraftKey::new(session.user.id, PostKey::Existing(id)))
            .await?;

        info!(target = "bloghub::admin::posts", post_id = %id, "post deleted");
        Ok(())
    }
}

pub(super) fn ensure_admin(session: &Session) -> Result<(), AdminPostError> {
    if session.user.is_admin {
        Ok(())
    } else {
        Err(AdminPostError::Forbidden)
    }
}
