use uuid::Uuid;

use crate::application::auth::Session;
use crate::application::repos::PostListScope;
use crate::domain::drafts::{DraftKey, PostKey};
use crate::domain::posts::{BlogPost, PostCounts, PostInput};
use crate::presentation::views::{AdminDashboardView, AdminPostRow};

use super::service::AdminPostService;
use super::types::{AdminPostError, EditorState};

impl AdminPostService {
    /// Every post, drafts included, newest first.
    pub async fn list_all(&self, session: &Session) -> Result<Vec<BlogPost>, AdminPostError> {
        Ok(self
            .posts
            .list_posts(Some(session), PostListScope::Admin)
            .await?)
    }

    pub async fn dashboard(
        &self,
        session: &Session,
        notice: Option<String>,
    ) -> Result<AdminDashboardView, AdminPostError> {
        let posts = self.list_all(session).await?;
        Ok(AdminDashboardView {
            counts: PostCounts::tally(&posts),
            rows: posts.iter().map(AdminPostRow::from).collect(),
            notice,
        })
    }

    pub async fn find_post(&self, session: &Session, id: Uuid) -> Result<BlogPost, AdminPostError> {
        self.posts
            .find_post(Some(session), id)
            .await?
            .ok_or(AdminPostError::NotFound)
    }

    /// Load the editor for `key`, restoring the stored draft when asked to
    /// and when it is still worth restoring.
    pub async fn editor_state(
        &self,
        session: &Session,
        key: PostKey,
        restore: bool,
    ) -> Result<EditorState, AdminPostError> {
        let post = match key.id() {
            Some(id) => Some(self.find_post(session, id).await?),
            None => None,
        };

        let draft_key = DraftKey::new(session.user.id, key);
        let recoverable = self
            .drafts
            .recoverable(&draft_key, post.as_ref().map(BlogPost::last_modified))
            .await?;

        let base_form = post
            .as_ref()
            .map(BlogPost::to_input)
            .unwrap_or_else(PostInput::default);

        let (form, restored, recoverable) = match recoverable {
            Some(draft) if restore => (draft.restore(), true, None),
            other => (base_form, false, other),
        };

        Ok(EditorState {
            key,
            post,
            form,
            recoverable,
            restored,
        })
    }

    pub fn preview(&self, markdown: &str) -> Result<String, AdminPostError> {
        Ok(self.renderer.render(markdown)?)
    }
}
