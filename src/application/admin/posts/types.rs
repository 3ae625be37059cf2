use thiserror::Error;
use time::OffsetDateTime;

use crate::application::drafts::DraftStoreError;
use crate::application::render::RenderError;
use crate::application::repos::RepoError;
use crate::domain::drafts::{Draft, PostKey};
use crate::domain::error::DomainError;
use crate::domain::posts::{BlogPost, PostInput};

#[derive(Debug, Error)]
pub enum AdminPostError {
    #[error("post not found")]
    NotFound,
    #[error("admin privileges required")]
    Forbidden,
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error(transparent)]
    Drafts(#[from] DraftStoreError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Everything the editor needs when it opens.
#[derive(Debug, Clone)]
pub struct EditorState {
    pub key: PostKey,
    pub post: Option<BlogPost>,
    pub form: PostInput,
    /// A stored draft that can be restored into the form.
    pub recoverable: Option<Draft>,
    /// The form was filled from the stored draft.
    pub restored: bool,
}

impl EditorState {
    pub fn recoverable_saved_at(&self) -> Option<OffsetDateTime> {
        self.recoverable.as_ref().map(|draft| draft.timestamp)
    }
}
