use std::sync::Arc;

use crate::application::drafts::DraftAutosaver;
use crate::application::render::MarkdownRenderer;
use crate::application::repos::PostsRepo;

#[derive(Clone)]
pub struct AdminPostService {
    pub(crate) posts: Arc<dyn PostsRepo>,
    pub(crate) drafts: DraftAutosaver,
    pub(crate) renderer: Arc<MarkdownRenderer>,
}

impl AdminPostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        drafts: DraftAutosaver,
        renderer: Arc<MarkdownRenderer>,
    ) -> Self {
        Self {
            posts,
            drafts,
            renderer,
        }
    }
}

impl AdminPostService {
    /// Quiet period the editor should observe between auto-save requests.
    pub fn autosave_window(&self) -> std::time::Duration {
        self.drafts.window()
    }
}
