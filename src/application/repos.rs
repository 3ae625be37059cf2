//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::auth::Session;
use crate::domain::posts::{BlogPost, NewPost};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("backend rejected the credentials")]
    Unauthorized,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("backend timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostListScope {
    /// Published posts only.
    Public,
    /// Every post, drafts included.
    Admin,
}

impl PostListScope {
    pub fn includes_unpublished(self) -> bool {
        matches!(self, PostListScope::Admin)
    }
}

/// Access to the hosted `blog_posts` table. Listings are ordered by
/// `published_at`, newest first.
#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// `viewer` is the signed-in user the read is made for, if any; the
    /// backend applies its row policies to that user.
    async fn list_posts(
        &self,
        viewer: Option<&Session>,
        scope: PostListScope,
    ) -> Result<Vec<BlogPost>, RepoError>;

    async fn find_post(
        &self,
        viewer: Option<&Session>,
        id: Uuid,
    ) -> Result<Option<BlogPost>, RepoError>;

    async fn create_post(&self, session: &Session, post: NewPost) -> Result<BlogPost, RepoError>;

    async fn update_post(
        &self,
        session: &Session,
        id: Uuid,
        post: NewPost,
    ) -> Result<BlogPost, RepoError>;

    async fn delete_post(&self, session: &Session, id: Uuid) -> Result<(), RepoError>;
}
