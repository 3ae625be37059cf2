//! Public listing and post pages.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::application::auth::Session;
use crate::application::chrome::category_href;
use crate::application::render::{MarkdownRenderer, RenderError};
use crate::application::repos::{PostListScope, PostsRepo, RepoError};
use crate::domain::filter::{PostQuery, categories, filter_posts};
use crate::domain::slug::{SlugError, extract_id_from_slug};
use crate::presentation::views::{CategoryFilterView, IndexContext, PostCard, PostDetailContext};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    renderer: Arc<MarkdownRenderer>,
}

impl FeedService {
    pub fn new(posts: Arc<dyn PostsRepo>, renderer: Arc<MarkdownRenderer>) -> Self {
        Self { posts, renderer }
    }

    /// Published posts narrowed by `query`, plus the category filter bar.
    pub async fn index_context(&self, query: &PostQuery) -> Result<IndexContext, FeedError> {
        let posts = self.posts.list_posts(None, PostListScope::Public).await?;
        let active = query.category();

        let mut filters = vec![CategoryFilterView {
            label: "All".to_string(),
            href: "/".to_string(),
            is_active: active.is_none(),
        }];
        filters.extend(categories(&posts).into_iter().map(|category| {
            CategoryFilterView {
                href: category_href(&category),
                is_active: active == Some(category.as_str()),
                label: category,
            }
        }));

        let cards: Vec<PostCard> = filter_posts(&posts, query)
            .into_iter()
            .map(PostCard::from)
            .collect();
        debug!(
            target = "bloghub::feed",
            total = posts.len(),
            visible = cards.len(),
            category = active.unwrap_or(""),
            search = query.search().unwrap_or(""),
            "listing filtered"
        );

        Ok(IndexContext {
            categories: filters,
            has_results: !cards.is_empty(),
            posts: cards,
            search: query.search().unwrap_or_default().to_string(),
            is_filtered: !query.is_empty(),
        })
    }

    /// Full post addressed by its slug. Unpublished posts are only visible to
    /// admins.
    pub async fn post_context(
        &self,
        slug: &str,
        viewer: Option<&Session>,
    ) -> Result<PostDetailContext, FeedError> {
        let id = extract_id_from_slug(slug)?;
        let viewer_is_admin = viewer.is_some_and(|session| session.user.is_admin);
        let post = self
            .posts
            .find_post(viewer, id)
            .await?
            .filter(|post| post.is_published || viewer_is_admin)
            .ok_or(FeedError::NotFound)?;

        let content_html = self.renderer.render(&post.content)?;

        Ok(PostDetailContext {
            author_initial: post.author_initial(),
            published: post.long_date(),
            title: post.title,
            category: post.category,
            tags: post.tags,
            cover_image: post.cover_image,
            author_name: post.author_name,
            author_avatar: post.author_avatar,
            reading_time: post.reading_time,
            content_html,
            is_published: post.is_published,
        })
    }
}
