//! Category and free-text filtering for the public listing.

use serde::Deserialize;

use crate::domain::posts::BlogPost;

/// Listing query as it arrives from `?category=&q=`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PostQuery {
    pub category: Option<String>,
    #[serde(rename = "q")]
    pub search: Option<String>,
}

impl PostQuery {
    pub fn category(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }

    pub fn search(&self) -> Option<&str> {
        non_blank(self.search.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.category().is_none() && self.search().is_none()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Distinct categories in order of first appearance.
pub fn categories(posts: &[BlogPost]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for post in posts {
        if !seen.iter().any(|category| category == &post.category) {
            seen.push(post.category.clone());
        }
    }
    seen
}

/// Keep the posts matching `query`, preserving input order.
pub fn filter_posts<'a>(posts: &'a [BlogPost], query: &PostQuery) -> Vec<&'a BlogPost> {
    let category = query.category();
    let needle = query.search().map(str::to_lowercase);

    posts
        .iter()
        .filter(|post| category.is_none_or(|category| post.category == category))
        .filter(|post| {
            needle
                .as_deref()
                .is_none_or(|needle| matches_search(post, needle))
        })
        .collect()
}

fn matches_search(post: &BlogPost, needle: &str) -> bool {
    post.title.to_lowercase().contains(needle)
        || post.excerpt.to_lowercase().contains(needle)
        || post
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}
