//! Blog post records and the editable input that produces them.

mod data;

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::slug::generate_slug;

pub use data::seed_posts;

pub const DEFAULT_READING_TIME: u32 = 5;
pub const FALLBACK_AUTHOR_NAME: &str = "Admin";
pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields";

pub const LONG_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");
pub const SHORT_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:short] [day padding:none], [year]");

/// A row of the hosted `blog_posts` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub author_name: String,
    #[serde(default)]
    pub author_avatar: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    pub reading_time: u32,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub is_published: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl BlogPost {
    pub fn slug(&self) -> String {
        generate_slug(&self.title, self.id)
    }

    /// First character of the author name, used when no avatar is set.
    pub fn author_initial(&self) -> String {
        self.author_name
            .chars()
            .next()
            .map(|ch| ch.to_uppercase().collect())
            .unwrap_or_default()
    }

    pub fn long_date(&self) -> String {
        format_date(self.published_at, LONG_DATE_FORMAT)
    }

    pub fn short_date(&self) -> String {
        format_date(self.published_at, SHORT_DATE_FORMAT)
    }

    /// Last time the record changed, falling back to its publication stamp.
    pub fn last_modified(&self) -> OffsetDateTime {
        self.updated_at
            .or(self.created_at)
            .unwrap_or(self.published_at)
    }

    pub fn to_input(&self) -> PostInput {
        PostInput {
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            content: self.content.clone(),
            category: self.category.clone(),
            tags: self.tags.join(", "),
            cover_image: self.cover_image.clone().unwrap_or_default(),
            reading_time: self.reading_time,
            is_published: self.is_published,
        }
    }
}

fn format_date(value: OffsetDateTime, format: &[FormatItem<'static>]) -> String {
    value.date().format(format).unwrap_or_default()
}

/// Editor form state. Tags stay in their comma-separated form until the post
/// is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub tags: String,
    pub cover_image: String,
    pub reading_time: u32,
    pub is_published: bool,
}

impl Default for PostInput {
    fn default() -> Self {
        Self {
            title: String::new(),
            excerpt: String::new(),
            content: String::new(),
            category: String::new(),
            tags: String::new(),
            cover_image: String::new(),
            reading_time: DEFAULT_READING_TIME,
            is_published: false,
        }
    }
}

impl PostInput {
    /// Validate the form and turn it into the payload written to the table.
    pub fn into_new_post(self, author_email: Option<&str>) -> Result<NewPost, DomainError> {
        let required = [&self.title, &self.excerpt, &self.content, &self.category];
        if required.iter().any(|value| value.trim().is_empty()) {
            return Err(DomainError::validation(REQUIRED_FIELDS_MESSAGE));
        }
        if self.reading_time == 0 {
            return Err(DomainError::validation(
                "Reading time must be at least one minute",
            ));
        }

        let cover_image = Some(self.cover_image.trim().to_string()).filter(|url| !url.is_empty());

        Ok(NewPost {
            title: self.title,
            excerpt: self.excerpt,
            content: self.content,
            category: self.category.trim().to_string(),
            tags: parse_tags(&self.tags),
            cover_image,
            reading_time: self.reading_time,
            is_published: self.is_published,
            author_name: author_name_from_email(author_email),
            author_avatar: None,
        })
    }
}

/// Payload for inserting or updating a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPost {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub reading_time: u32,
    pub is_published: bool,
    pub author_name: String,
    pub author_avatar: Option<String>,
}

/// Split a comma-separated tag list, trimming entries and dropping blanks.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Local part of the author's e-mail, or [`FALLBACK_AUTHOR_NAME`].
pub fn author_name_from_email(email: Option<&str>) -> String {
    email
        .and_then(|value| value.split('@').next())
        .map(str::trim)
        .filter(|local| !local.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_AUTHOR_NAME.to_string())
}

/// Published / draft split shown on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostCounts {
    pub total: usize,
    pub published: usize,
    pub drafts: usize,
}

impl PostCounts {
    pub fn tally(posts: &[BlogPost]) -> Self {
        let published = posts.iter().filter(|post| post.is_published).count();
        Self {
            total: posts.len(),
            published,
            drafts: posts.len() - published,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_input() -> PostInput {
        PostInput {
            title: "Title".into(),
            excerpt: "Excerpt".into(),
            content: "# Body".into(),
            category: " Design ".into(),
            tags: "css, , layout ,grid".into(),
            cover_image: "   ".into(),
            reading_time: 6,
            is_published: true,
        }
    }

    #[test]
    fn into_new_post_normalises_fields() {
        let post = filled_input()
            .into_new_post(Some("sarah@example.com"))
            .expect("valid input");

        assert_eq!(post.tags, vec!["css", "layout", "grid"]);
        assert_eq!(post.category, "Design");
        assert_eq!(post.cover_image, None);
        assert_eq!(post.author_name, "sarah");
        assert_eq!(post.author_avatar, None);
    }

    #[test]
    fn into_new_post_requires_core_fields() {
        let mut input = filled_input();
        input.excerpt = "  ".into();
        let err = input.into_new_post(None).expect_err("missing excerpt");
        assert_eq!(err, DomainError::validation(REQUIRED_FIELDS_MESSAGE));
    }

    #[test]
    fn into_new_post_rejects_zero_reading_time() {
        let mut input = filled_input();
        input.reading_time = 0;
        assert!(input.into_new_post(None).is_err());
    }

    #[test]
    fn author_name_falls_back_to_admin() {
        assert_eq!(author_name_from_email(None), "Admin");
        assert_eq!(author_name_from_email(Some("@example.com")), "Admin");
        assert_eq!(author_name_from_email(Some("mike@blog.dev")), "mike");
    }

    #[test]
    fn counts_split_published_and_drafts() {
        let mut posts = seed_posts();
        posts[0].is_published = false;
        let counts = PostCounts::tally(&posts);
        assert_eq!(counts.total, posts.len());
        assert_eq!(counts.drafts, 1);
        assert_eq!(counts.published, posts.len() - 1);
    }

    #[test]
    fn dates_render_in_long_and_short_form() {
        let post = &seed_posts()[0];
        assert_eq!(post.long_date(), "March 15, 2024");
        assert_eq!(post.short_date(), "Mar 15, 2024");
        assert_eq!(post.author_initial(), "S");
    }

    #[test]
    fn to_input_round_trips_through_validation() {
        let post = &seed_posts()[1];
        let new_post = post
            .to_input()
            .into_new_post(Some("mike@example.com"))
            .expect("valid");
        assert_eq!(new_post.tags, post.tags);
        assert_eq!(new_post.title, post.title);
    }
}
