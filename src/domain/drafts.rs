//! Editor drafts cached between saves.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::posts::{DEFAULT_READING_TIME, PostInput};

const DRAFT_KEY_PREFIX: &str = "blog-draft-";
const NEW_POST_SEGMENT: &str = "new";

/// The post an editor session is working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostKey {
    New,
    Existing(Uuid),
}

impl PostKey {
    pub fn id(&self) -> Option<Uuid> {
        match self {
            PostKey::New => None,
            PostKey::Existing(id) => Some(*id),
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, PostKey::New)
    }
}

impl fmt::Display for PostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostKey::New => f.write_str(NEW_POST_SEGMENT),
            PostKey::Existing(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for PostKey {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == NEW_POST_SEGMENT {
            return Ok(PostKey::New);
        }
        Uuid::parse_str(value).map(PostKey::Existing)
    }
}

/// Draft cache key: drafts are scoped to the user editing them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DraftKey {
    pub owner: Uuid,
    pub post: PostKey,
}

impl DraftKey {
    pub fn new(owner: Uuid, post: PostKey) -> Self {
        Self { owner, post }
    }

    /// Storage name of the draft within the owner's namespace.
    pub fn storage_name(&self) -> String {
        format!("{DRAFT_KEY_PREFIX}{}", self.post)
    }
}

impl fmt::Display for DraftKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.storage_name())
    }
}

/// Snapshot of the editor form. Every field is optional on the wire so that
/// partially written drafts still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub cover_image: String,
    #[serde(default)]
    pub reading_time: Option<u32>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl Draft {
    pub fn capture(input: &PostInput, timestamp: OffsetDateTime) -> Self {
        Self {
            title: input.title.clone(),
            excerpt: input.excerpt.clone(),
            content: input.content.clone(),
            category: input.category.clone(),
            tags: input.tags.clone(),
            cover_image: input.cover_image.clone(),
            reading_time: Some(input.reading_time),
            is_published: input.is_published,
            timestamp,
        }
    }

    /// Form state restored from the draft.
    pub fn restore(&self) -> PostInput {
        PostInput {
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            content: self.content.clone(),
            category: self.category.clone(),
            tags: self.tags.clone(),
            cover_image: self.cover_image.clone(),
            reading_time: self
                .reading_time
                .filter(|minutes| *minutes > 0)
                .unwrap_or(DEFAULT_READING_TIME),
            is_published: self.is_published,
        }
    }

    /// Whether restoring this draft should be offered for a post last
    /// modified at `post_modified` (`None` for a post that does not exist yet).
    pub fn is_recoverable(&self, post_modified: Option<OffsetDateTime>) -> bool {
        post_modified.is_none_or(|modified| self.timestamp > modified)
    }
}

/// Auto-save indicator shown next to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    Unsaved,
    Saving,
    Saved,
}

impl SaveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SaveStatus::Unsaved => "Unsaved changes",
            SaveStatus::Saving => "Saving draft...",
            SaveStatus::Saved => "Draft saved",
        }
    }
}
