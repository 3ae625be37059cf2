//! Post URL slugs.
//!
//! A post is addressed as `{title-slug}--{uuid}`: the readable part is derived
//! from the title and is purely cosmetic, while the identifier after the first
//! `--` is what the reader actually resolves. The title part goes through
//! ASCII slugification (`slug` crate) after Chinese transliteration (`pinyin`
//! crate), so inputs like “基线对齐” become `ji-xian-dui-qi`.

use pinyin::{Pinyin, ToPinyin};
use slug::slugify;
use thiserror::Error;
use uuid::Uuid;

/// Upper bound for the title portion of a post slug, in characters.
pub const MAX_TITLE_SLUG_LEN: usize = 50;

/// Separates the title portion from the post identifier.
pub const ID_SEPARATOR: &str = "--";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug `{slug}` does not carry a valid post identifier")]
    InvalidIdentifier { slug: String },
}

/// Derive the readable title portion of a slug.
///
/// The result only contains `[a-z0-9-]`, never starts or ends with a hyphen,
/// never contains `--` and is at most [`MAX_TITLE_SLUG_LEN`] characters long.
/// Titles without any representable character yield an empty string.
pub fn title_slug(title: &str) -> String {
    let transliterated = transliterate_to_ascii(title);
    let mut slug: String = slugify(&transliterated)
        .chars()
        .take(MAX_TITLE_SLUG_LEN)
        .collect();

    // The cut may land right after a word separator.
    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

/// Build the public slug for a post.
pub fn generate_slug(title: &str, id: Uuid) -> String {
    format!("{}{ID_SEPARATOR}{id}", title_slug(title))
}

/// Recover the post identifier embedded in a slug.
///
/// The identifier is whatever follows the first `--`. A slug without a
/// separator is treated as a bare identifier so `/post/{uuid}` links resolve.
pub fn extract_id_from_slug(slug: &str) -> Result<Uuid, SlugError> {
    let candidate = match slug.find(ID_SEPARATOR) {
        Some(index) => &slug[index + ID_SEPARATOR.len()..],
        None => slug,
    };

    // Older links could carry a dangling hyphen from a truncated title.
    let candidate = candidate.trim_start_matches('-');

    Uuid::parse_str(candidate).map_err(|_| SlugError::InvalidIdentifier {
        slug: slug.to_string(),
    })
}

fn transliterate_to_ascii(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        if ch.is_ascii() {
            output.push(ch);
            continue;
        }

        match ch.to_pinyin() {
            Some(py) => append_pinyin(&mut output, py),
            None if ch.is_whitespace() => output.push(' '),
            None => output.push(ch),
        }
    }

    output
}

fn append_pinyin(buffer: &mut String, pinyin: Pinyin) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(pinyin.plain());
    buffer.push(' ');
}
