//! Markdown editing helpers behind the editor toolbar and keyboard shortcuts.

use serde::Serialize;

const SELECTION_PLACEHOLDER: &str = "text";
const CODE_PLACEHOLDER: &str = "code";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tool {
    pub label: &'static str,
    pub syntax: &'static str,
}

pub const TOOLS: &[Tool] = &[
    Tool {
        label: "Bold",
        syntax: "**text**",
    },
    Tool {
        label: "Italic",
        syntax: "*text*",
    },
    Tool {
        label: "Heading 1",
        syntax: "# Heading",
    },
    Tool {
        label: "Heading 2",
        syntax: "## Heading",
    },
    Tool {
        label: "Bullet List",
        syntax: "- List item",
    },
    Tool {
        label: "Numbered List",
        syntax: "1. List item",
    },
    Tool {
        label: "Link",
        syntax: "[link text](https://example.com)",
    },
    Tool {
        label: "Image",
        syntax: "![alt text](https://example.com/image.jpg)",
    },
    Tool {
        label: "Code Block",
        syntax: "```\ncode here\n```",
    },
    Tool {
        label: "Quote",
        syntax: "> Quote text",
    },
];

/// Syntax bound to `Ctrl`/`Cmd` + `key`, if any.
pub fn shortcut_syntax(key: &str) -> Option<String> {
    let key = key.to_lowercase();
    let syntax = match key.as_str() {
        "b" => "**text**",
        "i" => "*text*",
        "k" => "[text](url)",
        "e" => "`text`",
        "`" => "```\ncode\n```",
        "q" => "> text",
        "1" | "2" | "3" | "4" | "5" | "6" => {
            let level = key.parse::<usize>().unwrap_or(1);
            return Some(format!("{} Heading", "#".repeat(level)));
        }
        _ => return None,
    };
    Some(syntax.to_string())
}

/// Editor content after an insertion, with the caret position in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insertion {
    pub content: String,
    pub cursor: usize,
}

/// Insert `syntax` over the selection `start..end` of `content`.
///
/// Offsets count characters, not bytes. Selections outside the content are
/// clamped and a reversed selection is normalised.
pub fn insert_syntax(content: &str, start: usize, end: usize, syntax: &str) -> Insertion {
    let chars: Vec<char> = content.chars().collect();
    let (start, end) = if end < start { (end, start) } else { (start, end) };
    let start = start.min(chars.len());
    let end = end.clamp(start, chars.len());
    let selected: String = chars[start..end].iter().collect();

    let (inserted, offset) = if syntax.contains(SELECTION_PLACEHOLDER) {
        let replacement = if selected.is_empty() {
            SELECTION_PLACEHOLDER
        } else {
            selected.as_str()
        };
        let inserted = syntax.replacen(SELECTION_PLACEHOLDER, replacement, 1);
        let offset = if selected.is_empty() {
            char_offset(syntax, SELECTION_PLACEHOLDER).unwrap_or(0)
        } else {
            inserted.chars().count()
        };
        (inserted, offset)
    } else if syntax.contains('\n') {
        let offset = match char_offset(syntax, CODE_PLACEHOLDER) {
            Some(index) => index + 1,
            None => syntax.chars().count() + 1,
        };
        (format!("\n{syntax}\n"), offset)
    } else {
        let at_line_start = start == 0 || chars[start - 1] == '\n';
        let inserted = if at_line_start {
            syntax.to_string()
        } else {
            format!("\n{syntax}")
        };
        let offset = inserted.chars().count();
        (inserted, offset)
    };

    let mut result: String = chars[..start].iter().collect();
    result.push_str(&inserted);
    result.extend(&chars[end..]);

    Insertion {
        content: result,
        cursor: start + offset,
    }
}

/// Markdown image reference for an uploaded file.
pub fn image_markdown(name: &str, url: &str) -> String {
    format!("![{name}]({url})")
}

/// Insert an uploaded image on its own line at `cursor`.
pub fn insert_image(content: &str, cursor: usize, name: &str, url: &str) -> Insertion {
    let chars: Vec<char> = content.chars().collect();
    let cursor = cursor.min(chars.len());
    let inserted = format!("\n{}\n", image_markdown(name, url));

    let mut result: String = chars[..cursor].iter().collect();
    result.push_str(&inserted);
    result.extend(&chars[cursor..]);

    Insertion {
        content: result,
        cursor: cursor + inserted.chars().count(),
    }
}

fn char_offset(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte_index| haystack[..byte_index].chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_selection_with_inline_syntax() {
        let result = insert_syntax("make this bold", 10, 14, "**text**");
        assert_eq!(result.content, "make this **bold**");
        assert_eq!(result.cursor, 10 + "**bold**".len());
    }

    #[test]
    fn placeholder_is_kept_without_selection() {
        let result = insert_syntax("", 0, 0, "*text*");
        assert_eq!(result.content, "*text*");
        assert_eq!(result.cursor, 1);
    }

    #[test]
    fn link_replaces_only_first_placeholder() {
        let result = insert_syntax("see docs", 4, 8, "[link text](https://example.com)");
        assert_eq!(result.content, "see [link docs](https://example.com)");
    }

    #[test]
    fn reversed_selection_is_wrapped_like_a_forward_one() {
        let result = insert_syntax("make this bold", 14, 10, "**text**");
        assert_eq!(result.content, "make this **bold**");
        assert_eq!(result.cursor, 10 + "**bold**".len());
    }

    #[test]
    fn code_block_lands_on_its_own_lines() {
        let result = insert_syntax("intro", 5, 5, "```\ncode\n```");
        assert_eq!(result.content, "intro\n```\ncode\n```\n");
        assert_eq!(result.cursor, 5 + 5);
    }

    #[test]
    fn line_syntax_starts_a_new_line_when_needed() {
        let mid_line = insert_syntax("para", 4, 4, "## Heading");
        assert_eq!(mid_line.content, "para\n## Heading");
        assert_eq!(mid_line.cursor, 4 + "\n## Heading".len());

        let fresh_line = insert_syntax("para\n", 5, 5, "- List item");
        assert_eq!(fresh_line.content, "para\n- List item");
        assert_eq!(fresh_line.cursor, 5 + "- List item".len());
    }

    #[test]
    fn offsets_are_counted_in_characters() {
        let result = insert_syntax("héllo wörld", 6, 11, "**text**");
        assert_eq!(result.content, "héllo **wörld**");
        assert_eq!(result.cursor, 6 + 9);
    }

    #[test]
    fn out_of_range_selection_is_clamped() {
        let result = insert_syntax("abc", 10, 2, "`text`");
        assert_eq!(result.content, "abc`text`");
        assert_eq!(result.cursor, 4);
    }

    #[test]
    fn shortcuts_cover_formatting_and_headings() {
        assert_eq!(shortcut_syntax("B").as_deref(), Some("**text**"));
        assert_eq!(shortcut_syntax("k").as_deref(), Some("[text](url)"));
        assert_eq!(shortcut_syntax("3").as_deref(), Some("### Heading"));
        assert_eq!(shortcut_syntax("7"), None);
        assert_eq!(shortcut_syntax("x"), None);
    }

    #[test]
    fn image_is_inserted_on_its_own_line() {
        let result = insert_image("before after", 6, "pic.png", "/uploads/a.png");
        assert_eq!(result.content, "before\n![pic.png](/uploads/a.png)\n after");
        assert_eq!(result.cursor, 6 + "\n![pic.png](/uploads/a.png)\n".len());
    }
}
