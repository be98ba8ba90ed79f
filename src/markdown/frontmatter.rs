//! Frontmatter header embedded at the start of a note document.
//!
//! The document string is the only representation of a note's metadata.
//! Every read parses the header out of the text and every write injects the
//! new value back into it, so the header can never drift from the body that
//! gets pushed to the remote folder.
//!
//! ```text
//! ---
//! title: Todo
//! date: 2026-10-19T09:30:00+02:00
//! lastmod: 2026-10-19T09:41:12+02:00
//! tags: [work, errands]
//! ---
//!
//! - [ ] buy milk
//! ```

use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;

/// Delimiter line that opens and closes the header block
pub const MARKER: &str = "---";

/// Header fields the note model knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Date,
    Lastmod,
    Tags,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Date => "date",
            Field::Lastmod => "lastmod",
            Field::Tags => "tags",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values read from a document header. Missing fields stay `None`/empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frontmatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub lastmod: Option<String>,
    pub tags: Vec<String>,
}

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| Regex::new(r"(?s)\A---\n(.*?)\n---").expect("header pattern is valid"))
}

/// Line-anchored matcher for `field:` inside a header block
fn field_regex(field: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?m)^{}:[ \t]*(.*)$", regex::escape(field))).ok()
}

/// Captures of the header block, if the document starts with one.
/// Group 1 is the block text between the delimiters.
fn header_captures(document: &str) -> Option<Captures<'_>> {
    header_regex().captures(document)
}

/// Whether the document begins with a header block
pub fn has_header(document: &str) -> bool {
    header_captures(document).is_some()
}

/// Read a single field from the header block.
pub fn field_value(document: &str, field: &str) -> Option<String> {
    let caps = header_captures(document)?;
    let block = caps.get(1)?.as_str();
    let re = field_regex(field)?;
    re.captures(block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Parse the header block. Malformed or partial headers yield missing fields.
pub fn parse(document: &str) -> Frontmatter {
    let Some(caps) = header_captures(document) else {
        return Frontmatter::default();
    };
    let block = caps.get(1).map(|m| m.as_str()).unwrap_or_default();

    let read = |field: Field| -> Option<String> {
        field_regex(field.as_str())?
            .captures(block)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    };

    Frontmatter {
        title: read(Field::Title),
        date: read(Field::Date),
        lastmod: read(Field::Lastmod),
        tags: read(Field::Tags).map(|v| parse_tags(&v)).unwrap_or_default(),
    }
}

/// Split a `[a, b, c]` list value. Brackets are optional.
pub fn parse_tags(value: &str) -> Vec<String> {
    let value = value.trim();
    let inner = value
        .strip_prefix('[')
        .map(|v| v.strip_suffix(']').unwrap_or(v))
        .unwrap_or(value);

    inner
        .split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Render tags the way the header stores them
pub fn format_tags(tags: &[String]) -> String {
    format!("[{}]", tags.join(", "))
}

/// Header values are line oriented; a newline would end the field early.
fn fold_value(value: &str) -> String {
    if value.contains('\n') || value.contains('\r') {
        value
            .split(['\r', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        value.to_string()
    }
}

/// Set `field` to `value` in the document's header block.
///
/// Replaces the first `field:` line of the block, or appends one at the end
/// of the block. Everything outside the replaced line is kept verbatim. A
/// document without a header gets a minimal one containing only this field.
pub fn upsert_field(document: &str, field: &str, value: &str) -> String {
    let value = fold_value(value);
    let line = format!("{}: {}", field, value);

    let Some(caps) = header_captures(document) else {
        return format!("{MARKER}\n{line}\n{MARKER}\n\n{document}");
    };
    let Some(block) = caps.get(1) else {
        return document.to_string();
    };
    let block_text = block.as_str();

    let new_block = match field_regex(field).and_then(|re| re.find(block_text)) {
        Some(existing) => {
            let mut out = String::with_capacity(block_text.len() + line.len());
            out.push_str(&block_text[..existing.start()]);
            out.push_str(&line);
            out.push_str(&block_text[existing.end()..]);
            out
        }
        None => format!("{}\n{}", block_text, line),
    };

    let mut out = String::with_capacity(document.len() + line.len() + 1);
    out.push_str(&document[..block.start()]);
    out.push_str(&new_block);
    out.push_str(&document[block.end()..]);
    out
}

/// Typed variant of [`upsert_field`]
pub fn set_field(document: &str, field: Field, value: &str) -> String {
    upsert_field(document, field.as_str(), value)
}

/// Replace the tag list in the header
pub fn set_tags(document: &str, tags: &[String]) -> String {
    set_field(document, Field::Tags, &format_tags(tags))
}

/// Canonical header for a new document, followed by a blank separator line.
pub fn create(title: &str, date: &str, lastmod: &str, tags: &[String]) -> String {
    format!(
        "{MARKER}\ntitle: {}\ndate: {}\nlastmod: {}\ntags: {}\n{MARKER}\n\n",
        fold_value(title),
        date,
        lastmod,
        format_tags(tags)
    )
}

/// Document text after the header block, with the delimiter line's newline removed.
pub fn strip_header(document: &str) -> &str {
    match header_regex().find(document) {
        Some(m) => {
            let rest = &document[m.end()..];
            rest.strip_prefix('\n').unwrap_or(rest)
        }
        None => document,
    }
}

/// Replace the body of a document, keeping its header block.
pub fn replace_body(document: &str, body: &str) -> String {
    let header = &document[..document.len() - strip_header(document).len()];
    if header.is_empty() {
        body.to_string()
    } else {
        format!("{}\n{}", header, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2026-10-19T09:30:00+02:00";
    const LATER: &str = "2026-10-19T10:00:00+02:00";

    #[test]
    fn test_create_and_parse() {
        let doc = create("Todo", NOW, NOW, &[]);
        assert_eq!(
            doc,
            "---\ntitle: Todo\ndate: 2026-10-19T09:30:00+02:00\nlastmod: 2026-10-19T09:30:00+02:00\ntags: []\n---\n\n"
        );

        let fm = parse(&doc);
        assert_eq!(fm.title.as_deref(), Some("Todo"));
        assert_eq!(fm.date.as_deref(), Some(NOW));
        assert_eq!(fm.lastmod.as_deref(), Some(NOW));
        assert!(fm.tags.is_empty());
    }

    #[test]
    fn test_parse_no_header() {
        let fm = parse("# Just a heading\n\ntitle: not a header");
        assert_eq!(fm, Frontmatter::default());
    }

    #[test]
    fn test_parse_partial_header() {
        let fm = parse("---\ntitle: Only title\n---\nbody");
        assert_eq!(fm.title.as_deref(), Some("Only title"));
        assert_eq!(fm.date, None);
        assert_eq!(fm.lastmod, None);
    }

    #[test]
    fn test_parse_unterminated_header() {
        let fm = parse("---\ntitle: Broken\nno closing marker");
        assert_eq!(fm.title, None);
    }

    #[test]
    fn test_parse_ignores_body_fields() {
        let doc = "---\ndate: 2026-01-01\n---\n\ntitle: from the body\n";
        assert_eq!(parse(doc).title, None);
    }

    #[test]
    fn test_field_must_start_line() {
        let doc = "---\nsubtitle: Nope\n---\n";
        assert_eq!(parse(doc).title, None);
    }

    #[test]
    fn test_parse_tags() {
        let doc = create("T", NOW, NOW, &["work".to_string(), "home".to_string()]);
        assert_eq!(parse(&doc).tags, vec!["work", "home"]);

        assert_eq!(parse_tags("[ a ,, b , ]"), vec!["a", "b"]);
        assert_eq!(parse_tags("a, b"), vec!["a", "b"]);
        assert!(parse_tags("[]").is_empty());
    }

    #[test]
    fn test_upsert_replaces_existing_field() {
        let doc = format!("{}Body text\n", create("Old", NOW, NOW, &[]));
        let updated = upsert_field(&doc, "title", "New");

        assert_eq!(parse(&updated).title.as_deref(), Some("New"));
        assert_eq!(parse(&updated).date.as_deref(), Some(NOW));
        assert!(updated.ends_with("---\n\nBody text\n"));
        assert_eq!(updated.matches("title:").count(), 1);
    }

    #[test]
    fn test_upsert_appends_missing_field() {
        let doc = "---\ntitle: A\n---\n\nbody";
        let updated = upsert_field(doc, "lastmod", LATER);
        assert_eq!(updated, format!("---\ntitle: A\nlastmod: {}\n---\n\nbody", LATER));
    }

    #[test]
    fn test_upsert_without_header() {
        let updated = upsert_field("plain text", "lastmod", LATER);
        assert_eq!(updated, format!("---\nlastmod: {}\n---\n\nplain text", LATER));
        assert_eq!(strip_header(&updated), "\nplain text");
    }

    #[test]
    fn test_upsert_does_not_touch_body() {
        let doc = "---\ntitle: A\n---\n\ntitle: body line\n";
        let updated = upsert_field(doc, "title", "B");
        assert_eq!(updated, "---\ntitle: B\n---\n\ntitle: body line\n");
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let doc = create("A", NOW, NOW, &[]);
        let once = upsert_field(&doc, "lastmod", LATER);
        let twice = upsert_field(&once, "lastmod", LATER);
        assert_eq!(once, twice);

        let once = upsert_field(&doc, "draft", "true");
        let twice = upsert_field(&once, "draft", "true");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_upsert_value_taken_literally() {
        let doc = create("A", NOW, NOW, &[]);
        let updated = upsert_field(&doc, "title", "costs $1 and ${name}");
        assert_eq!(parse(&updated).title.as_deref(), Some("costs $1 and ${name}"));
    }

    #[test]
    fn test_upsert_folds_newlines() {
        let doc = create("A", NOW, NOW, &[]);
        let updated = upsert_field(&doc, "title", "two\nlines");
        assert_eq!(parse(&updated).title.as_deref(), Some("two lines"));
        assert_eq!(parse(&updated).date.as_deref(), Some(NOW));
    }

    #[test]
    fn test_round_trip_latest_value_wins() {
        let mut doc = create("Start", NOW, NOW, &[]);
        let writes = [
            ("title", "First"),
            ("lastmod", LATER),
            ("title", "Second"),
            ("tags", "[x, y]"),
            ("lastmod", "2026-10-20T00:00:00+02:00"),
        ];
        for (field, value) in writes {
            doc = upsert_field(&doc, field, value);
        }

        let fm = parse(&doc);
        assert_eq!(fm.title.as_deref(), Some("Second"));
        assert_eq!(fm.date.as_deref(), Some(NOW));
        assert_eq!(fm.lastmod.as_deref(), Some("2026-10-20T00:00:00+02:00"));
        assert_eq!(fm.tags, vec!["x", "y"]);
    }

    #[test]
    fn test_set_tags() {
        let doc = create("A", NOW, NOW, &[]);
        let updated = set_tags(&doc, &["one".to_string(), "two".to_string()]);
        assert!(updated.contains("tags: [one, two]\n"));
        assert_eq!(field_value(&updated, "tags").as_deref(), Some("[one, two]"));
    }

    #[test]
    fn test_strip_header() {
        let doc = format!("{}# Heading\n", create("A", NOW, NOW, &[]));
        assert_eq!(strip_header(&doc), "\n# Heading\n");
        assert_eq!(strip_header("no header"), "no header");
    }

    #[test]
    fn test_replace_body() {
        let doc = "---\ntitle: A\n---\n\nold body\n";
        assert_eq!(replace_body(doc, "new"), "---\ntitle: A\n---\n\nnew");
        assert_eq!(replace_body("plain", "new"), "new");
    }
}
