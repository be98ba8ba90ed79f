use serde::{Deserialize, Serialize};

use crate::storage::Note;

/// Extension of synchronized documents
pub const NOTE_EXTENSION: &str = ".md";

/// Stem used when a note's title yields no usable file name
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilenameFallback {
    /// `untitled.md`
    #[default]
    Untitled,
    /// `YYYY-MM-DD-HH-MM-SS.md` from the note's creation time
    Timestamp,
}

/// Remote file name for a note.
///
/// A note that already has a file name keeps it forever, whatever its title
/// becomes later. Push and merge must both go through here with the same
/// fallback, otherwise a pushed note will not be recognized on the next fetch.
pub fn resolve_filename(note: &Note, fallback: FilenameFallback) -> String {
    if let Some(filename) = &note.filename {
        return filename.clone();
    }

    let stem = sanitize_stem(&note.title);
    if !stem.is_empty() {
        return format!("{}{}", stem, NOTE_EXTENSION);
    }

    match fallback {
        FilenameFallback::Untitled => format!("untitled{}", NOTE_EXTENSION),
        FilenameFallback::Timestamp => format!(
            "{}{}",
            note.created_at.format("%Y-%m-%d-%H-%M-%S"),
            NOTE_EXTENSION
        ),
    }
}

/// Keep `[A-Za-z0-9-_ ]`, then turn each whitespace run into one underscore.
pub fn sanitize_stem(title: &str) -> String {
    let kept: String = title
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' '))
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut in_space = false;
    for c in kept.chars() {
        if c == ' ' {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Whether a remote file name is a synchronized document
pub fn is_note_file(name: &str) -> bool {
    name.ends_with(NOTE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn note_titled(title: &str) -> Note {
        let created = DateTime::parse_from_rfc3339("2026-03-04T05:06:07+01:00").unwrap();
        let mut note = Note::new(created);
        note.title = title.to_string();
        note
    }

    #[test]
    fn test_sanitize_stem() {
        assert_eq!(sanitize_stem("Todo"), "Todo");
        assert_eq!(sanitize_stem("  Hello,   World! "), "Hello_World");
        assert_eq!(sanitize_stem("a-b_c d"), "a-b_c_d");
        assert_eq!(sanitize_stem("Café & Co"), "Caf_Co");
        assert_eq!(sanitize_stem("!!!"), "");
    }

    #[test]
    fn test_resolve_from_title() {
        assert_eq!(resolve_filename(&note_titled("Todo"), FilenameFallback::Untitled), "Todo.md");
        assert_eq!(
            resolve_filename(&note_titled("Meeting notes 2"), FilenameFallback::Untitled),
            "Meeting_notes_2.md"
        );
    }

    #[test]
    fn test_resolve_fallbacks() {
        let note = note_titled("");
        assert_eq!(resolve_filename(&note, FilenameFallback::Untitled), "untitled.md");
        assert_eq!(
            resolve_filename(&note, FilenameFallback::Timestamp),
            "2026-03-04-05-06-07.md"
        );
        assert_eq!(
            resolve_filename(&note_titled("???"), FilenameFallback::Untitled),
            "untitled.md"
        );
    }

    #[test]
    fn test_resolve_is_stable_once_assigned() {
        let mut note = note_titled("First title");
        let first = resolve_filename(&note, FilenameFallback::Untitled);
        assert_eq!(first, resolve_filename(&note, FilenameFallback::Untitled));

        note.filename = Some(first.clone());
        note.title = "Renamed completely".to_string();
        assert_eq!(resolve_filename(&note, FilenameFallback::Untitled), "First_title.md");
        assert_eq!(resolve_filename(&note, FilenameFallback::Timestamp), "First_title.md");
    }

    #[test]
    fn test_is_note_file() {
        assert!(is_note_file("a.md"));
        assert!(!is_note_file("a.txt"));
        assert!(!is_note_file("md"));
    }
}
