use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};

use crate::markdown::frontmatter::{self, Field};
use crate::storage::{format_timestamp, Note, StorageError};

/// Export file name: title with whitespace runs replaced by `_`, or `untitled`.
///
/// Path separators and characters invalid in file names become `_`, so the
/// file always lands directly inside the export directory.
pub fn export_filename(note: &Note) -> String {
    let joined = note.title.split_whitespace().collect::<Vec<_>>().join("_");
    let mapped: String = joined
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = mapped.trim_start_matches('.');
    if stem.is_empty() {
        "untitled.md".to_string()
    } else {
        format!("{}.md", stem)
    }
}

/// Document text as exported, with `lastmod` stamped at export time
pub fn export_note_to_markdown(note: &Note, now: DateTime<FixedOffset>) -> String {
    frontmatter::set_field(&note.content, Field::Lastmod, &format_timestamp(&now))
}

/// Write a note into `dir` as a Markdown file and return the written path.
pub fn export_note(
    note: &Note,
    dir: &Path,
    now: DateTime<FixedOffset>,
) -> Result<PathBuf, StorageError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(note));
    fs::write(&path, export_note_to_markdown(note, now))?;
    log::info!("Exported note {} to {}", note.id, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_export_filename() {
        let mut note = Note::new(ts("2026-01-01T00:00:00+00:00"));
        assert_eq!(export_filename(&note), "untitled.md");

        note.title = "Weekly  review notes".to_string();
        assert_eq!(export_filename(&note), "Weekly_review_notes.md");

        note.title = "..".to_string();
        assert_eq!(export_filename(&note), "untitled.md");
    }

    #[test]
    fn test_export_stays_inside_dir() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("exports");
        let mut note = Note::new(ts("2026-01-01T00:00:00+00:00"));

        let absolute = temp.path().join("abs");
        for title in ["../escaped", "a/b\\c", absolute.to_str().unwrap(), "what? <now>"] {
            note.title = title.to_string();
            let path = export_note(&note, &target, ts("2026-02-02T12:00:00+00:00")).unwrap();
            assert_eq!(path.parent(), Some(target.as_path()), "title {:?}", title);
            assert!(path.exists());
        }

        note.title = "../escaped".to_string();
        assert_eq!(export_filename(&note), "_escaped.md");
    }

    #[test]
    fn test_export_stamps_lastmod() {
        let temp = TempDir::new().unwrap();
        let mut note = Note::new(ts("2026-01-01T00:00:00+00:00"));
        note.title = "Plan".to_string();
        note.content.push_str("# Plan\n");

        let path = export_note(&note, temp.path(), ts("2026-02-02T12:00:00+00:00")).unwrap();
        assert_eq!(path, temp.path().join("Plan.md"));

        let written = fs::read_to_string(&path).unwrap();
        let fm = frontmatter::parse(&written);
        assert_eq!(fm.lastmod.as_deref(), Some("2026-02-02T12:00:00+00:00"));
        assert_eq!(fm.date.as_deref(), Some("2026-01-01T00:00:00+00:00"));
        assert!(written.ends_with("# Plan\n"));
    }
}
