use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::markdown::frontmatter::{self, Field};

/// Timestamp layout written into headers: local time with UTC offset
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Current local time, keeping the local UTC offset
pub fn local_now() -> DateTime<FixedOffset> {
    let now = Local::now();
    now.with_timezone(now.offset())
}

pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a header timestamp. Accepts RFC 3339 and bare `YYYY-MM-DD` dates (read as UTC midnight).
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).fixed_offset())
}

/// Trim, lowercase and deduplicate tags, keeping first-seen order
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Local key; never sent to the remote store
    pub id: Uuid,
    pub title: String,
    /// Full document text, header included
    pub content: String,
    /// Remote file name, once associated with a remote path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Revision marker of the last known remote version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub dirty: bool,
}

impl Note {
    /// A fresh local note with an empty header. Starts out dirty.
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        let ts = format_timestamp(&now);
        Self {
            id: Uuid::new_v4(),
            title: String::new(),
            content: frontmatter::create("", &ts, &ts, &[]),
            filename: None,
            sha: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            last_synced_at: None,
            dirty: true,
        }
    }

    /// Build a note from a fetched remote file.
    ///
    /// Remote files carry no creation or modification time, so a header-less
    /// file gets one stamped with `now` and titled after the file name.
    pub fn from_remote(
        filename: &str,
        raw: &str,
        sha: Option<String>,
        now: DateTime<FixedOffset>,
    ) -> Self {
        let raw = raw.replace("\r\n", "\n");
        let stem = filename.strip_suffix(".md").unwrap_or(filename);

        let content = if frontmatter::has_header(&raw) {
            raw
        } else {
            let ts = format_timestamp(&now);
            frontmatter::create(stem, &ts, &ts, &[]) + &raw
        };

        let fm = frontmatter::parse(&content);
        let created_at = fm.date.as_deref().and_then(parse_timestamp).unwrap_or(now);
        let updated_at = fm
            .lastmod
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(created_at);
        let title = fm
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| stem.to_string());

        Self {
            id: Uuid::new_v4(),
            title,
            content,
            filename: Some(filename.to_string()),
            sha,
            tags: normalize_tags(fm.tags),
            created_at,
            updated_at,
            last_synced_at: Some(now),
            dirty: false,
        }
    }

    /// Notes without a revision marker have never been pushed
    pub fn is_new(&self) -> bool {
        self.sha.is_none()
    }

    /// First non-empty line of the body, header excluded
    pub fn preview(&self) -> &str {
        frontmatter::strip_header(&self.content)
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("")
    }

    /// Apply a user edit. Content and title changes go through the header so
    /// `lastmod` stays current. Returns false when the update changes nothing.
    pub fn apply_update(&mut self, update: NoteUpdate, now: DateTime<FixedOffset>) -> bool {
        if update.is_empty() {
            return false;
        }

        let content_changed = update.content.is_some();
        let mut content = update.content.unwrap_or_else(|| self.content.clone());

        if let Some(title) = update.title {
            content = frontmatter::set_field(&content, Field::Title, &title);
        }
        if let Some(tags) = update.tags {
            content = frontmatter::set_tags(&content, &normalize_tags(tags));
        }
        content = frontmatter::set_field(&content, Field::Lastmod, &format_timestamp(&now));

        let fm = frontmatter::parse(&content);
        if let Some(title) = fm.title {
            self.title = title;
        } else if content_changed {
            self.title.clear();
        }
        self.tags = normalize_tags(fm.tags);
        self.content = content;
        self.updated_at = now;
        self.dirty = true;
        true
    }
}

/// A user edit. `None` fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NoteUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_new_note_is_dirty_with_header() {
        let now = ts("2026-10-19T09:30:00+02:00");
        let note = Note::new(now);
        assert!(note.dirty);
        assert!(note.is_new());
        assert_eq!(note.filename, None);

        let fm = frontmatter::parse(&note.content);
        assert_eq!(fm.title.as_deref(), Some(""));
        assert_eq!(fm.date.as_deref(), Some("2026-10-19T09:30:00+02:00"));
    }

    #[test]
    fn test_note_ids_are_unique() {
        let now = local_now();
        assert_ne!(Note::new(now).id, Note::new(now).id);
    }

    #[test]
    fn test_apply_update_title() {
        let created = ts("2026-10-19T09:30:00+02:00");
        let later = ts("2026-10-19T10:15:00+02:00");
        let mut note = Note::new(created);
        note.dirty = false;

        let changed = note.apply_update(
            NoteUpdate {
                title: Some("Todo".to_string()),
                ..Default::default()
            },
            later,
        );

        assert!(changed);
        assert!(note.dirty);
        assert_eq!(note.title, "Todo");
        assert_eq!(note.updated_at, later);
        let fm = frontmatter::parse(&note.content);
        assert_eq!(fm.title.as_deref(), Some("Todo"));
        assert_eq!(fm.date.as_deref(), Some("2026-10-19T09:30:00+02:00"));
        assert_eq!(fm.lastmod.as_deref(), Some("2026-10-19T10:15:00+02:00"));
    }

    #[test]
    fn test_apply_update_tags_normalized() {
        let mut note = Note::new(local_now());
        note.apply_update(
            NoteUpdate {
                tags: Some(vec![" Work ".into(), "home".into(), "WORK".into(), "".into()]),
                ..Default::default()
            },
            local_now(),
        );
        assert_eq!(note.tags, vec!["work", "home"]);
        assert!(note.content.contains("tags: [work, home]\n"));
    }

    #[test]
    fn test_apply_update_content_reads_title_from_header() {
        let mut note = Note::new(local_now());
        let edited = "---\ntitle: Typed in header\n---\n\nbody";
        note.apply_update(
            NoteUpdate {
                content: Some(edited.to_string()),
                ..Default::default()
            },
            local_now(),
        );
        assert_eq!(note.title, "Typed in header");
        assert!(note.content.contains("lastmod: "));
        assert!(note.content.ends_with("\n\nbody"));
    }

    #[test]
    fn test_empty_update_is_noop() {
        let mut note = Note::new(local_now());
        note.dirty = false;
        let before = note.clone();
        assert!(!note.apply_update(NoteUpdate::default(), local_now()));
        assert_eq!(note, before);
    }

    #[test]
    fn test_from_remote_without_header() {
        let now = ts("2026-10-19T09:30:00+02:00");
        let note = Note::from_remote("Groceries.md", "- milk\r\n- eggs\r\n", Some("abc".into()), now);

        assert_eq!(note.title, "Groceries");
        assert_eq!(note.filename.as_deref(), Some("Groceries.md"));
        assert_eq!(note.sha.as_deref(), Some("abc"));
        assert!(!note.dirty);
        assert_eq!(note.created_at, now);
        assert!(note.content.starts_with("---\ntitle: Groceries\n"));
        assert!(note.content.ends_with("---\n\n- milk\n- eggs\n"));
    }

    #[test]
    fn test_from_remote_with_header() {
        let now = ts("2026-10-19T09:30:00+02:00");
        let raw = "---\ntitle: Plans\ndate: 2024-01-01\nlastmod: 2024-02-01T08:00:00+00:00\ntags: [Trip]\n---\n\nbody";
        let note = Note::from_remote("plans.md", raw, None, now);

        assert_eq!(note.title, "Plans");
        assert_eq!(note.content, raw);
        assert_eq!(note.tags, vec!["trip"]);
        assert_eq!(note.created_at, ts("2024-01-01T00:00:00+00:00"));
        assert_eq!(note.updated_at, ts("2024-02-01T08:00:00+00:00"));
    }

    #[test]
    fn test_from_remote_empty_title_uses_stem() {
        let note = Note::from_remote("inbox.md", "---\ntitle: \n---\n", None, local_now());
        assert_eq!(note.title, "inbox");
    }

    #[test]
    fn test_preview_skips_header() {
        let mut note = Note::new(local_now());
        note.content.push_str("\n\n  First line  \nSecond");
        assert_eq!(note.preview(), "First line");
    }

    #[test]
    fn test_timestamp_format() {
        let t = ts("2026-03-04T05:06:07-07:00");
        assert_eq!(format_timestamp(&t), "2026-03-04T05:06:07-07:00");
        assert_eq!(parse_timestamp("2026-03-04T05:06:07-07:00"), Some(t));
        assert_eq!(parse_timestamp("not a date"), None);
    }
}
