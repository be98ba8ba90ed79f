use std::fmt;

use serde::{Deserialize, Serialize};

use crate::markdown::FilenameFallback;
use crate::storage::Note;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Connection settings for the GitHub folder notes are synced with
#[derive(Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GitHubConfig {
    /// Repository owner or organization
    pub owner: String,
    pub repo: String,
    /// Folder inside the repository (empty for the repository root)
    #[serde(default)]
    pub path: String,
    /// Personal access token; anonymous requests when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Branch to read from and commit to; the repository default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// API root, for GitHub Enterprise installs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub filename_fallback: FilenameFallback,
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("path", &self.path)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("branch", &self.branch)
            .field("api_base_url", &self.api_base_url)
            .field("filename_fallback", &self.filename_fallback)
            .finish()
    }
}

impl GitHubConfig {
    /// Owner and repository are required before any request can be made
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.owner.trim().is_empty() {
            Some("owner")
        } else if self.repo.trim().is_empty() {
            Some("repo")
        } else {
            None
        }
    }

    pub fn is_configured(&self) -> bool {
        self.missing_field().is_none()
    }

    /// Folder path without leading or trailing slashes
    pub fn folder(&self) -> &str {
        self.path.trim_matches('/')
    }

    /// Repository path of a note file inside the configured folder
    pub fn file_path(&self, filename: &str) -> String {
        let folder = self.folder();
        if folder.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{}", folder, filename)
        }
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(DEFAULT_API_BASE_URL)
    }

    /// Branch to target, ignoring blank values
    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref().map(str::trim).filter(|b| !b.is_empty())
    }

    /// Token to send, ignoring blank values
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// The two kinds of sync session
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Fetch,
    Push,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::Fetch => f.write_str("fetch"),
            SessionKind::Push => f.write_str("push"),
        }
    }
}

/// Lifecycle of a session: Idle -> Running -> Completed | Aborted
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Running,
    Completed,
    Aborted,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct SyncProgress {
    pub current: usize,
    pub total: usize,
}

/// Observable state of the latest session of one kind
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub state: SessionState,
    pub progress: SyncProgress,
    /// Error text of an aborted session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A remote file that could not be fetched; the session went on without it
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkippedItem {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FetchReport {
    /// Files fetched and merged
    pub fetched: usize,
    /// Local notes replaced by their remote version
    pub updated: usize,
    /// Remote notes new to the local collection
    pub added: usize,
    pub skipped: Vec<SkippedItem>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PushReport {
    /// Repository paths written, in push order
    pub pushed: Vec<String>,
}

/// Commit message used when the user does not supply one
pub fn default_commit_message(dirty: &[Note]) -> String {
    match dirty {
        [] => "No changes".to_string(),
        [note] => {
            let title = if note.title.trim().is_empty() {
                "note"
            } else {
                note.title.as_str()
            };
            format!("Update {}", title)
        }
        notes => format!("Update {} notes", notes.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::local_now;

    #[test]
    fn test_file_path_trims_folder() {
        let mut config = GitHubConfig {
            owner: "o".into(),
            repo: "r".into(),
            path: "/notes/daily/".into(),
            ..Default::default()
        };
        assert_eq!(config.file_path("a.md"), "notes/daily/a.md");

        config.path = String::new();
        assert_eq!(config.file_path("a.md"), "a.md");
    }

    #[test]
    fn test_missing_field() {
        let mut config = GitHubConfig::default();
        assert_eq!(config.missing_field(), Some("owner"));
        config.owner = "octo".into();
        assert_eq!(config.missing_field(), Some("repo"));
        config.repo = "notes".into();
        assert!(config.is_configured());
    }

    #[test]
    fn test_token_and_base_url() {
        let mut config = GitHubConfig::default();
        assert_eq!(config.token(), None);
        assert_eq!(config.api_base_url(), DEFAULT_API_BASE_URL);

        config.token = Some("  ".into());
        assert_eq!(config.token(), None);
        config.token = Some("ghp_x".into());
        assert_eq!(config.token(), Some("ghp_x"));
        assert!(!format!("{:?}", config).contains("ghp_x"));
    }

    #[test]
    fn test_config_accepts_minimal_json() {
        let config: GitHubConfig =
            serde_json::from_str(r#"{"owner":"o","repo":"r","path":"","token":""}"#).unwrap();
        assert_eq!(config.owner, "o");
        assert_eq!(config.filename_fallback, FilenameFallback::Untitled);
    }

    #[test]
    fn test_default_commit_message() {
        assert_eq!(default_commit_message(&[]), "No changes");

        let mut note = Note::new(local_now());
        assert_eq!(default_commit_message(&[note.clone()]), "Update note");

        note.title = "Todo".into();
        assert_eq!(default_commit_message(&[note.clone()]), "Update Todo");
        assert_eq!(default_commit_message(&[note.clone(), note]), "Update 2 notes");
    }
}
