use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use ghnotes_lib::storage::{lock_store, FileStorage, Note, NoteStore, SharedNoteStore};
use ghnotes_lib::sync::{GitHubClient, GitHubConfig, SyncManager};

/// Shared application state for CLI commands
pub struct App {
    pub data_dir: PathBuf,
    pub store: SharedNoteStore,
    config_storage: FileStorage,
}

impl App {
    /// Open the note store in `data_dir`, or the default data directory
    pub fn new(data_dir: Option<&Path>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => FileStorage::default_data_dir().context("Failed to get data directory")?,
        };

        let storage = FileStorage::new(data_dir.clone());
        storage.init().context("Failed to initialize storage")?;
        let store = NoteStore::open(storage)
            .context("Failed to load notes")?
            .into_shared();

        Ok(Self {
            config_storage: FileStorage::new(data_dir.clone()),
            data_dir,
            store,
        })
    }

    /// Saved connection config as stored on disk
    pub fn stored_config(&self) -> Result<GitHubConfig> {
        self.config_storage
            .load_config()
            .context("Failed to read sync config")
    }

    /// Connection config with `GITHUB_TOKEN` filling in a missing token
    pub fn config(&self) -> Result<GitHubConfig> {
        let mut config = self.stored_config()?;
        if config.token().is_none() {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                config.token = Some(token);
            }
        }
        Ok(config)
    }

    pub fn save_config(&self, config: &GitHubConfig) -> Result<()> {
        self.config_storage
            .save_config(config)
            .context("Failed to save sync config")
    }

    /// Sync manager for the configured repository
    pub fn sync_manager(&self) -> Result<SyncManager<GitHubClient>> {
        let config = self.config()?;
        if let Some(field) = config.missing_field() {
            bail!(
                "Sync is not configured: {} is missing. Run `ghnotes-cli config set --{} <value>`.",
                field,
                field
            );
        }
        let client = GitHubClient::new(&config).context("Failed to create GitHub client")?;
        Ok(SyncManager::new(client, config))
    }

    /// Find a note by id prefix or title (case-insensitive, exact match first, then prefix)
    pub fn find_note(&self, query: &str) -> Result<Note> {
        let store = lock_store(&self.store);
        let notes = store.notes();
        let query_lower = query.to_lowercase();

        if let Some(note) = notes.iter().find(|n| n.id.to_string() == query_lower) {
            return Ok(note.clone());
        }

        // Exact title match
        if let Some(note) = notes.iter().find(|n| n.title.to_lowercase() == query_lower) {
            return Ok(note.clone());
        }

        // Id or title prefix match
        let matches: Vec<&Note> = notes
            .iter()
            .filter(|n| {
                n.id.to_string().starts_with(&query_lower)
                    || n.title.to_lowercase().starts_with(&query_lower)
            })
            .collect();

        match matches.len() {
            0 => bail!("No note matching '{}'", query),
            1 => Ok(matches[0].clone()),
            _ => bail!(
                "Ambiguous note '{}'. Matches:\n{}",
                query,
                matches
                    .iter()
                    .map(|n| format!("  - {} ({})", display_title(n), short_id(n)))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        }
    }
}

pub fn display_title(note: &Note) -> &str {
    if note.title.trim().is_empty() {
        "(untitled)"
    } else {
        &note.title
    }
}

pub fn short_id(note: &Note) -> String {
    note.id.to_string()[..8].to_string()
}

/// Split a comma-separated tag list
pub fn parse_tag_list(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
