use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use super::models::Note;
use crate::sync::GitHubConfig;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Note not found: {0}")]
    NoteNotFound(Uuid),

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Side effect run after every mutation of the note collection
pub trait NotesPersistence: Send + Sync {
    fn save_notes(&self, notes: &[Note]) -> Result<()>;
}

/// Stores the note collection and the connection config as one JSON blob each.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the default data directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("ghnotes"))
            .ok_or(StorageError::DataDirNotFound)
    }

    /// Initialize storage directories
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path)?;
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn notes_path(&self) -> PathBuf {
        self.base_path.join("notes.json")
    }

    fn config_path(&self) -> PathBuf {
        self.base_path.join("config.json")
    }

    /// Saved notes, or `None` if nothing has been saved yet
    pub fn load_notes(&self) -> Result<Option<Vec<Note>>> {
        let path = self.notes_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let notes: Vec<Note> = serde_json::from_str(&content)?;
        Ok(Some(notes))
    }

    pub fn write_notes(&self, notes: &[Note]) -> Result<()> {
        self.init()?;
        let content = serde_json::to_string_pretty(notes)?;
        fs::write(self.notes_path(), content)?;
        Ok(())
    }

    /// Saved connection config, or the empty default
    pub fn load_config(&self) -> Result<GitHubConfig> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(GitHubConfig::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: GitHubConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save_config(&self, config: &GitHubConfig) -> Result<()> {
        self.init()?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(self.config_path(), content)?;

        // The config carries the access token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(self.config_path(), fs::Permissions::from_mode(0o600));
        }
        Ok(())
    }
}

impl NotesPersistence for FileStorage {
    fn save_notes(&self, notes: &[Note]) -> Result<()> {
        self.write_notes(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::local_now;
    use tempfile::TempDir;

    fn create_test_storage() -> (FileStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("data"));
        (storage, temp_dir)
    }

    #[test]
    fn test_load_notes_missing() {
        let (storage, _temp) = create_test_storage();
        assert!(storage.load_notes().unwrap().is_none());
    }

    #[test]
    fn test_notes_round_trip() {
        let (storage, _temp) = create_test_storage();
        let mut note = Note::new(local_now());
        note.title = "Saved".to_string();
        note.sha = Some("abc123".to_string());

        storage.save_notes(&[note.clone()]).unwrap();
        let loaded = storage.load_notes().unwrap().unwrap();
        assert_eq!(loaded, vec![note]);
    }

    #[test]
    fn test_config_default_and_save() {
        let (storage, _temp) = create_test_storage();
        assert_eq!(storage.load_config().unwrap(), GitHubConfig::default());

        let config = GitHubConfig {
            owner: "octo".to_string(),
            repo: "notes".to_string(),
            path: "journal".to_string(),
            token: Some("ghp_secret".to_string()),
            ..Default::default()
        };
        storage.save_config(&config).unwrap();
        assert_eq!(storage.load_config().unwrap(), config);
    }
}
