use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use super::file_storage::{FileStorage, NotesPersistence, Result, StorageError};
use super::models::{format_timestamp, local_now, Note, NoteUpdate};
use crate::markdown::{frontmatter, FilenameFallback};
use crate::sync::merge::{merge_remote, MergeSummary};

/// Note store shared between user edits and sync sessions
pub type SharedNoteStore = Arc<Mutex<NoteStore>>;

/// Lock a shared store. A panic in another holder does not invalidate the notes.
pub fn lock_store(store: &SharedNoteStore) -> MutexGuard<'_, NoteStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Outcome of one successful remote write, applied back to the local note
#[derive(Debug, Clone)]
pub struct PushedNote {
    pub id: Uuid,
    /// Content the note had when the push session took its snapshot
    pub snapshot_content: String,
    /// Content that was written (with `lastmod` stamped)
    pub pushed_content: String,
    pub filename: String,
    pub sha: String,
}

/// Owns the local note collection. Every mutating call persists the whole
/// collection through the injected persistence.
pub struct NoteStore {
    notes: Vec<Note>,
    persistence: Option<Box<dyn NotesPersistence>>,
}

impl NoteStore {
    pub fn new(notes: Vec<Note>, persistence: Box<dyn NotesPersistence>) -> Self {
        Self {
            notes,
            persistence: Some(persistence),
        }
    }

    /// A store that keeps notes in memory only
    pub fn detached(notes: Vec<Note>) -> Self {
        Self {
            notes,
            persistence: None,
        }
    }

    /// Load the saved collection, seeding a welcome note on first start.
    pub fn open(storage: FileStorage) -> Result<Self> {
        let (notes, seeded) = match storage.load_notes()? {
            Some(notes) => (notes, false),
            None => (vec![welcome_note(local_now())], true),
        };

        let store = Self::new(notes, Box::new(storage));
        if seeded {
            log::info!("No saved notes found, created welcome note");
            store.persist()?;
        }
        Ok(store)
    }

    pub fn into_shared(self) -> SharedNoteStore {
        Arc::new(Mutex::new(self))
    }

    fn persist(&self) -> Result<()> {
        if let Some(persistence) = &self.persistence {
            persistence.save_notes(&self.notes)?;
        }
        Ok(())
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    fn get_mut(&mut self, id: Uuid) -> Result<&mut Note> {
        self.notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(StorageError::NoteNotFound(id))
    }

    /// Snapshot of notes with local changes, in collection order
    pub fn dirty_notes(&self) -> Vec<Note> {
        self.notes.iter().filter(|n| n.dirty).cloned().collect()
    }

    /// Create an empty note at the top of the collection
    pub fn create(&mut self) -> Result<Note> {
        self.create_at(local_now())
    }

    pub fn create_at(&mut self, now: DateTime<FixedOffset>) -> Result<Note> {
        let note = Note::new(now);
        self.notes.insert(0, note.clone());
        self.persist()?;
        Ok(note)
    }

    /// Apply a user edit to a note
    pub fn update(&mut self, id: Uuid, update: NoteUpdate) -> Result<Note> {
        self.update_at(id, update, local_now())
    }

    pub fn update_at(
        &mut self,
        id: Uuid,
        update: NoteUpdate,
        now: DateTime<FixedOffset>,
    ) -> Result<Note> {
        let note = self.get_mut(id)?;
        let changed = note.apply_update(update, now);
        let note = note.clone();
        if changed {
            self.persist()?;
        }
        Ok(note)
    }

    /// Insert or replace a note by id
    pub fn upsert(&mut self, note: Note) -> Result<()> {
        match self.notes.iter_mut().find(|n| n.id == note.id) {
            Some(existing) => *existing = note,
            None => self.notes.push(note),
        }
        self.persist()
    }

    /// Remove a note locally. The remote file, if any, is left in place.
    pub fn delete(&mut self, id: Uuid) -> Result<Note> {
        let index = self
            .notes
            .iter()
            .position(|n| n.id == id)
            .ok_or(StorageError::NoteNotFound(id))?;
        let note = self.notes.remove(index);
        self.persist()?;
        Ok(note)
    }

    /// Fold a fetched batch into the collection
    pub fn merge(
        &mut self,
        batch: Vec<Note>,
        fallback: FilenameFallback,
        now: DateTime<FixedOffset>,
    ) -> Result<MergeSummary> {
        let summary = merge_remote(&mut self.notes, batch, fallback, now);
        self.persist()?;
        Ok(summary)
    }

    /// Record a successful write. Returns false if the note was deleted meanwhile.
    ///
    /// A note edited while its write was in flight keeps its newer content
    /// and stays dirty; only the revision marker and file name are taken.
    pub fn apply_push(&mut self, pushed: &PushedNote, now: DateTime<FixedOffset>) -> Result<bool> {
        let Some(note) = self.notes.iter_mut().find(|n| n.id == pushed.id) else {
            return Ok(false);
        };

        note.sha = Some(pushed.sha.clone());
        note.filename = Some(pushed.filename.clone());
        note.last_synced_at = Some(now);
        if note.content == pushed.snapshot_content {
            note.content = pushed.pushed_content.clone();
            note.dirty = false;
        } else {
            log::debug!(
                "Note {} changed while '{}' was being pushed, keeping it dirty",
                note.id,
                pushed.filename
            );
        }

        self.persist()?;
        Ok(true)
    }
}

/// Note shown on first start
pub fn welcome_note(now: DateTime<FixedOffset>) -> Note {
    let ts = format_timestamp(&now);
    let mut note = Note::new(now);
    note.title = "Welcome".to_string();
    note.content = frontmatter::create("Welcome", &ts, &ts, &[]) + "# Welcome\n\nStart writing...";
    note.filename = Some("Welcome.md".to_string());
    note.dirty = false;
    note
}
