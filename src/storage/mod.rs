mod file_storage;
mod models;
mod note_store;

pub use file_storage::{FileStorage, NotesPersistence, StorageError};
pub use models::*;
pub use note_store::{lock_store, welcome_note, NoteStore, PushedNote, SharedNoteStore};
