use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::markdown::{frontmatter, is_note_file, resolve_filename, Field};
use crate::storage::{
    format_timestamp, local_now, lock_store, Note, PushedNote, SharedNoteStore, StorageError,
};

use super::config::{
    default_commit_message, FetchReport, GitHubConfig, PushReport, SessionKind, SessionState,
    SessionStatus, SkippedItem, SyncProgress,
};
use super::remote::{PutRequest, RemoteEntry, RemoteError, RemoteStore};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Network error.")]
    Network(#[source] reqwest::Error),
    #[error("Path not found: {0}")]
    PathNotFound(String),
    #[error("Authentication failed. Check the access token.")]
    AuthFailed,
    #[error("Error {status}: {message}")]
    Remote { status: u16, message: String },
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Path is not a directory.")]
    NotADirectory,
    #[error("No markdown files found.")]
    NoMarkdownFiles,
    #[error("Failed to push {filename}: {source}")]
    PushFailed {
        filename: String,
        #[source]
        source: RemoteError,
    },
    #[error("A {0} is already running")]
    Busy(SessionKind),
    #[error("Sync not configured: {0} is missing")]
    NotConfigured(&'static str),
    #[error("{0}")]
    Protocol(RemoteError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<RemoteError> for SyncError {
    /// Classify a failure of the folder listing, which aborts a fetch
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Http(e) => SyncError::Network(e),
            RemoteError::AuthFailed => SyncError::AuthFailed,
            RemoteError::NotFound(path) => SyncError::PathNotFound(path),
            RemoteError::NotADirectory(_) => SyncError::NotADirectory,
            RemoteError::Status { status, message } => SyncError::Remote { status, message },
            RemoteError::Conflict(message) => SyncError::Conflict(message),
            other => SyncError::Protocol(other),
        }
    }
}

/// Called after every processed item of a session
pub type ProgressListener = Box<dyn Fn(SessionKind, SyncProgress) + Send + Sync>;

#[derive(Default)]
struct SessionSlot {
    busy: AtomicBool,
    status: Mutex<SessionStatus>,
}

impl SessionSlot {
    fn update<F: FnOnce(&mut SessionStatus)>(&self, f: F) -> SessionStatus {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut status);
        status.clone()
    }
}

/// Releases the busy flag of a session when dropped
struct SessionGuard<'a> {
    slot: &'a SessionSlot,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.slot.busy.store(false, Ordering::Release);
    }
}

/// Runs fetch and push sessions between a note store and a remote folder.
///
/// At most one session of each kind runs at a time. The store lock is only
/// taken between remote calls, so the user can keep editing while a
/// session is in flight.
pub struct SyncManager<R: RemoteStore> {
    remote: R,
    config: GitHubConfig,
    fetch: SessionSlot,
    push: SessionSlot,
    listener: Option<ProgressListener>,
}

impl<R: RemoteStore> SyncManager<R> {
    pub fn new(remote: R, config: GitHubConfig) -> Self {
        Self {
            remote,
            config,
            fetch: SessionSlot::default(),
            push: SessionSlot::default(),
            listener: None,
        }
    }

    pub fn with_progress_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(SessionKind, SyncProgress) + Send + Sync + 'static,
    {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn is_busy(&self, kind: SessionKind) -> bool {
        self.slot(kind).busy.load(Ordering::Acquire)
    }

    /// State of the latest session of `kind`
    pub fn status(&self, kind: SessionKind) -> SessionStatus {
        self.slot(kind).update(|_| {})
    }

    fn slot(&self, kind: SessionKind) -> &SessionSlot {
        match kind {
            SessionKind::Fetch => &self.fetch,
            SessionKind::Push => &self.push,
        }
    }

    fn begin(&self, kind: SessionKind) -> Result<SessionGuard<'_>, SyncError> {
        if let Some(field) = self.config.missing_field() {
            return Err(SyncError::NotConfigured(field));
        }

        let slot = self.slot(kind);
        if slot
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SyncError::Busy(kind));
        }

        slot.update(|status| *status = SessionStatus {
            state: SessionState::Running,
            ..Default::default()
        });
        Ok(SessionGuard { slot })
    }

    fn set_total(&self, kind: SessionKind, total: usize) {
        let status = self.slot(kind).update(|s| s.progress.total = total);
        self.notify(kind, status.progress);
    }

    fn advance(&self, kind: SessionKind) {
        let status = self.slot(kind).update(|s| s.progress.current += 1);
        self.notify(kind, status.progress);
    }

    fn notify(&self, kind: SessionKind, progress: SyncProgress) {
        if let Some(listener) = &self.listener {
            listener(kind, progress);
        }
    }

    fn finish<T>(&self, kind: SessionKind, result: &Result<T, SyncError>) {
        self.slot(kind).update(|status| match result {
            Ok(_) => status.state = SessionState::Completed,
            Err(e) => {
                status.state = SessionState::Aborted;
                status.error = Some(e.to_string());
            }
        });
    }

    /// Pull every Markdown file of the configured folder into the store.
    ///
    /// Files that fail to download are skipped and reported; a listing
    /// failure aborts the session without touching the store.
    pub async fn fetch_all(&self, store: &SharedNoteStore) -> Result<FetchReport, SyncError> {
        let _guard = self.begin(SessionKind::Fetch)?;
        let result = self.run_fetch(store).await;
        if let Err(e) = &result {
            log::error!("Sync: fetch aborted: {}", e);
        }
        self.finish(SessionKind::Fetch, &result);
        result
    }

    async fn run_fetch(&self, store: &SharedNoteStore) -> Result<FetchReport, SyncError> {
        let folder = self.config.folder();
        log::info!(
            "Sync: fetching '{}' from {}/{}",
            folder,
            self.config.owner,
            self.config.repo
        );

        let entries = self.remote.list_dir(folder).await?;
        let files: Vec<RemoteEntry> = entries
            .into_iter()
            .filter(|e| e.is_file() && is_note_file(&e.name))
            .collect();
        if files.is_empty() {
            return Err(SyncError::NoMarkdownFiles);
        }

        log::info!("Sync: remote folder has {} markdown files", files.len());
        self.set_total(SessionKind::Fetch, files.len());

        let mut batch = Vec::with_capacity(files.len());
        let mut skipped = Vec::new();
        for entry in &files {
            match self.fetch_note(entry).await {
                Ok(note) => batch.push(note),
                Err(e) => {
                    log::warn!("Sync: skipping '{}': {}", entry.name, e);
                    skipped.push(SkippedItem {
                        name: entry.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            self.advance(SessionKind::Fetch);
        }

        let fetched = batch.len();
        let summary = lock_store(store).merge(batch, self.config.filename_fallback, local_now())?;

        log::info!(
            "Sync: fetch complete ({} updated, {} added, {} skipped)",
            summary.updated,
            summary.added,
            skipped.len()
        );
        Ok(FetchReport {
            fetched,
            updated: summary.updated,
            added: summary.added,
            skipped,
        })
    }

    async fn fetch_note(&self, entry: &RemoteEntry) -> Result<Note, RemoteError> {
        let file = self.remote.get_file(entry).await?;
        let text = file.decode_text()?;
        let sha = if file.sha.is_empty() {
            entry.sha.clone()
        } else {
            file.sha
        };
        Ok(Note::from_remote(&entry.name, &text, Some(sha), local_now()))
    }

    /// Write every dirty note to the remote folder, in collection order.
    ///
    /// The first failed write aborts the session. Notes written before it
    /// stay clean; the failed note and the rest stay dirty.
    pub async fn push_all(
        &self,
        store: &SharedNoteStore,
        message: Option<&str>,
    ) -> Result<PushReport, SyncError> {
        let _guard = self.begin(SessionKind::Push)?;
        let result = self.run_push(store, message).await;
        if let Err(e) = &result {
            log::error!("Sync: push aborted: {}", e);
        }
        self.finish(SessionKind::Push, &result);
        result
    }

    async fn run_push(
        &self,
        store: &SharedNoteStore,
        message: Option<&str>,
    ) -> Result<PushReport, SyncError> {
        let dirty = lock_store(store).dirty_notes();
        self.set_total(SessionKind::Push, dirty.len());

        let mut report = PushReport::default();
        if dirty.is_empty() {
            log::info!("Sync: nothing to push");
            return Ok(report);
        }

        let message = message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_commit_message(&dirty));
        log::info!("Sync: pushing {} notes ({})", dirty.len(), message);

        for note in &dirty {
            let filename = resolve_filename(note, self.config.filename_fallback);
            let path = self.config.file_path(&filename);
            let now = local_now();
            let content = frontmatter::set_field(&note.content, Field::Lastmod, &format_timestamp(&now));

            let request = PutRequest::new(
                &message,
                &content,
                note.sha.clone(),
                self.config.branch().map(str::to_string),
            );
            let response = self
                .remote
                .put_file(&path, &request)
                .await
                .map_err(|source| SyncError::PushFailed {
                    filename: filename.clone(),
                    source,
                })?;

            log::debug!("Sync: wrote {} (sha {})", path, response.content.sha);
            let pushed = PushedNote {
                id: note.id,
                snapshot_content: note.content.clone(),
                pushed_content: content,
                filename,
                sha: response.content.sha,
            };
            let applied = lock_store(store).apply_push(&pushed, now)?;
            if !applied {
                log::warn!("Sync: note {} was deleted while being pushed", note.id);
            }

            report.pushed.push(path);
            self.advance(SessionKind::Push);
        }

        log::info!("Sync: push complete ({} files)", report.pushed.len());
        Ok(report)
    }
}
