//! Folding a fetched batch of remote notes into the local collection.
//!
//! The merge is one-directional: remote content replaces the local note with
//! the same file name, local notes missing from the batch are left alone, and
//! nothing is ever deleted. A local edit made to a note that is then fetched
//! again is overwritten by the remote version.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::markdown::{resolve_filename, FilenameFallback};
use crate::storage::Note;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    /// Local notes overwritten by a remote note with the same file name
    pub updated: usize,
    /// Remote notes with no local counterpart
    pub added: usize,
}

/// Merge `batch` into `local` by file name, keeping local note ids.
pub fn merge_remote(
    local: &mut Vec<Note>,
    batch: Vec<Note>,
    fallback: FilenameFallback,
    now: DateTime<FixedOffset>,
) -> MergeSummary {
    let mut summary = MergeSummary::default();

    for mut remote in batch {
        let identity = resolve_filename(&remote, fallback);
        let existing = local
            .iter()
            .position(|n| resolve_filename(n, fallback) == identity);

        remote.filename = Some(identity);
        remote.dirty = false;
        remote.last_synced_at = Some(now);

        match existing {
            Some(index) => {
                let current = &local[index];
                if current.dirty {
                    log::warn!(
                        "Local changes to '{}' were replaced by the remote version",
                        remote.filename.as_deref().unwrap_or_default()
                    );
                }
                remote.id = current.id;
                local[index] = remote;
                summary.updated += 1;
            }
            None => {
                local.push(remote);
                summary.added += 1;
            }
        }
    }

    summary
}
