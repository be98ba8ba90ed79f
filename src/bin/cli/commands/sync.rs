use std::io::{IsTerminal, Write};

use anyhow::Result;

use ghnotes_lib::markdown::{resolve_filename, FilenameFallback};
use ghnotes_lib::storage::{lock_store, Note};
use ghnotes_lib::sync::{SessionKind, SyncProgress};

use crate::app::{display_title, short_id, App};
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

/// Progress line on stderr, redrawn in place
fn print_progress(kind: SessionKind, progress: SyncProgress) {
    let verb = match kind {
        SessionKind::Fetch => "Fetching",
        SessionKind::Push => "Pushing",
    };
    let mut stderr = std::io::stderr();
    let _ = write!(stderr, "\r{} {}/{}", verb, progress.current, progress.total);
    let _ = stderr.flush();
}

fn show_progress(format: &OutputFormat) -> bool {
    matches!(format, OutputFormat::Plain) && std::io::stderr().is_terminal()
}

fn end_progress(shown: bool) {
    if shown {
        eprintln!();
    }
}

pub async fn run_fetch(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let mut manager = app.sync_manager()?;
    let shown = show_progress(format);
    if shown {
        manager = manager.with_progress_listener(print_progress);
    }

    let result = manager.fetch_all(&app.store).await;
    end_progress(shown);
    let report = result?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Plain => {
            println!(
                "Fetched {} notes ({} updated, {} new)",
                report.fetched, report.updated, report.added
            );
            for item in &report.skipped {
                println!(
                    "  {} {}: {}",
                    paint("skipped", Color::YELLOW, use_color),
                    item.name,
                    item.reason
                );
            }
        }
    }

    Ok(())
}

pub async fn run_push(
    app: &App,
    message: Option<&str>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let mut manager = app.sync_manager()?;
    let shown = show_progress(format);
    if shown {
        manager = manager.with_progress_listener(print_progress);
    }

    let result = manager.push_all(&app.store, message).await;
    end_progress(shown);
    let report = result?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Plain => {
            if report.pushed.is_empty() {
                println!("No changes to push");
            } else {
                println!("Pushed {} notes", report.pushed.len());
                for path in &report.pushed {
                    println!("  {}", paint(path, Color::GREEN, use_color));
                }
            }
        }
    }

    Ok(())
}

/// A dirty note as `status` reports it, with the file name `push` will write
fn pending_change(note: &Note, fallback: FilenameFallback) -> serde_json::Value {
    serde_json::json!({
        "id": note.id.to_string(),
        "title": note.title,
        "filename": resolve_filename(note, fallback),
        "status": if note.is_new() { "new" } else { "modified" },
    })
}

pub fn run_status(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let config = app.config()?;
    let dirty = lock_store(&app.store).dirty_notes();

    match format {
        OutputFormat::Json => {
            let changes: Vec<_> = dirty
                .iter()
                .map(|n| pending_change(n, config.filename_fallback))
                .collect();
            let output = serde_json::json!({
                "configured": config.is_configured(),
                "repository": format!("{}/{}", config.owner, config.repo),
                "path": config.folder(),
                "changes": changes,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if config.is_configured() {
                println!(
                    "Syncing with {}/{} ({})",
                    config.owner,
                    config.repo,
                    if config.folder().is_empty() { "/" } else { config.folder() }
                );
            } else {
                println!("Sync is not configured");
            }

            if dirty.is_empty() {
                println!("Nothing to push");
                return Ok(());
            }

            println!("{} notes to push:", dirty.len());
            for note in &dirty {
                let (label, color) = if note.is_new() {
                    ("new     ", Color::GREEN)
                } else {
                    ("modified", Color::YELLOW)
                };
                println!(
                    "  {} {}  {}  {}",
                    paint(label, color, use_color),
                    paint(&short_id(note), Color::GRAY, use_color),
                    display_title(note),
                    paint(&resolve_filename(note, config.filename_fallback), Color::DIM, use_color)
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghnotes_lib::storage::local_now;

    #[test]
    fn test_pending_change_names_target_file() {
        let mut note = Note::new(local_now());
        note.title = "Shopping list".to_string();

        let change = pending_change(&note, FilenameFallback::Untitled);
        assert_eq!(change["filename"], "Shopping_list.md");
        assert_eq!(change["status"], "new");

        note.title = String::new();
        let change = pending_change(&note, FilenameFallback::Untitled);
        assert_eq!(change["filename"], "untitled.md");

        note.filename = Some("kept.md".to_string());
        note.sha = Some("abc".to_string());
        let change = pending_change(&note, FilenameFallback::Untitled);
        assert_eq!(change["filename"], "kept.md");
        assert_eq!(change["status"], "modified");
    }
}
