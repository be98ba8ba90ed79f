use anyhow::Result;

use ghnotes_lib::storage::lock_store;

use crate::app::{display_title, short_id, App};
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let store = lock_store(&app.store);
    let notes = store.notes();

    match format {
        OutputFormat::Json => {
            let output: Vec<_> = notes
                .iter()
                .map(|n| {
                    serde_json::json!({
                        "id": n.id.to_string(),
                        "title": n.title,
                        "filename": n.filename,
                        "tags": n.tags,
                        "preview": n.preview(),
                        "updatedAt": n.updated_at,
                        "dirty": n.dirty,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if notes.is_empty() {
                println!("(no notes)");
                return Ok(());
            }
            for note in notes {
                let marker = if note.dirty { "*" } else { " " };
                println!(
                    "{} {}  {}  {}",
                    paint(marker, Color::YELLOW, use_color),
                    paint(&short_id(note), Color::GRAY, use_color),
                    display_title(note),
                    paint(&note.updated_at.format("%Y-%m-%d %H:%M").to_string(), Color::DIM, use_color)
                );
                let preview = note.preview();
                if !preview.is_empty() {
                    println!("             {}", paint(preview, Color::DIM, use_color));
                }
            }
        }
    }

    Ok(())
}
