use anyhow::{Context, Result};

use ghnotes_lib::storage::lock_store;

use crate::app::{display_title, App};
use crate::OutputFormat;

pub fn run(app: &App, query: &str, format: &OutputFormat) -> Result<()> {
    let note = app.find_note(query)?;
    let deleted = lock_store(&app.store)
        .delete(note.id)
        .context("Failed to delete note")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "id": deleted.id.to_string(),
                "title": deleted.title,
                "deleted": true,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Deleted note \"{}\"", display_title(&deleted));
            if let Some(filename) = &deleted.filename {
                println!("  The remote file {} was not removed.", filename);
            }
        }
    }

    Ok(())
}
