use anyhow::{Context, Result};

use ghnotes_lib::markdown::frontmatter;
use ghnotes_lib::storage::{lock_store, NoteUpdate};

use crate::app::{display_title, parse_tag_list, App};
use crate::OutputFormat;

pub fn run(
    app: &App,
    title: Option<&str>,
    tags: Option<&str>,
    body: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let mut store = lock_store(&app.store);
    let note = store.create().context("Failed to create note")?;

    let update = NoteUpdate {
        title: title.map(str::to_string),
        content: body.map(|b| frontmatter::replace_body(&note.content, &b)),
        tags: tags.map(parse_tag_list),
    };
    let note = if update.is_empty() {
        note
    } else {
        store.update(note.id, update).context("Failed to update note")?
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&note)?);
        }
        OutputFormat::Plain => {
            println!("Created note \"{}\"", display_title(&note));
            if !note.tags.is_empty() {
                println!(
                    "  Tags: {}",
                    note.tags
                        .iter()
                        .map(|t| format!("#{}", t))
                        .collect::<Vec<_>>()
                        .join(" ")
                );
            }
            println!("  ID: {}", note.id);
        }
    }

    Ok(())
}
