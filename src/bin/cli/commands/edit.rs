use anyhow::{bail, Context, Result};

use ghnotes_lib::markdown::frontmatter;
use ghnotes_lib::storage::{lock_store, NoteUpdate};

use crate::app::{display_title, parse_tag_list, App};
use crate::OutputFormat;

pub fn run(
    app: &App,
    query: &str,
    title: Option<String>,
    tags: Option<&str>,
    body: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let note = app.find_note(query)?;

    let update = NoteUpdate {
        title,
        content: body.map(|b| frontmatter::replace_body(&note.content, &b)),
        tags: tags.map(parse_tag_list),
    };
    if update.is_empty() {
        bail!("Nothing to change. Pass --title, --tags or --body.");
    }

    let note = lock_store(&app.store)
        .update(note.id, update)
        .context("Failed to update note")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&note)?);
        }
        OutputFormat::Plain => {
            println!("Updated note \"{}\"", display_title(&note));
        }
    }

    Ok(())
}
