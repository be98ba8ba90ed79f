use anyhow::Result;

use crate::app::{display_title, App};
use crate::render::terminal::{self, paint, Color};
use crate::OutputFormat;

pub fn run(app: &App, query: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let note = app.find_note(query)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&note)?);
        }
        OutputFormat::Plain => {
            println!("{}", paint(display_title(&note), Color::BOLD, use_color));

            let mut meta = Vec::new();
            if let Some(filename) = &note.filename {
                meta.push(filename.clone());
            }
            if !note.tags.is_empty() {
                meta.push(
                    note.tags
                        .iter()
                        .map(|t| format!("#{}", t))
                        .collect::<Vec<_>>()
                        .join(" "),
                );
            }
            if note.dirty {
                meta.push("modified".to_string());
            }
            if !meta.is_empty() {
                println!("{}", paint(&meta.join("  "), Color::DIM, use_color));
            }

            println!();
            println!("{}", terminal::render_document(&note.content, use_color));
        }
    }

    Ok(())
}
