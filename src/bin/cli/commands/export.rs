use std::path::Path;

use anyhow::{Context, Result};

use ghnotes_lib::markdown::export_note;
use ghnotes_lib::storage::local_now;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, query: &str, dir: &Path, format: &OutputFormat) -> Result<()> {
    let note = app.find_note(query)?;
    let path = export_note(&note, dir, local_now())
        .with_context(|| format!("Failed to export note to {}", dir.display()))?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "id": note.id.to_string(),
                "path": path.to_string_lossy(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Exported to {}", path.display());
        }
    }

    Ok(())
}
