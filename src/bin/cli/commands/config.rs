use anyhow::Result;

use ghnotes_lib::markdown::FilenameFallback;
use ghnotes_lib::sync::GitHubConfig;

use crate::app::App;
use crate::{FallbackArg, OutputFormat};

/// Fields given to `config set`; `None` leaves a field unchanged
pub struct ConfigChanges {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub path: Option<String>,
    pub token: Option<String>,
    pub branch: Option<String>,
    pub api_base_url: Option<String>,
    pub filename_fallback: Option<FallbackArg>,
}

/// Empty strings clear optional fields
fn optional(value: String) -> Option<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

pub fn apply_changes(config: &mut GitHubConfig, changes: ConfigChanges) {
    if let Some(owner) = changes.owner {
        config.owner = owner.trim().to_string();
    }
    if let Some(repo) = changes.repo {
        config.repo = repo.trim().to_string();
    }
    if let Some(path) = changes.path {
        config.path = path.trim().to_string();
    }
    if let Some(token) = changes.token {
        config.token = optional(token);
    }
    if let Some(branch) = changes.branch {
        config.branch = optional(branch);
    }
    if let Some(url) = changes.api_base_url {
        config.api_base_url = optional(url);
    }
    if let Some(fallback) = changes.filename_fallback {
        config.filename_fallback = match fallback {
            FallbackArg::Untitled => FilenameFallback::Untitled,
            FallbackArg::Timestamp => FilenameFallback::Timestamp,
        };
    }
}

pub fn run_show(app: &App, format: &OutputFormat) -> Result<()> {
    let stored = app.stored_config()?;
    let effective = app.config()?;
    let token_source = match (stored.token(), effective.token()) {
        (Some(_), _) => "config",
        (None, Some(_)) => "GITHUB_TOKEN",
        (None, None) => "none",
    };

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "owner": effective.owner,
                "repo": effective.repo,
                "path": effective.path,
                "branch": effective.branch(),
                "apiBaseUrl": effective.api_base_url(),
                "filenameFallback": effective.filename_fallback,
                "token": token_source,
                "configured": effective.is_configured(),
                "dataDir": app.data_dir.to_string_lossy(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Owner:     {}", effective.owner);
            println!("Repo:      {}", effective.repo);
            println!("Path:      {}", effective.folder());
            println!("Branch:    {}", effective.branch().unwrap_or("(default)"));
            println!("API:       {}", effective.api_base_url());
            println!("Token:     {}", token_source);
            println!("Data dir:  {}", app.data_dir.display());
            if let Some(field) = effective.missing_field() {
                println!();
                println!("Sync is not configured yet ({} is missing).", field);
            }
        }
    }

    Ok(())
}

pub fn run_set(app: &App, changes: ConfigChanges, format: &OutputFormat) -> Result<()> {
    let mut config = app.stored_config()?;
    apply_changes(&mut config, changes);
    app.save_config(&config)?;
    log::info!("Saved sync config for {}/{}", config.owner, config.repo);

    run_show(app, format)
}
