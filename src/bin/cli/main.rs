mod app;
mod commands;
mod render;

use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ghnotes-cli", about = "Markdown notes synced with a GitHub folder", version)]
struct Cli {
    /// Use a specific data directory (default: platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum FallbackArg {
    Untitled,
    Timestamp,
}

#[derive(Subcommand)]
enum Command {
    /// List all notes
    List,

    /// Show a note
    Show {
        /// Note id prefix or title (case-insensitive prefix match)
        note: String,
    },

    /// Create a new note
    New {
        /// Note title
        title: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Body text (use "-" to read from stdin)
        #[arg(long)]
        body: Option<String>,
    },

    /// Edit the title, tags or body of a note
    Edit {
        /// Note id prefix or title
        note: String,
        #[arg(long)]
        title: Option<String>,
        /// Comma-separated tags (empty string clears them)
        #[arg(long)]
        tags: Option<String>,
        /// Replacement body text (use "-" to read from stdin)
        #[arg(long)]
        body: Option<String>,
    },

    /// Delete a note locally (the remote file is kept)
    Delete {
        /// Note id prefix or title
        note: String,
    },

    /// Export a note as a Markdown file
    Export {
        /// Note id prefix or title
        note: String,
        /// Target directory
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Show or change the GitHub connection
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Fetch all Markdown files from the configured folder
    Fetch,

    /// Push all modified notes to the configured folder
    Push {
        /// Commit message
        #[arg(long, short)]
        message: Option<String>,
    },

    /// Show notes waiting to be pushed
    Status,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the current config (token redacted)
    Show,

    /// Update config fields
    Set {
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        repo: Option<String>,
        /// Folder inside the repository
        #[arg(long)]
        path: Option<String>,
        /// Personal access token (empty string removes it)
        #[arg(long)]
        token: Option<String>,
        /// Branch to sync with (empty string uses the default branch)
        #[arg(long)]
        branch: Option<String>,
        /// API root for GitHub Enterprise
        #[arg(long)]
        api_base_url: Option<String>,
        /// File name for notes with an empty title
        #[arg(long)]
        filename_fallback: Option<FallbackArg>,
    },
}

/// Read body text from stdin when given as "-"
fn resolve_body(body: Option<String>) -> anyhow::Result<Option<String>> {
    match body.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(Some(buf))
        }
        _ => Ok(body),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    let app = app::App::new(cli.data_dir.as_deref())?;

    match cli.command {
        Command::List => {
            commands::list::run(&app, &cli.format, use_color)?;
        }
        Command::Show { note } => {
            commands::show::run(&app, &note, &cli.format, use_color)?;
        }
        Command::New { title, tags, body } => {
            let body = resolve_body(body)?;
            commands::new::run(&app, title.as_deref(), tags.as_deref(), body, &cli.format)?;
        }
        Command::Edit { note, title, tags, body } => {
            let body = resolve_body(body)?;
            commands::edit::run(&app, &note, title, tags.as_deref(), body, &cli.format)?;
        }
        Command::Delete { note } => {
            commands::delete::run(&app, &note, &cli.format)?;
        }
        Command::Export { note, dir } => {
            commands::export::run(&app, &note, &dir, &cli.format)?;
        }
        Command::Config(ConfigCommand::Show) => {
            commands::config::run_show(&app, &cli.format)?;
        }
        Command::Config(ConfigCommand::Set {
            owner,
            repo,
            path,
            token,
            branch,
            api_base_url,
            filename_fallback,
        }) => {
            let changes = commands::config::ConfigChanges {
                owner,
                repo,
                path,
                token,
                branch,
                api_base_url,
                filename_fallback,
            };
            commands::config::run_set(&app, changes, &cli.format)?;
        }
        Command::Fetch => {
            commands::sync::run_fetch(&app, &cli.format, use_color).await?;
        }
        Command::Push { message } => {
            commands::sync::run_push(&app, message.as_deref(), &cli.format, use_color).await?;
        }
        Command::Status => {
            commands::sync::run_status(&app, &cli.format, use_color)?;
        }
    }

    Ok(())
}
