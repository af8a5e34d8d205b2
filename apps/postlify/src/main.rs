use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{HttpPostService, PostListController};
use shared::domain::{PostId, UserId};
use storage::QueryCache;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod render;
mod shell;
mod terminal;

use app::App;
use config::load_settings;
use terminal::{StdTerminal, TerminalInteraction};

#[derive(Parser, Debug)]
#[command(name = "postlify", version, about = "Browse and edit posts on the demo post API")]
struct Cli {
    /// Config file; defaults to ./postlify.toml when present.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long)]
    base_url: Option<String>,
    /// Owner id sent with created posts.
    #[arg(long)]
    user_id: Option<i64>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the post list.
    List,
    /// Create a post; missing fields are prompted for.
    Create {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
    },
    /// Edit a post's title and body.
    Update { id: i64 },
    /// Delete a post after confirmation.
    Delete {
        id: i64,
        /// Skip the confirmation question.
        #[arg(long)]
        yes: bool,
    },
    /// Interactive session (default).
    Shell,
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let (mut settings, warnings) = load_settings(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }
    if let Some(user_id) = cli.user_id {
        settings.default_user_id = user_id;
    }

    init_tracing(&settings.log_filter);
    for warning in warnings {
        warn!("{warning}");
    }

    let service = HttpPostService::from_options(settings.service_options())
        .with_context(|| format!("invalid post service URL '{}'", settings.base_url))?;
    let command = cli.command.unwrap_or(Command::Shell);
    let assume_yes = matches!(command, Command::Delete { yes: true, .. });

    let terminal = Arc::new(StdTerminal::stdio());
    let interaction = TerminalInteraction::new(Arc::clone(&terminal)).assume_yes(assume_yes);
    let controller = PostListController::new(service, interaction, QueryCache::new())
        .with_owner(UserId(settings.default_user_id));
    let app = App::new(controller, terminal);

    let ok = match command {
        Command::Shell => shell::run(&app).await?,
        Command::List => {
            let loaded = app.load().await?;
            if loaded {
                app.show_list().await?;
            }
            loaded
        }
        Command::Create { title, body } => app.load().await? && app.create(title, body).await?,
        Command::Update { id } => app.load().await? && app.update(PostId(id)).await?,
        Command::Delete { id, .. } => app.load().await? && app.delete(PostId(id)).await?,
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
