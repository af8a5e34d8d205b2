//! Interactive loop: one command per line, re-rendering the list whenever the
//! posts cache entry changes.

pub mod commands;

use anyhow::Result;
use client_core::{PostService, POSTS_QUERY_KEY};
use storage::CacheEvent;
use tokio::sync::broadcast::{error::TryRecvError, Receiver};
use tracing::{debug, info};

use crate::{
    app::App,
    terminal::{Input, Output},
};
use commands::{ShellCommand, HELP};

const PROMPT: &str = "postlify> ";

/// Returns `Ok(false)` when the initial load failed and the session never started.
pub async fn run<S: PostService, R: Input, W: Output>(app: &App<S, R, W>) -> Result<bool> {
    let mut events = app.controller().cache().subscribe();

    if !app.load().await? {
        return Ok(false);
    }
    drain_posts_changes(&mut events);
    app.show_list().await?;
    app.say(HELP).await?;

    loop {
        let Some(line) = app.terminal().ask(PROMPT).await? else {
            break;
        };
        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                app.say(&format!("{err}; type `help` for commands.\n"))
                    .await?;
                continue;
            }
        };
        debug!(command = command.name(), "shell command");

        match command {
            ShellCommand::List => app.show_list().await?,
            ShellCommand::Create => {
                app.create(None, None).await?;
            }
            ShellCommand::Update(id) => {
                app.update(id).await?;
            }
            ShellCommand::Delete(id) => {
                app.delete(id).await?;
            }
            ShellCommand::Help => app.say(HELP).await?,
            ShellCommand::Quit => break,
        }

        let changed = drain_posts_changes(&mut events);
        if changed && command != ShellCommand::List {
            app.show_list().await?;
        }
    }

    info!("shell closed");
    Ok(true)
}

/// Consumes pending cache events; true if any touched the posts entry.
fn drain_posts_changes(events: &mut Receiver<CacheEvent>) -> bool {
    let mut changed = false;
    loop {
        match events.try_recv() {
            Ok(event) => changed |= event.key == POSTS_QUERY_KEY,
            Err(TryRecvError::Lagged(_)) => changed = true,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    changed
}
