//! Line-oriented terminal I/O and the prompt/confirm/notify capability built on it.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use client_core::{ConfirmRequest, Interaction, Notice, PromptRequest};
use tokio::{
    io::{
        AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin, Stdout,
    },
    sync::Mutex,
};
use tracing::{debug, warn};

use crate::render::render_notice;

/// Typed at any field prompt to dismiss it.
pub const CANCEL_INPUT: &str = ":q";
/// Typed at a field prompt to send it empty instead of keeping the shown value.
pub const CLEAR_INPUT: &str = ":clear";

pub trait Input: AsyncBufRead + Unpin + Send {}
impl<T: AsyncBufRead + Unpin + Send> Input for T {}

pub trait Output: AsyncWrite + Unpin + Send {}
impl<T: AsyncWrite + Unpin + Send> Output for T {}

pub struct Terminal<R, W> {
    lines: Mutex<Lines<R>>,
    out: Mutex<W>,
}

pub type StdTerminal = Terminal<BufReader<Stdin>, Stdout>;

impl StdTerminal {
    pub fn stdio() -> Self {
        Terminal::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R: Input, W: Output> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            lines: Mutex::new(input.lines()),
            out: Mutex::new(output),
        }
    }

    pub async fn write(&self, text: &str) -> Result<()> {
        let mut out = self.out.lock().await;
        out.write_all(text.as_bytes())
            .await
            .context("failed to write to terminal")?;
        out.flush().await.context("failed to flush terminal")?;
        Ok(())
    }

    /// Next input line without its line terminator, or `None` at end of input.
    pub async fn read_line(&self) -> Result<Option<String>> {
        let mut lines = self.lines.lock().await;
        let line = lines
            .next_line()
            .await
            .context("failed to read from terminal")?;
        Ok(line.map(|line| line.trim_end_matches('\r').to_string()))
    }

    pub async fn ask(&self, prompt: &str) -> Result<Option<String>> {
        self.write(prompt).await?;
        self.read_line().await
    }

    /// Asks for each field in turn. An empty answer keeps the shown value and
    /// `:clear` empties it; `:q` or end of input dismisses the whole prompt.
    pub async fn prompt_values(&self, request: &PromptRequest) -> Result<Option<Vec<String>>> {
        self.write(&format!(
            "{} (enter keeps the shown value, {CLEAR_INPUT} empties it, {CANCEL_INPUT} cancels)\n",
            request.title
        ))
        .await?;

        let mut values = Vec::with_capacity(request.fields.len());
        for field in &request.fields {
            let prompt = if field.initial.is_empty() {
                format!("{}: ", field.label)
            } else {
                format!("{} [{}]: ", field.label, field.initial)
            };
            let Some(answer) = self.ask(&prompt).await? else {
                return Ok(None);
            };
            match answer.trim() {
                CANCEL_INPUT => return Ok(None),
                CLEAR_INPUT => values.push(String::new()),
                _ if answer.is_empty() => values.push(field.initial.clone()),
                _ => values.push(answer),
            }
        }
        Ok(Some(values))
    }
}

#[cfg(test)]
impl<R, W: Default> Terminal<R, W> {
    pub async fn take_output(&self) -> W {
        std::mem::take(&mut *self.out.lock().await)
    }
}

pub struct TerminalInteraction<R, W> {
    terminal: Arc<Terminal<R, W>>,
    assume_yes: bool,
}

impl<R, W> TerminalInteraction<R, W> {
    pub fn new(terminal: Arc<Terminal<R, W>>) -> Self {
        Self {
            terminal,
            assume_yes: false,
        }
    }

    /// Answers every confirmation with yes without asking.
    pub fn assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }
}

#[async_trait]
impl<R: Input, W: Output> Interaction for TerminalInteraction<R, W> {
    async fn confirm(&self, request: ConfirmRequest) -> Result<bool> {
        if self.assume_yes {
            debug!(title = %request.title, "confirmation assumed");
            return Ok(true);
        }
        let prompt = format!(
            "{}\n{}\n{}? [y/N]: ",
            request.title, request.message, request.confirm_label
        );
        let answer = self
            .terminal
            .ask(&prompt)
            .await?
            .ok_or_else(|| anyhow!("input closed before confirmation"))?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }

    async fn prompt_fields(&self, request: PromptRequest) -> Result<Option<Vec<String>>> {
        self.terminal.prompt_values(&request).await
    }

    async fn notify(&self, notice: Notice) {
        if let Err(err) = self.terminal.write(&render_notice(&notice)).await {
            warn!(error = %err, "failed to show notification");
        }
    }
}
