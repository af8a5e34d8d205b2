//! User-facing actions shared by the one-shot commands and the shell.
//!
//! Each action returns `Ok(true)` when it finished as the user intended
//! (including a deliberate cancel) and `Ok(false)` when it was rejected or
//! the service reported a failure. `Err` is reserved for terminal I/O.

use std::sync::Arc;

use anyhow::Result;
use client_core::{
    ControllerError, DraftPost, MutationOutcome, PostListController, PostService, PromptField,
    PromptRequest,
};
use shared::domain::PostId;
use tracing::debug;

use crate::{
    render::render_view,
    terminal::{Input, Output, Terminal, TerminalInteraction},
};

pub type TerminalController<S, R, W> = PostListController<S, TerminalInteraction<R, W>>;

pub struct App<S, R, W> {
    controller: TerminalController<S, R, W>,
    terminal: Arc<Terminal<R, W>>,
}

impl<S: PostService, R: Input, W: Output> App<S, R, W> {
    pub fn new(controller: TerminalController<S, R, W>, terminal: Arc<Terminal<R, W>>) -> Self {
        Self {
            controller,
            terminal,
        }
    }

    pub fn controller(&self) -> &TerminalController<S, R, W> {
        &self.controller
    }

    pub fn terminal(&self) -> &Terminal<R, W> {
        &self.terminal
    }

    pub async fn say(&self, text: &str) -> Result<()> {
        self.terminal.write(text).await
    }

    /// Runs the initial load. A failed load is shown and is not retried.
    pub async fn load(&self) -> Result<bool> {
        let state = self.controller.load().await;
        if state.is_ready() {
            return Ok(true);
        }
        self.say(&render_view(&state, None)).await?;
        Ok(false)
    }

    pub async fn show_list(&self) -> Result<()> {
        let state = self.controller.view_state().await;
        let posts = self.controller.posts().await;
        self.say(&render_view(&state, posts.as_deref().map(Vec::as_slice)))
            .await
    }

    /// Opens the create form and submits it. Values given up front skip the
    /// prompt; a draft kept from a failed attempt pre-fills it.
    pub async fn create(&self, title: Option<String>, body: Option<String>) -> Result<bool> {
        if let Err(err) = self.controller.open_create_form().await {
            return self.reject(err).await;
        }
        let kept = self.controller.create_form().await.draft;

        let draft = match (title, body) {
            (Some(title), Some(body)) => DraftPost::new(title, body),
            (title, body) => {
                let request = PromptRequest {
                    title: "Create post".into(),
                    fields: vec![
                        PromptField {
                            name: "title",
                            label: "Title".into(),
                            initial: title.unwrap_or(kept.title),
                        },
                        PromptField {
                            name: "body",
                            label: "Body".into(),
                            initial: body.unwrap_or(kept.body),
                        },
                    ],
                };
                match self.terminal.prompt_values(&request).await? {
                    Some(values) => {
                        let mut values = values.into_iter();
                        DraftPost::new(
                            values.next().unwrap_or_default(),
                            values.next().unwrap_or_default(),
                        )
                    }
                    None => {
                        self.controller.dismiss_create_form().await;
                        self.say("Create cancelled.\n").await?;
                        return Ok(true);
                    }
                }
            }
        };

        if let Err(err) = self.controller.set_draft(draft).await {
            return self.reject(err).await;
        }
        match self.controller.submit_create().await {
            Ok(outcome) => Ok(finished(&outcome)),
            Err(err @ ControllerError::MissingField(_)) => {
                self.say(&format!("{err}; the draft was kept.\n")).await?;
                Ok(false)
            }
            Err(err) => self.reject(err).await,
        }
    }

    pub async fn update(&self, id: PostId) -> Result<bool> {
        let Some(post) = self.controller.find_post(id).await else {
            if let Err(err) = ensure_listed(&self.controller).await {
                return self.reject(err).await;
            }
            self.say(&format!("No post #{id} in the list.\n")).await?;
            return Ok(false);
        };
        match self.controller.update(id, &post.title, &post.body).await {
            Ok(outcome) => {
                if outcome == MutationOutcome::Cancelled {
                    self.say("Update cancelled.\n").await?;
                }
                Ok(finished(&outcome))
            }
            Err(err) => self.reject(err).await,
        }
    }

    pub async fn delete(&self, id: PostId) -> Result<bool> {
        match self.controller.delete(id).await {
            Ok(outcome) => {
                if outcome == MutationOutcome::Cancelled {
                    self.say("Delete cancelled.\n").await?;
                }
                Ok(finished(&outcome))
            }
            Err(err) => self.reject(err).await,
        }
    }

    async fn reject(&self, err: ControllerError) -> Result<bool> {
        debug!(error = %err, "action rejected");
        self.say(&format!("{err}\n")).await?;
        Ok(false)
    }
}

async fn ensure_listed<S: PostService, R: Input, W: Output>(
    controller: &TerminalController<S, R, W>,
) -> Result<(), ControllerError> {
    let state = controller.view_state().await;
    if state.is_ready() {
        Ok(())
    } else {
        Err(ControllerError::NotReady {
            state: state.label(),
        })
    }
}

fn finished(outcome: &MutationOutcome) -> bool {
    !matches!(outcome, MutationOutcome::Failed { .. })
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
