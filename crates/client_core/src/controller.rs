//! Keeps the cached post collection in step with the remote post service.
//!
//! The controller never mutates the cache before the server answers, and it
//! never keeps a copy of the list itself: it owns only the view state and the
//! create-form draft. Every cache write matches entries by id, so responses
//! that arrive out of order cannot corrupt the collection.

use std::{collections::HashSet, sync::Arc};

use shared::{
    domain::{Post, PostId, UserId, DEFAULT_USER_ID},
    protocol::{CreatePostRequest, UpdatePostRequest},
};
use storage::{QueryCache, QueryKey};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    error::ControllerError,
    interaction::{ConfirmRequest, Interaction, Notice, PromptField, PromptRequest},
    transport::PostService,
    types::{CreateForm, DraftField, DraftPost, EditDraft, MutationOutcome, ViewState},
};

pub const POSTS_QUERY_KEY: QueryKey = QueryKey::from_static("posts");

#[derive(Default)]
struct ControllerState {
    view: ViewState,
    create_form: CreateForm,
}

pub struct PostListController<S, I> {
    service: S,
    interaction: I,
    cache: Arc<QueryCache<Vec<Post>>>,
    owner: UserId,
    state: Mutex<ControllerState>,
}

impl<S: PostService, I: Interaction> PostListController<S, I> {
    pub fn new(service: S, interaction: I, cache: Arc<QueryCache<Vec<Post>>>) -> Self {
        Self {
            service,
            interaction,
            cache,
            owner: DEFAULT_USER_ID,
            state: Mutex::new(ControllerState::default()),
        }
    }

    pub fn with_owner(mut self, owner: UserId) -> Self {
        self.owner = owner;
        self
    }

    pub fn cache(&self) -> &Arc<QueryCache<Vec<Post>>> {
        &self.cache
    }

    pub async fn view_state(&self) -> ViewState {
        self.state.lock().await.view.clone()
    }

    pub async fn posts(&self) -> Option<Arc<Vec<Post>>> {
        self.cache.get_query_data(&POSTS_QUERY_KEY).await
    }

    pub async fn find_post(&self, id: PostId) -> Option<Post> {
        let posts = self.posts().await?;
        posts.iter().find(|post| post.id == id).cloned()
    }

    /// Activates the view. Only the first call issues a list request; later
    /// calls report the current state.
    pub async fn load(&self) -> ViewState {
        {
            let mut state = self.state.lock().await;
            if state.view != ViewState::Idle {
                return state.view.clone();
            }
            state.view = ViewState::Loading;
        }

        info!("loading posts");
        let next = match self.service.list_posts().await {
            Ok(posts) => {
                let posts = dedupe_by_id(posts);
                info!(count = posts.len(), "posts loaded");
                self.cache.set_query_data(&POSTS_QUERY_KEY, posts).await;
                ViewState::Ready
            }
            Err(err) => {
                warn!(error = %err, "failed to load posts");
                ViewState::Error {
                    message: err.to_string(),
                }
            }
        };

        let mut state = self.state.lock().await;
        state.view = next.clone();
        next
    }

    pub async fn create_form(&self) -> CreateForm {
        self.state.lock().await.create_form.clone()
    }

    pub async fn open_create_form(&self) -> Result<(), ControllerError> {
        let mut state = self.state.lock().await;
        ensure_ready(&state.view)?;
        state.create_form.open = true;
        Ok(())
    }

    /// Closes the form and throws the draft away.
    pub async fn dismiss_create_form(&self) {
        let mut state = self.state.lock().await;
        state.create_form = CreateForm::default();
    }

    pub async fn set_draft_field(
        &self,
        field: DraftField,
        value: impl Into<String>,
    ) -> Result<(), ControllerError> {
        let mut state = self.state.lock().await;
        if !state.create_form.open {
            return Err(ControllerError::FormClosed);
        }
        state.create_form.draft.set(field, value);
        Ok(())
    }

    pub async fn set_draft(&self, draft: DraftPost) -> Result<(), ControllerError> {
        let mut state = self.state.lock().await;
        if !state.create_form.open {
            return Err(ControllerError::FormClosed);
        }
        state.create_form.draft = draft;
        Ok(())
    }

    /// Sends the open form's draft. On failure the form and draft stay as
    /// they were so the user can retry.
    pub async fn submit_create(&self) -> Result<MutationOutcome, ControllerError> {
        let draft = {
            let state = self.state.lock().await;
            ensure_ready(&state.view)?;
            if !state.create_form.open {
                return Err(ControllerError::FormClosed);
            }
            state.create_form.draft.validate()?;
            state.create_form.draft.clone()
        };

        let request = CreatePostRequest {
            title: draft.title,
            body: draft.body,
            user_id: self.owner,
        };
        match self.service.create_post(request).await {
            Ok(post) => {
                info!(post_id = post.id.0, "post created");
                let created = post.clone();
                let written = self
                    .cache
                    .update_query_data(&POSTS_QUERY_KEY, move |current| {
                        prepend_post(current, created)
                    })
                    .await;
                if written.is_none() {
                    warn!(post_id = post.id.0, "posts cache entry missing; created post not cached");
                }
                {
                    let mut state = self.state.lock().await;
                    state.create_form = CreateForm::default();
                }
                self.interaction
                    .notify(Notice::success(
                        "Post created",
                        format!("\"{}\" was added.", post.title),
                    ))
                    .await;
                Ok(MutationOutcome::Created(post))
            }
            Err(err) => {
                warn!(error = %err, "failed to create post");
                let message = err.to_string();
                self.interaction
                    .notify(Notice::failure("Could not create post", message.clone()))
                    .await;
                Ok(MutationOutcome::Failed { message })
            }
        }
    }

    /// Prompts for a replacement title and body, then updates the post.
    pub async fn update(
        &self,
        id: PostId,
        current_title: &str,
        current_body: &str,
    ) -> Result<MutationOutcome, ControllerError> {
        ensure_ready(&self.state.lock().await.view)?;

        let Some(edit) = self.prompt_edit(id, current_title, current_body).await else {
            debug!(post_id = id.0, "update cancelled");
            return Ok(MutationOutcome::Cancelled);
        };

        let request = UpdatePostRequest {
            title: edit.title,
            body: edit.body,
        };
        match self.service.update_post(id, request).await {
            Ok(updated) => {
                info!(post_id = updated.id.0, "post updated");
                let replacement = updated.clone();
                self.cache
                    .update_query_data(&POSTS_QUERY_KEY, move |current| {
                        replace_post(current, replacement)
                    })
                    .await;
                self.interaction
                    .notify(Notice::success(
                        "Post updated",
                        format!("Post #{} was saved.", updated.id),
                    ))
                    .await;
                Ok(MutationOutcome::Updated(updated))
            }
            Err(err) => {
                warn!(post_id = id.0, error = %err, "failed to update post");
                let message = err.to_string();
                self.interaction
                    .notify(Notice::failure("Could not update post", message.clone()))
                    .await;
                Ok(MutationOutcome::Failed { message })
            }
        }
    }

    /// Confirms, then deletes the post. The cache entry is removed by the id
    /// that was sent, whatever the response body says.
    pub async fn delete(&self, id: PostId) -> Result<MutationOutcome, ControllerError> {
        ensure_ready(&self.state.lock().await.view)?;

        let confirmed = self
            .interaction
            .confirm(ConfirmRequest {
                title: "Delete post?".into(),
                message: format!("Post #{id} will be removed. This cannot be undone."),
                confirm_label: "Delete".into(),
            })
            .await
            .unwrap_or_else(|err| {
                warn!(post_id = id.0, error = %err, "delete confirmation failed");
                false
            });
        if !confirmed {
            debug!(post_id = id.0, "delete declined");
            return Ok(MutationOutcome::Cancelled);
        }

        match self.service.delete_post(id).await {
            Ok(ack) => {
                info!(post_id = id.0, acknowledged = ack.is_deleted, "post deleted");
                self.cache
                    .update_query_data(&POSTS_QUERY_KEY, move |current| {
                        current.iter().filter(|post| post.id != id).cloned().collect()
                    })
                    .await;
                self.interaction
                    .notify(Notice::success(
                        "Post deleted",
                        format!("Post #{id} was removed."),
                    ))
                    .await;
                Ok(MutationOutcome::Deleted(id))
            }
            Err(err) => {
                warn!(post_id = id.0, error = %err, "failed to delete post");
                let message = err.to_string();
                self.interaction
                    .notify(Notice::failure("Could not delete post", message.clone()))
                    .await;
                Ok(MutationOutcome::Failed { message })
            }
        }
    }

    async fn prompt_edit(&self, id: PostId, title: &str, body: &str) -> Option<EditDraft> {
        let request = PromptRequest {
            title: format!("Edit post #{id}"),
            fields: vec![
                PromptField {
                    name: "title",
                    label: "Enter the new title".into(),
                    initial: title.to_string(),
                },
                PromptField {
                    name: "body",
                    label: "Enter the new body".into(),
                    initial: body.to_string(),
                },
            ],
        };
        let values = match self.interaction.prompt_fields(request).await {
            Ok(values) => values?,
            Err(err) => {
                warn!(post_id = id.0, error = %err, "edit prompt failed");
                return None;
            }
        };
        let mut values = values.into_iter();
        match (values.next(), values.next()) {
            (Some(title), Some(body)) => Some(EditDraft { title, body }),
            _ => {
                warn!(post_id = id.0, "edit prompt returned too few values");
                None
            }
        }
    }
}

fn ensure_ready(view: &ViewState) -> Result<(), ControllerError> {
    if view.is_ready() {
        Ok(())
    } else {
        Err(ControllerError::NotReady {
            state: view.label(),
        })
    }
}

fn dedupe_by_id(posts: Vec<Post>) -> Vec<Post> {
    let mut seen = HashSet::with_capacity(posts.len());
    posts.into_iter().filter(|post| seen.insert(post.id)).collect()
}

fn prepend_post(current: &[Post], created: Post) -> Vec<Post> {
    let mut next = Vec::with_capacity(current.len() + 1);
    let id = created.id;
    next.push(created);
    next.extend(current.iter().filter(|post| post.id != id).cloned());
    next
}

fn replace_post(current: &[Post], updated: Post) -> Vec<Post> {
    current
        .iter()
        .map(|post| {
            if post.id == updated.id {
                updated.clone()
            } else {
                post.clone()
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
