use std::fmt;

use shared::domain::{Post, PostId};

use crate::error::ControllerError;

/// Top-level state of a post list view. `Error` is terminal for the initial load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Ready,
    Error {
        message: String,
    },
}

impl ViewState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Title,
    Body,
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => f.write_str("title"),
            Self::Body => f.write_str("body"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DraftPost {
    pub title: String,
    pub body: String,
}

impl DraftPost {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        match field {
            DraftField::Title => self.title = value.into(),
            DraftField::Body => self.body = value.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.body.is_empty()
    }

    /// Both fields are required before a create request may be sent.
    pub fn validate(&self) -> Result<(), ControllerError> {
        if self.title.trim().is_empty() {
            return Err(ControllerError::MissingField(DraftField::Title));
        }
        if self.body.trim().is_empty() {
            return Err(ControllerError::MissingField(DraftField::Body));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateForm {
    pub open: bool,
    pub draft: DraftPost,
}

/// Replacement values collected by the update prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Created(Post),
    Updated(Post),
    Deleted(PostId),
    Cancelled,
    Failed { message: String },
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(
            self,
            Self::Created(_) | Self::Updated(_) | Self::Deleted(_)
        )
    }
}
