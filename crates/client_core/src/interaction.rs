//! Capability the controller uses to ask the user things and report outcomes.

use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptField {
    pub name: &'static str,
    pub label: String,
    pub initial: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub title: String,
    pub fields: Vec<PromptField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn failure(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Failure,
            title: title.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait Interaction: Send + Sync {
    /// Asks for confirmation of a destructive action.
    async fn confirm(&self, request: ConfirmRequest) -> Result<bool>;

    /// Collects one value per requested field, in order. `None` means the
    /// user dismissed the prompt.
    async fn prompt_fields(&self, request: PromptRequest) -> Result<Option<Vec<String>>>;

    async fn notify(&self, notice: Notice);
}
