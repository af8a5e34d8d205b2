use thiserror::Error;

use crate::types::DraftField;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Preconditions checked before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("post list is not ready (currently {state})")]
    NotReady { state: &'static str },
    #[error("the create form is not open")]
    FormClosed,
    #[error("{0} is required")]
    MissingField(DraftField),
}
