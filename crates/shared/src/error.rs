use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body the post service sends with non-2xx responses.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
}

impl ApiError {
    /// Extracts the service's `message` from a raw error body, if it is one.
    pub fn from_body(body: &str) -> Option<Self> {
        serde_json::from_str::<Self>(body)
            .ok()
            .filter(|err| !err.message.trim().is_empty())
    }
}
