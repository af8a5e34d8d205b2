//! Post list synchronization: a remote post service, a keyed query cache and
//! the controller that keeps the two consistent.

pub mod controller;
pub mod error;
pub mod interaction;
pub mod transport;
pub mod types;

pub use controller::{PostListController, POSTS_QUERY_KEY};
pub use error::{ClientError, ControllerError};
pub use interaction::{
    ConfirmRequest, Interaction, Notice, NoticeLevel, PromptField, PromptRequest,
};
pub use transport::{HttpPostService, PostService, ServiceOptions};
pub use types::{CreateForm, DraftField, DraftPost, EditDraft, MutationOutcome, ViewState};
