use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Post, PostId, UserId};

/// Envelope returned by `GET /posts`; only `posts` is consumed by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPostsResponse {
    pub posts: Vec<Post>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    #[serde(rename = "userId")]
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    pub title: String,
    pub body: String,
}

/// Acknowledgement of `DELETE /posts/{id}`. Every field is optional; the
/// client only logs it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeletedPost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PostId>,
    #[serde(rename = "isDeleted", default)]
    pub is_deleted: bool,
    #[serde(
        rename = "deletedOn",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted_on: Option<DateTime<Utc>>,
}

impl DeletedPost {
    /// Placeholder for a successful delete whose body could not be read.
    pub fn unacknowledged(id: PostId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }
}
