use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Post, PostId},
    error::ApiError,
    protocol::{CreatePostRequest, DeletedPost, ListPostsResponse, UpdatePostRequest},
};
use tracing::{debug, warn};
use url::Url;

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "https://dummyjson.com";

#[async_trait]
pub trait PostService: Send + Sync {
    async fn list_posts(&self) -> Result<Vec<Post>, ClientError>;
    async fn create_post(&self, request: CreatePostRequest) -> Result<Post, ClientError>;
    async fn update_post(
        &self,
        id: PostId,
        request: UpdatePostRequest,
    ) -> Result<Post, ClientError>;
    async fn delete_post(&self, id: PostId) -> Result<DeletedPost, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub base_url: String,
    /// Appended to the list request as `?limit=N` when set.
    pub list_limit: Option<u32>,
    pub timeout: Option<Duration>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            list_limit: None,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpPostService {
    http: Client,
    base: Url,
    list_limit: Option<u32>,
}

impl HttpPostService {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::from_options(ServiceOptions {
            base_url: base_url.to_string(),
            ..ServiceOptions::default()
        })
    }

    pub fn from_options(options: ServiceOptions) -> Result<Self, ClientError> {
        let mut base = Url::parse(options.base_url.trim())?;
        // Relative joins replace the last segment unless the base ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut builder = Client::builder().user_agent(Self::user_agent());
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base,
            list_limit: options.list_limit,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("postlify/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base.join(path).map_err(ClientError::Url)
    }

    fn post_url(&self, id: PostId) -> Result<Url, ClientError> {
        self.url(&format!("posts/{}", id.0))
    }

    /// Sends the request and returns the body of a 2xx response.
    async fn send(request: RequestBuilder) -> Result<Vec<u8>, ClientError> {
        let resp = request.send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            let message = ApiError::from_body(&text)
                .map(|err| err.message)
                .unwrap_or(text);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(bytes.to_vec())
    }

    async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let bytes = Self::send(request).await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PostService for HttpPostService {
    async fn list_posts(&self) -> Result<Vec<Post>, ClientError> {
        let mut url = self.url("posts")?;
        if let Some(limit) = self.list_limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }
        debug!(%url, "GET posts");
        let page: ListPostsResponse = Self::execute(self.http.get(url)).await?;
        Ok(page.posts)
    }

    async fn create_post(&self, request: CreatePostRequest) -> Result<Post, ClientError> {
        let url = self.url("posts/add")?;
        debug!(%url, "POST post");
        Self::execute(self.http.post(url).json(&request)).await
    }

    async fn update_post(
        &self,
        id: PostId,
        request: UpdatePostRequest,
    ) -> Result<Post, ClientError> {
        let url = self.post_url(id)?;
        debug!(%url, post_id = id.0, "PUT post");
        Self::execute(self.http.put(url).json(&request)).await
    }

    async fn delete_post(&self, id: PostId) -> Result<DeletedPost, ClientError> {
        let url = self.post_url(id)?;
        debug!(%url, post_id = id.0, "DELETE post");
        let bytes = Self::send(self.http.delete(url)).await?;
        // A 2xx status is the delete; the body is informational.
        match serde_json::from_slice::<DeletedPost>(&bytes) {
            Ok(ack) => Ok(ack),
            Err(err) => {
                warn!(post_id = id.0, error = %err, "unreadable delete acknowledgement");
                Ok(DeletedPost::unacknowledged(id))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
