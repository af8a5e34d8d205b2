use std::{collections::VecDeque, time::Duration};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::protocol::DeletedPost;

use super::*;
use crate::{error::ClientError, interaction::NoticeLevel};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    List,
    Create(CreatePostRequest),
    Update(PostId, UpdatePostRequest),
    Delete(PostId),
}

#[derive(Clone, Default)]
struct FakePostService {
    posts: Vec<Post>,
    next_id: i64,
    fail_with: Option<String>,
    delays: Arc<Mutex<VecDeque<Duration>>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakePostService {
    fn with_posts(posts: Vec<Post>) -> Self {
        let next_id = posts.iter().map(|post| post.id.0).max().unwrap_or(0) + 1;
        Self {
            posts,
            next_id,
            ..Self::default()
        }
    }

    fn failing(err: impl Into<String>) -> Self {
        Self {
            fail_with: Some(err.into()),
            ..Self::default()
        }
    }

    async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: Call) -> Result<(), ClientError> {
        self.calls.lock().await.push(call);
        let delay = self.delays.lock().await.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match &self.fail_with {
            Some(message) => Err(ClientError::Status {
                status: 503,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PostService for FakePostService {
    async fn list_posts(&self) -> Result<Vec<Post>, ClientError> {
        self.record(Call::List).await?;
        Ok(self.posts.clone())
    }

    async fn create_post(&self, request: CreatePostRequest) -> Result<Post, ClientError> {
        self.record(Call::Create(request.clone())).await?;
        Ok(Post::new(
            PostId(self.next_id),
            request.title,
            request.body,
            request.user_id,
        ))
    }

    async fn update_post(
        &self,
        id: PostId,
        request: UpdatePostRequest,
    ) -> Result<Post, ClientError> {
        self.record(Call::Update(id, request.clone())).await?;
        Ok(Post::new(id, request.title, request.body, UserId(5)))
    }

    async fn delete_post(&self, id: PostId) -> Result<DeletedPost, ClientError> {
        self.record(Call::Delete(id)).await?;
        Ok(DeletedPost {
            id: Some(id),
            is_deleted: true,
            deleted_on: None,
        })
    }
}

#[derive(Clone, Default)]
struct ScriptedInteraction {
    confirms: Arc<Mutex<VecDeque<bool>>>,
    prompts: Arc<Mutex<VecDeque<Option<Vec<String>>>>>,
    prompt_requests: Arc<Mutex<Vec<PromptRequest>>>,
    confirm_requests: Arc<Mutex<Vec<ConfirmRequest>>>,
    notices: Arc<Mutex<Vec<Notice>>>,
    broken: bool,
}

impl ScriptedInteraction {
    async fn answer_confirm(&self, answer: bool) {
        self.confirms.lock().await.push_back(answer);
    }

    async fn answer_prompt(&self, answer: Option<Vec<&str>>) {
        self.prompts
            .lock()
            .await
            .push_back(answer.map(|values| values.into_iter().map(String::from).collect()));
    }

    async fn notices(&self) -> Vec<Notice> {
        self.notices.lock().await.clone()
    }
}

#[async_trait]
impl Interaction for ScriptedInteraction {
    async fn confirm(&self, request: ConfirmRequest) -> Result<bool> {
        self.confirm_requests.lock().await.push(request);
        if self.broken {
            return Err(anyhow!("terminal closed"));
        }
        Ok(self.confirms.lock().await.pop_front().unwrap_or(false))
    }

    async fn prompt_fields(&self, request: PromptRequest) -> Result<Option<Vec<String>>> {
        self.prompt_requests.lock().await.push(request);
        if self.broken {
            return Err(anyhow!("terminal closed"));
        }
        Ok(self.prompts.lock().await.pop_front().flatten())
    }

    async fn notify(&self, notice: Notice) {
        self.notices.lock().await.push(notice);
    }
}

fn post(id: i64, title: &str, body: &str) -> Post {
    Post::new(PostId(id), title, body, UserId(7))
}

fn ids(posts: &[Post]) -> Vec<i64> {
    posts.iter().map(|post| post.id.0).collect()
}

type TestController = PostListController<FakePostService, ScriptedInteraction>;

async fn ready_controller(
    posts: Vec<Post>,
) -> (TestController, FakePostService, ScriptedInteraction) {
    let service = FakePostService::with_posts(posts);
    let interaction = ScriptedInteraction::default();
    let controller = PostListController::new(
        service.clone(),
        interaction.clone(),
        QueryCache::new(),
    );
    assert_eq!(controller.load().await, ViewState::Ready);
    (controller, service, interaction)
}

#[tokio::test]
async fn load_populates_cache_once() {
    let (controller, service, _) = ready_controller(vec![post(1, "A", "a")]).await;

    assert_eq!(controller.load().await, ViewState::Ready);

    assert_eq!(service.calls().await, vec![Call::List]);
    let posts = controller.posts().await.expect("posts cached");
    assert_eq!(*posts, vec![post(1, "A", "a")]);
}

#[tokio::test]
async fn load_failure_sets_error_state_without_collection() {
    let controller = PostListController::new(
        FakePostService::failing("upstream unavailable"),
        ScriptedInteraction::default(),
        QueryCache::new(),
    );

    let state = controller.load().await;

    match state {
        ViewState::Error { message } => assert!(message.contains("upstream unavailable")),
        other => panic!("unexpected state: {other:?}"),
    }
    assert!(controller.posts().await.is_none());
    assert!(!controller.cache().contains(&POSTS_QUERY_KEY).await);
    // No retry on a second activation.
    assert_eq!(controller.load().await.label(), "error");
}

#[tokio::test]
async fn load_drops_duplicate_ids_from_server() {
    let (controller, _, _) =
        ready_controller(vec![post(1, "A", "a"), post(1, "A2", "a2"), post(2, "B", "b")]).await;

    let posts = controller.posts().await.expect("posts");
    assert_eq!(ids(&posts), vec![1, 2]);
    assert_eq!(posts[0].title, "A");
}

#[tokio::test]
async fn mutations_require_a_ready_view() {
    let controller = PostListController::new(
        FakePostService::default(),
        ScriptedInteraction::default(),
        QueryCache::new(),
    );

    assert_eq!(
        controller.open_create_form().await,
        Err(ControllerError::NotReady { state: "idle" })
    );
    assert_eq!(
        controller.delete(PostId(1)).await,
        Err(ControllerError::NotReady { state: "idle" })
    );
    assert_eq!(
        controller.update(PostId(1), "t", "b").await,
        Err(ControllerError::NotReady { state: "idle" })
    );
}

#[tokio::test]
async fn create_prepends_post_and_resets_form() {
    let (controller, service, interaction) = ready_controller(vec![post(1, "A", "a")]).await;

    controller.open_create_form().await.expect("open");
    controller
        .set_draft_field(DraftField::Title, "B")
        .await
        .expect("title");
    controller
        .set_draft_field(DraftField::Body, "b")
        .await
        .expect("body");
    let outcome = controller.submit_create().await.expect("submit");

    assert_eq!(
        outcome,
        MutationOutcome::Created(Post::new(PostId(2), "B", "b", UserId(1)))
    );
    let posts = controller.posts().await.expect("posts");
    assert_eq!(ids(&posts), vec![2, 1]);
    assert_eq!(posts[0].title, "B");
    assert_eq!(posts[0].body, "b");
    assert_eq!(controller.create_form().await, CreateForm::default());
    assert_eq!(
        service.calls().await[1],
        Call::Create(CreatePostRequest {
            title: "B".into(),
            body: "b".into(),
            user_id: UserId(1),
        })
    );
    let notices = interaction.notices().await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);
}

#[tokio::test]
async fn create_uses_configured_owner() {
    let service = FakePostService::with_posts(Vec::new());
    let controller = PostListController::new(
        service.clone(),
        ScriptedInteraction::default(),
        QueryCache::new(),
    )
    .with_owner(UserId(42));
    controller.load().await;

    controller.open_create_form().await.expect("open");
    controller
        .set_draft(DraftPost::new("T", "B"))
        .await
        .expect("draft");
    controller.submit_create().await.expect("submit");

    match &service.calls().await[1] {
        Call::Create(request) => assert_eq!(request.user_id, UserId(42)),
        other => panic!("unexpected call: {other:?}"),
    }
}

#[tokio::test]
async fn create_rejects_incomplete_draft_without_request() {
    let (controller, service, interaction) = ready_controller(vec![post(1, "A", "a")]).await;

    assert_eq!(
        controller.submit_create().await,
        Err(ControllerError::FormClosed)
    );
    controller.open_create_form().await.expect("open");
    controller
        .set_draft_field(DraftField::Title, "only a title")
        .await
        .expect("title");

    assert_eq!(
        controller.submit_create().await,
        Err(ControllerError::MissingField(DraftField::Body))
    );
    assert_eq!(service.calls().await, vec![Call::List]);
    assert!(interaction.notices().await.is_empty());
    assert!(controller.create_form().await.open);
}

#[tokio::test]
async fn create_failure_keeps_form_and_collection() {
    let service = FakePostService::with_posts(vec![post(1, "A", "a")]);
    let interaction = ScriptedInteraction::default();
    let controller = PostListController::new(
        service.clone(),
        interaction.clone(),
        QueryCache::new(),
    );
    controller.load().await;
    let controller = PostListController {
        service: FakePostService {
            fail_with: Some("boom".into()),
            ..service.clone()
        },
        ..controller
    };

    controller.open_create_form().await.expect("open");
    controller
        .set_draft(DraftPost::new("B", "b"))
        .await
        .expect("draft");
    let outcome = controller.submit_create().await.expect("submit");

    assert!(matches!(outcome, MutationOutcome::Failed { ref message } if message.contains("boom")));
    let form = controller.create_form().await;
    assert!(form.open);
    assert_eq!(form.draft, DraftPost::new("B", "b"));
    assert_eq!(ids(&controller.posts().await.expect("posts")), vec![1]);
    let notices = interaction.notices().await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Failure);
}

#[tokio::test]
async fn create_with_known_id_keeps_ids_unique() {
    let (controller, _, _) = ready_controller(vec![post(1, "A", "a"), post(2, "B", "b")]).await;
    let controller = PostListController {
        service: FakePostService {
            next_id: 2,
            ..FakePostService::default()
        },
        ..controller
    };

    controller.open_create_form().await.expect("open");
    controller
        .set_draft(DraftPost::new("C", "c"))
        .await
        .expect("draft");
    controller.submit_create().await.expect("submit");

    let posts = controller.posts().await.expect("posts");
    assert_eq!(ids(&posts), vec![2, 1]);
    assert_eq!(posts[0].title, "C");
}

#[tokio::test]
async fn dismissing_form_resets_draft() {
    let (controller, _, _) = ready_controller(Vec::new()).await;
    controller.open_create_form().await.expect("open");
    controller
        .set_draft(DraftPost::new("half", "written"))
        .await
        .expect("draft");

    controller.dismiss_create_form().await;

    assert_eq!(controller.create_form().await, CreateForm::default());
    assert_eq!(
        controller.set_draft_field(DraftField::Title, "x").await,
        Err(ControllerError::FormClosed)
    );
}

#[tokio::test]
async fn update_replaces_entry_in_place() {
    let (controller, service, interaction) =
        ready_controller(vec![post(1, "A", "a"), post(2, "B", "b"), post(3, "C", "c")]).await;
    interaction.answer_prompt(Some(vec!["B2", "b2"])).await;

    let outcome = controller
        .update(PostId(2), "B", "b")
        .await
        .expect("update");

    assert!(outcome.is_applied());
    let posts = controller.posts().await.expect("posts");
    assert_eq!(ids(&posts), vec![1, 2, 3]);
    assert_eq!((posts[1].title.as_str(), posts[1].body.as_str()), ("B2", "b2"));
    assert_eq!(posts[0], post(1, "A", "a"));
    assert_eq!(posts[2], post(3, "C", "c"));
    assert_eq!(
        service.calls().await[1],
        Call::Update(
            PostId(2),
            UpdatePostRequest {
                title: "B2".into(),
                body: "b2".into(),
            }
        )
    );

    let prompts = interaction.prompt_requests.lock().await.clone();
    assert_eq!(prompts[0].fields[0].initial, "B");
    assert_eq!(prompts[0].fields[1].initial, "b");
}

#[tokio::test]
async fn cancelled_update_sends_nothing() {
    let (controller, service, interaction) = ready_controller(vec![post(1, "A", "a")]).await;
    interaction.answer_prompt(None).await;

    let outcome = controller.update(PostId(1), "A", "a").await.expect("update");

    assert_eq!(outcome, MutationOutcome::Cancelled);
    assert_eq!(service.calls().await, vec![Call::List]);
    assert_eq!(*controller.posts().await.expect("posts"), vec![post(1, "A", "a")]);
    assert!(interaction.notices().await.is_empty());
}

#[tokio::test]
async fn broken_prompt_counts_as_cancel() {
    let service = FakePostService::with_posts(vec![post(1, "A", "a")]);
    let controller = PostListController::new(
        service.clone(),
        ScriptedInteraction {
            broken: true,
            ..ScriptedInteraction::default()
        },
        QueryCache::new(),
    );
    controller.load().await;

    assert_eq!(
        controller.update(PostId(1), "A", "a").await,
        Ok(MutationOutcome::Cancelled)
    );
    assert_eq!(
        controller.delete(PostId(1)).await,
        Ok(MutationOutcome::Cancelled)
    );
    assert_eq!(service.calls().await, vec![Call::List]);
}

#[tokio::test]
async fn update_failure_leaves_collection() {
    let (controller, _, interaction) = ready_controller(vec![post(1, "A", "a")]).await;
    let controller = PostListController {
        service: FakePostService::failing("Post with id '1' not found"),
        ..controller
    };
    interaction.answer_prompt(Some(vec!["X", "x"])).await;

    let outcome = controller.update(PostId(1), "A", "a").await.expect("update");

    assert!(matches!(outcome, MutationOutcome::Failed { .. }));
    assert_eq!(*controller.posts().await.expect("posts"), vec![post(1, "A", "a")]);
    assert_eq!(interaction.notices().await[0].level, NoticeLevel::Failure);
}

#[tokio::test]
async fn update_of_vanished_post_is_a_no_op() {
    let (controller, _, interaction) = ready_controller(vec![post(1, "A", "a")]).await;
    interaction.answer_prompt(Some(vec!["X", "x"])).await;

    let outcome = controller.update(PostId(9), "old", "old").await.expect("update");

    assert!(outcome.is_applied());
    assert_eq!(*controller.posts().await.expect("posts"), vec![post(1, "A", "a")]);
}

#[tokio::test]
async fn delete_removes_only_that_entry() {
    let (controller, service, interaction) =
        ready_controller(vec![post(1, "A", "a"), post(2, "B", "b")]).await;
    interaction.answer_confirm(true).await;

    let outcome = controller.delete(PostId(1)).await.expect("delete");

    assert_eq!(outcome, MutationOutcome::Deleted(PostId(1)));
    assert_eq!(*controller.posts().await.expect("posts"), vec![post(2, "B", "b")]);
    assert_eq!(service.calls().await[1], Call::Delete(PostId(1)));
    assert_eq!(interaction.confirm_requests.lock().await.len(), 1);
    assert_eq!(interaction.notices().await[0].level, NoticeLevel::Success);
}

#[tokio::test]
async fn declined_delete_sends_nothing() {
    let (controller, service, interaction) = ready_controller(vec![post(1, "A", "a")]).await;
    interaction.answer_confirm(false).await;

    let outcome = controller.delete(PostId(1)).await.expect("delete");

    assert_eq!(outcome, MutationOutcome::Cancelled);
    assert_eq!(service.calls().await, vec![Call::List]);
    assert_eq!(ids(&controller.posts().await.expect("posts")), vec![1]);
}

#[tokio::test]
async fn delete_failure_leaves_collection() {
    let (controller, _, interaction) = ready_controller(vec![post(1, "A", "a")]).await;
    let controller = PostListController {
        service: FakePostService::failing("boom"),
        ..controller
    };
    interaction.answer_confirm(true).await;

    let outcome = controller.delete(PostId(1)).await.expect("delete");

    assert!(matches!(outcome, MutationOutcome::Failed { .. }));
    assert_eq!(ids(&controller.posts().await.expect("posts")), vec![1]);
    assert_eq!(interaction.notices().await[0].level, NoticeLevel::Failure);
}

#[tokio::test]
async fn delete_of_vanished_post_is_a_no_op() {
    let (controller, _, interaction) = ready_controller(vec![post(1, "A", "a")]).await;
    interaction.answer_confirm(true).await;

    let outcome = controller.delete(PostId(5)).await.expect("delete");

    assert_eq!(outcome, MutationOutcome::Deleted(PostId(5)));
    assert_eq!(ids(&controller.posts().await.expect("posts")), vec![1]);
}

#[tokio::test]
async fn out_of_order_responses_apply_by_id() {
    let (controller, service, interaction) =
        ready_controller(vec![post(1, "A", "a"), post(2, "B", "b"), post(3, "C", "c")]).await;
    {
        // The update is sent first but answers last.
        let mut delays = service.delays.lock().await;
        delays.push_back(Duration::from_millis(60));
        delays.push_back(Duration::from_millis(5));
    }
    interaction.answer_prompt(Some(vec!["A2", "a2"])).await;
    interaction.answer_confirm(true).await;

    let (updated, deleted) = tokio::join!(
        controller.update(PostId(1), "A", "a"),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            controller.delete(PostId(3)).await
        }
    );

    assert!(updated.expect("update").is_applied());
    assert!(deleted.expect("delete").is_applied());
    let posts = controller.posts().await.expect("posts");
    assert_eq!(ids(&posts), vec![1, 2]);
    assert_eq!(posts[0].title, "A2");
}

#[tokio::test]
async fn double_submit_issues_two_requests() {
    let (controller, service, _) = ready_controller(Vec::new()).await;
    controller.open_create_form().await.expect("open");
    controller
        .set_draft(DraftPost::new("B", "b"))
        .await
        .expect("draft");
    {
        let mut delays = service.delays.lock().await;
        delays.push_back(Duration::from_millis(20));
        delays.push_back(Duration::from_millis(20));
    }

    let (first, second) = tokio::join!(controller.submit_create(), controller.submit_create());

    assert!(first.expect("first").is_applied());
    assert!(second.expect("second").is_applied());
    let creates = service
        .calls()
        .await
        .into_iter()
        .filter(|call| matches!(call, Call::Create(_)))
        .count();
    assert_eq!(creates, 2);
}
