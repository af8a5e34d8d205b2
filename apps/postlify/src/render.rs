//! Plain-text rendering of the post list view and notifications.

use std::fmt::Write as _;

use client_core::{Notice, NoticeLevel, ViewState};
use shared::domain::Post;

pub fn render_view(state: &ViewState, posts: Option<&[Post]>) -> String {
    match state {
        ViewState::Idle | ViewState::Loading => "Loading...\n".to_string(),
        ViewState::Error { message } => format!("Error: {message}\n"),
        ViewState::Ready => render_posts(posts.unwrap_or_default()),
    }
}

pub fn render_posts(posts: &[Post]) -> String {
    if posts.is_empty() {
        return "No posts.\n".to_string();
    }
    let mut out = String::new();
    for post in posts {
        out.push_str(&render_post(post));
        out.push('\n');
    }
    let _ = writeln!(out, "{} post(s)", posts.len());
    out
}

pub fn render_post(post: &Post) -> String {
    let mut out = format!("#{} {}\n", post.id, post.title);
    for line in post.body.lines() {
        let _ = writeln!(out, "    {line}");
    }
    let mut meta = vec![format!("user {}", post.user_id)];
    if !post.tags.is_empty() {
        meta.push(format!("tags: {}", post.tags.join(", ")));
    }
    if let Some(reactions) = post.reactions {
        meta.push(format!("+{} / -{}", reactions.likes, reactions.dislikes));
    }
    if let Some(views) = post.views {
        meta.push(format!("{views} views"));
    }
    let _ = writeln!(out, "    -- {}", meta.join(" | "));
    out
}

pub fn render_notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Success => "ok",
        NoticeLevel::Failure => "failed",
    };
    format!("[{tag}] {}: {}\n", notice.title, notice.message)
}
