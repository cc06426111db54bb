//! Post retrieval with graceful degradation: a fetch failure downgrades to
//! locally generated fallback posts so the desktop workflow stays runnable
//! offline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::errors::{PostpadError, PostpadResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "userId")]
    pub user_id: u32,
    pub id: u32,
    pub title: String,
    pub body: String,
}

impl Post {
    /// File content as typed into the editor.
    pub fn content(&self) -> String {
        format!("Title: {}\n\nBody: {}", self.title, self.body)
    }

    pub fn filename(&self) -> String {
        format!("post_{}.txt", self.id)
    }
}

/// Fetch the first `post_limit` posts from the configured endpoint.
pub async fn fetch_posts(cfg: &ApiConfig) -> PostpadResult<Vec<Post>> {
    tracing::info!(url = %cfg.url, "fetching posts");
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .build()?;

    let response = client.get(&cfg.url).send().await?.error_for_status()?;
    let mut posts: Vec<Post> = response.json().await?;

    if posts.is_empty() {
        return Err(PostpadError::Api("endpoint returned no posts".into()));
    }

    posts.truncate(cfg.post_limit);
    tracing::info!(count = posts.len(), "posts retrieved");
    Ok(posts)
}

/// Locally generated stand-ins used when the API is unavailable.
pub fn fallback_posts(count: u32) -> Vec<Post> {
    tracing::warn!(count, "API unavailable, generating fallback posts");
    (1..=count)
        .map(|i| Post {
            user_id: 1,
            id: i,
            title: format!("Fallback Post {i}"),
            body: format!(
                "This is a fallback post created because the API was unavailable.\n\
                 Post ID: {i}\n\
                 The bot continues to operate using this test data."
            ),
        })
        .collect()
}

/// Fetch posts, falling back to generated ones on any error.
pub async fn fetch_or_fallback(cfg: &ApiConfig) -> Vec<Post> {
    match fetch_posts(cfg).await {
        Ok(posts) => posts,
        Err(e) => {
            tracing::warn!(error = %e, "post fetch failed");
            fallback_posts(cfg.fallback_count)
        }
    }
}
