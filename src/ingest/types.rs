// src/ingest/types.rs
use anyhow::Result;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Post {
    pub title: String,
    pub created_at: u64, // unix seconds
    pub score: i64,
    pub url: String,
}

#[async_trait::async_trait]
pub trait PostProvider: Send + Sync {
    /// Newest-first batch of at most `limit` posts.
    async fn fetch_latest(&self, limit: u32) -> Result<Vec<Post>>;
    fn name(&self) -> &'static str;
}
