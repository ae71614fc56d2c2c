use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;

use crate::ingest::types::{Post, PostProvider};

const REDDIT_BASE: &str = "https://www.reddit.com";
const PAGE_SIZE: u32 = 100; // listing API cap per request

pub const ENV_USER_AGENT: &str = "REDDIT_USER_AGENT";
const DEFAULT_USER_AGENT: &str = "migration-pattern-analyzer/0.1";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: ChildData,
}

#[derive(Debug, Deserialize)]
struct ChildData {
    title: Option<String>,
    created_utc: Option<f64>,
    score: Option<i64>,
    permalink: Option<String>,
}

fn posts_from_listing(listing: Listing) -> (Vec<Post>, Option<String>) {
    let after = listing.data.after;
    let mut out = Vec::with_capacity(listing.data.children.len());
    for child in listing.data.children {
        let d = child.data;
        let title = d.title.unwrap_or_default();
        if title.is_empty() {
            continue;
        }
        out.push(Post {
            title,
            created_at: d.created_utc.map(|t| t.max(0.0) as u64).unwrap_or(0),
            score: d.score.unwrap_or(0),
            url: format!(
                "https://reddit.com{}",
                d.permalink.as_deref().unwrap_or_default()
            ),
        });
    }
    counter!("ingest_events_total").increment(out.len() as u64);
    (out, after)
}

/// New-posts provider for one subreddit via the public listing JSON.
pub struct RedditJsonProvider {
    feed: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client },
}

impl RedditJsonProvider {
    pub fn new(feed: impl Into<String>) -> Result<Self> {
        let user_agent =
            std::env::var(ENV_USER_AGENT).unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .context("building reddit http client")?;
        Ok(Self {
            feed: feed.into(),
            mode: Mode::Http { client },
        })
    }

    /// Parse a single captured listing page instead of calling out.
    pub fn from_fixture_str(feed: impl Into<String>, s: &str) -> Self {
        Self {
            feed: feed.into(),
            mode: Mode::Fixture(s.to_string()),
        }
    }

    fn parse_listing_str(s: &str) -> Result<(Vec<Post>, Option<String>)> {
        let listing: Listing = serde_json::from_str(s).context("parsing reddit listing json")?;
        Ok(posts_from_listing(listing))
    }
}

#[async_trait]
impl PostProvider for RedditJsonProvider {
    async fn fetch_latest(&self, limit: u32) -> Result<Vec<Post>> {
        match &self.mode {
            Mode::Fixture(s) => {
                let (mut posts, _) = Self::parse_listing_str(s)?;
                posts.truncate(limit as usize);
                Ok(posts)
            }
            Mode::Http { client } => {
                let mut posts: Vec<Post> = Vec::new();
                let mut after: Option<String> = None;

                while (posts.len() as u32) < limit {
                    let want = PAGE_SIZE.min(limit - posts.len() as u32);
                    let mut url = format!(
                        "{REDDIT_BASE}/r/{}/new.json?limit={want}&raw_json=1",
                        self.feed
                    );
                    if let Some(cursor) = &after {
                        url.push_str(&format!("&after={cursor}"));
                    }

                    let body = match client.get(&url).send().await {
                        Ok(resp) => resp
                            .error_for_status()
                            .context("reddit http status")?
                            .text()
                            .await
                            .context("reddit http .text()")?,
                        Err(e) => {
                            tracing::warn!(error = ?e, provider = "Reddit", "provider http error");
                            counter!("provider_errors_total").increment(1);
                            return Err(e).context("reddit http get()");
                        }
                    };

                    let (page, next) = Self::parse_listing_str(&body)?;
                    if page.is_empty() {
                        break;
                    }
                    posts.extend(page);

                    match next {
                        Some(cursor) => after = Some(cursor),
                        None => break,
                    }
                }

                posts.truncate(limit as usize);
                Ok(posts)
            }
        }
    }

    fn name(&self) -> &'static str {
        "Reddit"
    }
}
