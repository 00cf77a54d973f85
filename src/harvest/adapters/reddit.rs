// src/harvest/adapters/reddit.rs
//! Reddit adapter over the public listing endpoints. Walks a fixed set of
//! problem-dense subreddits and keeps posts that pass the solvability gate.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;
use tokio::time::Instant;

use crate::harvest::adapters::{
    get_text, is_tech_solvable, normalize_text, suggest_tech, FetchError, SourceAdapter,
    USER_AGENT,
};
use crate::model::{CandidateItem, Engagement};

const SUBREDDITS: &[&str] = &["learnprogramming", "webdev", "techsupport", "askprogramming"];

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    #[serde(default)]
    selftext: String,
    permalink: String,
    #[serde(default)]
    ups: Option<u32>,
    #[serde(default)]
    created_utc: Option<f64>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    subreddit: Option<String>,
    #[serde(default)]
    link_flair_text: Option<String>,
}

enum Mode {
    /// One listing response body in the `new.json` shape.
    Fixture(String),
    Http { client: reqwest::Client },
}

pub struct RedditAdapter {
    mode: Mode,
}

impl RedditAdapter {
    pub fn from_fixture(body: impl Into<String>) -> Self {
        Self {
            mode: Mode::Fixture(body.into()),
        }
    }

    /// Live client with an explicit user agent; Reddit throttles the
    /// library default.
    pub fn new_http() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("building reddit http client")?;
        Ok(Self {
            mode: Mode::Http { client },
        })
    }

    fn convert(post: Post, fallback_sub: &str) -> Option<CandidateItem> {
        if !is_tech_solvable(&post.title, &post.selftext) {
            return None;
        }
        let title = normalize_text(&post.title);
        let description = normalize_text(&post.selftext);
        let sub = post.subreddit.as_deref().unwrap_or(fallback_sub);

        let mut tags = Vec::new();
        if let Some(flair) = post.link_flair_text.filter(|f| !f.trim().is_empty()) {
            tags.push(flair);
        }

        Some(CandidateItem {
            suggested_tech: suggest_tech(&format!("{title} {description}")),
            title,
            description,
            origin: format!("reddit/{sub}"),
            reference_locator: format!("https://reddit.com{}", post.permalink),
            tags,
            author: post.author.filter(|a| a != "[deleted]"),
            posted_at: post.created_utc.map(|t| t as u64),
            engagement: post.ups.map(|u| Engagement {
                upvotes: u,
                views: 0,
            }),
        })
    }

    fn parse_listing(body: &str, sub: &str, quota: usize) -> Result<Vec<CandidateItem>> {
        let listing: Listing =
            serde_json::from_str(body).context("parsing reddit listing json")?;
        let out: Vec<CandidateItem> = listing
            .data
            .children
            .into_iter()
            .filter_map(|c| Self::convert(c.data, sub))
            .take(quota)
            .collect();
        counter!("harvest_fetched_total", "origin" => "reddit").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for RedditAdapter {
    async fn fetch(
        &self,
        quota: usize,
        deadline: Instant,
    ) -> Result<Vec<CandidateItem>, FetchError> {
        match &self.mode {
            Mode::Fixture(body) => {
                Self::parse_listing(body, "learnprogramming", quota).map_err(FetchError::Unavailable)
            }
            Mode::Http { client } => {
                let mut out = Vec::new();
                for sub in SUBREDDITS {
                    if out.len() >= quota || Instant::now() >= deadline {
                        break;
                    }
                    let url = format!(
                        "https://www.reddit.com/r/{sub}/new.json?limit={}",
                        quota.min(25)
                    );
                    match get_text(client, &url, deadline).await {
                        Ok(body) => {
                            let remaining = quota - out.len();
                            let mut items = Self::parse_listing(&body, sub, remaining)
                                .map_err(FetchError::Unavailable)?;
                            out.append(&mut items);
                        }
                        Err(FetchError::RateLimited) => return Err(FetchError::RateLimited),
                        Err(e) => {
                            tracing::warn!(error = %e, sub, "reddit listing failed");
                        }
                    }
                }
                Ok(out)
            }
        }
    }

    fn name(&self) -> &'static str {
        "reddit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
      "data": {
        "children": [
          {
            "data": {
              "title": "How to fix CORS error in my react app?",
              "selftext": "My api calls fail with a CORS error when the app runs locally.",
              "permalink": "/r/webdev/comments/abc123/how_to_fix_cors/",
              "ups": 17,
              "created_utc": 1767100000.0,
              "author": "dev_anna",
              "subreddit": "webdev",
              "link_flair_text": "Help"
            }
          },
          {
            "data": {
              "title": "Is a CS degree worth it?",
              "selftext": "Looking for career advice on software jobs.",
              "permalink": "/r/webdev/comments/abc124/degree/",
              "ups": 200,
              "subreddit": "webdev"
            }
          }
        ]
      }
    }"#;

    #[tokio::test]
    async fn fixture_gates_and_converts() {
        let adapter = RedditAdapter::from_fixture(FIXTURE);
        let items = adapter
            .fetch(10, Instant::now() + std::time::Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.origin, "reddit/webdev");
        assert_eq!(
            item.reference_locator,
            "https://reddit.com/r/webdev/comments/abc123/how_to_fix_cors/"
        );
        assert_eq!(item.tags, vec!["Help"]);
        assert_eq!(item.engagement, Some(Engagement { upvotes: 17, views: 0 }));
        assert!(item.suggested_tech.contains(&"React".to_string()));
    }

    #[test]
    fn live_client_builds_with_a_user_agent() {
        assert!(RedditAdapter::new_http().is_ok());
    }

    #[tokio::test]
    async fn deleted_author_is_dropped() {
        let body = r#"{"data": {"children": [{"data": {
            "title": "How to fix api bug",
            "selftext": "the code crashes",
            "permalink": "/r/techsupport/comments/x/y/",
            "ups": 1,
            "author": "[deleted]",
            "subreddit": "techsupport"
        }}]}}"#;
        let adapter = RedditAdapter::from_fixture(body);
        let items = adapter
            .fetch(5, Instant::now() + std::time::Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].author.is_none());
    }
}
