// src/harvest/adapters/stackoverflow.rs
//! Stack Overflow adapter over the Stack Exchange 2.3 API. Questions come
//! back with HTML bodies and entity-encoded titles; both go through the
//! shared normalizer before they enter the pipeline.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;
use tokio::time::Instant;

use crate::harvest::adapters::{
    get_text, is_tech_solvable, normalize_text, suggest_tech, FetchError, SourceAdapter,
};
use crate::model::{CandidateItem, Engagement};

const API_BASE: &str = "https://api.stackexchange.com/2.3";

const TAGS: &[&str] = &["python", "javascript", "rust", "sql"];

#[derive(Debug, Deserialize)]
struct QuestionPage {
    items: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct Question {
    title: String,
    #[serde(default)]
    body: Option<String>,
    link: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    creation_date: Option<u64>,
    #[serde(default)]
    owner: Option<Owner>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    #[serde(default)]
    display_name: Option<String>,
}

enum Mode {
    /// One question page body in the 2.3 wrapper shape.
    Fixture(String),
    Http { client: reqwest::Client },
}

pub struct StackOverflowAdapter {
    mode: Mode,
    key: Option<String>,
}

impl StackOverflowAdapter {
    pub fn from_fixture(body: impl Into<String>) -> Self {
        Self {
            mode: Mode::Fixture(body.into()),
            key: None,
        }
    }

    pub fn new_http() -> Self {
        dotenvy::dotenv().ok();
        Self {
            mode: Mode::Http {
                client: reqwest::Client::new(),
            },
            key: std::env::var("STACKEXCHANGE_KEY").ok(),
        }
    }

    fn convert(q: Question) -> Option<CandidateItem> {
        let raw_body = q.body.as_deref().unwrap_or_default();
        if !is_tech_solvable(&q.title, raw_body) {
            return None;
        }
        let title = normalize_text(&q.title);
        let description = normalize_text(raw_body);
        let primary_tag = q.tags.first().cloned().unwrap_or_else(|| "untagged".into());

        let upvotes = q.score.map(|s| s.max(0) as u32);
        let engagement = match (upvotes, q.view_count) {
            (None, None) => None,
            (u, v) => Some(Engagement {
                upvotes: u.unwrap_or(0),
                // view_count is 64-bit on the wire; saturate into the
                // counter width.
                views: v.unwrap_or(0).try_into().unwrap_or(u32::MAX),
            }),
        };

        Some(CandidateItem {
            suggested_tech: suggest_tech(&format!("{title} {}", q.tags.join(" "))),
            title,
            description,
            origin: format!("stackoverflow/{primary_tag}"),
            reference_locator: q.link,
            tags: q.tags.into_iter().take(3).collect(),
            author: q.owner.and_then(|o| o.display_name),
            posted_at: q.creation_date,
            engagement,
        })
    }

    fn parse_page(body: &str, quota: usize) -> Result<Vec<CandidateItem>> {
        let page: QuestionPage =
            serde_json::from_str(body).context("parsing stack exchange question page")?;
        let out: Vec<CandidateItem> = page
            .items
            .into_iter()
            .filter_map(Self::convert)
            .take(quota)
            .collect();
        counter!("harvest_fetched_total", "origin" => "stackoverflow").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for StackOverflowAdapter {
    async fn fetch(
        &self,
        quota: usize,
        deadline: Instant,
    ) -> Result<Vec<CandidateItem>, FetchError> {
        match &self.mode {
            Mode::Fixture(body) => Self::parse_page(body, quota).map_err(FetchError::Unavailable),
            Mode::Http { client } => {
                let mut out = Vec::new();
                for tag in TAGS {
                    if out.len() >= quota || Instant::now() >= deadline {
                        break;
                    }
                    let url = format!(
                        "{API_BASE}/questions?order=desc&sort=creation&tagged={tag}\
                         &site=stackoverflow&filter=withbody&pagesize={}{}",
                        quota.min(30),
                        self.key
                            .as_deref()
                            .map(|k| format!("&key={k}"))
                            .unwrap_or_default()
                    );
                    match get_text(client, &url, deadline).await {
                        Ok(body) => {
                            let remaining = quota - out.len();
                            let mut items = Self::parse_page(&body, remaining)
                                .map_err(FetchError::Unavailable)?;
                            out.append(&mut items);
                        }
                        Err(FetchError::RateLimited) => return Err(FetchError::RateLimited),
                        Err(e) => {
                            tracing::warn!(error = %e, tag, "stack overflow page fetch failed");
                        }
                    }
                }
                Ok(out)
            }
        }
    }

    fn name(&self) -> &'static str {
        "stackoverflow"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
      "items": [
        {
          "title": "How to fix &quot;list index out of range&quot; error?",
          "body": "<p>My python script crashes with <code>IndexError</code>. Steps to reproduce below.</p>",
          "link": "https://stackoverflow.com/questions/555/list-index",
          "tags": ["python", "list", "indexing", "extra"],
          "score": 12,
          "view_count": 340,
          "creation_date": 1767200000,
          "owner": {"display_name": "sam"}
        },
        {
          "title": "Which laptop for a programming course?",
          "body": "<p>Need a recommendation for my degree.</p>",
          "link": "https://stackoverflow.com/questions/556/laptop",
          "tags": ["hardware"],
          "score": 3
        }
      ]
    }"#;

    #[tokio::test]
    async fn fixture_decodes_and_gates() {
        let adapter = StackOverflowAdapter::from_fixture(FIXTURE);
        let items = adapter
            .fetch(10, Instant::now() + std::time::Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.title, "How to fix \"list index out of range\" error?");
        assert!(!item.description.contains('<'));
        assert_eq!(item.origin, "stackoverflow/python");
        assert_eq!(item.tags, vec!["python", "list", "indexing"]);
        assert_eq!(
            item.engagement,
            Some(Engagement {
                upvotes: 12,
                views: 340
            })
        );
        assert_eq!(item.author.as_deref(), Some("sam"));
    }

    #[tokio::test]
    async fn oversized_view_count_saturates() {
        let body = format!(
            r#"{{"items": [{{
                "title": "How to fix api error in my code?",
                "body": "<p>it crashes</p>",
                "link": "https://stackoverflow.com/questions/558/x",
                "tags": ["python"],
                "score": 1,
                "view_count": {}
            }}]}}"#,
            u32::MAX as u64 + 5
        );
        let adapter = StackOverflowAdapter::from_fixture(body);
        let items = adapter
            .fetch(5, Instant::now() + std::time::Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(items[0].engagement.unwrap().views, u32::MAX);
    }

    #[tokio::test]
    async fn negative_score_clamps_to_zero_upvotes() {
        let body = r#"{"items": [{
            "title": "How to fix api error in my code?",
            "body": "<p>it crashes</p>",
            "link": "https://stackoverflow.com/questions/557/x",
            "tags": ["python"],
            "score": -4,
            "view_count": 9
        }]}"#;
        let adapter = StackOverflowAdapter::from_fixture(body);
        let items = adapter
            .fetch(5, Instant::now() + std::time::Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(
            items[0].engagement,
            Some(Engagement { upvotes: 0, views: 9 })
        );
    }
}
