// src/harvest/adapters/hackernews.rs
//! Ask HN adapter over the Firebase API: one listing call for story ids,
//! then one item call per story until the quota is met.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Deserialize;
use tokio::time::Instant;

use crate::harvest::adapters::{
    get_text, is_tech_solvable, normalize_text, suggest_tech, FetchError, SourceAdapter,
    PROBLEM_KEYWORDS,
};
use crate::model::{CandidateItem, Engagement};

const API_BASE: &str = "https://hacker-news.firebaseio.com/v0";

#[derive(Debug, Deserialize)]
struct Item {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    score: Option<u32>,
    #[serde(default)]
    by: Option<String>,
    #[serde(default)]
    time: Option<u64>,
    #[serde(default)]
    r#type: Option<String>,
}

enum Mode {
    /// JSON array of item objects, as returned by `item/{id}.json`.
    Fixture(String),
    Http { client: reqwest::Client },
}

pub struct HackerNewsAdapter {
    mode: Mode,
}

impl HackerNewsAdapter {
    pub fn from_fixture(body: impl Into<String>) -> Self {
        Self {
            mode: Mode::Fixture(body.into()),
        }
    }

    pub fn new_http() -> Self {
        Self {
            mode: Mode::Http {
                client: reqwest::Client::new(),
            },
        }
    }

    fn convert(item: Item) -> Option<CandidateItem> {
        if item.r#type.as_deref() != Some("story") {
            return None;
        }
        let raw_title = item.title?;
        let raw_text = item.text.unwrap_or_default();
        if !is_tech_solvable(&raw_title, &raw_text) {
            return None;
        }

        let title = normalize_text(&raw_title);
        let description = normalize_text(&raw_text);
        let lower = format!("{} {}", title, description).to_lowercase();
        let tags: Vec<String> = PROBLEM_KEYWORDS
            .iter()
            .filter(|kw| lower.contains(*kw))
            .take(3)
            .map(|kw| kw.to_string())
            .collect();

        Some(CandidateItem {
            suggested_tech: suggest_tech(&lower),
            title,
            description,
            origin: "hackernews/ask".to_string(),
            // Path form, stable under locator normalization.
            reference_locator: format!("https://news.ycombinator.com/item/{}", item.id),
            tags,
            author: item.by,
            posted_at: item.time,
            engagement: item.score.map(|s| Engagement {
                upvotes: s,
                views: 0,
            }),
        })
    }

    fn parse_items(body: &str, quota: usize) -> Result<Vec<CandidateItem>> {
        let items: Vec<Item> =
            serde_json::from_str(body).context("parsing hacker news item json")?;
        let out: Vec<CandidateItem> = items
            .into_iter()
            .filter_map(Self::convert)
            .take(quota)
            .collect();
        counter!("harvest_fetched_total", "origin" => "hackernews").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for HackerNewsAdapter {
    async fn fetch(
        &self,
        quota: usize,
        deadline: Instant,
    ) -> Result<Vec<CandidateItem>, FetchError> {
        match &self.mode {
            Mode::Fixture(body) => Self::parse_items(body, quota).map_err(FetchError::Unavailable),
            Mode::Http { client } => {
                let listing = get_text(client, &format!("{API_BASE}/askstories.json"), deadline)
                    .await?;
                let ids: Vec<u64> = serde_json::from_str(&listing)
                    .context("parsing ask hn listing")
                    .map_err(FetchError::Unavailable)?;

                let mut out = Vec::new();
                for id in ids {
                    if out.len() >= quota || Instant::now() >= deadline {
                        break;
                    }
                    let url = format!("{API_BASE}/item/{id}.json");
                    let body = match get_text(client, &url, deadline).await {
                        Ok(b) => b,
                        Err(FetchError::RateLimited) => return Err(FetchError::RateLimited),
                        Err(e) => {
                            tracing::warn!(error = %e, id, "hacker news item fetch failed");
                            continue;
                        }
                    };
                    match serde_json::from_str::<Option<Item>>(&body) {
                        Ok(Some(item)) => {
                            if let Some(candidate) = Self::convert(item) {
                                out.push(candidate);
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::warn!(error = %e, id, "hacker news item parse failed");
                        }
                    }
                }
                counter!("harvest_fetched_total", "origin" => "hackernews")
                    .increment(out.len() as u64);
                Ok(out)
            }
        }
    }

    fn name(&self) -> &'static str {
        "hackernews"
    }
}
