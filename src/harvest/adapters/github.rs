// src/harvest/adapters/github.rs
//! GitHub issues adapter (REST API v3). Repository discovery is the
//! expensive step and is memoized in the discovery cache; issue listing
//! then walks the discovered repositories until the quota is met.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tokio::time::Instant;

use crate::harvest::adapters::{
    get_text, is_tech_solvable, normalize_text, suggest_tech, FetchError, SourceAdapter,
    USER_AGENT,
};
use crate::harvest::cache::{Clock, DiscoveryCache, SystemClock};
use crate::model::{CandidateItem, Engagement};

const API_BASE: &str = "https://api.github.com";

const TOPICS: &[&str] = &["rust", "python", "javascript", "machine-learning", "devops"];

/// Resource/link collections have no real issues; skip them at discovery.
const AWESOME_LIST_PATTERNS: &[&str] = &[
    "awesome-", "-awesome", "resources", "curated", "collection", "-list", "reading-list",
];

const HUGE_REPOS_BLACKLIST: &[&str] = &[
    "torvalds/linux",
    "chromium/chromium",
    "microsoft/vscode",
    "tensorflow/tensorflow",
    "facebook/react",
];

#[derive(Debug, Deserialize)]
struct RepoSearch {
    items: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    full_name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    title: String,
    #[serde(default)]
    body: Option<String>,
    html_url: String,
    #[serde(default)]
    repository_url: Option<String>,
    #[serde(default)]
    labels: Vec<Label>,
    #[serde(default)]
    comments: Option<u32>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    user: Option<IssueUser>,
    /// Present on pull requests returned by the issues endpoint.
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Label {
    name: String,
}

#[derive(Debug, Deserialize)]
struct IssueUser {
    login: String,
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client },
}

pub struct GithubAdapter {
    mode: Mode,
    cache: Arc<DiscoveryCache<Vec<String>>>,
    clock: Arc<dyn Clock>,
}

impl GithubAdapter {
    /// Fixture body: a JSON array of issue objects in the REST v3 shape.
    pub fn from_fixture(body: impl Into<String>) -> Self {
        Self {
            mode: Mode::Fixture(body.into()),
            cache: Arc::new(DiscoveryCache::new(3600)),
            clock: Arc::new(SystemClock),
        }
    }

    /// Live client. The token (if any) goes into the Authorization header,
    /// never into URLs, so it cannot leak through logs.
    pub fn new_http(
        cache: Arc<DiscoveryCache<Vec<String>>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        dotenvy::dotenv().ok();
        let token = std::env::var("GITHUB_TOKEN").ok();
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(api_headers(token.as_deref())?)
            .build()
            .context("building github http client")?;
        Ok(Self {
            mode: Mode::Http { client },
            cache,
            clock,
        })
    }

    fn is_awesome_list(repo: &Repo) -> bool {
        let combined = format!(
            "{} {}",
            repo.full_name.to_lowercase(),
            repo.description.as_deref().unwrap_or_default().to_lowercase()
        );
        AWESOME_LIST_PATTERNS.iter().any(|p| combined.contains(p))
    }

    /// Discover candidate repositories for one topic, memoized in the
    /// discovery cache under `github:repos:{topic}`.
    async fn discover_repos(
        &self,
        client: &reqwest::Client,
        topic: &str,
        deadline: Instant,
    ) -> Result<Vec<String>, FetchError> {
        let key = format!("github:repos:{topic}");
        if let Some(cached) = self.cache.get(self.clock.as_ref(), &key) {
            return Ok(cached);
        }

        let url = format!(
            "{API_BASE}/search/repositories?q=topic:{topic}&sort=stars&order=desc&per_page=10"
        );
        let body = get_text(client, &url, deadline).await?;
        let search: RepoSearch = serde_json::from_str(&body)
            .context("parsing github repository search response")
            .map_err(FetchError::Unavailable)?;

        let repos: Vec<String> = search
            .items
            .iter()
            .filter(|r| !Self::is_awesome_list(r))
            .filter(|r| !HUGE_REPOS_BLACKLIST.contains(&r.full_name.as_str()))
            .map(|r| r.full_name.clone())
            .collect();

        self.cache.put(self.clock.as_ref(), &key, repos.clone());
        Ok(repos)
    }

    fn parse_issues(body: &str, quota: usize) -> Result<Vec<CandidateItem>> {
        let t0 = std::time::Instant::now();
        let issues: Vec<Issue> = serde_json::from_str(body).context("parsing github issues json")?;

        let mut out = Vec::new();
        for issue in issues {
            if out.len() >= quota {
                break;
            }
            if issue.pull_request.is_some() {
                continue;
            }
            let raw_body = issue.body.as_deref().unwrap_or_default();
            if !is_tech_solvable(&issue.title, raw_body) {
                continue;
            }

            let title = normalize_text(&issue.title);
            let description = normalize_text(raw_body);
            let repo = issue
                .repository_url
                .as_deref()
                .and_then(|u| u.split("/repos/").nth(1))
                .unwrap_or("unknown")
                .to_string();

            out.push(CandidateItem {
                suggested_tech: suggest_tech(&format!("{title} {description}")),
                title,
                description,
                origin: format!("github/{repo}"),
                reference_locator: issue.html_url,
                tags: issue.labels.iter().take(3).map(|l| l.name.clone()).collect(),
                author: issue.user.map(|u| u.login),
                posted_at: issue
                    .created_at
                    .as_deref()
                    .and_then(parse_rfc3339_to_unix),
                engagement: issue.comments.map(|c| Engagement {
                    upvotes: c,
                    views: 0,
                }),
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("harvest_parse_ms").record(ms);
        counter!("harvest_fetched_total", "origin" => "github").increment(out.len() as u64);
        Ok(out)
    }
}

fn api_headers(token: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("token {token}"))
            .context("GITHUB_TOKEN contains invalid header characters")?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

fn issues_url(repo: &str, quota: usize) -> String {
    format!(
        "{API_BASE}/repos/{repo}/issues?state=open&per_page={}",
        quota.min(30)
    )
}

fn parse_rfc3339_to_unix(ts: &str) -> Option<u64> {
    chrono::DateTime::parse_from_rfc3339(ts)
        .ok()
        .and_then(|dt| u64::try_from(dt.timestamp()).ok())
}

#[async_trait]
impl SourceAdapter for GithubAdapter {
    async fn fetch(
        &self,
        quota: usize,
        deadline: Instant,
    ) -> Result<Vec<CandidateItem>, FetchError> {
        match &self.mode {
            Mode::Fixture(body) => Self::parse_issues(body, quota).map_err(FetchError::Unavailable),
            Mode::Http { client } => {
                let mut out = Vec::new();
                'topics: for topic in TOPICS {
                    let repos = self.discover_repos(client, topic, deadline).await?;
                    for repo in repos {
                        if out.len() >= quota || Instant::now() >= deadline {
                            break 'topics;
                        }
                        let url = issues_url(&repo, quota);
                        match get_text(client, &url, deadline).await {
                            Ok(body) => {
                                let remaining = quota - out.len();
                                let mut items =
                                    Self::parse_issues(&body, remaining).map_err(FetchError::Unavailable)?;
                                out.append(&mut items);
                            }
                            Err(FetchError::RateLimited) => return Err(FetchError::RateLimited),
                            Err(e) => {
                                tracing::warn!(error = %e, repo, "github issue listing failed");
                            }
                        }
                    }
                }
                Ok(out)
            }
        }
    }

    fn name(&self) -> &'static str {
        "github"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"[
      {
        "title": "How to fix crash in parser",
        "body": "The python app crashes with Error: index out of range. Steps to reproduce: run the script.",
        "html_url": "https://github.com/acme/widget/issues/7",
        "repository_url": "https://api.github.com/repos/acme/widget",
        "labels": [{"name": "bug"}, {"name": "help wanted"}],
        "comments": 4,
        "created_at": "2026-01-05T10:00:00Z",
        "user": {"login": "ada"}
      },
      {
        "title": "Career advice for new grads",
        "body": "What job should I take?",
        "html_url": "https://github.com/acme/widget/issues/8",
        "repository_url": "https://api.github.com/repos/acme/widget",
        "labels": [],
        "comments": 0
      },
      {
        "title": "Fix flaky api bug",
        "body": "intermittent failures",
        "html_url": "https://github.com/acme/widget/pull/9",
        "repository_url": "https://api.github.com/repos/acme/widget",
        "pull_request": {"url": "https://api.github.com/repos/acme/widget/pulls/9"},
        "labels": []
      }
    ]"#;

    #[tokio::test]
    async fn fixture_parses_and_filters() {
        let adapter = GithubAdapter::from_fixture(FIXTURE);
        let items = adapter
            .fetch(10, Instant::now() + std::time::Duration::from_secs(5))
            .await
            .unwrap();
        // Career post gated out; pull request skipped.
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.origin, "github/acme/widget");
        assert_eq!(item.reference_locator, "https://github.com/acme/widget/issues/7");
        assert_eq!(item.tags, vec!["bug", "help wanted"]);
        assert_eq!(item.engagement, Some(Engagement { upvotes: 4, views: 0 }));
        assert_eq!(item.author.as_deref(), Some("ada"));
        assert!(item.posted_at.is_some());
    }

    #[tokio::test]
    async fn quota_is_an_upper_bound() {
        let adapter = GithubAdapter::from_fixture(FIXTURE);
        let items = adapter
            .fetch(0, Instant::now() + std::time::Duration::from_secs(5))
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn auth_travels_in_headers_not_urls() {
        let headers = api_headers(Some("abc123")).unwrap();
        assert_eq!(
            headers.get(ACCEPT).unwrap(),
            "application/vnd.github.v3+json"
        );
        let auth = headers.get(AUTHORIZATION).unwrap();
        assert!(auth.is_sensitive());
        assert_eq!(auth.to_str().unwrap(), "token abc123");

        assert!(api_headers(None).unwrap().get(AUTHORIZATION).is_none());

        let url = issues_url("acme/widget", 50);
        assert_eq!(
            url,
            "https://api.github.com/repos/acme/widget/issues?state=open&per_page=30"
        );
        assert!(!url.contains("token"));
    }

    #[test]
    fn awesome_lists_are_filtered() {
        let repo = Repo {
            full_name: "someone/awesome-rust".into(),
            description: Some("A curated list of Rust code".into()),
        };
        assert!(GithubAdapter::is_awesome_list(&repo));
        let normal = Repo {
            full_name: "acme/widget".into(),
            description: Some("A widget engine".into()),
        };
        assert!(!GithubAdapter::is_awesome_list(&normal));
    }
}
