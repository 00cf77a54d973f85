// src/harvest/adapters/mod.rs
//! Source adapter capability and the text-processing helpers shared by all
//! origins: normalization, the tech-solvability gate, and tech suggestion.

pub mod github;
pub mod hackernews;
pub mod reddit;
pub mod stackoverflow;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;

use crate::model::CandidateItem;

/// Fetch failure taxonomy visible to the orchestrator. Both variants are
/// retryable within the adapter's retry budget; the distinction only
/// changes the backoff and the reported reason.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate limited")]
    RateLimited,
    #[error("source unavailable: {0}")]
    Unavailable(#[from] anyhow::Error),
}

/// One external origin. Implemented once per platform and selected by
/// configuration; `quota` and `deadline` are upper bounds, never guarantees.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(
        &self,
        quota: usize,
        deadline: Instant,
    ) -> Result<Vec<CandidateItem>, FetchError>;

    /// Origin category name; items from this adapter carry origins with
    /// this prefix ("github" → "github/owner/repo").
    fn name(&self) -> &'static str;
}

/// Sent on every live request; GitHub rejects requests without one and
/// Reddit throttles the library default.
pub(crate) const USER_AGENT: &str = concat!("problem-shelf/", env!("CARGO_PKG_VERSION"));

pub(crate) const PROBLEM_KEYWORDS: &[&str] = &[
    "how to",
    "problem",
    "fix",
    "build",
    "issue",
    "help with",
    "need solution",
    "error",
    "bug",
    "implement",
    "optimize",
    "automate",
    "script",
    "tool",
];

const TECH_KEYWORDS: &[&str] = &[
    "app", "software", "code", "web", "database", "ai", "ml", "python", "java", "js", "api",
    "mobile", "cloud", "android", "ios", "aws", "react", "node", "sql", "debug", "error", "crash",
    "performance",
];

const NON_TECH_KEYWORDS: &[&str] = &[
    "feel",
    "advice",
    "career",
    "job",
    "course",
    "degree",
    "imposter",
    "recommendation",
];

/// Keyword → canonical tech tags, used when the origin carries no explicit
/// technology metadata.
const TECH_MAP: &[(&str, &[&str])] = &[
    ("web", &["HTML", "CSS", "JS", "React"]),
    ("python", &["Python", "Flask", "Django"]),
    ("database", &["SQL", "PostgreSQL", "MongoDB"]),
    ("ml", &["Machine Learning", "TensorFlow", "PyTorch"]),
    ("ai", &["AI", "NLP", "Deep Learning"]),
    ("java", &["Java", "Spring"]),
    ("js", &["JavaScript", "Node.js"]),
    ("react", &["React", "JavaScript"]),
    ("mobile", &["Mobile", "Flutter", "React Native"]),
    ("android", &["Android", "Kotlin"]),
    ("ios", &["iOS", "Swift"]),
    ("cloud", &["Cloud", "AWS", "Kubernetes"]),
    ("rust", &["Rust"]),
    ("docker", &["Docker"]),
];

/// Normalize free text from an origin: decode HTML entities, strip tags and
/// URLs, collapse whitespace, cap the length.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_URLS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_urls = RE_URLS.get_or_init(|| regex::Regex::new(r"https?://\S+").unwrap());
    out = re_urls.replace_all(&out, "").to_string();

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Keyword gate: keep only items that look like tech-solvable problems and
/// not career/meta discussion.
pub fn is_tech_solvable(title: &str, body: &str) -> bool {
    let text = format!("{} {}", title, body).to_lowercase();
    let has_problem = PROBLEM_KEYWORDS.iter().any(|kw| text.contains(kw));
    let has_tech = TECH_KEYWORDS.iter().any(|kw| text.contains(kw));
    let is_non_tech = NON_TECH_KEYWORDS.iter().any(|kw| text.contains(kw));
    has_problem && has_tech && !is_non_tech
}

/// Suggest canonical technology tags from free text. Deterministic keyword
/// mapping; returns an empty list rather than inventing a catch-all.
pub fn suggest_tech(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut out: Vec<String> = Vec::new();
    for (kw, techs) in TECH_MAP {
        if lower.contains(kw) {
            for t in *techs {
                if !out.iter().any(|x| x == t) {
                    out.push((*t).to_string());
                }
            }
        }
    }
    out.truncate(5);
    out
}

/// Shared helper: GET a URL as text with the remaining time until
/// `deadline` as the request timeout. 429 maps to `RateLimited`.
pub(crate) async fn get_text(
    client: &reqwest::Client,
    url: &str,
    deadline: Instant,
) -> Result<String, FetchError> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return Err(FetchError::Unavailable(anyhow::anyhow!(
            "deadline elapsed before request to {url}"
        )));
    }
    let resp = client
        .get(url)
        .timeout(remaining)
        .send()
        .await
        .map_err(|e| FetchError::Unavailable(anyhow::Error::new(e).context(format!("GET {url}"))))?;
    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::RateLimited);
    }
    let resp = resp
        .error_for_status()
        .map_err(|e| FetchError::Unavailable(anyhow::Error::new(e).context(format!("GET {url}"))))?;
    resp.text()
        .await
        .map_err(|e| FetchError::Unavailable(anyhow::Error::new(e).context(format!("body of {url}"))))
}
