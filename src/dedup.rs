// src/dedup.rs
//! Two-stage deduplication of harvested candidates against the catalog and
//! within the current batch: exact normalized-locator match first, then a
//! title-similarity test scoped to the same origin category.

use std::collections::{HashMap, HashSet};

use strsim::normalized_levenshtein;

use crate::model::CandidateItem;
use crate::store::CatalogStore;

/// Why an item was rejected as a duplicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateKind {
    /// Same normalized reference locator as a catalog or batch item.
    ExactLocator,
    /// Title similarity at or above the threshold within one origin category.
    SimilarTitle,
}

#[derive(Debug, Clone)]
pub struct RejectedDuplicate {
    pub item: CandidateItem,
    pub kind: DuplicateKind,
}

#[derive(Debug, Default)]
pub struct DedupOutcome {
    pub accepted: Vec<CandidateItem>,
    pub rejected: Vec<RejectedDuplicate>,
}

impl DedupOutcome {
    /// Duplicate counts keyed by origin category, for per-source reporting.
    pub fn rejected_by_category(&self) -> HashMap<String, usize> {
        let mut out = HashMap::new();
        for r in &self.rejected {
            *out.entry(r.item.origin_category().to_string()).or_insert(0) += 1;
        }
        out
    }
}

/// Normalize a reference locator into the canonical dedup key: case-folded,
/// fragment and query string stripped, trailing slashes removed.
pub fn normalize_locator(raw: &str) -> String {
    let mut s = raw.trim().to_ascii_lowercase();
    if let Some(pos) = s.find('#') {
        s.truncate(pos);
    }
    if let Some(pos) = s.find('?') {
        s.truncate(pos);
    }
    while s.ends_with('/') {
        s.pop();
    }
    s
}

fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

pub struct Deduplicator {
    similarity_threshold: f64,
}

impl Deduplicator {
    pub fn new(similarity_threshold: f64) -> Self {
        Self {
            similarity_threshold: similarity_threshold.clamp(0.0, 1.0),
        }
    }

    /// Filter `batch` against the catalog and against itself. Earliest-seen
    /// wins; later duplicates are returned in `rejected`, never dropped
    /// silently. Runs single-threaded over the merged batch after all
    /// concurrent harvesting completes.
    pub fn dedup(&self, catalog: &dyn CatalogStore, batch: Vec<CandidateItem>) -> DedupOutcome {
        // Snapshot of catalog titles grouped by origin category for stage 2.
        let mut known_titles: HashMap<String, Vec<String>> = HashMap::new();
        for p in catalog.all() {
            known_titles
                .entry(p.origin_category().to_string())
                .or_default()
                .push(title_key(&p.title));
        }

        let mut seen_locators: HashSet<String> = HashSet::new();
        let mut outcome = DedupOutcome::default();

        for item in batch {
            let key = normalize_locator(&item.reference_locator);

            // Stage 1: exact locator against catalog and accepted batch items.
            if seen_locators.contains(&key)
                || catalog.find_by_reference_locator(&key).is_some()
            {
                outcome.rejected.push(RejectedDuplicate {
                    item,
                    kind: DuplicateKind::ExactLocator,
                });
                continue;
            }

            // Stage 2: title similarity within the same origin category.
            let category = item.origin_category().to_string();
            let title = title_key(&item.title);
            let similar = known_titles
                .get(&category)
                .map(|titles| {
                    titles
                        .iter()
                        .any(|t| normalized_levenshtein(t, &title) >= self.similarity_threshold)
                })
                .unwrap_or(false);
            if similar {
                outcome.rejected.push(RejectedDuplicate {
                    item,
                    kind: DuplicateKind::SimilarTitle,
                });
                continue;
            }

            seen_locators.insert(key);
            known_titles.entry(category).or_default().push(title);
            outcome.accepted.push(item);
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, EffortBucket, Problem};
    use crate::store::{CatalogStore, MemoryCatalog};

    fn item(origin: &str, title: &str, locator: &str) -> CandidateItem {
        CandidateItem {
            title: title.into(),
            description: String::new(),
            origin: origin.into(),
            reference_locator: locator.into(),
            tags: vec![],
            suggested_tech: vec![],
            author: None,
            posted_at: None,
            engagement: None,
        }
    }

    fn catalog_with(title: &str, locator: &str) -> MemoryCatalog {
        let cat = MemoryCatalog::new();
        cat.insert(Problem {
            id: 1,
            title: title.into(),
            description: String::new(),
            origin: "github/acme/widget".into(),
            suggested_tech: vec![],
            reference_locator: normalize_locator(locator),
            tags: vec![],
            quality_score: 0,
            difficulty: Difficulty::Intermediate,
            effort: EffortBucket::DaysOneToThree,
            engagement: None,
            created_at: 0,
            score_updated_at: None,
        })
        .unwrap();
        cat
    }

    #[test]
    fn locator_normalization_strips_query_and_trailing_slash() {
        assert_eq!(
            normalize_locator("https://Example.test/Issue/42/?utm=x#frag"),
            "https://example.test/issue/42"
        );
        assert_eq!(
            normalize_locator("https://example.test/a//"),
            "https://example.test/a"
        );
    }

    #[test]
    fn trailing_slash_and_query_variants_collapse_to_one() {
        let cat = MemoryCatalog::new();
        let d = Deduplicator::new(0.85);
        let batch = vec![
            item("github/a/b", "panic in parser", "https://example.test/i/1"),
            item("reddit/rust", "parser panic thread", "https://example.test/i/1/?ref=share"),
        ];
        let out = d.dedup(&cat, batch);
        assert_eq!(out.accepted.len(), 1);
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].kind, DuplicateKind::ExactLocator);
    }

    #[test]
    fn earliest_seen_wins_within_batch() {
        let cat = MemoryCatalog::new();
        let d = Deduplicator::new(0.85);
        let batch = vec![
            item("hn", "first", "https://example.test/x"),
            item("hn", "second", "https://example.test/x"),
        ];
        let out = d.dedup(&cat, batch);
        assert_eq!(out.accepted[0].title, "first");
        assert_eq!(out.rejected[0].item.title, "second");
    }

    #[test]
    fn similar_title_same_category_is_rejected() {
        let cat = catalog_with("memory leak in websocket handler", "https://example.test/1");
        let d = Deduplicator::new(0.85);
        let out = d.dedup(
            &cat,
            vec![item(
                "github/other/repo",
                "memory leak in websocket handlers",
                "https://example.test/2",
            )],
        );
        assert!(out.accepted.is_empty());
        assert_eq!(out.rejected[0].kind, DuplicateKind::SimilarTitle);
    }

    #[test]
    fn similar_title_different_category_is_kept() {
        let cat = catalog_with("memory leak in websocket handler", "https://example.test/1");
        let d = Deduplicator::new(0.85);
        let out = d.dedup(
            &cat,
            vec![item(
                "stackoverflow",
                "memory leak in websocket handlers",
                "https://example.test/3",
            )],
        );
        assert_eq!(out.accepted.len(), 1);
    }

    #[test]
    fn dissimilar_titles_pass_threshold() {
        let cat = catalog_with("memory leak in websocket handler", "https://example.test/1");
        let d = Deduplicator::new(0.85);
        let out = d.dedup(
            &cat,
            vec![item(
                "github/x/y",
                "add dark mode to settings page",
                "https://example.test/4",
            )],
        );
        assert_eq!(out.accepted.len(), 1);
    }

    #[test]
    fn rejected_counts_group_by_category() {
        let cat = MemoryCatalog::new();
        let d = Deduplicator::new(0.85);
        let batch = vec![
            item("github/a/b", "t1", "https://example.test/1"),
            item("github/c/d", "t2", "https://example.test/1/"),
            item("reddit/rust", "t3", "https://example.test/1?x=1"),
        ];
        let out = d.dedup(&cat, batch);
        let by_cat = out.rejected_by_category();
        assert_eq!(by_cat.get("github"), Some(&1));
        assert_eq!(by_cat.get("reddit"), Some(&1));
    }
}
