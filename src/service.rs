// src/service.rs
//! Service facade over the whole pipeline: one harvest entry point plus
//! rescoring, recommendations, and collaborator suggestions. Storage comes
//! in through the `CatalogStore`/`ProfileStore` traits, sources through
//! `SourceAdapter`, so hosts and tests wire their own implementations.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;

use crate::config::ShelfConfig;
use crate::dedup::Deduplicator;
use crate::harvest::adapters::SourceAdapter;
use crate::harvest::Harvester;
use crate::matching::{collab, recommend};
use crate::model::{
    CollaborationCandidate, HarvestSummary, Problem, ProblemId, Recommendation, ScoreBreakdown,
    UserId,
};
use crate::score::QualityScorer;
use crate::store::{CatalogStore, ProfileStore, StoreError};

pub struct ProblemShelf {
    catalog: Arc<dyn CatalogStore>,
    profiles: Arc<dyn ProfileStore>,
    harvester: Harvester,
    dedup: Deduplicator,
    scorer: QualityScorer,
}

impl ProblemShelf {
    pub fn new(
        cfg: &ShelfConfig,
        catalog: Arc<dyn CatalogStore>,
        profiles: Arc<dyn ProfileStore>,
        adapters: Vec<Arc<dyn SourceAdapter>>,
    ) -> Self {
        Self {
            catalog,
            profiles,
            harvester: Harvester::new(adapters, &cfg.harvest),
            dedup: Deduplicator::new(cfg.dedup.title_similarity_threshold),
            scorer: QualityScorer::new(cfg.scoring.clone()),
        }
    }

    /// Run one harvest toward `target` new problems. Never fails as a
    /// whole; per-source outcomes land in the summary, and each report
    /// satisfies `fetched = accepted + duplicates + malformed + failed`.
    pub async fn harvest(&self, target: usize) -> HarvestSummary {
        let batch = self.harvester.run(target).await;
        let mut reports = batch.reports;

        // Validation precedes dedup so malformed items never consume a
        // duplicate slot.
        let mut malformed: HashMap<String, usize> = HashMap::new();
        let mut sound = Vec::with_capacity(batch.items.len());
        for item in batch.items {
            match item.malformed_reason() {
                Some(reason) => {
                    let category = item.origin_category().to_string();
                    tracing::warn!(origin = %item.origin, reason, "dropping malformed item");
                    counter!("harvest_malformed_total", "origin" => category.clone()).increment(1);
                    *malformed.entry(category).or_insert(0) += 1;
                }
                None => sound.push(item),
            }
        }

        let outcome = self.dedup.dedup(self.catalog.as_ref(), sound);
        let mut duplicates = outcome.rejected_by_category();

        let mut accepted: HashMap<String, usize> = HashMap::new();
        let mut failed: HashMap<String, usize> = HashMap::new();
        for item in outcome.accepted {
            let category = item.origin_category().to_string();
            match self.admit(item) {
                Ok(_) => {
                    counter!("harvest_accepted_total", "origin" => category.clone()).increment(1);
                    *accepted.entry(category).or_insert(0) += 1;
                }
                // The catalog can still hold a locator the in-batch pass
                // missed, e.g. one written by a concurrent harvest.
                Err(StoreError::ConstraintViolation(_)) => {
                    *duplicates.entry(category).or_insert(0) += 1;
                }
                Err(e) => {
                    tracing::warn!(origin = %category, error = %e, "catalog insert failed");
                    *failed.entry(category).or_insert(0) += 1;
                }
            }
        }
        for (category, n) in &duplicates {
            counter!("harvest_duplicate_total", "origin" => category.clone()).increment(*n as u64);
        }

        let mut total_accepted = 0;
        for report in &mut reports {
            report.accepted = accepted.get(&report.origin).copied().unwrap_or(0);
            report.skipped_duplicate = duplicates.get(&report.origin).copied().unwrap_or(0);
            report.skipped_malformed = malformed.get(&report.origin).copied().unwrap_or(0);
            report.failed = failed.get(&report.origin).copied().unwrap_or(0);
            total_accepted += report.accepted;
            tracing::info!(
                origin = %report.origin,
                requested = report.requested,
                fetched = report.fetched,
                accepted = report.accepted,
                duplicates = report.skipped_duplicate,
                malformed = report.skipped_malformed,
                "source report"
            );
        }

        HarvestSummary {
            per_source: reports,
            total_accepted,
        }
    }

    /// Score a deduplicated item and insert it as a new Problem. Items have
    /// no catalog-side interest yet, so the interest input is zero.
    fn admit(&self, item: crate::model::CandidateItem) -> Result<ProblemId, StoreError> {
        let locator = crate::dedup::normalize_locator(&item.reference_locator);
        let breakdown = self.scorer.score_parts(
            &item.description,
            &item.suggested_tech,
            &locator,
            0,
            item.engagement,
        );
        let problem = Problem {
            id: self.catalog.next_id(),
            title: item.title,
            description: item.description,
            origin: item.origin,
            suggested_tech: item.suggested_tech,
            reference_locator: locator,
            tags: item.tags,
            quality_score: breakdown.total,
            difficulty: breakdown.difficulty,
            effort: breakdown.effort,
            engagement: item.engagement,
            created_at: item.posted_at.unwrap_or_else(now_unix),
            score_updated_at: Some(now_unix()),
        };
        self.catalog.insert(problem)
    }

    /// Recompute one Problem's score from its current state and interest
    /// count, persist it, and return the explainable breakdown.
    pub fn score_problem(&self, id: ProblemId) -> Result<ScoreBreakdown, StoreError> {
        let mut problem = self
            .catalog
            .get(id)
            .ok_or(StoreError::ProblemNotFound(id))?;
        let interested = self.profiles.interested_in(id).len() as u32;
        let breakdown = self.scorer.score(&problem, interested);

        problem.quality_score = breakdown.total;
        problem.difficulty = breakdown.difficulty;
        problem.effort = breakdown.effort;
        problem.score_updated_at = Some(now_unix());
        self.catalog.update(problem)?;
        Ok(breakdown)
    }

    pub fn recommend(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<Recommendation>, StoreError> {
        let profile = self
            .profiles
            .get_profile(user_id)
            .ok_or(StoreError::UserNotFound(user_id))?;
        Ok(recommend::recommend(&profile, &self.catalog.all(), limit))
    }

    /// Candidate collaborators come from the pool of users already
    /// interested in the problem.
    pub fn suggest_collaborators(
        &self,
        user_id: UserId,
        problem_id: ProblemId,
        limit: usize,
    ) -> Result<Vec<CollaborationCandidate>, StoreError> {
        let requester = self
            .profiles
            .get_profile(user_id)
            .ok_or(StoreError::UserNotFound(user_id))?;
        let problem = self
            .catalog
            .get(problem_id)
            .ok_or(StoreError::ProblemNotFound(problem_id))?;
        let pool = self.profiles.interested_in(problem_id);
        Ok(collab::suggest_collaborators(
            &requester, &problem, &pool, limit,
        ))
    }
}

fn now_unix() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
