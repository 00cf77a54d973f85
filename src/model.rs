// src/model.rs
//! Domain types shared across the harvest → dedup → score → match pipeline.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

pub type ProblemId = u64;
pub type UserId = u64;

/// Difficulty band, also used for user experience levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Ordinal rank used for level-distance computations.
    pub fn rank(self) -> i32 {
        match self {
            Difficulty::Beginner => 0,
            Difficulty::Intermediate => 1,
            Difficulty::Advanced => 2,
        }
    }

    pub fn distance(self, other: Difficulty) -> i32 {
        (self.rank() - other.rank()).abs()
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Intermediate
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        };
        f.write_str(s)
    }
}

/// Bucketed effort estimate derived from difficulty and tech-stack breadth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffortBucket {
    HoursOneToTwo,
    DaysOneToThree,
    DaysThreeToSeven,
    WeeksOneToTwo,
    MonthPlus,
}

impl Default for EffortBucket {
    fn default() -> Self {
        EffortBucket::DaysOneToThree
    }
}

impl fmt::Display for EffortBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EffortBucket::HoursOneToTwo => "1-2 hours",
            EffortBucket::DaysOneToThree => "1-3 days",
            EffortBucket::DaysThreeToSeven => "3-7 days",
            EffortBucket::WeeksOneToTwo => "1-2 weeks",
            EffortBucket::MonthPlus => "1+ month",
        };
        f.write_str(s)
    }
}

/// Origin-side engagement counters. Absent as a whole when the origin
/// exposes no such signals; the scorer substitutes a neutral default then.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub upvotes: u32,
    pub views: u32,
}

/// Raw item fetched by a source adapter. Ephemeral: either merged into a
/// `Problem` after dedup + scoring or dropped (and counted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub title: String,
    pub description: String,
    /// Origin identifier, e.g. "github/rust-lang/rust" or "reddit/techsupport".
    pub origin: String,
    /// Canonical identifying URL; dedup key after normalization.
    pub reference_locator: String,
    pub tags: Vec<String>,
    pub suggested_tech: Vec<String>,
    pub author: Option<String>,
    pub posted_at: Option<u64>,
    pub engagement: Option<Engagement>,
}

impl CandidateItem {
    /// Origin category = platform part of the origin identifier
    /// ("github/rust-lang/rust" → "github"). Title similarity only compares
    /// items of the same category.
    pub fn origin_category(&self) -> &str {
        self.origin.split('/').next().unwrap_or(&self.origin)
    }

    /// Returns the reason a required field is missing, if any.
    pub fn malformed_reason(&self) -> Option<&'static str> {
        if self.title.trim().is_empty() {
            return Some("missing title");
        }
        if !self.reference_locator.starts_with("http") {
            return Some("missing or non-http reference locator");
        }
        None
    }
}

/// Canonical deduplicated item. Created on first successful dedup + score,
/// mutated only by rescoring, never deleted during normal operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: ProblemId,
    pub title: String,
    pub description: String,
    pub origin: String,
    pub suggested_tech: Vec<String>,
    /// Normalized; unique across all Problems.
    pub reference_locator: String,
    pub tags: Vec<String>,
    pub quality_score: u8,
    pub difficulty: Difficulty,
    pub effort: EffortBucket,
    pub engagement: Option<Engagement>,
    pub created_at: u64,
    pub score_updated_at: Option<u64>,
}

impl Problem {
    pub fn origin_category(&self) -> &str {
        self.origin.split('/').next().unwrap_or(&self.origin)
    }
}

/// One scored dimension with its human-readable reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScore {
    pub score: u8,
    pub max: u8,
    pub reasons: Vec<String>,
}

impl SubScore {
    pub fn new(score: u8, max: u8, reasons: Vec<String>) -> Self {
        Self {
            score: score.min(max),
            max,
            reasons,
        }
    }
}

/// Explainable decomposition of a Problem's quality score. Always
/// recomputable from the Problem; never the persisted source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub description_quality: SubScore,
    pub technical_depth: SubScore,
    pub engagement: SubScore,
    pub reproducibility: SubScore,
    pub total: u8,
    pub difficulty: Difficulty,
    pub effort: EffortBucket,
}

impl ScoreBreakdown {
    pub fn all_reasons(&self) -> Vec<String> {
        let mut out = Vec::new();
        out.extend(self.description_quality.reasons.iter().cloned());
        out.extend(self.technical_depth.reasons.iter().cloned());
        out.extend(self.engagement.reasons.iter().cloned());
        out.extend(self.reproducibility.reasons.iter().cloned());
        out
    }
}

/// User profile; owned by the identity/collaborator subsystem and read-only
/// to this core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: String,
    pub skills: Vec<String>,
    pub experience_level: Difficulty,
    pub interests: Vec<String>,
    /// 0-100, maintained by the identity subsystem from user actions.
    pub activity_score: u8,
    pub preferred_difficulty: Difficulty,
    pub preferred_effort: EffortBucket,
    #[serde(default)]
    pub interested: HashSet<ProblemId>,
    #[serde(default)]
    pub claimed: HashSet<ProblemId>,
    #[serde(default)]
    pub rejected: HashSet<ProblemId>,
    /// Users currently collaborating with this user, per problem.
    #[serde(default)]
    pub collaborators: HashMap<ProblemId, HashSet<UserId>>,
    /// Count of past shared collaboration groups, per peer.
    #[serde(default)]
    pub shared_collaborations: HashMap<UserId, u32>,
}

impl UserProfile {
    pub fn collaborators_on(&self, problem: ProblemId) -> Option<&HashSet<UserId>> {
        self.collaborators.get(&problem)
    }
}

/// One ranked recommendation for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub problem: Problem,
    pub match_score: u8,
    pub reasons: Vec<String>,
}

/// A candidate collaborator for one (Problem, requesting user) pair.
/// Ephemeral; recomputed per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborationCandidate {
    pub profile: UserProfile,
    pub compatibility_score: u8,
    pub reasons: Vec<String>,
}

/// Per-adapter accounting for one harvest run. Holds the identity
/// `fetched = accepted + skipped_duplicate + skipped_malformed + failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    pub origin: String,
    pub requested: usize,
    pub fetched: usize,
    pub accepted: usize,
    pub skipped_duplicate: usize,
    pub skipped_malformed: usize,
    pub failed: usize,
    pub reason: Option<String>,
}

/// Result of one harvest run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestSummary {
    pub per_source: Vec<SourceReport>,
    pub total_accepted: usize,
}

impl HarvestSummary {
    pub fn report_for(&self, origin: &str) -> Option<&SourceReport> {
        self.per_source.iter().find(|r| r.origin == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_distance_is_symmetric() {
        assert_eq!(Difficulty::Beginner.distance(Difficulty::Advanced), 2);
        assert_eq!(Difficulty::Advanced.distance(Difficulty::Beginner), 2);
        assert_eq!(Difficulty::Intermediate.distance(Difficulty::Intermediate), 0);
    }

    #[test]
    fn origin_category_is_platform_prefix() {
        let item = CandidateItem {
            title: "t".into(),
            description: String::new(),
            origin: "github/rust-lang/rust".into(),
            reference_locator: "https://example.test/1".into(),
            tags: vec![],
            suggested_tech: vec![],
            author: None,
            posted_at: None,
            engagement: None,
        };
        assert_eq!(item.origin_category(), "github");
    }

    #[test]
    fn malformed_detection() {
        let mut item = CandidateItem {
            title: "  ".into(),
            description: "d".into(),
            origin: "hn".into(),
            reference_locator: "https://example.test/2".into(),
            tags: vec![],
            suggested_tech: vec![],
            author: None,
            posted_at: None,
            engagement: None,
        };
        assert_eq!(item.malformed_reason(), Some("missing title"));
        item.title = "ok".into();
        item.reference_locator = "ftp://nope".into();
        assert!(item.malformed_reason().is_some());
        item.reference_locator = "https://example.test/2".into();
        assert_eq!(item.malformed_reason(), None);
    }

    #[test]
    fn subscore_clamps_to_max() {
        let s = SubScore::new(40, 30, vec![]);
        assert_eq!(s.score, 30);
    }
}
