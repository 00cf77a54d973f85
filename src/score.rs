// src/score.rs
//! Heuristic quality scorer. Pure and deterministic: the same inputs always
//! produce the same `ScoreBreakdown`. Four weighted dimensions with
//! human-readable reasons; total maps to a difficulty band and an effort
//! bucket via the configured cut points.

use crate::config::ScoringConfig;
use crate::model::{
    Difficulty, EffortBucket, Engagement, Problem, ScoreBreakdown, SubScore,
};

const TECH_KEYWORDS: &[&str] = &[
    "error", "function", "api", "database", "bug", "crash", "issue",
];

const COMPLEX_TECHS: &[&str] = &[
    "kubernetes",
    "microservices",
    "distributed",
    "ml",
    "ai",
    "docker",
    "cloud",
];

const REPRO_KEYWORDS: &[&str] = &["step", "setup", "install", "run", "reproduce", "how to"];

const ENV_KEYWORDS: &[&str] = &[
    "version",
    "os",
    "environment",
    "python",
    "node",
    "npm",
    "using",
];

pub struct QualityScorer {
    cfg: ScoringConfig,
}

impl QualityScorer {
    pub fn new(cfg: ScoringConfig) -> Self {
        Self { cfg }
    }

    /// Score a Problem together with its catalog-side interest count.
    /// No I/O, no clocks; the caller stamps `score_updated_at`.
    pub fn score(&self, problem: &Problem, interested_count: u32) -> ScoreBreakdown {
        self.score_parts(
            &problem.description,
            &problem.suggested_tech,
            &problem.reference_locator,
            interested_count,
            problem.engagement,
        )
    }

    pub fn score_parts(
        &self,
        description: &str,
        suggested_tech: &[String],
        reference_locator: &str,
        interested_count: u32,
        engagement: Option<Engagement>,
    ) -> ScoreBreakdown {
        let description_quality = self.score_description(description);
        let technical_depth = self.score_tech_depth(suggested_tech);
        let engagement_score = self.score_engagement(interested_count, engagement);
        let reproducibility = self.score_reproducibility(description, reference_locator);

        let total = (description_quality.score as u16
            + technical_depth.score as u16
            + engagement_score.score as u16
            + reproducibility.score as u16)
            .min(self.cfg.total_max()) as u8;

        let difficulty = self.classify_difficulty(total);
        let effort = estimate_effort(difficulty, suggested_tech.len());

        ScoreBreakdown {
            description_quality,
            technical_depth,
            engagement: engagement_score,
            reproducibility,
            total,
            difficulty,
            effort,
        }
    }

    /// Description clarity and completeness (default max 30): length band,
    /// technical keywords, code markers, error details, explicit questions.
    fn score_description(&self, description: &str) -> SubScore {
        if description.trim().is_empty() {
            return SubScore::new(
                0,
                self.cfg.description_max,
                vec!["No description provided".into()],
            );
        }

        let mut score = 0u16;
        let mut reasons = Vec::new();
        let lower = description.to_lowercase();
        let length = description.chars().count();

        if (100..=500).contains(&length) {
            score += 10;
            reasons.push("Good description length".into());
        } else if (50..100).contains(&length) {
            score += 5;
            reasons.push("Adequate description length".into());
        } else if length > 500 {
            score += 7;
            reasons.push("Detailed description".into());
        }

        let keyword_hits = TECH_KEYWORDS.iter().filter(|kw| lower.contains(*kw)).count();
        score += keyword_hits.min(5) as u16;
        if keyword_hits > 2 {
            reasons.push(format!("Technical depth ({keyword_hits} keywords)"));
        }

        if description.contains('`') {
            score += 5;
            reasons.push("Includes code snippets".into());
        }

        if lower.contains("error:") || lower.contains("exception") {
            score += 5;
            reasons.push("Includes error details".into());
        }

        if description.contains('?') {
            score += 5;
            reasons.push("Clear questions asked".into());
        }

        SubScore::new(score.min(255) as u8, self.cfg.description_max, reasons)
    }

    /// Technical complexity (default max 25): tech-stack breadth,
    /// complex-stack indicators, version specificity.
    fn score_tech_depth(&self, suggested_tech: &[String]) -> SubScore {
        if suggested_tech.is_empty() {
            return SubScore::new(5, self.cfg.tech_depth_max, vec!["Basic problem".into()]);
        }

        let mut score = 0u16;
        let mut reasons = Vec::new();
        let tech_count = suggested_tech.len();

        score += (tech_count * 3).min(10) as u16;
        if tech_count > 2 {
            reasons.push(format!("Multi-tech problem ({tech_count} technologies)"));
        }

        let joined = suggested_tech.join(",").to_lowercase();
        if COMPLEX_TECHS.iter().any(|t| joined.contains(t)) {
            score += 10;
            reasons.push("Advanced/complex technologies".into());
        }

        if joined.chars().any(|c| c.is_ascii_digit()) {
            score += 5;
            reasons.push("Version-specific problem".into());
        }

        SubScore::new(score.min(255) as u8, self.cfg.tech_depth_max, reasons)
    }

    /// Community engagement (default max 25). Missing origin signals are an
    /// expected condition, not an error: the configured neutral default is
    /// substituted and explained.
    fn score_engagement(&self, interested_count: u32, engagement: Option<Engagement>) -> SubScore {
        let Some(eng) = engagement else {
            return SubScore::new(
                self.cfg.engagement_neutral,
                self.cfg.engagement_max,
                vec!["Engagement signals unavailable, neutral default applied".into()],
            );
        };

        let mut score = 0u32;
        let mut reasons = Vec::new();

        score += (interested_count * 2).min(10);
        if interested_count > 3 {
            reasons.push(format!("High interest ({interested_count} users)"));
        }

        score += eng.upvotes.min(10);
        if eng.upvotes > 5 {
            reasons.push(format!("Well-received ({} upvotes)", eng.upvotes));
        }

        if eng.views > 100 {
            score += 5;
            reasons.push("High visibility".into());
        } else if eng.views > 50 {
            score += 3;
            reasons.push("Good visibility".into());
        } else if eng.views > 10 {
            score += 1;
        }

        SubScore::new(score.min(255) as u8, self.cfg.engagement_max, reasons)
    }

    /// Reproducibility (default max 20): reference link, reproduction-step
    /// keywords, environment details.
    fn score_reproducibility(&self, description: &str, reference_locator: &str) -> SubScore {
        let mut score = 0u16;
        let mut reasons = Vec::new();
        let lower = description.to_lowercase();

        if reference_locator.starts_with("http") {
            score += 10;
            reasons.push("Has reference link".into());
        }

        if REPRO_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            score += 5;
            reasons.push("Includes reproduction steps".into());
        }

        if ENV_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            score += 5;
            reasons.push("Specifies environment".into());
        }

        SubScore::new(score.min(255) as u8, self.cfg.reproducibility_max, reasons)
    }

    fn classify_difficulty(&self, total: u8) -> Difficulty {
        if total < self.cfg.beginner_below {
            Difficulty::Beginner
        } else if total > self.cfg.advanced_above {
            Difficulty::Advanced
        } else {
            Difficulty::Intermediate
        }
    }
}

/// Effort bucket from difficulty and tech-stack breadth; thresholds follow
/// the documented defaults.
pub fn estimate_effort(difficulty: Difficulty, tech_count: usize) -> EffortBucket {
    match difficulty {
        Difficulty::Beginner => EffortBucket::HoursOneToTwo,
        Difficulty::Intermediate => {
            if tech_count < 3 {
                EffortBucket::DaysOneToThree
            } else {
                EffortBucket::DaysThreeToSeven
            }
        }
        Difficulty::Advanced => {
            if tech_count < 4 {
                EffortBucket::WeeksOneToTwo
            } else {
                EffortBucket::MonthPlus
            }
        }
    }
}
