// src/matching/recommend.rs
//! Problem recommendations for one user. Four weighted dimensions: skills
//! (0-40), difficulty preference (0-20), interests (0-20), novelty (0-20).
//! Claimed and rejected problems never appear; weak matches (20 or below)
//! are dropped rather than ranked last.

use crate::matching::skill_covers;
use crate::model::{Problem, Recommendation, UserProfile};

const MIN_MATCH_SCORE: u8 = 20;

/// Rank `problems` for `user`, strongest match first. Ties break on
/// quality score, then on the more recently rescored problem.
pub fn recommend(user: &UserProfile, problems: &[Problem], limit: usize) -> Vec<Recommendation> {
    let mut out: Vec<Recommendation> = problems
        .iter()
        .filter(|p| !user.claimed.contains(&p.id) && !user.rejected.contains(&p.id))
        .filter_map(|p| {
            let (match_score, reasons) = match_score(user, p);
            (match_score > MIN_MATCH_SCORE).then(|| Recommendation {
                problem: p.clone(),
                match_score,
                reasons,
            })
        })
        .collect();

    out.sort_by(|a, b| {
        b.match_score
            .cmp(&a.match_score)
            .then(b.problem.quality_score.cmp(&a.problem.quality_score))
            .then(b.problem.score_updated_at.cmp(&a.problem.score_updated_at))
    });
    out.truncate(limit);
    out
}

pub(crate) fn match_score(user: &UserProfile, problem: &Problem) -> (u8, Vec<String>) {
    let mut score = 0u16;
    let mut reasons = Vec::new();

    // Skills vs the problem's suggested stack (0-40).
    if problem.suggested_tech.is_empty() {
        score += 20;
        reasons.push("General problem, any stack applies".to_string());
    } else {
        let matched = problem
            .suggested_tech
            .iter()
            .filter(|tech| user.skills.iter().any(|s| skill_covers(s, tech)))
            .count();
        let ratio = matched as f32 / problem.suggested_tech.len() as f32;
        score += (ratio * 40.0).round() as u16;
        if matched > 0 {
            reasons.push(format!(
                "Matches {matched} of {} required technologies",
                problem.suggested_tech.len()
            ));
        }
    }

    // Difficulty preference (0-20).
    match user.preferred_difficulty.distance(problem.difficulty) {
        0 => {
            score += 20;
            reasons.push(format!("Preferred difficulty ({})", problem.difficulty));
        }
        1 => {
            score += 10;
            reasons.push("Near your preferred difficulty".to_string());
        }
        _ => score += 5,
    }

    // Interests vs tags and text (0-20).
    let mut interest_score = 0u16;
    for interest in &user.interests {
        let lower = interest.to_lowercase();
        if problem.tags.iter().any(|t| t.to_lowercase().contains(&lower)) {
            interest_score += 10;
            reasons.push(format!("Tagged with your interest: {interest}"));
        } else if problem.title.to_lowercase().contains(&lower)
            || problem.description.to_lowercase().contains(&lower)
        {
            interest_score += 5;
            reasons.push(format!("Touches your interest: {interest}"));
        }
    }
    score += interest_score.min(20);

    // Novelty (0-20): already-tracked problems rank below fresh ones.
    if user.interested.contains(&problem.id) {
        score += 5;
        reasons.push("Already on your interested list".to_string());
    } else {
        score += 20;
    }

    (score.min(100) as u8, reasons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, EffortBucket};

    fn problem(id: u64, tech: &[&str], difficulty: Difficulty, quality: u8) -> Problem {
        Problem {
            id,
            title: format!("Problem {id}"),
            description: "a bug in the api".to_string(),
            origin: "github/acme/widget".to_string(),
            suggested_tech: tech.iter().map(|s| s.to_string()).collect(),
            reference_locator: format!("https://example.test/{id}"),
            tags: vec!["backend".to_string()],
            quality_score: quality,
            difficulty,
            effort: EffortBucket::DaysOneToThree,
            engagement: None,
            created_at: 1_767_000_000,
            score_updated_at: Some(1_767_000_000 + id),
        }
    }

    fn user(skills: &[&str], preferred: Difficulty) -> UserProfile {
        UserProfile {
            user_id: 1,
            username: "ada".to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            preferred_difficulty: preferred,
            ..UserProfile::default()
        }
    }

    #[test]
    fn full_skill_and_difficulty_match_scores_high() {
        let u = user(&["Python", "Docker"], Difficulty::Intermediate);
        let p = problem(1, &["Python", "Docker"], Difficulty::Intermediate, 60);
        let (score, reasons) = match_score(&u, &p);
        // 40 skills + 20 difficulty + 0 interests + 20 novelty.
        assert_eq!(score, 80);
        assert!(reasons.iter().any(|r| r.contains("2 of 2")));
    }

    #[test]
    fn claimed_and_rejected_problems_are_excluded() {
        let mut u = user(&["Python"], Difficulty::Intermediate);
        u.claimed.insert(1);
        u.rejected.insert(2);
        let problems = vec![
            problem(1, &["Python"], Difficulty::Intermediate, 60),
            problem(2, &["Python"], Difficulty::Intermediate, 60),
            problem(3, &["Python"], Difficulty::Intermediate, 60),
        ];
        let recs = recommend(&u, &problems, 10);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].problem.id, 3);
    }

    #[test]
    fn interested_problems_lose_novelty_but_stay_ranked() {
        let mut u = user(&["Python"], Difficulty::Intermediate);
        u.interested.insert(1);
        let fresh = problem(2, &["Python"], Difficulty::Intermediate, 60);
        let seen = problem(1, &["Python"], Difficulty::Intermediate, 60);
        let recs = recommend(&u, &[seen, fresh], 10);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].problem.id, 2);
        assert_eq!(recs[0].match_score - recs[1].match_score, 15);
    }

    #[test]
    fn weak_matches_are_dropped() {
        // No skill overlap, far difficulty, no interests: 0 + 5 + 0 + 20 > 20
        // still passes; push it under the floor by marking it interested.
        let mut u = user(&["Haskell"], Difficulty::Beginner);
        u.interested.insert(1);
        let p = problem(1, &["Rust", "Kubernetes"], Difficulty::Advanced, 90);
        assert!(recommend(&u, &[p], 10).is_empty());
    }

    #[test]
    fn ties_break_on_quality_then_recency() {
        let u = user(&["Python"], Difficulty::Intermediate);
        let mut low = problem(1, &["Python"], Difficulty::Intermediate, 50);
        let mut high = problem(2, &["Python"], Difficulty::Intermediate, 80);
        low.score_updated_at = Some(10);
        high.score_updated_at = Some(10);
        let recs = recommend(&u, &[low.clone(), high.clone()], 10);
        assert_eq!(recs[0].problem.id, 2);

        let mut newer = low.clone();
        newer.id = 3;
        newer.score_updated_at = Some(99);
        let recs = recommend(&u, &[low, newer], 10);
        assert_eq!(recs[0].problem.id, 3);
    }

    #[test]
    fn limit_truncates_results() {
        let u = user(&["Python"], Difficulty::Intermediate);
        let problems: Vec<Problem> = (1..=5)
            .map(|id| problem(id, &["Python"], Difficulty::Intermediate, 60))
            .collect();
        assert_eq!(recommend(&u, &problems, 2).len(), 2);
    }
}
