// src/matching/collab.rs
//! Collaborator suggestions for one (problem, requester) pair. Dimensions:
//! skill complementarity (0-35), experience fit (0-20), activity alignment
//! (0-25), past shared success (0-20, zero when there is no history).

use crate::matching::skill_covers;
use crate::model::{CollaborationCandidate, Difficulty, Problem, UserProfile};

/// Rank candidate collaborators for `requester` on `problem`. The requester
/// and anyone already collaborating on the problem are excluded; ties break
/// on the more active candidate.
pub fn suggest_collaborators(
    requester: &UserProfile,
    problem: &Problem,
    candidates: &[UserProfile],
    limit: usize,
) -> Vec<CollaborationCandidate> {
    let existing = requester.collaborators_on(problem.id);

    let mut out: Vec<CollaborationCandidate> = candidates
        .iter()
        .filter(|c| c.user_id != requester.user_id)
        .filter(|c| !existing.is_some_and(|set| set.contains(&c.user_id)))
        .map(|c| {
            let (compatibility_score, reasons) = compatibility(requester, c, problem);
            CollaborationCandidate {
                profile: c.clone(),
                compatibility_score,
                reasons,
            }
        })
        .collect();

    out.sort_by(|a, b| {
        b.compatibility_score
            .cmp(&a.compatibility_score)
            .then(b.profile.activity_score.cmp(&a.profile.activity_score))
    });
    out.truncate(limit);
    out
}

pub(crate) fn compatibility(
    requester: &UserProfile,
    candidate: &UserProfile,
    problem: &Problem,
) -> (u8, Vec<String>) {
    let mut score = 0u16;
    let mut reasons = Vec::new();

    score += complementarity(requester, candidate, problem, &mut reasons);
    score += experience_fit(
        requester.experience_level,
        candidate.experience_level,
        problem.difficulty,
        &mut reasons,
    );
    score += activity_alignment(requester.activity_score, candidate.activity_score, &mut reasons);
    score += past_success(requester, candidate, &mut reasons);

    (score.min(100) as u8, reasons)
}

/// Skill complementarity (0-35): how much of the stack the requester lacks
/// does the candidate cover, plus a bonus for bringing anything new.
fn complementarity(
    requester: &UserProfile,
    candidate: &UserProfile,
    problem: &Problem,
    reasons: &mut Vec<String>,
) -> u16 {
    if problem.suggested_tech.is_empty() {
        reasons.push("General problem, any pairing works".to_string());
        return 15;
    }

    let gap: Vec<&String> = problem
        .suggested_tech
        .iter()
        .filter(|tech| !requester.skills.iter().any(|s| skill_covers(s, tech)))
        .collect();

    let brings_new = candidate
        .skills
        .iter()
        .any(|s| !requester.skills.iter().any(|r| skill_covers(r, s)));

    if gap.is_empty() {
        // Requester already covers the stack alone.
        if brings_new {
            reasons.push("Brings additional skills".to_string());
            return 10 + 10;
        }
        return 10;
    }

    let covered = gap
        .iter()
        .filter(|tech| candidate.skills.iter().any(|s| skill_covers(s, tech)))
        .count();
    let ratio = covered as f32 / gap.len() as f32;
    let mut score = (ratio * 25.0).round() as u16;
    if covered > 0 {
        reasons.push(format!("Covers {covered} of {} missing skills", gap.len()));
    }
    if brings_new {
        score += 10;
        reasons.push("Brings additional skills".to_string());
    }
    score.min(35)
}

/// Experience balance (0-20), scored on both users against the problem:
/// both at the problem's level 20, one matching with the other adjacent 15,
/// adjacent levels 12. A pair at extreme level distance scores the floor
/// even when one of them fits the problem alone.
fn experience_fit(
    requester_level: Difficulty,
    candidate_level: Difficulty,
    problem_difficulty: Difficulty,
    reasons: &mut Vec<String>,
) -> u16 {
    let requester_gap = requester_level.distance(problem_difficulty);
    let candidate_gap = candidate_level.distance(problem_difficulty);
    let pair_gap = requester_level.distance(candidate_level);

    if requester_gap == 0 && candidate_gap == 0 {
        reasons.push(format!("Both match {problem_difficulty}"));
        20
    } else if (requester_gap == 0 && candidate_gap == 1)
        || (candidate_gap == 0 && requester_gap == 1)
    {
        reasons.push("One matches the difficulty, the other is close".to_string());
        15
    } else if pair_gap <= 1 {
        reasons.push("Adjacent experience levels".to_string());
        12
    } else {
        reasons.push("Wide experience gap".to_string());
        8
    }
}

/// Activity alignment (0-25): both-active pairs score high; a wide activity
/// gap predicts an unbalanced collaboration and is penalized.
fn activity_alignment(requester: u8, candidate: u8, reasons: &mut Vec<String>) -> u16 {
    let avg = (requester as f32 + candidate as f32) / 2.0;
    let mut score = avg * 0.25;
    if requester.abs_diff(candidate) > 40 {
        score -= 10.0;
        reasons.push("Large activity gap".to_string());
    } else if avg >= 60.0 {
        reasons.push("Both actively engaged".to_string());
    }
    score.clamp(0.0, 25.0).round() as u16
}

/// Past shared success (0-20). No shared history scores zero rather than a
/// neutral default, so strangers are not boosted over proven pairs.
fn past_success(requester: &UserProfile, candidate: &UserProfile, reasons: &mut Vec<String>) -> u16 {
    let shared = requester
        .shared_collaborations
        .get(&candidate.user_id)
        .copied()
        .unwrap_or(0);
    if shared == 0 {
        return 0;
    }
    reasons.push(format!("{shared} past shared collaborations"));
    (10 + shared as u16 * 5).min(20)
}
