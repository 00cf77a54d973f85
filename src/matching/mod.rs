// src/matching/mod.rs
//! Matching engines: problem recommendations for one user and collaborator
//! suggestions for one (problem, requester) pair. Both are pure functions
//! over profiles and catalog snapshots.

pub mod collab;
pub mod recommend;

/// Case-insensitive skill/tech comparison. "Python" covers "python 3" and
/// vice versa; substring in either direction counts as a match.
pub(crate) fn skill_covers(skill: &str, tech: &str) -> bool {
    let skill = skill.to_lowercase();
    let tech = tech.to_lowercase();
    skill.contains(&tech) || tech.contains(&skill)
}
