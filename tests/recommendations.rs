// tests/recommendations.rs
// Recommendation ranking through the service facade.

use std::sync::Arc;

use problem_shelf::{
    Difficulty, EffortBucket, MemoryCatalog, MemoryProfiles, Problem, ProblemShelf, ShelfConfig,
    UserProfile,
};
use problem_shelf::store::CatalogStore;

fn problem(id: u64, title: &str, tech: &[&str], difficulty: Difficulty, quality: u8) -> Problem {
    Problem {
        id,
        title: title.to_string(),
        description: "an api bug that needs fixing".to_string(),
        origin: "github/acme/widget".to_string(),
        suggested_tech: tech.iter().map(|s| s.to_string()).collect(),
        reference_locator: format!("https://example.test/problems/{id}"),
        tags: vec!["backend".to_string()],
        quality_score: quality,
        difficulty,
        effort: EffortBucket::DaysOneToThree,
        engagement: None,
        created_at: 1_767_000_000,
        score_updated_at: Some(1_767_000_000),
    }
}

fn shelf(problems: Vec<Problem>, users: Vec<UserProfile>) -> ProblemShelf {
    let catalog = Arc::new(MemoryCatalog::new());
    for p in problems {
        catalog.insert(p).unwrap();
    }
    ProblemShelf::new(
        &ShelfConfig::default(),
        catalog,
        Arc::new(MemoryProfiles::seed(users)),
        vec![],
    )
}

fn user(id: u64, skills: &[&str]) -> UserProfile {
    UserProfile {
        user_id: id,
        username: format!("user{id}"),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        preferred_difficulty: Difficulty::Intermediate,
        ..UserProfile::default()
    }
}

#[tokio::test]
async fn skill_overlap_dominates_the_ranking() {
    let shelf = shelf(
        vec![
            problem(1, "Fix the python scraper", &["Python"], Difficulty::Intermediate, 50),
            problem(2, "Tune the rust allocator", &["Rust"], Difficulty::Intermediate, 50),
        ],
        vec![user(1, &["Python"])],
    );

    let recs = shelf.recommend(1, 10).unwrap();
    assert_eq!(recs[0].problem.id, 1);
    assert!(recs[0].match_score > recs.get(1).map(|r| r.match_score).unwrap_or(0));
}

#[tokio::test]
async fn claimed_and_rejected_never_come_back() {
    let mut u = user(1, &["Python"]);
    u.claimed.insert(1);
    u.rejected.insert(2);
    let shelf = shelf(
        vec![
            problem(1, "Fix the python scraper", &["Python"], Difficulty::Intermediate, 50),
            problem(2, "Patch the python cli", &["Python"], Difficulty::Intermediate, 50),
            problem(3, "Debug the python service", &["Python"], Difficulty::Intermediate, 50),
        ],
        vec![u],
    );

    let recs = shelf.recommend(1, 10).unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].problem.id, 3);
}

#[tokio::test]
async fn equal_scores_rank_by_quality() {
    let shelf = shelf(
        vec![
            problem(1, "Fix the python scraper", &["Python"], Difficulty::Intermediate, 40),
            problem(2, "Patch the python daemon", &["Python"], Difficulty::Intermediate, 90),
        ],
        vec![user(1, &["Python"])],
    );

    let recs = shelf.recommend(1, 10).unwrap();
    assert_eq!(recs[0].problem.id, 2);
    assert_eq!(recs[0].match_score, recs[1].match_score);
}

#[tokio::test]
async fn reasons_explain_the_match() {
    let mut u = user(1, &["Python"]);
    u.interests = vec!["backend".to_string()];
    let shelf = shelf(
        vec![problem(1, "Fix the python scraper", &["Python"], Difficulty::Intermediate, 50)],
        vec![u],
    );

    let recs = shelf.recommend(1, 10).unwrap();
    let reasons = recs[0].reasons.join("; ");
    assert!(reasons.contains("1 of 1"));
    assert!(reasons.contains("backend"));
}
