// src/lib.rs
//! Problem shelf core: harvest candidate problems from public developer
//! platforms, deduplicate them into a canonical catalog, score their
//! quality, and match them to users and collaborators.

pub mod config;
pub mod dedup;
pub mod harvest;
pub mod matching;
pub mod model;
pub mod score;
pub mod service;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::config::ShelfConfig;
pub use crate::harvest::adapters::SourceAdapter;
pub use crate::model::{
    CandidateItem, CollaborationCandidate, Difficulty, EffortBucket, Engagement, HarvestSummary,
    Problem, Recommendation, ScoreBreakdown, SourceReport, UserProfile,
};
pub use crate::service::ProblemShelf;
pub use crate::store::{
    CatalogFilter, CatalogStore, MemoryCatalog, MemoryProfiles, ProfileStore, StoreError,
};

use tracing_subscriber::EnvFilter;

/// Install the process-wide tracing subscriber. Call once from the host
/// entrypoint; repeated calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
