// src/store.rs
//! Catalog and profile store collaborators. The core only ever touches
//! persistence through these traits; the in-memory implementations back the
//! service in tests and single-process deployments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use thiserror::Error;

use crate::model::{Difficulty, Problem, ProblemId, UserId, UserProfile};

/// Conjunctive catalog filters; `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub difficulty: Option<Difficulty>,
    pub origin_category: Option<String>,
    pub min_quality: Option<u8>,
    /// Case-insensitive match against the suggested tech tags.
    pub tech: Option<String>,
}

impl CatalogFilter {
    pub fn matches(&self, problem: &Problem) -> bool {
        if let Some(d) = self.difficulty {
            if problem.difficulty != d {
                return false;
            }
        }
        if let Some(cat) = &self.origin_category {
            if problem.origin_category() != cat {
                return false;
            }
        }
        if let Some(min) = self.min_quality {
            if problem.quality_score < min {
                return false;
            }
        }
        if let Some(tech) = &self.tech {
            let tech = tech.to_lowercase();
            if !problem
                .suggested_tech
                .iter()
                .any(|t| t.to_lowercase().contains(&tech))
            {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Another Problem already owns this normalized reference locator.
    #[error("reference locator already present: {0}")]
    ConstraintViolation(String),
    #[error("problem not found: {0}")]
    ProblemNotFound(ProblemId),
    #[error("user not found: {0}")]
    UserNotFound(UserId),
}

/// Catalog of canonical Problems. `insert` must enforce the locator
/// uniqueness invariant.
pub trait CatalogStore: Send + Sync {
    fn find_by_reference_locator(&self, key: &str) -> Option<Problem>;
    fn get(&self, id: ProblemId) -> Option<Problem>;
    /// Fails with `ConstraintViolation` if the locator is already present.
    fn insert(&self, problem: Problem) -> Result<ProblemId, StoreError>;
    fn update(&self, problem: Problem) -> Result<(), StoreError>;
    fn all(&self) -> Vec<Problem>;
    /// Problems matching all set filter fields, ordered by id.
    fn query(&self, filter: &CatalogFilter) -> Vec<Problem> {
        self.all().into_iter().filter(|p| filter.matches(p)).collect()
    }
    /// Next stable identifier for a newly created Problem.
    fn next_id(&self) -> ProblemId;
}

/// Read-only access to user profiles, owned by the identity subsystem.
pub trait ProfileStore: Send + Sync {
    fn get_profile(&self, user_id: UserId) -> Option<UserProfile>;
    /// Users who expressed interest in the given Problem.
    fn interested_in(&self, problem_id: ProblemId) -> Vec<UserProfile>;
}

/// RwLock-backed catalog keyed by id, with a locator index for O(1) dedup
/// lookups.
#[derive(Default)]
pub struct MemoryCatalog {
    inner: RwLock<CatalogInner>,
    next_id: AtomicU64,
}

#[derive(Default)]
struct CatalogInner {
    by_id: HashMap<ProblemId, Problem>,
    by_locator: HashMap<String, ProblemId>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CatalogInner::default()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("catalog lock poisoned").by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CatalogStore for MemoryCatalog {
    fn find_by_reference_locator(&self, key: &str) -> Option<Problem> {
        let inner = self.inner.read().expect("catalog lock poisoned");
        inner
            .by_locator
            .get(key)
            .and_then(|id| inner.by_id.get(id))
            .cloned()
    }

    fn get(&self, id: ProblemId) -> Option<Problem> {
        self.inner
            .read()
            .expect("catalog lock poisoned")
            .by_id
            .get(&id)
            .cloned()
    }

    fn insert(&self, problem: Problem) -> Result<ProblemId, StoreError> {
        let mut inner = self.inner.write().expect("catalog lock poisoned");
        if inner.by_locator.contains_key(&problem.reference_locator) {
            return Err(StoreError::ConstraintViolation(
                problem.reference_locator.clone(),
            ));
        }
        let id = problem.id;
        inner
            .by_locator
            .insert(problem.reference_locator.clone(), id);
        inner.by_id.insert(id, problem);
        Ok(id)
    }

    fn update(&self, problem: Problem) -> Result<(), StoreError> {
        let mut inner = self.inner.write().expect("catalog lock poisoned");
        if !inner.by_id.contains_key(&problem.id) {
            return Err(StoreError::ProblemNotFound(problem.id));
        }
        inner.by_id.insert(problem.id, problem);
        Ok(())
    }

    fn all(&self) -> Vec<Problem> {
        let mut v: Vec<Problem> = self
            .inner
            .read()
            .expect("catalog lock poisoned")
            .by_id
            .values()
            .cloned()
            .collect();
        v.sort_by_key(|p| p.id);
        v
    }

    fn next_id(&self) -> ProblemId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// RwLock-backed profile store seeded by the host.
#[derive(Default)]
pub struct MemoryProfiles {
    inner: RwLock<HashMap<UserId, UserProfile>>,
}

impl MemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        let map = profiles.into_iter().map(|p| (p.user_id, p)).collect();
        Self {
            inner: RwLock::new(map),
        }
    }

    pub fn upsert(&self, profile: UserProfile) {
        self.inner
            .write()
            .expect("profiles lock poisoned")
            .insert(profile.user_id, profile);
    }
}

impl ProfileStore for MemoryProfiles {
    fn get_profile(&self, user_id: UserId) -> Option<UserProfile> {
        self.inner
            .read()
            .expect("profiles lock poisoned")
            .get(&user_id)
            .cloned()
    }

    fn interested_in(&self, problem_id: ProblemId) -> Vec<UserProfile> {
        let mut v: Vec<UserProfile> = self
            .inner
            .read()
            .expect("profiles lock poisoned")
            .values()
            .filter(|p| p.interested.contains(&problem_id))
            .cloned()
            .collect();
        v.sort_by_key(|p| p.user_id);
        v
    }
}
