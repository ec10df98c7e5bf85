//! Reviewer selection
//!
//! Picks are uniform over the eligible candidates. Randomness only spreads
//! review load; it is not a security control, so a seeded `StdRng` shared
//! by the whole process is enough.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::model::{TeamMember, User};

/// Upper bound on reviewers chosen when a pull request is opened
pub const MAX_INITIAL_REVIEWERS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentError {
    /// The candidate pool was empty after exclusions
    #[error("no eligible reviewer candidate")]
    NoCandidate,
}

/// Choose up to [`MAX_INITIAL_REVIEWERS`] distinct active members, never the author.
///
/// An empty result is valid: a pull request may have no reviewers.
pub fn select_initial_reviewers<R: Rng + ?Sized>(
    members: &[TeamMember],
    author_id: &str,
    rng: &mut R,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut candidates: Vec<&str> = members
        .iter()
        .filter(|m| m.is_active && m.user_id != author_id)
        .map(|m| m.user_id.as_str())
        .filter(|id| seen.insert(*id))
        .collect();

    candidates.shuffle(rng);
    candidates.truncate(MAX_INITIAL_REVIEWERS);

    candidates.into_iter().map(str::to_string).collect()
}

/// Choose one replacement for `old_reviewer_id` among `team_members`.
///
/// The pool excludes inactive members, the departing reviewer and anyone
/// already reviewing the pull request.
pub fn select_replacement_reviewer<R: Rng + ?Sized>(
    team_members: &[User],
    old_reviewer_id: &str,
    current_reviewers: &[String],
    rng: &mut R,
) -> Result<String, AssignmentError> {
    let pool: Vec<&User> = team_members
        .iter()
        .filter(|u| u.is_active)
        .filter(|u| u.user_id != old_reviewer_id)
        .filter(|u| !current_reviewers.iter().any(|r| r == &u.user_id))
        .collect();

    pool.choose(rng)
        .map(|u| u.user_id.clone())
        .ok_or(AssignmentError::NoCandidate)
}

/// Process-wide reviewer picker owning a single seeded generator
pub struct ReviewerSelector {
    rng: Mutex<StdRng>,
}

impl ReviewerSelector {
    /// Seed from the operating system's entropy source
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic selector, for tests and reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn initial_reviewers(&self, members: &[TeamMember], author_id: &str) -> Vec<String> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let picked = select_initial_reviewers(members, author_id, &mut *rng);
        debug!(
            "Selected {} initial reviewer(s) from {} member(s)",
            picked.len(),
            members.len()
        );
        picked
    }

    pub fn replacement_reviewer(
        &self,
        team_members: &[User],
        old_reviewer_id: &str,
        current_reviewers: &[String],
    ) -> Result<String, AssignmentError> {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        select_replacement_reviewer(team_members, old_reviewer_id, current_reviewers, &mut *rng)
    }
}

impl Default for ReviewerSelector {
    fn default() -> Self {
        Self::from_entropy()
    }
}
