//! Pull request lifecycle: team management, reviewer assignment and merge
//!
//! Input is validated before any store call. Every multi-row write goes
//! through one atomic store operation, and races that slip past the
//! read-side checks are caught by the store's conditional writes and
//! classified here.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::assignment::ReviewerSelector;
use crate::error::{ServiceError, ServiceResult};
use crate::model::{PrStatus, PullRequest, PullRequestShort, Team, User};
use crate::store::{ReviewStore, StoreError};

/// Swap attempts before a reassignment that keeps losing races gives up
const MAX_SWAP_ATTEMPTS: usize = 3;

/// Entry point for every state transition in the system
pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
    selector: ReviewerSelector,
}

impl ReviewService {
    /// Create a service with an entropy-seeded reviewer selector
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self::with_selector(store, ReviewerSelector::from_entropy())
    }

    pub fn with_selector(store: Arc<dyn ReviewStore>, selector: ReviewerSelector) -> Self {
        Self { store, selector }
    }

    /// Create a team and upsert all of its members
    pub async fn create_team(&self, team: Team) -> ServiceResult<Team> {
        require(&team.team_name, "team_name")?;
        if team.members.is_empty() {
            return Err(ServiceError::invalid("at least one member"));
        }
        let mut seen = HashSet::new();
        for member in &team.members {
            require(&member.user_id, "member user_id")?;
            if !seen.insert(member.user_id.as_str()) {
                return Err(ServiceError::InvalidInput(format!(
                    "duplicate member user_id '{}'",
                    member.user_id
                )));
            }
        }

        if self.store.team_exists(&team.team_name).await? {
            return Err(ServiceError::TeamExists(team.team_name));
        }

        match self.store.create_team_atomic(&team).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists(_)) => {
                warn!("Team '{}' was created concurrently", team.team_name);
                return Err(ServiceError::TeamExists(team.team_name));
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            "Created team '{}' with {} member(s)",
            team.team_name,
            team.members.len()
        );
        Ok(team)
    }

    pub async fn get_team(&self, team_name: &str) -> ServiceResult<Team> {
        require(team_name, "team_name")?;

        let members = self
            .store
            .get_team_members(team_name)
            .await
            .map_err(|e| not_found_or_internal(e, "team", team_name))?;

        Ok(Team {
            team_name: team_name.to_string(),
            members,
        })
    }

    /// Insert or update a single user inside an existing team
    pub async fn upsert_user(&self, user: User) -> ServiceResult<User> {
        require(&user.user_id, "user_id")?;
        require(&user.username, "username")?;
        require(&user.team_name, "team_name")?;

        if !self.store.team_exists(&user.team_name).await? {
            return Err(ServiceError::not_found("team", &user.team_name));
        }

        self.store.upsert_user(&user).await?;
        info!("Upserted user '{}' in team '{}'", user.user_id, user.team_name);

        Ok(user)
    }

    /// Flip a user's reviewer eligibility. Existing assignments are untouched.
    pub async fn set_user_active(&self, user_id: &str, is_active: bool) -> ServiceResult<User> {
        require(user_id, "user_id")?;

        let user = self
            .store
            .set_user_active(user_id, is_active)
            .await
            .map_err(|e| not_found_or_internal(e, "user", user_id))?;

        info!("User '{}' is_active set to {}", user_id, is_active);
        Ok(user)
    }

    /// Pull requests the user currently reviews, newest first
    pub async fn get_user_review_requests(
        &self,
        user_id: &str,
    ) -> ServiceResult<Vec<PullRequestShort>> {
        require(user_id, "user_id")?;

        self.store
            .get_user(user_id)
            .await
            .map_err(|e| not_found_or_internal(e, "user", user_id))?;

        let prs = self.store.list_prs_reviewed_by(user_id).await?;
        debug!("User '{}' has {} review request(s)", user_id, prs.len());
        Ok(prs)
    }

    pub async fn get_pull_request(&self, pr_id: &str) -> ServiceResult<PullRequest> {
        require(pr_id, "pull_request_id")?;
        self.load_pr(pr_id).await
    }

    /// Open a pull request and assign up to two reviewers from the author's team
    pub async fn create_pull_request(
        &self,
        pr_id: &str,
        pr_name: &str,
        author_id: &str,
    ) -> ServiceResult<PullRequest> {
        require(pr_id, "pull_request_id")?;
        require(pr_name, "pull_request_name")?;
        require(author_id, "author_id")?;

        let author = self
            .store
            .get_user(author_id)
            .await
            .map_err(|e| not_found_or_internal(e, "author", author_id))?;

        let members = self
            .store
            .get_team_members(&author.team_name)
            .await
            .map_err(|e| not_found_or_internal(e, "team", &author.team_name))?;

        let reviewers = self.selector.initial_reviewers(&members, author_id);
        if reviewers.is_empty() {
            debug!(
                "No active reviewer available in team '{}' for PR '{}'",
                author.team_name, pr_id
            );
        }

        let pr = PullRequest {
            pull_request_id: pr_id.to_string(),
            pull_request_name: pr_name.to_string(),
            author_id: author_id.to_string(),
            status: PrStatus::Open,
            assigned_reviewers: reviewers,
            created_at: Utc::now(),
            merged_at: None,
        };

        match self.store.create_pr_atomic(&pr).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists(_)) => {
                return Err(ServiceError::PrExists(pr_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            "Created PR '{}' by '{}' with reviewers {:?}",
            pr.pull_request_id, pr.author_id, pr.assigned_reviewers
        );
        Ok(pr)
    }

    /// Merge an open pull request. Merging a merged one is a no-op.
    pub async fn merge_pull_request(&self, pr_id: &str) -> ServiceResult<PullRequest> {
        require(pr_id, "pull_request_id")?;

        self.load_pr(pr_id).await?;

        let merged = self.store.merge_if_open(pr_id, Utc::now()).await?;
        let pr = self.load_pr(pr_id).await?;

        if merged {
            info!("Merged PR '{}'", pr_id);
        } else {
            debug!("PR '{}' already {}, merge is a no-op", pr_id, pr.status);
        }

        Ok(pr)
    }

    /// Replace one reviewer with another active member of the departing
    /// reviewer's team. Returns the refreshed pull request and the new reviewer.
    pub async fn reassign_reviewer(
        &self,
        pr_id: &str,
        old_reviewer_id: &str,
    ) -> ServiceResult<(PullRequest, String)> {
        require(pr_id, "pull_request_id")?;
        require(old_reviewer_id, "old_user_id")?;

        // A swap only loses to a concurrent reassignment that took the same
        // candidate; the retry reloads the reviewer set and picks again.
        for attempt in 1..=MAX_SWAP_ATTEMPTS {
            let pr = self.load_pr(pr_id).await?;
            if pr.is_merged() {
                return Err(ServiceError::PrMerged(pr_id.to_string()));
            }

            if !self
                .store
                .is_reviewer_assigned(pr_id, old_reviewer_id)
                .await?
            {
                return Err(not_assigned(pr_id, old_reviewer_id));
            }

            let old_reviewer = self
                .store
                .get_user(old_reviewer_id)
                .await
                .map_err(|e| not_found_or_internal(e, "user", old_reviewer_id))?;

            let candidates = self
                .store
                .list_active_team_members(&old_reviewer.team_name, old_reviewer_id)
                .await?;

            // The author may share the reviewer's team but never reviews their own PR
            let mut excluded = pr.assigned_reviewers.clone();
            excluded.push(pr.author_id.clone());

            let new_reviewer_id =
                self.selector
                    .replacement_reviewer(&candidates, old_reviewer_id, &excluded)?;

            match self
                .store
                .swap_reviewer_atomic(pr_id, old_reviewer_id, &new_reviewer_id)
                .await
            {
                Ok(()) => {
                    let refreshed = self.load_pr(pr_id).await?;
                    info!(
                        "Reassigned PR '{}': '{}' -> '{}'",
                        pr_id, old_reviewer_id, new_reviewer_id
                    );
                    return Ok((refreshed, new_reviewer_id));
                }
                Err(StoreError::NoMatchingRow) => {
                    warn!(
                        "Reviewer '{}' left PR '{}' before the swap applied",
                        old_reviewer_id, pr_id
                    );
                    return Err(not_assigned(pr_id, old_reviewer_id));
                }
                Err(StoreError::Merged) => {
                    warn!("PR '{}' was merged before the swap applied", pr_id);
                    return Err(ServiceError::PrMerged(pr_id.to_string()));
                }
                Err(StoreError::NotFound(_)) => {
                    return Err(ServiceError::not_found("pull request", pr_id));
                }
                Err(StoreError::AlreadyExists(_)) => {
                    warn!(
                        "Candidate '{}' was assigned to PR '{}' concurrently (attempt {}/{})",
                        new_reviewer_id, pr_id, attempt, MAX_SWAP_ATTEMPTS
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Internal(StoreError::Backend(format!(
            "reassignment on PR '{}' kept conflicting after {} attempts",
            pr_id, MAX_SWAP_ATTEMPTS
        ))))
    }

    async fn load_pr(&self, pr_id: &str) -> ServiceResult<PullRequest> {
        self.store
            .get_pr(pr_id)
            .await
            .map_err(|e| not_found_or_internal(e, "pull request", pr_id))
    }
}

fn require(value: &str, field: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::invalid(field));
    }
    Ok(())
}

fn not_found_or_internal(err: StoreError, kind: &str, key: &str) -> ServiceError {
    match err {
        StoreError::NotFound(_) => ServiceError::not_found(kind, key),
        other => ServiceError::Internal(other),
    }
}

fn not_assigned(pr_id: &str, reviewer_id: &str) -> ServiceError {
    ServiceError::NotAssigned {
        pr_id: pr_id.to_string(),
        reviewer_id: reviewer_id.to_string(),
    }
}
