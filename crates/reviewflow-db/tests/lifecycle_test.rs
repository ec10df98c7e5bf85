//! End-to-end lifecycle tests: ReviewService over a real SQLite store
//!
//! Covers the assignment scenarios and the behaviour under concurrent
//! requests racing on the same team, pull request or reviewer.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use reviewflow_core::{
    ErrorCode, PrStatus, ReviewService, ReviewerSelector, Team, TeamMember, User,
};
use reviewflow_db::{connect, migrate, SeaOrmStore};

async fn setup_service(seed: u64) -> Arc<ReviewService> {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    migrate(&db).await.expect("Failed to run migrations");

    let store = Arc::new(SeaOrmStore::new(db));
    Arc::new(ReviewService::with_selector(
        store,
        ReviewerSelector::seeded(seed),
    ))
}

fn member(id: &str, active: bool) -> TeamMember {
    TeamMember {
        user_id: id.to_string(),
        username: format!("User {}", id.to_uppercase()),
        is_active: active,
    }
}

fn team(name: &str, members: Vec<TeamMember>) -> Team {
    Team {
        team_name: name.to_string(),
        members,
    }
}

fn sorted(ids: &[String]) -> Vec<String> {
    let mut ids = ids.to_vec();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_scenario_author_and_inactive_are_never_picked() {
    let service = setup_service(1).await;
    service
        .create_team(team(
            "platform",
            vec![member("a", true), member("b", true), member("c", false)],
        ))
        .await
        .unwrap();

    let pr = service
        .create_pull_request("pr-1", "Add search", "a")
        .await
        .unwrap();

    assert_eq!(pr.status, PrStatus::Open);
    assert_eq!(pr.assigned_reviewers, vec!["b".to_string()]);

    let stored = service.get_pull_request("pr-1").await.unwrap();
    assert_eq!(stored.assigned_reviewers, vec!["b".to_string()]);
}

#[tokio::test]
async fn test_scenario_reassign_without_candidate_keeps_reviewers() {
    let service = setup_service(2).await;
    service
        .create_team(team(
            "platform",
            vec![member("a", true), member("b", true), member("c", false)],
        ))
        .await
        .unwrap();
    service
        .create_pull_request("pr-1", "Add search", "a")
        .await
        .unwrap();

    for _ in 0..3 {
        let err = service.reassign_reviewer("pr-1", "b").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoCandidate);
    }

    let pr = service.get_pull_request("pr-1").await.unwrap();
    assert_eq!(pr.assigned_reviewers, vec!["b".to_string()]);
}

#[tokio::test]
async fn test_scenario_reassign_after_merge_is_rejected() {
    let service = setup_service(3).await;
    service
        .create_team(team(
            "platform",
            vec![member("a", true), member("b", true), member("c", true)],
        ))
        .await
        .unwrap();
    let created = service
        .create_pull_request("pr-1", "Add search", "a")
        .await
        .unwrap();

    let merged = service.merge_pull_request("pr-1").await.unwrap();
    assert_eq!(merged.status, PrStatus::Merged);
    assert!(merged.merged_at.is_some());

    let reviewer = created.assigned_reviewers[0].clone();
    let err = service.reassign_reviewer("pr-1", &reviewer).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::PrMerged);

    let after = service.get_pull_request("pr-1").await.unwrap();
    assert_eq!(
        sorted(&after.assigned_reviewers),
        sorted(&created.assigned_reviewers)
    );
}

#[tokio::test]
async fn test_second_merge_is_a_noop() {
    let service = setup_service(4).await;
    service
        .create_team(team("platform", vec![member("a", true), member("b", true)]))
        .await
        .unwrap();
    service.create_pull_request("pr-1", "Fix", "a").await.unwrap();

    let first = service.merge_pull_request("pr-1").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = service.merge_pull_request("pr-1").await.unwrap();

    assert_eq!(second.status, PrStatus::Merged);
    assert_eq!(first.merged_at, second.merged_at);
    assert_eq!(first.assigned_reviewers, second.assigned_reviewers);
}

#[tokio::test]
async fn test_reassign_picks_from_old_reviewers_team() {
    let service = setup_service(5).await;
    service
        .create_team(team(
            "platform",
            vec![member("a", true), member("b", true)],
        ))
        .await
        .unwrap();
    service
        .create_pull_request("pr-1", "Fix", "a")
        .await
        .unwrap();

    // Move "b" into a team with one spare reviewer
    service
        .create_team(team("infra", vec![member("b", true), member("x", true)]))
        .await
        .unwrap();

    let (pr, replaced_by) = service.reassign_reviewer("pr-1", "b").await.unwrap();
    assert_eq!(replaced_by, "x");
    assert_eq!(pr.assigned_reviewers, vec!["x".to_string()]);

    let listed = service.get_user_review_requests("x").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(service.get_user_review_requests("b").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_not_assigned_is_repeatable() {
    let service = setup_service(6).await;
    service
        .create_team(team(
            "platform",
            vec![member("a", true), member("b", true), member("c", false)],
        ))
        .await
        .unwrap();
    service.create_pull_request("pr-1", "Fix", "a").await.unwrap();

    for _ in 0..3 {
        let err = service.reassign_reviewer("pr-1", "c").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotAssigned);
    }

    let pr = service.get_pull_request("pr-1").await.unwrap();
    assert_eq!(pr.assigned_reviewers, vec!["b".to_string()]);
}

#[tokio::test]
async fn test_deactivated_reviewer_keeps_assignment() {
    let service = setup_service(7).await;
    service
        .create_team(team(
            "platform",
            vec![member("a", true), member("b", true), member("c", false)],
        ))
        .await
        .unwrap();
    service.create_pull_request("pr-1", "Fix", "a").await.unwrap();

    let user = service.set_user_active("b", false).await.unwrap();
    assert!(!user.is_active);

    let pr = service.get_pull_request("pr-1").await.unwrap();
    assert_eq!(pr.assigned_reviewers, vec!["b".to_string()]);

    // Reassigning the inactive reviewer still needs an active candidate
    service.set_user_active("c", true).await.unwrap();
    let (_, replaced_by) = service.reassign_reviewer("pr-1", "b").await.unwrap();
    assert_eq!(replaced_by, "c");
}

#[tokio::test]
async fn test_review_requests_newest_first() {
    let service = setup_service(8).await;
    service
        .create_team(team("platform", vec![member("a", true), member("b", true)]))
        .await
        .unwrap();

    for id in ["pr-1", "pr-2", "pr-3"] {
        service.create_pull_request(id, "Change", "a").await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    service.merge_pull_request("pr-2").await.unwrap();

    let listed = service.get_user_review_requests("b").await.unwrap();
    let ids: Vec<_> = listed.iter().map(|p| p.pull_request_id.as_str()).collect();
    assert_eq!(ids, vec!["pr-3", "pr-2", "pr-1"]);
    assert_eq!(listed[1].status, PrStatus::Merged);

    let err = service.get_user_review_requests("ghost").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_upsert_user_requires_existing_team() {
    let service = setup_service(9).await;
    service
        .create_team(team("platform", vec![member("a", true)]))
        .await
        .unwrap();

    let err = service
        .upsert_user(User {
            user_id: "z".to_string(),
            username: "Zed".to_string(),
            team_name: "nowhere".to_string(),
            is_active: true,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    service
        .upsert_user(User {
            user_id: "z".to_string(),
            username: "Zed".to_string(),
            team_name: "platform".to_string(),
            is_active: true,
        })
        .await
        .unwrap();

    let team = service.get_team("platform").await.unwrap();
    assert_eq!(team.members.len(), 2);
}

#[tokio::test]
async fn test_concurrent_team_creation_has_one_winner() {
    let service = setup_service(10).await;

    let first = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .create_team(team("platform", vec![member("a", true)]))
                .await
        })
    };
    let second = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .create_team(team("platform", vec![member("b", true)]))
                .await
        })
    };

    let (first, second) = (first.await.unwrap(), second.await.unwrap());
    let results = [first, second];

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(loser.code(), ErrorCode::TeamExists);

    // Only the winner's member landed
    let members = service.get_team("platform").await.unwrap().members;
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn test_concurrent_pr_creation_has_one_winner() {
    let service = setup_service(11).await;
    service
        .create_team(team(
            "platform",
            vec![member("a", true), member("b", true), member("c", true)],
        ))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        service.create_pull_request("pr-1", "Left", "a"),
        service.create_pull_request("pr-1", "Right", "b"),
    );

    let winner = match (&first, &second) {
        (Ok(pr), Err(e)) | (Err(e), Ok(pr)) => {
            assert_eq!(e.code(), ErrorCode::PrExists);
            pr.clone()
        }
        _ => panic!("expected exactly one success, got {:?} / {:?}", first, second),
    };

    let stored = service.get_pull_request("pr-1").await.unwrap();
    assert_eq!(stored.author_id, winner.author_id);
    assert_eq!(
        sorted(&stored.assigned_reviewers),
        sorted(&winner.assigned_reviewers)
    );
}

#[tokio::test]
async fn test_concurrent_reassign_of_same_reviewer() {
    let service = setup_service(12).await;
    service
        .create_team(team(
            "platform",
            vec![
                member("a", true),
                member("b", true),
                member("c", true),
                member("d", true),
                member("e", true),
            ],
        ))
        .await
        .unwrap();
    let created = service.create_pull_request("pr-1", "Fix", "a").await.unwrap();
    assert_eq!(created.assigned_reviewers.len(), 2);
    let old = created.assigned_reviewers[0].clone();

    let (first, second) = tokio::join!(
        service.reassign_reviewer("pr-1", &old),
        service.reassign_reviewer("pr-1", &old),
    );

    let outcomes = [first, second];
    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    let loser = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(loser.code(), ErrorCode::NotAssigned);

    let pr = service.get_pull_request("pr-1").await.unwrap();
    assert_eq!(pr.assigned_reviewers.len(), 2);
    assert!(!pr.assigned_reviewers.contains(&old));
    assert!(!pr.assigned_reviewers.contains(&"a".to_string()));
    let distinct: HashSet<_> = pr.assigned_reviewers.iter().collect();
    assert_eq!(distinct.len(), 2);
}

#[tokio::test]
async fn test_concurrent_reassign_of_different_reviewers_both_succeed() {
    for seed in 0..8 {
        let service = setup_service(100 + seed).await;
        service
            .create_team(team(
                "platform",
                vec![
                    member("a", true),
                    member("b", true),
                    member("c", true),
                    member("d", true),
                    member("e", true),
                ],
            ))
            .await
            .unwrap();
        let created = service.create_pull_request("pr-1", "Fix", "a").await.unwrap();
        let (first_old, second_old) = (
            created.assigned_reviewers[0].clone(),
            created.assigned_reviewers[1].clone(),
        );

        let (first, second) = tokio::join!(
            service.reassign_reviewer("pr-1", &first_old),
            service.reassign_reviewer("pr-1", &second_old),
        );
        assert!(first.is_ok(), "seed {}: {:?}", seed, first);
        assert!(second.is_ok(), "seed {}: {:?}", seed, second);

        let pr = service.get_pull_request("pr-1").await.unwrap();
        let distinct: HashSet<_> = pr.assigned_reviewers.iter().collect();
        assert_eq!(pr.assigned_reviewers.len(), 2);
        assert_eq!(distinct.len(), 2);
        assert!(!pr.assigned_reviewers.contains(&"a".to_string()));
    }
}

#[tokio::test]
async fn test_duplicate_member_ids_leave_no_team() {
    let service = setup_service(14).await;

    let err = service
        .create_team(team(
            "platform",
            vec![member("a", true), member("b", true), member("b", false)],
        ))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidInput);

    let lookup = service.get_team("platform").await.unwrap_err();
    assert_eq!(lookup.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_created_team_matches_stored_members() {
    let service = setup_service(15).await;

    let created = service
        .create_team(team(
            "platform",
            vec![member("b", false), member("a", true)],
        ))
        .await
        .unwrap();
    let stored = service.get_team("platform").await.unwrap();

    let mut created_members = created.members.clone();
    created_members.sort_by(|x, y| x.user_id.cmp(&y.user_id));
    assert_eq!(created_members, stored.members);
}

#[tokio::test]
async fn test_concurrent_merge_and_reassign_never_mutates_merged_pr() {
    let service = setup_service(13).await;
    service
        .create_team(team(
            "platform",
            vec![
                member("a", true),
                member("b", true),
                member("c", true),
                member("d", true),
            ],
        ))
        .await
        .unwrap();
    let created = service.create_pull_request("pr-1", "Fix", "a").await.unwrap();
    let old = created.assigned_reviewers[0].clone();

    let (merged, reassigned) = tokio::join!(
        service.merge_pull_request("pr-1"),
        service.reassign_reviewer("pr-1", &old),
    );
    let merged = merged.unwrap();
    assert_eq!(merged.status, PrStatus::Merged);

    let final_pr = service.get_pull_request("pr-1").await.unwrap();
    match reassigned {
        // Swap landed first: the merge snapshot already carries it
        Ok(_) => assert_eq!(
            sorted(&final_pr.assigned_reviewers),
            sorted(&merged.assigned_reviewers)
        ),
        Err(e) => {
            assert_eq!(e.code(), ErrorCode::PrMerged);
            assert_eq!(
                sorted(&final_pr.assigned_reviewers),
                sorted(&created.assigned_reviewers)
            );
        }
    }
}
