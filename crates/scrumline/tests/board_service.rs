//! End-to-end tests for the board service: guard, ordering engine, sprint
//! state machine and storage working together over the in-memory backend.

mod common;

use common::{alice, bob, current_sprint, mallory, new_issue, new_project, service};
use scrumline::domain::{
    IssueEdit, IssuePriority, IssueStatus, MoveRequest, NewSprint, ReorderRequest, SprintId,
    SprintStatus, UserId,
};
use scrumline::error::Error;
use scrumline::service::BoardService;

/// Create a project, a startable sprint and `n` TODO issues on its board.
async fn project_with_board(
    service: &mut BoardService,
    n: usize,
) -> (scrumline::domain::ProjectId, SprintId, Vec<scrumline::domain::IssueId>) {
    let project = service
        .create_project(&alice(), new_project("RCYT", "Recite"))
        .await
        .unwrap();
    let sprint = service
        .create_sprint(&alice(), &project.id, current_sprint("Sprint 1"))
        .await
        .unwrap();

    let mut ids = Vec::new();
    for index in 0..n {
        let issue = service
            .create_issue(
                &alice(),
                &project.id,
                new_issue(&format!("Issue {index}"), Some(sprint.id.clone())),
            )
            .await
            .unwrap();
        ids.push(issue.id);
    }

    (project.id, sprint.id, ids)
}

fn assert_dense(issues: &[scrumline::domain::Issue]) {
    for (index, issue) in issues.iter().enumerate() {
        assert_eq!(issue.order, index as u32, "order gap at {}", issue.id);
    }
}

// ========== Projects ==========

#[tokio::test]
async fn admin_creates_project_and_becomes_project_admin() {
    let mut service = service();

    let project = service
        .create_project(&alice(), new_project("RCYT", "Recite"))
        .await
        .unwrap();

    assert_eq!(project.key, "RCYT");
    assert!(project.admin_ids.contains(&UserId::new("alice")));
    assert_eq!(service.projects(&alice()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn member_cannot_create_project_and_nothing_is_persisted() {
    let mut service = service();

    let err = service
        .create_project(&bob(), new_project("RCYT", "Recite"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Forbidden(_)));
    assert!(service.projects(&bob()).await.unwrap().is_empty());
}

#[tokio::test]
async fn projects_are_invisible_across_organisations() {
    let mut service = service();
    let (project_id, _, _) = project_with_board(&mut service, 0).await;

    assert!(service.project(&mallory(), &project_id).await.unwrap().is_none());
    assert!(service.projects(&mallory()).await.unwrap().is_empty());

    let err = service.delete_project(&mallory(), &project_id).await.unwrap_err();
    assert!(matches!(err, Error::ProjectNotFound(_)));
    // The project is still there for its own organisation.
    assert!(service.project(&alice(), &project_id).await.unwrap().is_some());
}

#[tokio::test]
async fn deleting_a_project_cascades_to_sprints_and_issues() {
    let mut service = service();
    let (project_id, sprint_id, issue_ids) = project_with_board(&mut service, 2).await;

    service.delete_project(&alice(), &project_id).await.unwrap();

    assert!(service.project(&alice(), &project_id).await.unwrap().is_none());
    let err = service.sprint_issues(&alice(), &sprint_id).await.unwrap_err();
    assert!(matches!(err, Error::SprintNotFound(_)));
    let err = service
        .update_issue(&alice(), &issue_ids[0], IssueEdit::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IssueNotFound(_)));
}

// ========== Sprint lifecycle ==========

#[tokio::test]
async fn sprint_walks_planned_active_completed() {
    let mut service = service();
    let (_, sprint_id, _) = project_with_board(&mut service, 0).await;

    let active = service
        .update_sprint_status(&alice(), &sprint_id, SprintStatus::Active)
        .await
        .unwrap();
    assert_eq!(active.status, SprintStatus::Active);

    let completed = service
        .update_sprint_status(&alice(), &sprint_id, SprintStatus::Completed)
        .await
        .unwrap();
    assert_eq!(completed.status, SprintStatus::Completed);

    // Completed is terminal.
    let err = service
        .update_sprint_status(&alice(), &sprint_id, SprintStatus::Active)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
}

#[tokio::test]
async fn member_cannot_change_sprint_status_and_state_is_unchanged() {
    let mut service = service();
    let (project_id, sprint_id, _) = project_with_board(&mut service, 0).await;

    let err = service
        .update_sprint_status(&bob(), &sprint_id, SprintStatus::Active)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let sprints = service.sprints(&bob(), &project_id).await.unwrap();
    assert_eq!(sprints[0].status, SprintStatus::Planned);
}

#[tokio::test]
async fn sprint_cannot_start_outside_its_date_range() {
    let mut service = service();
    let project = service
        .create_project(&alice(), new_project("RCYT", "Recite"))
        .await
        .unwrap();

    let future = chrono::Utc::now() + chrono::Duration::days(30);
    let sprint = service
        .create_sprint(
            &alice(),
            &project.id,
            NewSprint {
                name: "Future sprint".to_string(),
                start_date: future,
                end_date: future + chrono::Duration::days(14),
            },
        )
        .await
        .unwrap();

    let err = service
        .update_sprint_status(&alice(), &sprint.id, SprintStatus::Active)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
}

#[tokio::test]
async fn only_one_sprint_per_project_may_be_active() {
    let mut service = service();
    let (project_id, first, _) = project_with_board(&mut service, 0).await;
    let second = service
        .create_sprint(&alice(), &project_id, current_sprint("Sprint 2"))
        .await
        .unwrap();

    service
        .update_sprint_status(&alice(), &first, SprintStatus::Active)
        .await
        .unwrap();

    let err = service
        .update_sprint_status(&alice(), &second.id, SprintStatus::Active)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));

    // Completing the first frees the slot for the second.
    service
        .update_sprint_status(&alice(), &first, SprintStatus::Completed)
        .await
        .unwrap();
    let started = service
        .update_sprint_status(&alice(), &second.id, SprintStatus::Active)
        .await
        .unwrap();
    assert_eq!(started.status, SprintStatus::Active);
}

#[tokio::test]
async fn backwards_sprint_date_range_is_rejected() {
    let mut service = service();
    let project = service
        .create_project(&alice(), new_project("RCYT", "Recite"))
        .await
        .unwrap();

    let now = chrono::Utc::now();
    let err = service
        .create_sprint(
            &alice(),
            &project.id,
            NewSprint {
                name: "Backwards".to_string(),
                start_date: now,
                end_date: now - chrono::Duration::days(7),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

// ========== Issue creation ==========

#[tokio::test]
async fn issues_append_to_the_end_of_their_column() {
    let mut service = service();
    let (_, sprint_id, _) = project_with_board(&mut service, 3).await;

    let issues = service.sprint_issues(&alice(), &sprint_id).await.unwrap();
    assert_eq!(issues.len(), 3);
    assert_dense(&issues);
    assert!(issues.iter().all(|issue| issue.status == IssueStatus::Todo));
}

#[tokio::test]
async fn new_issues_may_only_target_the_todo_column() {
    let mut service = service();
    let (project_id, sprint_id, _) = project_with_board(&mut service, 0).await;

    let mut payload = new_issue("Sneaky", Some(sprint_id));
    payload.status = IssueStatus::Done;

    let err = service
        .create_issue(&alice(), &project_id, payload)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn members_can_create_issues() {
    let mut service = service();
    let (project_id, sprint_id, _) = project_with_board(&mut service, 0).await;

    let issue = service
        .create_issue(&bob(), &project_id, new_issue("From bob", Some(sprint_id)))
        .await
        .unwrap();
    assert_eq!(issue.reporter_id, UserId::new("bob"));
    assert_eq!(issue.order, 0);
}

// ========== Board reorder / move ==========

#[tokio::test]
async fn reorder_moves_last_issue_to_the_front() {
    let mut service = service();
    let (_, sprint_id, ids) = project_with_board(&mut service, 3).await;
    service
        .update_sprint_status(&alice(), &sprint_id, SprintStatus::Active)
        .await
        .unwrap();

    let reordered = service
        .reorder_issues(
            &alice(),
            ReorderRequest {
                sprint_id: sprint_id.clone(),
                status: IssueStatus::Todo,
                from_index: 2,
                to_index: 0,
            },
        )
        .await
        .unwrap();

    assert_dense(&reordered);
    assert_eq!(reordered[0].id, ids[2]);
    assert_eq!(reordered[1].id, ids[0]);
    assert_eq!(reordered[2].id, ids[1]);

    // The persisted board agrees with the returned column.
    let board = service.sprint_issues(&alice(), &sprint_id).await.unwrap();
    assert_eq!(board[0].id, ids[2]);
}

#[tokio::test]
async fn board_is_locked_until_the_sprint_starts() {
    let mut service = service();
    let (_, sprint_id, _) = project_with_board(&mut service, 2).await;

    let err = service
        .reorder_issues(
            &alice(),
            ReorderRequest {
                sprint_id,
                status: IssueStatus::Todo,
                from_index: 0,
                to_index: 1,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn board_is_locked_after_the_sprint_completes() {
    let mut service = service();
    let (_, sprint_id, _) = project_with_board(&mut service, 2).await;
    service
        .update_sprint_status(&alice(), &sprint_id, SprintStatus::Active)
        .await
        .unwrap();
    service
        .update_sprint_status(&alice(), &sprint_id, SprintStatus::Completed)
        .await
        .unwrap();

    let err = service
        .reorder_issues(
            &alice(),
            ReorderRequest {
                sprint_id,
                status: IssueStatus::Todo,
                from_index: 0,
                to_index: 1,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn move_renumbers_both_columns_and_preserves_count() {
    let mut service = service();
    let (_, sprint_id, ids) = project_with_board(&mut service, 3).await;
    service
        .update_sprint_status(&alice(), &sprint_id, SprintStatus::Active)
        .await
        .unwrap();

    let (source, dest) = service
        .move_issue(
            &alice(),
            MoveRequest {
                sprint_id: sprint_id.clone(),
                from_status: IssueStatus::Todo,
                to_status: IssueStatus::InProgress,
                from_index: 0,
                to_index: 0,
            },
        )
        .await
        .unwrap();

    assert_eq!(source.len() + dest.len(), 3);
    assert_dense(&source);
    assert_dense(&dest);
    assert_eq!(dest[0].id, ids[0]);
    assert_eq!(dest[0].status, IssueStatus::InProgress);
}

#[tokio::test]
async fn move_rejects_identical_columns() {
    let mut service = service();
    let (_, sprint_id, _) = project_with_board(&mut service, 2).await;
    service
        .update_sprint_status(&alice(), &sprint_id, SprintStatus::Active)
        .await
        .unwrap();

    let err = service
        .move_issue(
            &alice(),
            MoveRequest {
                sprint_id,
                from_status: IssueStatus::Todo,
                to_status: IssueStatus::Todo,
                from_index: 0,
                to_index: 1,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn out_of_range_drag_positions_are_rejected() {
    let mut service = service();
    let (_, sprint_id, _) = project_with_board(&mut service, 2).await;
    service
        .update_sprint_status(&alice(), &sprint_id, SprintStatus::Active)
        .await
        .unwrap();

    let err = service
        .reorder_issues(
            &alice(),
            ReorderRequest {
                sprint_id: sprint_id.clone(),
                status: IssueStatus::Todo,
                from_index: 5,
                to_index: 0,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IndexOutOfRange { index: 5, len: 2 }));

    // The board is untouched after the failed reorder.
    let board = service.sprint_issues(&alice(), &sprint_id).await.unwrap();
    assert_dense(&board);
}

// ========== Issue edits and deletion ==========

#[tokio::test]
async fn status_edit_rebuckets_the_issue_at_the_end_of_its_new_column() {
    let mut service = service();
    let (_, sprint_id, ids) = project_with_board(&mut service, 3).await;

    let updated = service
        .update_issue(
            &alice(),
            &ids[0],
            IssueEdit {
                status: Some(IssueStatus::InReview),
                priority: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, IssueStatus::InReview);
    assert_eq!(updated.order, 0);

    // The vacated column closed its gap.
    let board = service.sprint_issues(&alice(), &sprint_id).await.unwrap();
    let todo: Vec<_> = board
        .iter()
        .filter(|issue| issue.status == IssueStatus::Todo)
        .collect();
    assert_eq!(todo.len(), 2);
    assert_eq!(todo[0].order, 0);
    assert_eq!(todo[1].order, 1);
}

#[tokio::test]
async fn priority_edit_changes_only_priority() {
    let mut service = service();
    let (_, _, ids) = project_with_board(&mut service, 1).await;

    let updated = service
        .update_issue(
            &bob(),
            &ids[0],
            IssueEdit {
                status: None,
                priority: Some(IssuePriority::Urgent),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.priority, IssuePriority::Urgent);
    assert_eq!(updated.status, IssueStatus::Todo);
    assert_eq!(updated.order, 0);
}

#[tokio::test]
async fn issues_are_invisible_across_organisations() {
    let mut service = service();
    let (_, _, ids) = project_with_board(&mut service, 1).await;

    let err = service
        .update_issue(
            &mallory(),
            &ids[0],
            IssueEdit {
                status: None,
                priority: Some(IssuePriority::Low),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IssueNotFound(_)));
}

#[tokio::test]
async fn only_reporter_or_project_admin_deletes_issues() {
    let mut service = service();
    let (project_id, sprint_id, _) = project_with_board(&mut service, 0).await;

    let issue = service
        .create_issue(&bob(), &project_id, new_issue("Bob's issue", Some(sprint_id.clone())))
        .await
        .unwrap();

    // Carol is an org member but neither reporter nor project admin.
    let carol = scrumline::domain::ActorContext {
        user_id: UserId::new("carol"),
        organisation_id: alice().organisation_id,
        role: scrumline::domain::OrgRole::Member,
    };
    let err = service.delete_issue(&carol, &issue.id).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
    assert_eq!(service.sprint_issues(&alice(), &sprint_id).await.unwrap().len(), 1);

    // The reporter may delete.
    service.delete_issue(&bob(), &issue.id).await.unwrap();
    assert!(service.sprint_issues(&alice(), &sprint_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_an_issue_renumbers_the_rest_of_its_column() {
    let mut service = service();
    let (_, sprint_id, ids) = project_with_board(&mut service, 3).await;

    // Alice created them and is a project admin either way.
    service.delete_issue(&alice(), &ids[1]).await.unwrap();

    let board = service.sprint_issues(&alice(), &sprint_id).await.unwrap();
    assert_eq!(board.len(), 2);
    assert_dense(&board);
    assert_eq!(board[0].id, ids[0]);
    assert_eq!(board[1].id, ids[2]);
}

// ========== Queries and identity ==========

#[tokio::test]
async fn user_issues_cover_reported_and_assigned_within_the_org() {
    let mut service = service();
    let (project_id, sprint_id, _) = project_with_board(&mut service, 0).await;

    let mut assigned = new_issue("Assigned to bob", Some(sprint_id.clone()));
    assigned.assignee_id = Some(UserId::new("bob"));
    service.create_issue(&alice(), &project_id, assigned).await.unwrap();
    service
        .create_issue(&bob(), &project_id, new_issue("Reported by bob", Some(sprint_id)))
        .await
        .unwrap();

    let issues = service.user_issues(&alice(), &UserId::new("bob")).await.unwrap();
    assert_eq!(issues.len(), 2);

    // Nothing leaks into another organisation's view.
    let foreign = service.user_issues(&mallory(), &UserId::new("bob")).await.unwrap();
    assert!(foreign.is_empty());
}

#[tokio::test]
async fn session_tokens_resolve_through_the_identity_provider() {
    let service = service();

    let actor = service.resolve_actor("tok-bob").await.unwrap();
    assert_eq!(actor.user_id, UserId::new("bob"));

    let err = service.resolve_actor("tok-eve").await.unwrap_err();
    assert!(matches!(err, Error::Unauthenticated));

    let members = service.organisation_members(&actor).await.unwrap();
    assert_eq!(members.len(), 2); // alice and bob share org-1
}
