//! Shared fixtures for integration tests.
//!
//! Each test binary uses a subset of these helpers.
#![allow(dead_code)]

use chrono::{Duration, Utc};
use scrumline::domain::{
    ActorContext, IssuePriority, IssueStatus, NewIssue, NewProject, NewSprint, OrgId, OrgRole,
    UserId,
};
use scrumline::identity::StaticIdentity;
use scrumline::service::BoardService;
use scrumline::storage::{create_store, StoreBackend};

/// Admin of `org-1`.
pub fn alice() -> ActorContext {
    ActorContext {
        user_id: UserId::new("alice"),
        organisation_id: OrgId::new("org-1"),
        role: OrgRole::Admin,
    }
}

/// Regular member of `org-1`.
pub fn bob() -> ActorContext {
    ActorContext {
        user_id: UserId::new("bob"),
        organisation_id: OrgId::new("org-1"),
        role: OrgRole::Member,
    }
}

/// Admin of a different organisation, `org-2`.
pub fn mallory() -> ActorContext {
    ActorContext {
        user_id: UserId::new("mallory"),
        organisation_id: OrgId::new("org-2"),
        role: OrgRole::Admin,
    }
}

/// A service over an empty in-memory store, with sessions registered for
/// the three standard actors.
pub fn service() -> BoardService {
    let identity = StaticIdentity::new()
        .with_session("tok-alice", alice())
        .with_session("tok-bob", bob())
        .with_session("tok-mallory", mallory());

    let store = create_store(StoreBackend::InMemory).expect("in-memory store");
    BoardService::new(store, Box::new(identity))
}

/// A project creation payload.
pub fn new_project(key: &str, name: &str) -> NewProject {
    NewProject {
        key: key.to_string(),
        name: name.to_string(),
        description: None,
    }
}

/// A sprint whose date range surrounds the current time, so it can be
/// started immediately.
pub fn current_sprint(name: &str) -> NewSprint {
    let now = Utc::now();
    NewSprint {
        name: name.to_string(),
        start_date: now - Duration::days(1),
        end_date: now + Duration::days(13),
    }
}

/// A minimal TODO issue payload, optionally scheduled into a sprint.
pub fn new_issue(title: &str, sprint_id: Option<scrumline::domain::SprintId>) -> NewIssue {
    NewIssue {
        title: title.to_string(),
        description: None,
        status: IssueStatus::Todo,
        priority: IssuePriority::Medium,
        sprint_id,
        assignee_id: None,
    }
}
