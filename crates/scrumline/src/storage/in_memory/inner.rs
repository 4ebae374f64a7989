//! Core in-memory data structures.

use crate::domain::{
    Container, Issue, IssueId, IssueStatus, Project, ProjectId, Sprint, SprintId,
};
use crate::ids::IdMinter;
use std::collections::HashMap;

/// Inner store structure (not thread-safe on its own).
///
/// Wrapped in `Arc<Mutex<>>` by the module's factory; see the module docs
/// for the locking discipline.
pub(crate) struct InMemoryStoreInner {
    /// Projects indexed by id.
    pub(super) projects: HashMap<ProjectId, Project>,

    /// Sprints indexed by id.
    pub(super) sprints: HashMap<SprintId, Sprint>,

    /// Issues indexed by id.
    pub(super) issues: HashMap<IssueId, Issue>,

    /// Shared id minter for all entity kinds.
    pub(super) ids: IdMinter,
}

impl InMemoryStoreInner {
    /// Create an empty store.
    pub(crate) fn new() -> Self {
        Self {
            projects: HashMap::new(),
            sprints: HashMap::new(),
            issues: HashMap::new(),
            ids: IdMinter::new(),
        }
    }

    /// Members of one bucket, sorted by `order` ascending.
    pub(super) fn bucket_of(&self, container: &Container, status: IssueStatus) -> Vec<Issue> {
        let mut bucket: Vec<Issue> = self
            .issues
            .values()
            .filter(|issue| issue.status == status && &issue.container() == container)
            .cloned()
            .collect();
        bucket.sort_by(|a, b| a.order.cmp(&b.order).then(a.id.cmp(&b.id)));
        bucket
    }
}
