//! Storage abstraction for the board.
//!
//! The production deployment fronts a relational database; tests and
//! development use the in-memory backend. The trait is object-safe, so the
//! service holds a `Box<dyn BoardStore>` and stays backend-agnostic.
//!
//! # Contracts implementations must honor
//!
//! - Bucket queries return issues sorted by `order` ascending; whole-sprint
//!   fetches sort secondarily by `status` (ties in `order` across different
//!   buckets are expected and harmless).
//! - [`BoardStore::apply_order_patches`] is all-or-nothing: either every
//!   patch row is written or none is, and a concurrent reader never
//!   observes a partially renumbered bucket.
//! - Deleting a project cascades to its sprints and issues.

use crate::domain::{
    Container, Issue, IssueEdit, IssueId, IssueStatus, NewIssue, NewProject, NewSprint,
    OrderPatch, OrgId, Project, ProjectId, Sprint, SprintId, SprintStatus, UserId,
};
use crate::error::{Error, Result};
use async_trait::async_trait;

pub mod in_memory;

/// Core storage trait for projects, sprints and issues.
#[async_trait]
pub trait BoardStore: Send + Sync {
    // ========== Projects ==========

    /// Create a project in the given organisation. The creator becomes the
    /// project's first admin.
    async fn create_project(
        &mut self,
        org: &OrgId,
        new_project: NewProject,
        creator: &UserId,
    ) -> Result<Project>;

    /// Get a project by id. Returns `None` if it doesn't exist.
    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>>;

    /// List an organisation's projects, most recently created first.
    async fn list_projects(&self, org: &OrgId) -> Result<Vec<Project>>;

    /// Delete a project and cascade to its sprints and issues.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectNotFound`] if the project doesn't exist.
    async fn delete_project(&mut self, id: &ProjectId) -> Result<()>;

    // ========== Sprints ==========

    /// Create a sprint under a project. Sprints start out `Planned`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectNotFound`] if the project doesn't exist.
    async fn create_sprint(
        &mut self,
        project: &ProjectId,
        new_sprint: NewSprint,
    ) -> Result<Sprint>;

    /// Get a sprint by id. Returns `None` if it doesn't exist.
    async fn get_sprint(&self, id: &SprintId) -> Result<Option<Sprint>>;

    /// List a project's sprints, most recently created first.
    async fn list_sprints(&self, project: &ProjectId) -> Result<Vec<Sprint>>;

    /// Persist a sprint status decided by the state machine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SprintNotFound`] if the sprint doesn't exist.
    async fn set_sprint_status(&mut self, id: &SprintId, status: SprintStatus) -> Result<Sprint>;

    /// The project's currently active sprint, if any.
    async fn active_sprint(&self, project: &ProjectId) -> Result<Option<Sprint>>;

    // ========== Issues ==========

    /// Insert a fully prepared issue row; `order` has already been computed
    /// by the ordering engine for the target bucket.
    async fn insert_issue(
        &mut self,
        project: &ProjectId,
        new_issue: NewIssue,
        reporter: &UserId,
        order: u32,
    ) -> Result<Issue>;

    /// Get an issue by id. Returns `None` if it doesn't exist.
    async fn get_issue(&self, id: &IssueId) -> Result<Option<Issue>>;

    /// Apply a status/priority edit to an issue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IssueNotFound`] if the issue doesn't exist.
    async fn update_issue(&mut self, id: &IssueId, edit: IssueEdit) -> Result<Issue>;

    /// Delete an issue. The caller is responsible for renumbering the
    /// remaining bucket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IssueNotFound`] if the issue doesn't exist.
    async fn delete_issue(&mut self, id: &IssueId) -> Result<()>;

    /// All issues of one (container, status) bucket, `order` ascending.
    async fn bucket(&self, container: &Container, status: IssueStatus) -> Result<Vec<Issue>>;

    /// All issues of a sprint, sorted `order` ascending then `status`
    /// ascending.
    async fn sprint_issues(&self, sprint: &SprintId) -> Result<Vec<Issue>>;

    /// Issues within an organisation that a user reported or is assigned
    /// to, most recently updated first.
    async fn user_issues(&self, org: &OrgId, user: &UserId) -> Result<Vec<Issue>>;

    /// Atomically write back a bulk reorder: every row or none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IssueNotFound`] (with no rows written) if any patch
    /// references a missing issue.
    async fn apply_order_patches(&mut self, patches: &[OrderPatch]) -> Result<()>;
}

/// Storage backend configuration.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// In-memory storage (ephemeral; tests and development).
    InMemory,

    /// Relational database (production). The connection string is handed
    /// to the external store collaborator.
    Postgres(String),
}

/// Create a store instance for the given backend.
///
/// # Errors
///
/// Returns [`Error::Storage`] for backends that are not available in this
/// build.
pub fn create_store(backend: StoreBackend) -> Result<Box<dyn BoardStore>> {
    match backend {
        StoreBackend::InMemory => Ok(in_memory::new_in_memory_store()),
        StoreBackend::Postgres(_conn) => Err(Error::Storage(
            "Postgres store backend not yet implemented".to_string(),
        )),
    }
}
