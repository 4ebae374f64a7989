//! The lifecycle service: guard, then engine, then storage.
//!
//! [`BoardService`] is the single entry point the presentation layer calls.
//! Every operation takes an explicit [`ActorContext`]; the access guard is
//! consulted before anything else, so a rejected call never reaches
//! storage. Mutations that touch ordering run through the ordering engine
//! and persist the full recomputed batch atomically.
//!
//! The service is stateless per request; concurrent reorders on the same
//! bucket are last-write-wins on the `order` field set, which this design
//! accepts (no optimistic-concurrency tokens).

use crate::domain::{
    ActorContext, Container, Issue, IssueEdit, IssueId, Member, MoveRequest, NewIssue,
    NewProject, NewSprint, Project, ProjectId, ReorderRequest, Sprint, SprintId, SprintStatus,
    UserId,
};
use crate::error::{Error, Result};
use crate::identity::IdentityProvider;
use crate::storage::BoardStore;
use crate::{guard, lifecycle, ordering};
use chrono::Utc;
use tracing::{debug, instrument};

/// The combined ordering engine, sprint state machine and access guard,
/// fronting a storage collaborator.
pub struct BoardService {
    store: Box<dyn BoardStore>,
    identity: Box<dyn IdentityProvider>,
}

impl std::fmt::Debug for BoardService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardService")
            .field("store", &"<dyn BoardStore>")
            .field("identity", &"<dyn IdentityProvider>")
            .finish()
    }
}

impl BoardService {
    /// Create a service over the given collaborators.
    pub fn new(store: Box<dyn BoardStore>, identity: Box<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    /// Resolve a session token into an actor via the identity provider.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] when the token resolves to no
    /// actor.
    pub async fn resolve_actor(&self, session_token: &str) -> Result<ActorContext> {
        self.identity.resolve(session_token).await
    }

    /// Membership list of the actor's organisation, for assignee selection.
    pub async fn organisation_members(&self, actor: &ActorContext) -> Result<Vec<Member>> {
        self.identity
            .organisation_members(&actor.organisation_id)
            .await
    }

    // ========== Projects ==========

    /// Create a project in the actor's organisation. Admins only; the
    /// creator becomes the project's first admin.
    #[instrument(skip(self, new_project), fields(actor = %actor.user_id))]
    pub async fn create_project(
        &mut self,
        actor: &ActorContext,
        new_project: NewProject,
    ) -> Result<Project> {
        guard::can_create_project(actor)?;
        new_project.validate().map_err(Error::Validation)?;

        self.store
            .create_project(&actor.organisation_id, new_project, &actor.user_id)
            .await
    }

    /// Delete a project, cascading to its sprints and issues.
    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn delete_project(&mut self, actor: &ActorContext, id: &ProjectId) -> Result<()> {
        let project = self
            .store
            .get_project(id)
            .await?
            .ok_or_else(|| Error::ProjectNotFound(id.clone()))?;
        guard::can_delete_project(actor, &project)?;

        self.store.delete_project(id).await
    }

    /// List the actor's organisation's projects, newest first.
    pub async fn projects(&self, actor: &ActorContext) -> Result<Vec<Project>> {
        self.store.list_projects(&actor.organisation_id).await
    }

    /// Get a project with its visibility rule applied: a project outside
    /// the actor's organisation reads as absent.
    pub async fn project(&self, actor: &ActorContext, id: &ProjectId) -> Result<Option<Project>> {
        Ok(self
            .store
            .get_project(id)
            .await?
            .filter(|project| project.organisation_id == actor.organisation_id))
    }

    // ========== Sprints ==========

    /// Create a sprint under a project in the actor's organisation.
    #[instrument(skip(self, new_sprint), fields(actor = %actor.user_id))]
    pub async fn create_sprint(
        &mut self,
        actor: &ActorContext,
        project_id: &ProjectId,
        new_sprint: NewSprint,
    ) -> Result<Sprint> {
        let project = self.visible_project(actor, project_id).await?;
        guard::can_create_sprint(actor, &project)?;
        new_sprint.validate().map_err(Error::Validation)?;

        self.store.create_sprint(project_id, new_sprint).await
    }

    /// List a project's sprints, newest first.
    pub async fn sprints(&self, actor: &ActorContext, project_id: &ProjectId) -> Result<Vec<Sprint>> {
        self.visible_project(actor, project_id).await?;
        self.store.list_sprints(project_id).await
    }

    /// Drive a sprint through its lifecycle: `Planned -> Active ->
    /// Completed`, admin-only, date-gated, with at most one active sprint
    /// per project.
    #[instrument(skip(self), fields(actor = %actor.user_id, %target))]
    pub async fn update_sprint_status(
        &mut self,
        actor: &ActorContext,
        sprint_id: &SprintId,
        target: SprintStatus,
    ) -> Result<Sprint> {
        let (sprint, project) = self.visible_sprint(actor, sprint_id).await?;
        guard::can_change_sprint_status(actor, &project)?;

        if target == SprintStatus::Active {
            if let Some(active) = self.store.active_sprint(&project.id).await? {
                if active.id != sprint.id {
                    return Err(Error::InvalidTransition {
                        from: sprint.status,
                        to: target,
                        reason: format!(
                            "sprint {} is already active in this project",
                            active.id
                        ),
                    });
                }
            }
        }

        let updated = lifecycle::request_transition(&sprint, target, actor, Utc::now())?;
        self.store.set_sprint_status(sprint_id, updated.status).await
    }

    // ========== Issues ==========

    /// Create an issue, appended at the end of its (container, status)
    /// bucket. Any member of the organisation may create issues.
    #[instrument(skip(self, new_issue), fields(actor = %actor.user_id))]
    pub async fn create_issue(
        &mut self,
        actor: &ActorContext,
        project_id: &ProjectId,
        new_issue: NewIssue,
    ) -> Result<Issue> {
        let project = self.visible_project(actor, project_id).await?;
        guard::can_create_issue(actor, &project)?;
        new_issue.validate().map_err(Error::Validation)?;

        let container = match &new_issue.sprint_id {
            Some(sprint_id) => {
                let sprint = self
                    .store
                    .get_sprint(sprint_id)
                    .await?
                    .ok_or_else(|| Error::SprintNotFound(sprint_id.clone()))?;
                if sprint.project_id != project.id {
                    return Err(Error::Validation(
                        "Sprint belongs to a different project".to_string(),
                    ));
                }
                Container::Sprint(sprint_id.clone())
            }
            None => Container::Project(project_id.clone()),
        };

        let bucket = self.store.bucket(&container, new_issue.status).await?;
        let order = ordering::append_order(&bucket);

        self.store
            .insert_issue(project_id, new_issue, &actor.user_id, order)
            .await
    }

    /// Edit an issue's status and/or priority.
    ///
    /// A status change is a board move: the issue leaves its current bucket
    /// and is appended to the target column, and both buckets are densely
    /// renumbered in the same atomic batch, so the ordering invariant holds
    /// without a drag-and-drop position.
    #[instrument(skip(self, edit), fields(actor = %actor.user_id))]
    pub async fn update_issue(
        &mut self,
        actor: &ActorContext,
        id: &IssueId,
        edit: IssueEdit,
    ) -> Result<Issue> {
        let (issue, project) = self.visible_issue(actor, id).await?;
        guard::can_update_issue(actor, &project)?;

        if let Some(new_status) = edit.status {
            if new_status != issue.status {
                let container = issue.container();
                let source = self.store.bucket(&container, issue.status).await?;
                let dest = self.store.bucket(&container, new_status).await?;

                let from = source
                    .iter()
                    .position(|member| member.id == issue.id)
                    .ok_or_else(|| {
                        Error::Storage(format!("issue {} missing from its bucket", issue.id))
                    })?;
                let to = dest.len();

                let before = ordering::snapshot(&[source.as_slice(), dest.as_slice()]);
                let (new_source, new_dest) =
                    ordering::move_across_buckets(source, dest, from, to, new_status)?;

                let after: Vec<Issue> = new_source.into_iter().chain(new_dest).collect();
                let patches = ordering::changed_rows(&before, &after);
                debug!(rows = patches.len(), "re-bucketing issue after status edit");
                self.store.apply_order_patches(&patches).await?;
            }
        }

        if edit.priority.is_some() {
            return self
                .store
                .update_issue(
                    id,
                    IssueEdit {
                        status: None,
                        priority: edit.priority,
                    },
                )
                .await;
        }

        self.store
            .get_issue(id)
            .await?
            .ok_or_else(|| Error::IssueNotFound(id.clone()))
    }

    /// Delete an issue. Only the reporter or a project admin may delete;
    /// the remaining bucket is renumbered to stay dense.
    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn delete_issue(&mut self, actor: &ActorContext, id: &IssueId) -> Result<()> {
        let (issue, project) = self.visible_issue(actor, id).await?;
        guard::can_delete_issue(actor, &issue, &project)?;

        let container = issue.container();
        let status = issue.status;
        self.store.delete_issue(id).await?;

        let remaining = self.store.bucket(&container, status).await?;
        let before = ordering::snapshot(&[remaining.as_slice()]);
        let compacted = ordering::compact(remaining);
        let patches = ordering::changed_rows(&before, &compacted);
        if !patches.is_empty() {
            self.store.apply_order_patches(&patches).await?;
        }

        Ok(())
    }

    /// Reorder an issue within one column of an active sprint's board.
    /// Returns the column in its new order.
    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn reorder_issues(
        &mut self,
        actor: &ActorContext,
        request: ReorderRequest,
    ) -> Result<Vec<Issue>> {
        let (sprint, project) = self.visible_sprint(actor, &request.sprint_id).await?;
        guard::can_reorder_issues(actor, &project)?;
        lifecycle::ensure_board_editable(&sprint)?;

        let container = Container::Sprint(sprint.id.clone());
        let bucket = self.store.bucket(&container, request.status).await?;

        let before = ordering::snapshot(&[bucket.as_slice()]);
        let reordered =
            ordering::reorder_within_bucket(bucket, request.from_index, request.to_index)?;

        let patches = ordering::changed_rows(&before, &reordered);
        debug!(rows = patches.len(), "persisting column reorder");
        if !patches.is_empty() {
            self.store.apply_order_patches(&patches).await?;
        }

        Ok(reordered)
    }

    /// Move an issue from one column of an active sprint's board to
    /// another. Returns the recomputed (source, destination) columns.
    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn move_issue(
        &mut self,
        actor: &ActorContext,
        request: MoveRequest,
    ) -> Result<(Vec<Issue>, Vec<Issue>)> {
        if request.from_status == request.to_status {
            return Err(Error::Validation(
                "Source and destination columns are identical; use reorder".to_string(),
            ));
        }

        let (sprint, project) = self.visible_sprint(actor, &request.sprint_id).await?;
        guard::can_reorder_issues(actor, &project)?;
        lifecycle::ensure_board_editable(&sprint)?;

        let container = Container::Sprint(sprint.id.clone());
        let source = self.store.bucket(&container, request.from_status).await?;
        let dest = self.store.bucket(&container, request.to_status).await?;

        let before = ordering::snapshot(&[source.as_slice(), dest.as_slice()]);
        let (new_source, new_dest) = ordering::move_across_buckets(
            source,
            dest,
            request.from_index,
            request.to_index,
            request.to_status,
        )?;

        let after: Vec<Issue> = new_source
            .iter()
            .chain(new_dest.iter())
            .cloned()
            .collect();
        let patches = ordering::changed_rows(&before, &after);
        debug!(rows = patches.len(), "persisting cross-column move");
        self.store.apply_order_patches(&patches).await?;

        Ok((new_source, new_dest))
    }

    /// All issues of a sprint, sorted `order` ascending then `status`
    /// ascending.
    pub async fn sprint_issues(
        &self,
        actor: &ActorContext,
        sprint_id: &SprintId,
    ) -> Result<Vec<Issue>> {
        self.visible_sprint(actor, sprint_id).await?;
        self.store.sprint_issues(sprint_id).await
    }

    /// Issues within the actor's organisation that the given user reported
    /// or is assigned to, most recently updated first.
    pub async fn user_issues(
        &self,
        actor: &ActorContext,
        user: &UserId,
    ) -> Result<Vec<Issue>> {
        self.store.user_issues(&actor.organisation_id, user).await
    }

    // ========== Visibility helpers ==========

    /// Fetch a project, treating absence and cross-organisation targets
    /// identically.
    async fn visible_project(&self, actor: &ActorContext, id: &ProjectId) -> Result<Project> {
        self.store
            .get_project(id)
            .await?
            .filter(|project| project.organisation_id == actor.organisation_id)
            .ok_or_else(|| Error::ProjectNotFound(id.clone()))
    }

    /// Fetch a sprint and its project, hiding cross-organisation sprints.
    async fn visible_sprint(
        &self,
        actor: &ActorContext,
        id: &SprintId,
    ) -> Result<(Sprint, Project)> {
        let sprint = self
            .store
            .get_sprint(id)
            .await?
            .ok_or_else(|| Error::SprintNotFound(id.clone()))?;

        let project = self
            .store
            .get_project(&sprint.project_id)
            .await?
            .ok_or_else(|| Error::Storage(format!("sprint {id} has no project")))?;

        if project.organisation_id != actor.organisation_id {
            return Err(Error::SprintNotFound(id.clone()));
        }
        Ok((sprint, project))
    }

    /// Fetch an issue and its project, hiding cross-organisation issues.
    async fn visible_issue(&self, actor: &ActorContext, id: &IssueId) -> Result<(Issue, Project)> {
        let issue = self
            .store
            .get_issue(id)
            .await?
            .ok_or_else(|| Error::IssueNotFound(id.clone()))?;

        let project = self
            .store
            .get_project(&issue.project_id)
            .await?
            .ok_or_else(|| Error::Storage(format!("issue {id} has no project")))?;

        if project.organisation_id != actor.organisation_id {
            return Err(Error::IssueNotFound(id.clone()));
        }
        Ok((issue, project))
    }
}
