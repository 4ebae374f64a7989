//! Access rules for every mutation the service exposes.
//!
//! Each predicate takes an explicit [`ActorContext`] and the target entity
//! and returns `Ok(())` or an error; there is no ambient session state, so
//! these are trivially unit-testable. The service consults the guard before
//! touching storage, so a failed check never leaves a partial mutation
//! behind.
//!
//! Error convention: role and ownership failures are `Forbidden`; a target
//! that lives in another organisation surfaces as `*NotFound`, because
//! entities are invisible outside their organisation.

use crate::domain::{ActorContext, Issue, Project};
use crate::error::{Error, Result};

/// Create a project: organisation admins only.
pub fn can_create_project(actor: &ActorContext) -> Result<()> {
    if !actor.is_admin() {
        return Err(Error::forbidden(
            "Only organisation admins can create projects",
        ));
    }
    Ok(())
}

/// Delete a project: organisation admins only, and the project must be in
/// the actor's current organisation.
pub fn can_delete_project(actor: &ActorContext, project: &Project) -> Result<()> {
    if !actor.is_admin() {
        return Err(Error::forbidden("Only admins can delete projects"));
    }
    ensure_visible(actor, project)
}

/// Create a sprint: the target project must be in the actor's current
/// organisation.
pub fn can_create_sprint(actor: &ActorContext, project: &Project) -> Result<()> {
    ensure_visible(actor, project)
}

/// Change a sprint's status: organisation admins only. Date-range and
/// state rules live in [`crate::lifecycle::request_transition`].
pub fn can_change_sprint_status(actor: &ActorContext, project: &Project) -> Result<()> {
    ensure_visible(actor, project)?;
    if !actor.is_admin() {
        return Err(Error::forbidden("Only admins can change sprint status"));
    }
    Ok(())
}

/// Create an issue: any member of the organisation owning the project.
pub fn can_create_issue(actor: &ActorContext, project: &Project) -> Result<()> {
    ensure_visible(actor, project)
}

/// Update an issue's status or priority: the issue's project must be in the
/// actor's current organisation. No stricter role check.
pub fn can_update_issue(actor: &ActorContext, project: &Project) -> Result<()> {
    ensure_visible(actor, project)
}

/// Reorder or move issues on a sprint board: same rule as updating an
/// issue.
pub fn can_reorder_issues(actor: &ActorContext, project: &Project) -> Result<()> {
    ensure_visible(actor, project)
}

/// Delete an issue: the actor must be the issue's reporter or listed as a
/// project admin.
pub fn can_delete_issue(actor: &ActorContext, issue: &Issue, project: &Project) -> Result<()> {
    ensure_visible(actor, project)?;
    if issue.reporter_id != actor.user_id && !project.admin_ids.contains(&actor.user_id) {
        return Err(Error::forbidden(
            "You don't have permission to delete this issue",
        ));
    }
    Ok(())
}

/// A project outside the actor's organisation does not exist as far as the
/// actor is concerned.
fn ensure_visible(actor: &ActorContext, project: &Project) -> Result<()> {
    if project.organisation_id != actor.organisation_id {
        return Err(Error::ProjectNotFound(project.id.clone()));
    }
    Ok(())
}
