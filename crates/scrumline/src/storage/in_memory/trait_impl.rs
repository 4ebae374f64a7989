//! BoardStore trait implementation for in-memory storage.

use super::InMemoryStore;
use crate::domain::{
    Container, Issue, IssueEdit, IssueId, IssueStatus, NewIssue, NewProject, NewSprint,
    OrderPatch, OrgId, Project, ProjectId, Sprint, SprintId, SprintStatus, UserId,
};
use crate::error::{Error, Result};
use crate::storage::BoardStore;
use async_trait::async_trait;
use chrono::Utc;

#[async_trait]
impl BoardStore for InMemoryStore {
    async fn create_project(
        &mut self,
        org: &OrgId,
        new_project: NewProject,
        creator: &UserId,
    ) -> Result<Project> {
        let mut inner = self.lock().await;

        let id = ProjectId::new(inner.ids.mint("proj", &new_project.name));
        let now = Utc::now();

        let project = Project {
            id: id.clone(),
            organisation_id: org.clone(),
            key: new_project.key,
            name: new_project.name,
            description: new_project.description,
            admin_ids: vec![creator.clone()],
            created_at: now,
            updated_at: now,
        };

        inner.projects.insert(id, project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>> {
        let inner = self.lock().await;
        Ok(inner.projects.get(id).cloned())
    }

    async fn list_projects(&self, org: &OrgId) -> Result<Vec<Project>> {
        let inner = self.lock().await;

        let mut projects: Vec<Project> = inner
            .projects
            .values()
            .filter(|project| &project.organisation_id == org)
            .cloned()
            .collect();

        // Most recent first; id as a deterministic tiebreaker.
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(projects)
    }

    async fn delete_project(&mut self, id: &ProjectId) -> Result<()> {
        let mut inner = self.lock().await;

        if inner.projects.remove(id).is_none() {
            return Err(Error::ProjectNotFound(id.clone()));
        }

        // Cascade: the relational store does this via foreign keys.
        inner.sprints.retain(|_, sprint| &sprint.project_id != id);
        inner.issues.retain(|_, issue| &issue.project_id != id);

        Ok(())
    }

    async fn create_sprint(
        &mut self,
        project: &ProjectId,
        new_sprint: NewSprint,
    ) -> Result<Sprint> {
        let mut inner = self.lock().await;

        if !inner.projects.contains_key(project) {
            return Err(Error::ProjectNotFound(project.clone()));
        }

        let id = SprintId::new(inner.ids.mint("sprint", &new_sprint.name));
        let now = Utc::now();

        let sprint = Sprint {
            id: id.clone(),
            project_id: project.clone(),
            name: new_sprint.name,
            start_date: new_sprint.start_date,
            end_date: new_sprint.end_date,
            status: SprintStatus::Planned,
            created_at: now,
            updated_at: now,
        };

        inner.sprints.insert(id, sprint.clone());
        Ok(sprint)
    }

    async fn get_sprint(&self, id: &SprintId) -> Result<Option<Sprint>> {
        let inner = self.lock().await;
        Ok(inner.sprints.get(id).cloned())
    }

    async fn list_sprints(&self, project: &ProjectId) -> Result<Vec<Sprint>> {
        let inner = self.lock().await;

        let mut sprints: Vec<Sprint> = inner
            .sprints
            .values()
            .filter(|sprint| &sprint.project_id == project)
            .cloned()
            .collect();

        sprints.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(sprints)
    }

    async fn set_sprint_status(&mut self, id: &SprintId, status: SprintStatus) -> Result<Sprint> {
        let mut inner = self.lock().await;

        let sprint = inner
            .sprints
            .get_mut(id)
            .ok_or_else(|| Error::SprintNotFound(id.clone()))?;

        sprint.status = status;
        sprint.updated_at = Utc::now();

        Ok(sprint.clone())
    }

    async fn active_sprint(&self, project: &ProjectId) -> Result<Option<Sprint>> {
        let inner = self.lock().await;

        Ok(inner
            .sprints
            .values()
            .find(|sprint| {
                &sprint.project_id == project && sprint.status == SprintStatus::Active
            })
            .cloned())
    }

    async fn insert_issue(
        &mut self,
        project: &ProjectId,
        new_issue: NewIssue,
        reporter: &UserId,
        order: u32,
    ) -> Result<Issue> {
        let mut inner = self.lock().await;

        if !inner.projects.contains_key(project) {
            return Err(Error::ProjectNotFound(project.clone()));
        }

        let id = IssueId::new(inner.ids.mint("issue", &new_issue.title));
        let now = Utc::now();

        let issue = Issue {
            id: id.clone(),
            project_id: project.clone(),
            sprint_id: new_issue.sprint_id,
            title: new_issue.title,
            description: new_issue.description,
            status: new_issue.status,
            priority: new_issue.priority,
            order,
            reporter_id: reporter.clone(),
            assignee_id: new_issue.assignee_id,
            created_at: now,
            updated_at: now,
        };

        inner.issues.insert(id, issue.clone());
        Ok(issue)
    }

    async fn get_issue(&self, id: &IssueId) -> Result<Option<Issue>> {
        let inner = self.lock().await;
        Ok(inner.issues.get(id).cloned())
    }

    async fn update_issue(&mut self, id: &IssueId, edit: IssueEdit) -> Result<Issue> {
        let mut inner = self.lock().await;

        let issue = inner
            .issues
            .get_mut(id)
            .ok_or_else(|| Error::IssueNotFound(id.clone()))?;

        if let Some(status) = edit.status {
            issue.status = status;
        }
        if let Some(priority) = edit.priority {
            issue.priority = priority;
        }
        issue.updated_at = Utc::now();

        Ok(issue.clone())
    }

    async fn delete_issue(&mut self, id: &IssueId) -> Result<()> {
        let mut inner = self.lock().await;

        if inner.issues.remove(id).is_none() {
            return Err(Error::IssueNotFound(id.clone()));
        }
        Ok(())
    }

    async fn bucket(&self, container: &Container, status: IssueStatus) -> Result<Vec<Issue>> {
        let inner = self.lock().await;
        Ok(inner.bucket_of(container, status))
    }

    async fn sprint_issues(&self, sprint: &SprintId) -> Result<Vec<Issue>> {
        let inner = self.lock().await;

        let mut issues: Vec<Issue> = inner
            .issues
            .values()
            .filter(|issue| issue.sprint_id.as_ref() == Some(sprint))
            .cloned()
            .collect();

        // ORDER BY order ASC, status ASC. Ties in `order` across different
        // status buckets are expected.
        issues.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then(a.status.cmp(&b.status))
                .then(a.id.cmp(&b.id))
        });
        Ok(issues)
    }

    async fn user_issues(&self, org: &OrgId, user: &UserId) -> Result<Vec<Issue>> {
        let inner = self.lock().await;

        let mut issues: Vec<Issue> = inner
            .issues
            .values()
            .filter(|issue| {
                let in_org = inner
                    .projects
                    .get(&issue.project_id)
                    .is_some_and(|project| &project.organisation_id == org);
                let involved = &issue.reporter_id == user
                    || issue.assignee_id.as_ref() == Some(user);
                in_org && involved
            })
            .cloned()
            .collect();

        issues.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(issues)
    }

    async fn apply_order_patches(&mut self, patches: &[OrderPatch]) -> Result<()> {
        let mut inner = self.lock().await;

        // Validate every row before writing any: the batch is all-or-nothing.
        for patch in patches {
            if !inner.issues.contains_key(&patch.issue_id) {
                return Err(Error::IssueNotFound(patch.issue_id.clone()));
            }
        }

        let now = Utc::now();
        for patch in patches {
            // Presence was checked above; the lock is held throughout.
            if let Some(issue) = inner.issues.get_mut(&patch.issue_id) {
                issue.status = patch.status;
                issue.order = patch.order;
                issue.updated_at = now;
            }
        }

        Ok(())
    }
}
