//! Domain types for the project tracker.
//!
//! Organisations contain projects, projects contain sprints, and sprints
//! contain issues that move across a four-column board. The organisation
//! itself is owned by the external identity provider; this crate only ever
//! references it by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a project or sprint name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Minimum length of a project key (short code such as "RCYT").
pub const MIN_KEY_LENGTH: usize = 2;

/// Maximum length of a project key.
pub const MAX_KEY_LENGTH: usize = 10;

/// Maximum length of an issue title.
pub const MAX_TITLE_LENGTH: usize = 50;

/// Maximum length of a free-form description on any entity.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new id from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// View the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Opaque organisation id, issued by the identity provider.
    OrgId
);
string_id!(
    /// Opaque user id, issued by the identity provider.
    UserId
);
string_id!(
    /// Unique identifier for a project.
    ProjectId
);
string_id!(
    /// Unique identifier for a sprint.
    SprintId
);
string_id!(
    /// Unique identifier for an issue.
    IssueId
);

/// Role of a user within an organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    /// Can create/delete projects and drive sprint lifecycles.
    Admin,

    /// Regular member; can create and work on issues.
    Member,
}

/// The authenticated caller plus their resolved role in the current
/// organisation.
///
/// Every mutating operation takes an `ActorContext` explicitly; there is no
/// ambient session state anywhere in this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    /// The caller's user id.
    pub user_id: UserId,

    /// The organisation the caller is currently acting in.
    pub organisation_id: OrgId,

    /// The caller's role within that organisation.
    pub role: OrgRole,
}

impl ActorContext {
    /// Whether the actor is an organisation admin.
    pub fn is_admin(&self) -> bool {
        self.role == OrgRole::Admin
    }
}

/// One entry in an organisation's membership list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// The member's user id.
    pub user_id: UserId,

    /// The member's role in the organisation.
    pub role: OrgRole,
}

/// A project within an organisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier for the project.
    pub id: ProjectId,

    /// The organisation that owns this project.
    pub organisation_id: OrgId,

    /// Short human key, e.g. "RCYT".
    pub key: String,

    /// Project name.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// Users with project-level admin rights (may delete any issue).
    pub admin_ids: Vec<UserId>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle status of a sprint.
///
/// Transitions move forward only: `Planned -> Active -> Completed`. A
/// completed sprint is immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SprintStatus {
    /// Created but not yet started.
    Planned,

    /// Currently running; the only state in which the board is editable.
    Active,

    /// Finished. Terminal.
    Completed,
}

impl fmt::Display for SprintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SprintStatus::Planned => "PLANNED",
            SprintStatus::Active => "ACTIVE",
            SprintStatus::Completed => "COMPLETED",
        };
        write!(f, "{label}")
    }
}

/// A sprint within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sprint {
    /// Unique identifier for the sprint.
    pub id: SprintId,

    /// The project this sprint belongs to.
    pub project_id: ProjectId,

    /// Sprint name.
    pub name: String,

    /// First day of the sprint.
    pub start_date: DateTime<Utc>,

    /// Last day of the sprint.
    pub end_date: DateTime<Utc>,

    /// Current lifecycle status.
    pub status: SprintStatus,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Board column an issue currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    /// Not started. The only column that accepts newly created issues.
    Todo,

    /// Being worked on.
    InProgress,

    /// Awaiting review.
    InReview,

    /// Finished.
    Done,
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IssueStatus::Todo => "TODO",
            IssueStatus::InProgress => "IN_PROGRESS",
            IssueStatus::InReview => "IN_REVIEW",
            IssueStatus::Done => "DONE",
        };
        write!(f, "{label}")
    }
}

/// Priority of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssuePriority {
    /// Lowest urgency.
    Low,

    /// Default urgency.
    Medium,

    /// Elevated urgency.
    High,

    /// Highest urgency.
    Urgent,
}

/// An issue (ticket) on the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Unique identifier for the issue.
    pub id: IssueId,

    /// The project this issue belongs to.
    pub project_id: ProjectId,

    /// The sprint this issue is scheduled into, if any.
    pub sprint_id: Option<SprintId>,

    /// Issue title.
    pub title: String,

    /// Optional description.
    pub description: Option<String>,

    /// Current board column.
    pub status: IssueStatus,

    /// Priority level.
    pub priority: IssuePriority,

    /// Position within the issue's (container, status) bucket.
    ///
    /// Dense per bucket: the orders of a bucket's members are exactly
    /// `0..n-1` between operations.
    pub order: u32,

    /// The user who created the issue. Immutable.
    pub reporter_id: UserId,

    /// The user the issue is assigned to, if any.
    pub assignee_id: Option<UserId>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// The container half of a bucket key: issues are ordered per
/// (project-or-sprint, status) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Container {
    /// Backlog issues ordered directly under a project.
    Project(ProjectId),

    /// Issues ordered within a sprint board.
    Sprint(SprintId),
}

impl Issue {
    /// The container this issue is ordered in: its sprint board when
    /// scheduled, otherwise the project backlog.
    pub fn container(&self) -> Container {
        match &self.sprint_id {
            Some(sprint_id) => Container::Sprint(sprint_id.clone()),
            None => Container::Project(self.project_id.clone()),
        }
    }
}

/// Data for creating a new project.
#[derive(Debug, Clone)]
pub struct NewProject {
    /// Short human key, e.g. "RCYT".
    pub key: String,

    /// Project name.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,
}

impl NewProject {
    /// Validate field lengths before the project reaches storage.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name is required".to_string());
        }
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(format!("Name must be under {MAX_NAME_LENGTH} characters"));
        }
        if self.key.len() < MIN_KEY_LENGTH {
            return Err(format!("Key requires {MIN_KEY_LENGTH} characters"));
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Err(format!("Key must be under {MAX_KEY_LENGTH} characters"));
        }
        validate_description(self.description.as_deref())
    }
}

/// Data for creating a new sprint. Sprints always start out `Planned`.
#[derive(Debug, Clone)]
pub struct NewSprint {
    /// Sprint name.
    pub name: String,

    /// First day of the sprint.
    pub start_date: DateTime<Utc>,

    /// Last day of the sprint.
    pub end_date: DateTime<Utc>,
}

impl NewSprint {
    /// Validate the name and the date range.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name is required".to_string());
        }
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(format!("Name must be under {MAX_NAME_LENGTH} characters"));
        }
        if self.end_date < self.start_date {
            return Err("End date must not be before start date".to_string());
        }
        Ok(())
    }
}

/// Data for creating a new issue.
#[derive(Debug, Clone)]
pub struct NewIssue {
    /// Issue title.
    pub title: String,

    /// Optional description.
    pub description: Option<String>,

    /// Board column to create the issue in. Must be [`IssueStatus::Todo`].
    pub status: IssueStatus,

    /// Priority level.
    pub priority: IssuePriority,

    /// Sprint to schedule the issue into, if any.
    pub sprint_id: Option<SprintId>,

    /// Initial assignee, if any.
    pub assignee_id: Option<UserId>,
}

impl NewIssue {
    /// Validate field lengths and the new-issue column rule.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        if self.title.len() > MAX_TITLE_LENGTH {
            return Err(format!("Title must be under {MAX_TITLE_LENGTH} characters"));
        }
        if self.status != IssueStatus::Todo {
            return Err("New issues can only be created in the TODO column".to_string());
        }
        validate_description(self.description.as_deref())
    }
}

/// Data for editing an issue's status and/or priority.
///
/// Only the fields that are `Some` are changed. Reporter, title and
/// description are not editable through this path.
#[derive(Debug, Clone, Default)]
pub struct IssueEdit {
    /// New board column, if changing.
    pub status: Option<IssueStatus>,

    /// New priority, if changing.
    pub priority: Option<IssuePriority>,
}

/// Request to reorder an issue within one sprint board column.
#[derive(Debug, Clone)]
pub struct ReorderRequest {
    /// The sprint whose board is being edited.
    pub sprint_id: SprintId,

    /// The column being reordered.
    pub status: IssueStatus,

    /// Current position of the dragged issue.
    pub from_index: usize,

    /// Target position within the same column.
    pub to_index: usize,
}

/// Request to move an issue from one sprint board column to another.
#[derive(Debug, Clone)]
pub struct MoveRequest {
    /// The sprint whose board is being edited.
    pub sprint_id: SprintId,

    /// Column the issue is dragged out of.
    pub from_status: IssueStatus,

    /// Column the issue is dropped into.
    pub to_status: IssueStatus,

    /// Current position within the source column.
    pub from_index: usize,

    /// Target position within the destination column. May equal the
    /// destination length (append).
    pub to_index: usize,
}

/// One row of a bulk order/status write-back.
///
/// After a reorder or move, every issue whose order or status changed gets a
/// patch; the whole batch is persisted atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPatch {
    /// The issue to patch.
    pub issue_id: IssueId,

    /// The issue's (possibly unchanged) board column.
    pub status: IssueStatus,

    /// The issue's new position within its bucket.
    pub order: u32,
}

fn validate_description(description: Option<&str>) -> Result<(), String> {
    if let Some(description) = description {
        if description.len() > MAX_DESCRIPTION_LENGTH {
            return Err(format!(
                "Description must be under {MAX_DESCRIPTION_LENGTH} characters"
            ));
        }
    }
    Ok(())
}
