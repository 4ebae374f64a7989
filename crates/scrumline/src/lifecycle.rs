//! Sprint lifecycle state machine.
//!
//! Sprints move `Planned -> Active -> Completed`, forward only. Starting a
//! sprint is additionally gated on the wall clock sitting inside the
//! sprint's date range, and every transition requires an organisation
//! admin. The functions here are pure over a single sprint; the service
//! layer persists the result and enforces the cross-sprint
//! one-active-per-project rule.

use crate::domain::{ActorContext, Sprint, SprintStatus};
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};

/// Apply a status transition request to a sprint.
///
/// On success returns the sprint with `status` replaced and no other field
/// changed; the caller persists.
///
/// # Errors
///
/// - [`Error::Forbidden`] unless the actor is an organisation admin.
/// - [`Error::InvalidTransition`] for a backward transition, a same-state
///   request, a start outside the sprint's date range, or completing a
///   sprint that is not active.
pub fn request_transition(
    sprint: &Sprint,
    target: SprintStatus,
    actor: &ActorContext,
    now: DateTime<Utc>,
) -> Result<Sprint> {
    if !actor.is_admin() {
        return Err(Error::forbidden("Only admins can change sprint status"));
    }

    let invalid = |reason: &str| Error::InvalidTransition {
        from: sprint.status,
        to: target,
        reason: reason.to_string(),
    };

    match target {
        SprintStatus::Active => {
            if sprint.status != SprintStatus::Planned {
                return Err(invalid("only planned sprints can be started"));
            }
            if now < sprint.start_date || now > sprint.end_date {
                return Err(invalid(
                    "sprint cannot be started outside of its planned date range",
                ));
            }
        }
        SprintStatus::Completed => {
            if sprint.status != SprintStatus::Active {
                return Err(invalid("only active sprints can be completed"));
            }
        }
        SprintStatus::Planned => {
            return Err(invalid("sprints cannot move back to planned"));
        }
    }

    let mut updated = sprint.clone();
    updated.status = target;
    Ok(updated)
}

/// Check that a sprint's board accepts issue reorder/move operations.
///
/// Boards are only editable while the sprint is running: a planned sprint
/// must be started first and a completed sprint is immutable.
///
/// # Errors
///
/// Returns [`Error::Validation`] with a user-facing message otherwise.
pub fn ensure_board_editable(sprint: &Sprint) -> Result<()> {
    match sprint.status {
        SprintStatus::Active => Ok(()),
        SprintStatus::Planned => Err(Error::Validation(
            "To modify issues, start the sprint first".to_string(),
        )),
        SprintStatus::Completed => Err(Error::Validation(
            "Cannot modify issues in a completed sprint".to_string(),
        )),
    }
}

/// Where a sprint sits relative to the clock, for board headers and badges.
///
/// This is presentation policy layered on the status value, not a
/// transition rule: an overdue sprint is still `Active` until an admin
/// completes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SprintPhase {
    /// Planned, start date still ahead. Show a countdown.
    Upcoming {
        /// Time remaining until the start date.
        starts_in: Duration,
    },

    /// Planned and inside its date range; eligible to be started.
    Startable,

    /// Active and inside its date range.
    Running,

    /// Active but past its end date. Show an overdue indicator.
    Overdue {
        /// Time elapsed since the end date.
        overdue_by: Duration,
    },

    /// Completed. Terminal label.
    Ended,
}

/// Classify a sprint against the current time.
pub fn phase(sprint: &Sprint, now: DateTime<Utc>) -> SprintPhase {
    match sprint.status {
        SprintStatus::Planned => {
            if now < sprint.start_date {
                SprintPhase::Upcoming {
                    starts_in: sprint.start_date - now,
                }
            } else {
                SprintPhase::Startable
            }
        }
        SprintStatus::Active => {
            if now > sprint.end_date {
                SprintPhase::Overdue {
                    overdue_by: now - sprint.end_date,
                }
            } else {
                SprintPhase::Running
            }
        }
        SprintStatus::Completed => SprintPhase::Ended,
    }
}
