//! Ordering engine for board columns.
//!
//! Issues are totally ordered within each (container, status) bucket by
//! their `order` field, which is kept dense: the orders of a bucket's
//! members are exactly `0..n-1`, no gaps, no duplicates. All functions here
//! are pure; the caller persists the result through
//! [`crate::storage::BoardStore::apply_order_patches`].
//!
//! Callers must write back every row reported by [`changed_rows`], not just
//! the dragged issue, and must do so in one atomic batch. Partial
//! persistence corrupts the dense-order invariant and is a programming
//! error, not a recoverable runtime condition.

use crate::domain::{Issue, IssueId, IssueStatus, OrderPatch};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Order for an issue newly inserted into `bucket`: always appended at the
/// end.
pub fn append_order(bucket: &[Issue]) -> u32 {
    u32::try_from(bucket.len()).unwrap_or(u32::MAX)
}

/// Remove the issue at `from` and reinsert it at `to` within the same
/// bucket, then densely renumber the result.
///
/// `from == to` is a defined no-op: element order is unchanged and the
/// renumbering reproduces the existing orders.
///
/// # Errors
///
/// Returns [`Error::IndexOutOfRange`] if `from` or `to` is outside
/// `[0, len)`.
pub fn reorder_within_bucket(
    mut bucket: Vec<Issue>,
    from: usize,
    to: usize,
) -> Result<Vec<Issue>> {
    let len = bucket.len();
    check_index(from, len)?;
    check_index(to, len)?;

    let moved = bucket.remove(from);
    bucket.insert(to, moved);
    renumber(&mut bucket);

    Ok(bucket)
}

/// Move the issue at `from` out of `source`, give it `status`, and insert it
/// at `to` in `dest`; both resulting buckets are densely renumbered from 0.
///
/// `to` is an insertion position, so `to == dest.len()` (append) is valid.
///
/// # Errors
///
/// Returns [`Error::IndexOutOfRange`] if `from` is outside `[0, len(source))`
/// or `to` is outside `[0, len(dest)]`.
pub fn move_across_buckets(
    mut source: Vec<Issue>,
    mut dest: Vec<Issue>,
    from: usize,
    to: usize,
    status: IssueStatus,
) -> Result<(Vec<Issue>, Vec<Issue>)> {
    check_index(from, source.len())?;
    if to > dest.len() {
        return Err(Error::IndexOutOfRange {
            index: to,
            len: dest.len(),
        });
    }

    let mut moved = source.remove(from);
    moved.status = status;
    dest.insert(to, moved);

    renumber(&mut source);
    renumber(&mut dest);

    Ok((source, dest))
}

/// Densely renumber a bucket after an out-of-band removal (issue deletion
/// leaves a gap that the next renumbering must close).
pub fn compact(mut bucket: Vec<Issue>) -> Vec<Issue> {
    renumber(&mut bucket);
    bucket
}

/// Compute the write-back batch after a reorder or move.
///
/// `before` maps each issue id to its persisted `(status, order)` pair;
/// `after` is the concatenation of the recomputed buckets. Issues whose pair
/// is unchanged are omitted, so an identity reorder yields an empty batch.
pub fn changed_rows(
    before: &HashMap<IssueId, (IssueStatus, u32)>,
    after: &[Issue],
) -> Vec<OrderPatch> {
    after
        .iter()
        .filter(|issue| before.get(&issue.id) != Some(&(issue.status, issue.order)))
        .map(|issue| OrderPatch {
            issue_id: issue.id.clone(),
            status: issue.status,
            order: issue.order,
        })
        .collect()
}

/// Snapshot the persisted `(status, order)` pairs of the given buckets, for
/// later diffing with [`changed_rows`].
pub fn snapshot(buckets: &[&[Issue]]) -> HashMap<IssueId, (IssueStatus, u32)> {
    buckets
        .iter()
        .flat_map(|bucket| bucket.iter())
        .map(|issue| (issue.id.clone(), (issue.status, issue.order)))
        .collect()
}

fn renumber(bucket: &mut [Issue]) {
    for (index, issue) in bucket.iter_mut().enumerate() {
        issue.order = u32::try_from(index).unwrap_or(u32::MAX);
    }
}

fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(Error::IndexOutOfRange { index, len });
    }
    Ok(())
}
