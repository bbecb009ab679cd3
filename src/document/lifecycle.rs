//! Document lifecycle policy
//!
//! Pure transition rules, independent of storage:
//!
//! | op      | approval_status | last_review            | document_approved          |
//! |---------|-----------------|------------------------|----------------------------|
//! | Review  | unchanged       | max(last_review, now)  | unchanged                  |
//! | Approve | Approved        | max(last_review, now)  | document_approved ?? now   |
//!
//! There is no transition back to `Pending`.

use std::fmt;

use chrono::{DateTime, Utc};

use super::model::{ApprovalStatus, LifecycleState};

/// Lifecycle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    /// Record an examination without changing approval
    Review,
    /// Mark officially accepted; first approval timestamp wins
    Approve,
}

impl LifecycleOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleOp::Review => "review",
            LifecycleOp::Approve => "approve",
        }
    }
}

impl fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of applying an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub next: LifecycleState,
    /// Status moved from Pending to Approved
    pub newly_approved: bool,
    /// `now` was earlier than the stored review time and was not applied
    pub clock_behind: bool,
}

/// Compute the next lifecycle state
pub fn transition(
    current: &LifecycleState,
    op: LifecycleOp,
    now: DateTime<Utc>,
) -> TransitionOutcome {
    let (last_review, clock_behind) = match current.last_review {
        Some(prev) if prev > now => (prev, true),
        _ => (now, false),
    };

    let next = match op {
        LifecycleOp::Review => LifecycleState {
            last_review: Some(last_review),
            ..*current
        },
        LifecycleOp::Approve => LifecycleState {
            approval_status: ApprovalStatus::Approved,
            last_review: Some(last_review),
            document_approved: current.document_approved.or(Some(now)),
        },
    };

    TransitionOutcome {
        next,
        newly_approved: current.approval_status == ApprovalStatus::Pending
            && next.approval_status == ApprovalStatus::Approved,
        clock_behind,
    }
}
