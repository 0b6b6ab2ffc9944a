//! Record lifecycle
//!
//! Users and organizations are never physically removed. Deletion moves a
//! record into [`Lifecycle::Deleted`] and the record is retained.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a soft-deletable record.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use tenancy_org::Lifecycle;
///
/// let mut state = Lifecycle::Active;
/// assert!(!state.is_deleted());
///
/// state = Lifecycle::Deleted { at: Utc::now() };
/// assert!(state.is_deleted());
/// assert!(state.deleted_at().is_some());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Lifecycle {
    /// Record is live
    #[default]
    Active,

    /// Record was soft-deleted at the given instant
    Deleted {
        /// When the record was deleted
        at: DateTime<Utc>,
    },
}

impl Lifecycle {
    /// Check if the record is live.
    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }

    /// Check if the record was soft-deleted.
    pub fn is_deleted(&self) -> bool {
        matches!(self, Lifecycle::Deleted { .. })
    }

    /// Get the deletion instant, if any.
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Lifecycle::Active => None,
            Lifecycle::Deleted { at } => Some(*at),
        }
    }
}
