//! Soft-delete lifecycle for reference-counted entities.
//!
//! An entity that still has dependents (stars) cannot disappear under them,
//! so a delete request parks it in `PendingDeletion`. The transition to
//! destruction fires when the last dependent reference is dropped; no
//! background sweep exists.
//!
//! ```text
//! Active --delete(refs > 0)--> PendingDeletion --last ref removed--> Destroyed
//!   |                                                                  ^
//!   +--------------------delete(refs == 0)-----------------------------+
//! ```

use serde::{Deserialize, Serialize};

/// Persisted lifecycle state. `Destroyed` is never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    #[default]
    Active,
    /// Marked deleted; hidden from reads, kept until references drain.
    PendingDeletion,
}

/// What the storage layer must do after a lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Persist the (possibly changed) state.
    Retain(Lifecycle),
    /// Remove the entity permanently.
    Destroy,
}

impl Lifecycle {
    /// Maps the `is_deleted` storage flag.
    pub fn from_deleted_flag(is_deleted: bool) -> Self {
        if is_deleted {
            Self::PendingDeletion
        } else {
            Self::Active
        }
    }

    pub fn is_deleted(self) -> bool {
        self == Self::PendingDeletion
    }

    /// Owner asked for deletion while `references` dependents remain.
    pub fn on_delete_requested(self, references: u64) -> Disposition {
        if references == 0 {
            Disposition::Destroy
        } else {
            Disposition::Retain(Self::PendingDeletion)
        }
    }

    /// A dependent reference was dropped, leaving `remaining`.
    pub fn on_reference_removed(self, remaining: u64) -> Disposition {
        match self {
            Self::PendingDeletion if remaining == 0 => Disposition::Destroy,
            state => Disposition::Retain(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Disposition, Lifecycle};

    #[test]
    fn delete_without_references_destroys_immediately() {
        assert_eq!(
            Lifecycle::Active.on_delete_requested(0),
            Disposition::Destroy
        );
    }

    #[test]
    fn delete_with_references_parks_entity() {
        assert_eq!(
            Lifecycle::Active.on_delete_requested(2),
            Disposition::Retain(Lifecycle::PendingDeletion)
        );
        assert_eq!(
            Lifecycle::PendingDeletion.on_delete_requested(1),
            Disposition::Retain(Lifecycle::PendingDeletion)
        );
    }

    #[test]
    fn draining_references_only_destroys_pending_entities() {
        assert_eq!(
            Lifecycle::Active.on_reference_removed(0),
            Disposition::Retain(Lifecycle::Active)
        );
        assert_eq!(
            Lifecycle::PendingDeletion.on_reference_removed(1),
            Disposition::Retain(Lifecycle::PendingDeletion)
        );
        assert_eq!(
            Lifecycle::PendingDeletion.on_reference_removed(0),
            Disposition::Destroy
        );
    }
}
