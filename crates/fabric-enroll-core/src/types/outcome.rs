use std::fmt;

use super::Identity;
use crate::EnrollmentStage;

/// Result of a successful `ensure_enrolled` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    /// An identity was already stored under the label; nothing was done
    AlreadyEnrolled,
    /// The CA issued a new identity and it was stored
    NewlyEnrolled(Identity),
}

impl EnrollmentOutcome {
    /// Returns true if this call performed a new enrollment
    #[must_use]
    pub const fn is_new(&self) -> bool {
        matches!(self, Self::NewlyEnrolled(_))
    }

    /// The newly stored identity, if any
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::NewlyEnrolled(identity) => Some(identity),
            Self::AlreadyEnrolled => None,
        }
    }
}

/// Progress of a single enrollment attempt.
///
/// ```text
/// NotChecked -> Checked(absent) -> Enrolling -> Stored
///            -> Checked(present) -> Done
/// any non-terminal state -> Failed(stage)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentState {
    NotChecked,
    Checked { present: bool },
    Enrolling,
    Stored,
    Done,
    Failed(EnrollmentStage),
}

impl EnrollmentState {
    /// Returns true once no further transition is possible
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stored | Self::Done | Self::Failed(_))
    }

    /// Whether moving from `self` to `next` is a legal transition
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::NotChecked, Self::Checked { .. })
            | (Self::Checked { present: false }, Self::Enrolling)
            | (Self::Checked { present: true }, Self::Done)
            | (Self::Enrolling, Self::Stored | Self::Done) => true,
            (from, Self::Failed(_)) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for EnrollmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotChecked => f.write_str("not checked"),
            Self::Checked { present: true } => f.write_str("checked (present)"),
            Self::Checked { present: false } => f.write_str("checked (absent)"),
            Self::Enrolling => f.write_str("enrolling"),
            Self::Stored => f.write_str("stored"),
            Self::Done => f.write_str("done"),
            Self::Failed(stage) => write!(f, "failed during {stage}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_paths() {
        use EnrollmentState::*;
        assert!(NotChecked.can_transition_to(Checked { present: false }));
        assert!(Checked { present: false }.can_transition_to(Enrolling));
        assert!(Enrolling.can_transition_to(Stored));
        assert!(Checked { present: true }.can_transition_to(Done));
        assert!(Stored.is_terminal());
        assert!(Done.is_terminal());
    }

    #[test]
    fn test_illegal_transitions() {
        use EnrollmentState::*;
        assert!(!NotChecked.can_transition_to(Enrolling));
        assert!(!Checked { present: true }.can_transition_to(Enrolling));
        assert!(!Stored.can_transition_to(Failed(EnrollmentStage::StoreWrite)));
        assert!(Enrolling.can_transition_to(Failed(EnrollmentStage::CaRequest)));
    }

    #[test]
    fn test_outcome_accessors() {
        assert!(!EnrollmentOutcome::AlreadyEnrolled.is_new());
        assert!(EnrollmentOutcome::AlreadyEnrolled.identity().is_none());
    }
}
