//! Decisions produced by compare policies.

use crate::diff::Diff;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Composable decision flags.
///
/// `SAME` and `DIFFERENT` say how the pairing compares; `SKIP`,
/// `SKIP_CHILDREN`, `SKIP_ATTRIBUTES` and `BREAK` say what the differ does
/// with the pairing's descendants.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CompareDecision(u8);

impl CompareDecision {
    /// No policy has decided yet
    pub const UNKNOWN: Self = Self(0);
    pub const SAME: Self = Self(1);
    pub const DIFFERENT: Self = Self(1 << 1);
    /// Suppress the pairing and everything below it
    pub const SKIP: Self = Self(1 << 2);
    pub const SKIP_CHILDREN: Self = Self(1 << 3);
    pub const SKIP_ATTRIBUTES: Self = Self(1 << 4);
    /// Do not descend into attributes or children
    pub const BREAK: Self = Self(1 << 5);

    const NAMES: [(Self, &'static str); 6] = [
        (Self::SAME, "SAME"),
        (Self::DIFFERENT, "DIFFERENT"),
        (Self::SKIP, "SKIP"),
        (Self::SKIP_CHILDREN, "SKIP_CHILDREN"),
        (Self::SKIP_ATTRIBUTES, "SKIP_ATTRIBUTES"),
        (Self::BREAK, "BREAK"),
    ];

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether every flag in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any flag in `other` is set.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn is_unknown(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for CompareDecision {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for CompareDecision {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl fmt::Debug for CompareDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return write!(f, "UNKNOWN");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    write!(f, " | ")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// The running value of a compare fold: a decision plus an optional diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareResult<'a> {
    pub decision: CompareDecision,
    pub diff: Option<Diff<'a>>,
}

impl<'a> CompareResult<'a> {
    pub const UNKNOWN: Self = Self::from_decision(CompareDecision::UNKNOWN);
    pub const SAME: Self = Self::from_decision(CompareDecision::SAME);
    pub const SAME_AND_BREAK: Self =
        Self::from_decision(CompareDecision::SAME.union(CompareDecision::BREAK));
    pub const DIFFERENT: Self = Self::from_decision(CompareDecision::DIFFERENT);
    pub const DIFFERENT_AND_BREAK: Self =
        Self::from_decision(CompareDecision::DIFFERENT.union(CompareDecision::BREAK));
    pub const SKIP: Self = Self::from_decision(CompareDecision::SKIP);
    pub const SKIP_CHILDREN: Self = Self::from_decision(CompareDecision::SKIP_CHILDREN);
    pub const SKIP_ATTRIBUTES: Self = Self::from_decision(CompareDecision::SKIP_ATTRIBUTES);

    pub const fn from_decision(decision: CompareDecision) -> Self {
        Self {
            decision,
            diff: None,
        }
    }

    /// `DIFFERENT` carrying a diff.
    pub fn different(diff: Diff<'a>) -> Self {
        Self {
            decision: CompareDecision::DIFFERENT,
            diff: Some(diff),
        }
    }

    /// `DIFFERENT_AND_BREAK` carrying a diff.
    pub fn different_and_break(diff: Diff<'a>) -> Self {
        Self {
            decision: CompareDecision::DIFFERENT | CompareDecision::BREAK,
            diff: Some(diff),
        }
    }

    /// Same result with extra flags set; the diff is kept.
    pub fn with_decision(mut self, flags: CompareDecision) -> Self {
        self.decision |= flags;
        self
    }

    pub fn is_same(&self) -> bool {
        self.decision.contains(CompareDecision::SAME)
    }

    pub fn is_different(&self) -> bool {
        self.decision.contains(CompareDecision::DIFFERENT)
    }

    pub fn is_skip(&self) -> bool {
        self.decision.contains(CompareDecision::SKIP)
    }

    pub fn is_same_or_skip(&self) -> bool {
        self.is_same() || self.is_skip()
    }

    pub fn should_break(&self) -> bool {
        self.decision.contains(CompareDecision::BREAK)
    }

    /// Whether the differ should look at this pairing's attributes.
    pub fn visits_attributes(&self) -> bool {
        !self.decision.intersects(
            CompareDecision::SKIP | CompareDecision::SKIP_ATTRIBUTES | CompareDecision::BREAK,
        )
    }

    /// Whether the differ should look at this pairing's children.
    pub fn visits_children(&self) -> bool {
        !self.decision.intersects(
            CompareDecision::SKIP | CompareDecision::SKIP_CHILDREN | CompareDecision::BREAK,
        )
    }
}

impl Default for CompareResult<'_> {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_flags_compose() {
        let decision = CompareDecision::SAME | CompareDecision::SKIP_CHILDREN;
        assert!(decision.contains(CompareDecision::SAME));
        assert!(decision.contains(CompareDecision::SKIP_CHILDREN));
        assert!(!decision.contains(CompareDecision::DIFFERENT));
        assert!(decision.intersects(CompareDecision::SKIP_CHILDREN | CompareDecision::SKIP));
        assert_eq!(decision.without(CompareDecision::SAME), CompareDecision::SKIP_CHILDREN);
        assert_eq!(decision.bits(), 0b1001);
    }

    #[test]
    fn test_unknown_is_default() {
        assert_eq!(CompareResult::default(), CompareResult::UNKNOWN);
        assert!(CompareResult::UNKNOWN.decision.is_unknown());
        assert_eq!(format!("{:?}", CompareDecision::UNKNOWN), "UNKNOWN");
    }

    #[test]
    fn test_debug_lists_flags() {
        let decision = CompareDecision::DIFFERENT | CompareDecision::BREAK;
        assert_eq!(format!("{decision:?}"), "DIFFERENT | BREAK");
    }

    #[test]
    fn test_descent_rules() {
        assert!(CompareResult::SAME.visits_attributes());
        assert!(CompareResult::SAME.visits_children());
        assert!(CompareResult::DIFFERENT.visits_children());

        assert!(!CompareResult::SKIP.visits_attributes());
        assert!(!CompareResult::SKIP.visits_children());

        assert!(!CompareResult::SAME_AND_BREAK.visits_attributes());
        assert!(!CompareResult::DIFFERENT_AND_BREAK.visits_children());

        let same_skip_children = CompareResult::SAME.with_decision(CompareDecision::SKIP_CHILDREN);
        assert!(same_skip_children.visits_attributes());
        assert!(!same_skip_children.visits_children());

        let same_skip_attrs = CompareResult::SAME.with_decision(CompareDecision::SKIP_ATTRIBUTES);
        assert!(!same_skip_attrs.visits_attributes());
        assert!(same_skip_attrs.visits_children());
    }

    #[test]
    fn test_is_same_or_skip() {
        assert!(CompareResult::SAME.is_same_or_skip());
        assert!(CompareResult::SAME_AND_BREAK.is_same_or_skip());
        assert!(CompareResult::SKIP.is_same_or_skip());
        assert!(!CompareResult::DIFFERENT.is_same_or_skip());
        assert!(CompareResult::DIFFERENT_AND_BREAK.is_different());
        assert!(CompareResult::DIFFERENT_AND_BREAK.should_break());
    }
}
