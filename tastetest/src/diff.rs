//! Differences found between the control and test trees.

use crate::comparison::{AttributeComparison, Comparison};
use crate::source::{AttributeComparisonSource, ComparisonSource};

/// What kind of node a node diff is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffTarget {
    Element,
    Text,
    Comment,
    /// Nodes of different kinds, or kinds with no dedicated target
    Node,
}

impl DiffTarget {
    /// Target for a node pairing, based on the control side.
    pub fn of(comparison: &Comparison<'_>) -> Self {
        if !comparison.same_node_type() {
            return DiffTarget::Node;
        }
        let data = comparison.primary().data();
        if data.is_element() {
            DiffTarget::Element
        } else if data.is_text() {
            DiffTarget::Text
        } else if data.is_comment() {
            DiffTarget::Comment
        } else {
            DiffTarget::Node
        }
    }
}

/// How a diff relates the two trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffResult {
    /// Present in both trees but not equivalent
    Different,
    /// Present in the control tree only
    Missing,
    /// Present in the test tree only
    Unexpected,
}

/// A single discrepancy, together with the sources it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diff<'a> {
    /// Two paired nodes are not equivalent
    Node {
        comparison: Comparison<'a>,
        target: DiffTarget,
    },
    /// Two paired attributes are not equivalent
    Attr { comparison: AttributeComparison<'a> },
    /// A control node has no counterpart in the test tree
    MissingNode { control: ComparisonSource<'a> },
    /// A test node has no counterpart in the control tree
    UnexpectedNode { test: ComparisonSource<'a> },
    /// A control attribute has no counterpart on the test element
    MissingAttr {
        control: AttributeComparisonSource<'a>,
    },
    /// A test attribute has no counterpart on the control element
    UnexpectedAttr { test: AttributeComparisonSource<'a> },
}

impl<'a> Diff<'a> {
    /// Node diff for a pairing, with the target derived from its sources.
    pub fn node(comparison: Comparison<'a>) -> Self {
        let target = DiffTarget::of(&comparison);
        Diff::Node { comparison, target }
    }

    pub fn attr(comparison: AttributeComparison<'a>) -> Self {
        Diff::Attr { comparison }
    }

    /// Diff for a one-sided node pairing: missing or unexpected.
    ///
    /// Two-sided pairings get a node diff.
    pub fn unmatched_node(comparison: Comparison<'a>) -> Self {
        match (comparison.control(), comparison.test()) {
            (Some(control), None) => Diff::MissingNode {
                control: control.clone(),
            },
            (None, Some(test)) => Diff::UnexpectedNode { test: test.clone() },
            _ => Diff::node(comparison),
        }
    }

    /// Diff for a one-sided attribute pairing: missing or unexpected.
    pub fn unmatched_attr(comparison: AttributeComparison<'a>) -> Self {
        match (comparison.control(), comparison.test()) {
            (Some(control), None) => Diff::MissingAttr {
                control: control.clone(),
            },
            (None, Some(test)) => Diff::UnexpectedAttr { test: test.clone() },
            _ => Diff::attr(comparison),
        }
    }

    pub fn result_kind(&self) -> DiffResult {
        match self {
            Diff::Node { .. } | Diff::Attr { .. } => DiffResult::Different,
            Diff::MissingNode { .. } | Diff::MissingAttr { .. } => DiffResult::Missing,
            Diff::UnexpectedNode { .. } | Diff::UnexpectedAttr { .. } => DiffResult::Unexpected,
        }
    }

    /// Path of the source the diff is reported at: the control side when there
    /// is one, the test side otherwise.
    pub fn path(&self) -> &str {
        match self {
            Diff::Node { comparison, .. } => comparison.primary().path(),
            Diff::Attr { comparison } => comparison.primary().path(),
            Diff::MissingNode { control } => control.path(),
            Diff::UnexpectedNode { test } => test.path(),
            Diff::MissingAttr { control } => control.path(),
            Diff::UnexpectedAttr { test } => test.path(),
        }
    }

    /// Whether the diff concerns an attribute rather than a node.
    pub fn is_attribute(&self) -> bool {
        matches!(
            self,
            Diff::Attr { .. } | Diff::MissingAttr { .. } | Diff::UnexpectedAttr { .. }
        )
    }
}
