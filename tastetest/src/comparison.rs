//! Pairings of control and test sources.

use crate::source::{AttributeComparisonSource, ComparisonSource};

/// A control source paired with a test source.
///
/// At least one side is always present. A pairing with only a control side is
/// a removal, one with only a test side is an addition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pairing<S> {
    control: Option<S>,
    test: Option<S>,
}

/// Pairing of two nodes.
pub type Comparison<'a> = Pairing<ComparisonSource<'a>>;

/// Pairing of two attributes.
pub type AttributeComparison<'a> = Pairing<AttributeComparisonSource<'a>>;

impl<S> Pairing<S> {
    /// Pair a control source with a test source.
    pub fn new(control: S, test: S) -> Self {
        Self {
            control: Some(control),
            test: Some(test),
        }
    }

    /// A control source with no counterpart in the test tree.
    pub fn removed(control: S) -> Self {
        Self {
            control: Some(control),
            test: None,
        }
    }

    /// A test source with no counterpart in the control tree.
    pub fn added(test: S) -> Self {
        Self {
            control: None,
            test: Some(test),
        }
    }

    pub fn control(&self) -> Option<&S> {
        self.control.as_ref()
    }

    pub fn test(&self) -> Option<&S> {
        self.test.as_ref()
    }

    /// Both sides, when this is a two-sided pairing.
    pub fn sources(&self) -> Option<(&S, &S)> {
        self.control.as_ref().zip(self.test.as_ref())
    }

    pub fn is_one_sided(&self) -> bool {
        self.control.is_none() || self.test.is_none()
    }

    /// The control side when present, the test side otherwise.
    pub fn primary(&self) -> &S {
        match (&self.control, &self.test) {
            (Some(control), _) => control,
            (None, Some(test)) => test,
            (None, None) => unreachable!("pairing without sources"),
        }
    }
}

impl<'a> Comparison<'a> {
    /// Whether both sides are the same kind of node (element, text, comment).
    pub fn same_node_type(&self) -> bool {
        self.sources().is_some_and(|(control, test)| {
            std::mem::discriminant(&control.data().kind) == std::mem::discriminant(&test.data().kind)
        })
    }

    /// Whether both sides are elements.
    pub fn both_elements(&self) -> bool {
        self.sources()
            .is_some_and(|(control, test)| control.data().is_element() && test.data().is_element())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse;
    use crate::source::SourceKind;
    use facet_testhelpers::test;

    #[test]
    fn test_one_sided_pairings() {
        let doc = parse("<p></p>");
        let p = ComparisonSource::root_sources(&doc, SourceKind::Control).remove(0);

        let removed = Comparison::removed(p.clone());
        assert!(removed.is_one_sided());
        assert_eq!(removed.control(), Some(&p));
        assert!(removed.test().is_none());
        assert!(removed.sources().is_none());
        assert_eq!(removed.primary(), &p);

        let added = Comparison::added(p.clone());
        assert!(added.is_one_sided());
        assert_eq!(added.test(), Some(&p));
        assert_eq!(added.primary(), &p);
    }

    #[test]
    fn test_node_type_checks() {
        let control = parse("<p>text</p>");
        let test = parse("<p><!-- c --></p>");
        let c = ComparisonSource::root_sources(&control, SourceKind::Control).remove(0);
        let t = ComparisonSource::root_sources(&test, SourceKind::Test).remove(0);

        let elements = Comparison::new(c.clone(), t.clone());
        assert!(elements.same_node_type());
        assert!(elements.both_elements());

        let children = Comparison::new(c.child_sources().remove(0), t.child_sources().remove(0));
        assert!(!children.same_node_type());
        assert!(!children.both_elements());
    }
}
