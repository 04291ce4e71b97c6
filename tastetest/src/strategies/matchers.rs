//! Default matchers.
//!
//! All of them are lazy: they only look at the next candidate when the match
//! stage asks for another pairing, so they always see up-to-date markers.

use crate::collections::{SourceCollection, SourceMap, SourceSet, UnmatchedNodes, UnmatchedPositions};
use crate::comparison::{AttributeComparison, Comparison};
use crate::pipeline::DiffContext;

/// Postfix that marks a control attribute whose value is not compared.
pub const IGNORE_POSTFIX: &str = ":ignore";

/// Pairs each unmatched control node with the next unmatched test node of the
/// same name, searching forward from the previous pairing.
///
/// Keeps relative order: once a test node is paired, earlier test nodes are
/// left for later matchers.
pub fn forward_searching_node_matcher<'a>(
    _context: DiffContext<'a>,
    control: &SourceCollection<'a>,
    test: &SourceCollection<'a>,
) -> Box<dyn Iterator<Item = Comparison<'a>> + 'a> {
    Box::new(ForwardSearch {
        control: control.unmatched_positions(),
        test: test.clone(),
        next_test: 0,
    })
}

struct ForwardSearch<'a> {
    control: UnmatchedPositions<'a>,
    test: SourceCollection<'a>,
    next_test: usize,
}

impl<'a> Iterator for ForwardSearch<'a> {
    type Item = Comparison<'a>;

    fn next(&mut self) -> Option<Comparison<'a>> {
        for (_, control) in self.control.by_ref() {
            let name = control.node_name();
            let found = (self.next_test..self.test.len()).find(|&position| {
                !self.test.is_matched_at(position)
                    && self
                        .test
                        .get(position)
                        .is_some_and(|test| test.node_name() == name)
            });
            if let Some(position) = found {
                self.next_test = position + 1;
                let test = self.test.get(position)?.clone();
                return Some(Comparison::new(control, test));
            }
        }
        None
    }
}

/// Pairs the remaining unmatched nodes of both sides in order.
pub fn one_to_one_node_matcher<'a>(
    _context: DiffContext<'a>,
    control: &SourceCollection<'a>,
    test: &SourceCollection<'a>,
) -> Box<dyn Iterator<Item = Comparison<'a>> + 'a> {
    Box::new(OneToOne {
        control: control.unmatched(),
        test: test.unmatched(),
    })
}

struct OneToOne<'a> {
    control: UnmatchedNodes<'a>,
    test: UnmatchedNodes<'a>,
}

impl<'a> Iterator for OneToOne<'a> {
    type Item = Comparison<'a>;

    fn next(&mut self) -> Option<Comparison<'a>> {
        let control = self.control.next()?;
        let test = self.test.next()?;
        Some(Comparison::new(control, test))
    }
}

/// Pairs attributes by ASCII case-insensitive name.
///
/// A control attribute named `name:ignore` pairs with the test attribute `name`.
pub fn attribute_name_matcher<'a>(
    _context: DiffContext<'a>,
    control: &SourceMap<'a>,
    test: &SourceMap<'a>,
) -> Box<dyn Iterator<Item = AttributeComparison<'a>> + 'a> {
    let test = test.clone();
    Box::new(control.unmatched().filter_map(move |control| {
        let name = strip_ignore_postfix(control.name());
        let candidate = test.get(name)?;
        if test.is_matched(candidate) {
            return None;
        }
        Some(AttributeComparison::new(control, candidate.clone()))
    }))
}

/// `name` without a trailing `:ignore` (ASCII case-insensitive).
pub fn strip_ignore_postfix(name: &str) -> &str {
    match name.len().checked_sub(IGNORE_POSTFIX.len()) {
        Some(split)
            if name
                .get(split..)
                .is_some_and(|tail| tail.eq_ignore_ascii_case(IGNORE_POSTFIX)) =>
        {
            &name[..split]
        }
        _ => name,
    }
}
