//! Tree walk: drives the pipeline over two documents and yields diffs lazily.
//!
//! The walk keeps an explicit stack of sibling-group frames. Each frame owns
//! the collections of its group and the live match iterator, so nothing below
//! the current pairing is filtered, matched or compared until the consumer
//! pulls far enough to need it.

use crate::collections::{SourceCollection, SourceMap, SourceSet};
use crate::comparison::{AttributeComparison, Comparison, Pairing};
use crate::diff::Diff;
use crate::dom::Document;
use crate::pipeline::{AttributeMatcher, DiffContext, DiffingPipeline, Matches, NodeMatcher};
use crate::source::{AttributeComparisonSource, ComparisonSource, SourceKind};
use crate::tracing_macros::{debug, trace};
use std::iter::FusedIterator;

/// Compares control and test trees with a [`DiffingPipeline`].
#[derive(Debug, Clone, Copy)]
pub struct HtmlDiffer<'p> {
    pipeline: &'p DiffingPipeline,
}

impl<'p> HtmlDiffer<'p> {
    pub fn new(pipeline: &'p DiffingPipeline) -> Self {
        Self { pipeline }
    }

    /// Diff two documents: the children of `<body>`, preceded by the `<head>`
    /// elements when either document has head content.
    pub fn compare<'a>(&self, control: &'a Document, test: &'a Document) -> Diffs<'p, 'a> {
        let mut diffs = self.compare_sources(
            DiffContext::new(control, test),
            ComparisonSource::root_sources(control, SourceKind::Control),
            ComparisonSource::root_sources(test, SourceKind::Test),
        );
        // Pushed last, so the head is walked before the body content
        if control.has_head_content() || test.has_head_content() {
            diffs.push_nodes(
                ComparisonSource::head_sources(control, SourceKind::Control),
                ComparisonSource::head_sources(test, SourceKind::Test),
            );
        }
        diffs
    }

    /// Diff two arbitrary sibling groups.
    pub fn compare_sources<'a>(
        &self,
        context: DiffContext<'a>,
        control: impl IntoIterator<Item = ComparisonSource<'a>>,
        test: impl IntoIterator<Item = ComparisonSource<'a>>,
    ) -> Diffs<'p, 'a> {
        let mut diffs = Diffs {
            pipeline: self.pipeline,
            context,
            stack: Vec::new(),
        };
        diffs.push_nodes(control, test);
        diffs
    }
}

/// The lazy diff sequence.
///
/// Single pass: iterating again means calling [`HtmlDiffer::compare`] again,
/// which walks both trees from scratch. Dropping it early leaves the rest of
/// the trees unvisited.
pub struct Diffs<'p, 'a> {
    pipeline: &'p DiffingPipeline,
    context: DiffContext<'a>,
    stack: Vec<Frame<'p, 'a>>,
}

enum Frame<'p, 'a> {
    Nodes(Group<'p, 'a, SourceCollection<'a>, NodeMatcher>),
    Attributes(Group<'p, 'a, SourceMap<'a>, AttributeMatcher>),
}

/// Pairings of one group: matcher output first, then the leftovers of each side.
struct Group<'p, 'a, C: SourceSet, M> {
    matches: Matches<'p, 'a, C, M>,
    phase: Phase<C::Unmatched>,
}

enum Phase<U> {
    Matching,
    Missing(U),
    Unexpected(U),
}

impl<'p, 'a, C, M> Group<'p, 'a, C, M>
where
    C: SourceSet,
    Matches<'p, 'a, C, M>: Iterator<Item = Pairing<C::Source>>,
{
    fn new(matches: Matches<'p, 'a, C, M>) -> Self {
        Self {
            matches,
            phase: Phase::Matching,
        }
    }

    fn next_pairing(&mut self) -> Option<Pairing<C::Source>> {
        loop {
            match &mut self.phase {
                Phase::Matching => {
                    if let Some(pairing) = self.matches.next() {
                        return Some(pairing);
                    }
                    self.phase = Phase::Missing(self.matches.control().unmatched());
                }
                Phase::Missing(leftovers) => {
                    if let Some(control) = leftovers.next() {
                        return Some(Pairing::removed(control));
                    }
                    self.phase = Phase::Unexpected(self.matches.test().unmatched());
                }
                Phase::Unexpected(leftovers) => return leftovers.next().map(Pairing::added),
            }
        }
    }
}

enum Step<'a> {
    Node(Comparison<'a>),
    Attribute(AttributeComparison<'a>),
}

impl<'p, 'a> Diffs<'p, 'a> {
    fn push_nodes(
        &mut self,
        control: impl IntoIterator<Item = ComparisonSource<'a>>,
        test: impl IntoIterator<Item = ComparisonSource<'a>>,
    ) {
        let pipeline = self.pipeline;
        let keep = |source: &ComparisonSource<'a>| pipeline.filter_node(source).is_keep();
        let control = SourceCollection::new(SourceKind::Control, control.into_iter().filter(keep));
        let test = SourceCollection::new(SourceKind::Test, test.into_iter().filter(keep));
        debug!(control = control.len(), test = test.len(), "node group");
        let matches = pipeline.match_nodes(self.context, &control, &test);
        self.stack.push(Frame::Nodes(Group::new(matches)));
    }

    fn push_attributes(&mut self, control: &ComparisonSource<'a>, test: &ComparisonSource<'a>) {
        let pipeline = self.pipeline;
        let keep =
            |source: &AttributeComparisonSource<'a>| pipeline.filter_attribute(source).is_keep();
        let control = SourceMap::new(
            SourceKind::Control,
            AttributeComparisonSource::all(control).into_iter().filter(keep),
        );
        let test = SourceMap::new(
            SourceKind::Test,
            AttributeComparisonSource::all(test).into_iter().filter(keep),
        );
        if control.is_empty() && test.is_empty() {
            return;
        }
        debug!(control = control.len(), test = test.len(), "attribute group");
        let matches = pipeline.match_attributes(self.context, &control, &test);
        self.stack.push(Frame::Attributes(Group::new(matches)));
    }

    /// Compare one node pairing and schedule its attributes and children.
    ///
    /// Attributes are pushed last so they are walked before the children.
    fn visit_node(&mut self, comparison: Comparison<'a>) -> Option<Diff<'a>> {
        if comparison.is_one_sided() {
            trace!(path = comparison.primary().path(), "unmatched node");
            return Some(Diff::unmatched_node(comparison));
        }

        let result = self.pipeline.compare_nodes(&comparison);
        trace!(
            path = comparison.primary().path(),
            decision = ?result.decision,
            "node decision"
        );
        if result.is_skip() {
            return None;
        }

        if let Some((control, test)) = comparison.sources()
            && comparison.both_elements()
        {
            if result.visits_children() {
                self.push_nodes(control.child_sources(), test.child_sources());
            }
            if result.visits_attributes() {
                self.push_attributes(control, test);
            }
        }

        if !result.is_different() {
            return None;
        }
        Some(result.diff.unwrap_or_else(|| Diff::node(comparison)))
    }

    fn visit_attribute(&self, comparison: AttributeComparison<'a>) -> Option<Diff<'a>> {
        if comparison.is_one_sided() {
            trace!(path = comparison.primary().path(), "unmatched attribute");
            return Some(Diff::unmatched_attr(comparison));
        }

        let result = self.pipeline.compare_attributes(&comparison);
        trace!(
            path = comparison.primary().path(),
            decision = ?result.decision,
            "attribute decision"
        );
        if result.is_skip() || !result.is_different() {
            return None;
        }
        Some(result.diff.unwrap_or_else(|| Diff::attr(comparison)))
    }
}

impl<'p, 'a> Iterator for Diffs<'p, 'a> {
    type Item = Diff<'a>;

    fn next(&mut self) -> Option<Diff<'a>> {
        loop {
            let step = match self.stack.last_mut()? {
                Frame::Nodes(group) => group.next_pairing().map(Step::Node),
                Frame::Attributes(group) => group.next_pairing().map(Step::Attribute),
            };
            let diff = match step {
                None => {
                    self.stack.pop();
                    continue;
                }
                Some(Step::Node(comparison)) => self.visit_node(comparison),
                Some(Step::Attribute(comparison)) => self.visit_attribute(comparison),
            };
            if diff.is_some() {
                return diff;
            }
        }
    }
}

impl FusedIterator for Diffs<'_, '_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare_result::CompareResult;
    use crate::diff::DiffResult;
    use crate::dom::parse;
    use crate::pipeline::FilterDecision;
    use facet_testhelpers::test;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn positional<'a>(
        _context: DiffContext<'a>,
        control: &SourceCollection<'a>,
        test: &SourceCollection<'a>,
    ) -> Box<dyn Iterator<Item = Comparison<'a>> + 'a> {
        Box::new(
            control
                .unmatched()
                .zip(test.unmatched())
                .map(|(c, t)| Comparison::new(c, t)),
        )
    }

    fn by_name<'a>(
        _context: DiffContext<'a>,
        control: &SourceMap<'a>,
        test: &SourceMap<'a>,
    ) -> Box<dyn Iterator<Item = AttributeComparison<'a>> + 'a> {
        let test = test.clone();
        Box::new(control.unmatched().filter_map(move |c| {
            test.get(c.name())
                .filter(|t| !test.is_matched(t))
                .cloned()
                .map(|t| AttributeComparison::new(c, t))
        }))
    }

    /// Same tag is Same; anything else stays at the seed.
    fn same_tag<'a>(comparison: &Comparison<'a>, result: CompareResult<'a>) -> CompareResult<'a> {
        match comparison.sources() {
            Some((c, t)) if c.node_name() == t.node_name() && comparison.both_elements() => {
                CompareResult::SAME
            }
            _ => result,
        }
    }

    fn equal_values<'a>(
        comparison: &AttributeComparison<'a>,
        result: CompareResult<'a>,
    ) -> CompareResult<'a> {
        match comparison.sources() {
            Some((c, t)) if c.value() == t.value() => CompareResult::SAME,
            _ => result,
        }
    }

    fn basic_pipeline() -> DiffingPipeline {
        let mut pipeline = DiffingPipeline::new();
        pipeline
            .add_node_matcher(positional)
            .add_attribute_matcher(by_name)
            .add_node_comparer(same_tag)
            .add_attribute_comparer(equal_values);
        pipeline
    }

    fn summary(diffs: Diffs<'_, '_>) -> Vec<(DiffResult, String)> {
        diffs
            .map(|diff| (diff.result_kind(), diff.path().to_string()))
            .collect()
    }

    #[test]
    fn test_identical_paragraphs_have_no_diffs() {
        let control = parse("<p></p>");
        let test = parse("<p></p>");
        let pipeline = basic_pipeline();
        assert!(HtmlDiffer::new(&pipeline).compare(&control, &test).next().is_none());
    }

    #[test]
    fn test_tag_mismatch_reports_root_only() {
        let control = parse(r#"<p class="a"><em>x</em></p>"#);
        let test = parse(r#"<span class="b"><b>y</b></span>"#);
        let pipeline = basic_pipeline();

        let diffs: Vec<_> = HtmlDiffer::new(&pipeline).compare(&control, &test).collect();
        assert_eq!(diffs.len(), 1);
        assert!(matches!(&diffs[0], Diff::Node { .. }));
        assert_eq!(diffs[0].path(), "p(0)");
    }

    #[test]
    fn test_excluded_nodes_never_surface() {
        let control = parse(r#"<div><p data-ignore class="x"><b></b></p><i></i></div>"#);
        let test = parse("<div><i></i></div>");
        let seen = Rc::new(RefCell::new(Vec::new()));

        let mut pipeline = basic_pipeline();
        pipeline.add_node_filter(|source, decision| {
            if source.element().is_some_and(|e| e.has_attr("data-ignore")) {
                FilterDecision::Exclude
            } else {
                decision
            }
        });
        let log = Rc::clone(&seen);
        pipeline.add_node_comparer(move |comparison, result| {
            log.borrow_mut().push(comparison.primary().path().to_string());
            result
        });

        let diffs: Vec<_> = HtmlDiffer::new(&pipeline).compare(&control, &test).collect();
        assert!(diffs.is_empty(), "{diffs:?}");
        assert!(seen.borrow().iter().all(|path| !path.contains("p(0)")));
    }

    #[test]
    fn test_extra_list_item_is_one_addition() {
        let control = parse("<ul><li>a</li><li>b</li></ul>");
        let test = parse("<ul><li>z</li><li>b</li><li>c</li></ul>");

        // Paired items compare Different, which must not change the leftover count
        let mut pipeline = DiffingPipeline::new();
        pipeline.add_node_matcher(positional).add_node_comparer(|comparison, result| {
            if comparison.sources().is_some_and(|(c, _)| c.node_name() == "ul") {
                CompareResult::SAME
            } else {
                result
            }
        });

        let diffs = summary(HtmlDiffer::new(&pipeline).compare(&control, &test));
        let additions: Vec<_> = diffs
            .iter()
            .filter(|(kind, _)| *kind == DiffResult::Unexpected)
            .collect();
        assert_eq!(additions, vec![&(DiffResult::Unexpected, "ul(0) > li(2)".to_string())]);
    }

    #[test]
    fn test_skip_suppresses_subtree() {
        let control = parse(r#"<div id="a"><p>one</p></div>"#);
        let test = parse(r#"<div id="b"><span>two</span><i></i></div>"#);

        let mut pipeline = basic_pipeline();
        pipeline.add_node_comparer(|_, _| CompareResult::SKIP);
        assert!(HtmlDiffer::new(&pipeline).compare(&control, &test).next().is_none());
    }

    #[test]
    fn test_attribute_diffs_precede_children() {
        let control = parse(r#"<div id="a" title="t"><p></p></div>"#);
        let test = parse(r#"<div id="b" lang="en"><span></span></div>"#);
        let pipeline = basic_pipeline();

        let diffs = summary(HtmlDiffer::new(&pipeline).compare(&control, &test));
        assert_eq!(
            diffs,
            vec![
                (DiffResult::Different, "div(0)[id]".to_string()),
                (DiffResult::Missing, "div(0)[title]".to_string()),
                (DiffResult::Unexpected, "div(0)[lang]".to_string()),
                (DiffResult::Different, "div(0) > p(0)".to_string()),
            ]
        );
    }

    #[test]
    fn test_skip_children_and_attributes() {
        let control = parse(r#"<div id="a"><p></p></div>"#);
        let test = parse(r#"<div id="b"><span></span></div>"#);

        let mut children_only = basic_pipeline();
        children_only.add_node_comparer(|_, result| {
            result.with_decision(crate::compare_result::CompareDecision::SKIP_ATTRIBUTES)
        });
        let diffs = summary(HtmlDiffer::new(&children_only).compare(&control, &test));
        assert_eq!(diffs, vec![(DiffResult::Different, "div(0) > p(0)".to_string())]);

        let mut attributes_only = basic_pipeline();
        attributes_only.add_node_comparer(|_, result| {
            result.with_decision(crate::compare_result::CompareDecision::SKIP_CHILDREN)
        });
        let diffs = summary(HtmlDiffer::new(&attributes_only).compare(&control, &test));
        assert_eq!(diffs, vec![(DiffResult::Different, "div(0)[id]".to_string())]);
    }

    #[test]
    fn test_empty_pipeline_reports_every_root() {
        let control = parse("<p></p><div></div>");
        let test = parse("<p></p>");
        let pipeline = DiffingPipeline::new();

        let diffs = summary(HtmlDiffer::new(&pipeline).compare(&control, &test));
        assert_eq!(
            diffs,
            vec![
                (DiffResult::Missing, "p(0)".to_string()),
                (DiffResult::Missing, "div(1)".to_string()),
                (DiffResult::Unexpected, "p(0)".to_string()),
            ]
        );
    }

    #[test]
    fn test_attached_diff_is_emitted() {
        let control = parse("<p></p>");
        let test = parse("<p></p>");

        let mut pipeline = DiffingPipeline::new();
        pipeline
            .add_node_matcher(positional)
            .add_node_comparer(|comparison, _| {
                CompareResult::different(Diff::unmatched_node(Comparison::removed(
                    comparison.primary().clone(),
                )))
            });

        let diffs: Vec<_> = HtmlDiffer::new(&pipeline).compare(&control, &test).collect();
        assert_eq!(diffs.len(), 1);
        assert!(matches!(diffs[0], Diff::MissingNode { .. }));
    }

    #[test]
    fn test_stops_pulling_leaves_rest_unvisited() {
        let control = parse("<p></p><p></p><p></p>");
        let test = parse("<i></i><i></i><i></i>");
        let compared = Rc::new(RefCell::new(0));

        let mut pipeline = DiffingPipeline::new();
        let counter = Rc::clone(&compared);
        pipeline
            .add_node_matcher(positional)
            .add_node_comparer(move |_, result| {
                *counter.borrow_mut() += 1;
                result
            });

        let mut diffs = HtmlDiffer::new(&pipeline).compare(&control, &test);
        assert!(diffs.next().is_some());
        drop(diffs);
        assert_eq!(*compared.borrow(), 1);
    }

    #[test]
    fn test_exhaustive_and_unique_pairing() {
        let control = parse("<a></a><b></b><i></i><u></u>");
        let test = parse("<b></b><a></a><s></s>");
        let pairings = Rc::new(RefCell::new(Vec::new()));

        let mut pipeline = DiffingPipeline::new();
        // Pairs by tag name, then positionally
        pipeline.add_node_matcher(|_, control, test| {
            let test = test.clone();
            Box::new(control.unmatched().filter_map(move |c| {
                test.unmatched()
                    .find(|t| t.node_name() == c.node_name())
                    .map(|t| Comparison::new(c, t))
            }))
        });
        pipeline.add_node_matcher(positional);
        let log = Rc::clone(&pairings);
        pipeline.add_node_comparer(move |comparison, result| {
            log.borrow_mut().push(comparison.clone());
            result
        });

        let diffs: Vec<_> = HtmlDiffer::new(&pipeline).compare(&control, &test).collect();
        let pairings = pairings.borrow();
        assert_eq!(pairings.len(), 3);

        let mut control_seen = Vec::new();
        let mut test_seen = Vec::new();
        for pairing in pairings.iter() {
            control_seen.extend(pairing.control().map(|s| s.path().to_string()));
            test_seen.extend(pairing.test().map(|s| s.path().to_string()));
        }
        for diff in &diffs {
            match diff {
                Diff::MissingNode { control } => control_seen.push(control.path().to_string()),
                Diff::UnexpectedNode { test } => test_seen.push(test.path().to_string()),
                _ => {}
            }
        }
        control_seen.sort();
        test_seen.sort();
        assert_eq!(control_seen, vec!["a(0)", "b(1)", "i(2)", "u(3)"]);
        assert_eq!(test_seen, vec!["a(1)", "b(0)", "s(2)"]);
    }
}
