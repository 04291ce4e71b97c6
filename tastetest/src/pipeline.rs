//! The strategy pipeline: ordered filter, match and compare policies.
//!
//! Each stage folds its registered policies in registration order:
//! 1. **Filter**: `decision = Keep; decision = policy(source, decision)` for every policy
//! 2. **Match**: every matcher yields pairings lazily; each pairing is marked matched
//!    in the shared collections before the next one is requested
//! 3. **Compare**: `result = seed; result = policy(comparison, result)` for every policy
//!
//! Registration order is the only precedence mechanism.

use crate::collections::{SourceCollection, SourceMap, SourceSet};
use crate::comparison::{AttributeComparison, Comparison, Pairing};
use crate::compare_result::CompareResult;
use crate::dom::Document;
use crate::source::{AttributeComparisonSource, ComparisonSource};
use crate::tracing_macros::{debug, trace};
use std::fmt;

/// Whether a source takes part in matching and comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterDecision {
    #[default]
    Keep,
    /// The source (and, for nodes, its subtree) is dropped
    Exclude,
}

impl FilterDecision {
    pub fn is_keep(self) -> bool {
        self == FilterDecision::Keep
    }

    pub fn is_exclude(self) -> bool {
        self == FilterDecision::Exclude
    }
}

/// How the filter fold treats an `Exclude` reached midway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Later filters see the running decision and may override it, including
    /// turning an `Exclude` back into `Keep`.
    #[default]
    Permissive,
    /// Once the fold reaches `Exclude` it stays there. Later filters still run
    /// but their answer is ignored.
    Monotonic,
}

/// The two trees being compared, available to every matcher.
#[derive(Debug, Clone, Copy)]
pub struct DiffContext<'a> {
    pub control: &'a Document,
    pub test: &'a Document,
}

impl<'a> DiffContext<'a> {
    pub fn new(control: &'a Document, test: &'a Document) -> Self {
        Self { control, test }
    }
}

/// Node filter: `(source, running decision) -> decision`.
pub type NodeFilter = Box<dyn Fn(&ComparisonSource<'_>, FilterDecision) -> FilterDecision>;

/// Attribute filter: `(source, running decision) -> decision`.
pub type AttributeFilter =
    Box<dyn Fn(&AttributeComparisonSource<'_>, FilterDecision) -> FilterDecision>;

/// Node matcher: lazily pairs the unmatched members of two sibling groups.
pub type NodeMatcher = Box<
    dyn for<'a> Fn(
        DiffContext<'a>,
        &SourceCollection<'a>,
        &SourceCollection<'a>,
    ) -> Box<dyn Iterator<Item = Comparison<'a>> + 'a>,
>;

/// Attribute matcher: lazily pairs the unmatched attributes of two elements.
pub type AttributeMatcher = Box<
    dyn for<'a> Fn(
        DiffContext<'a>,
        &SourceMap<'a>,
        &SourceMap<'a>,
    ) -> Box<dyn Iterator<Item = AttributeComparison<'a>> + 'a>,
>;

/// Node comparer: `(comparison, running result) -> result`.
pub type NodeComparer = Box<dyn for<'a> Fn(&Comparison<'a>, CompareResult<'a>) -> CompareResult<'a>>;

/// Attribute comparer: `(comparison, running result) -> result`.
pub type AttributeComparer =
    Box<dyn for<'a> Fn(&AttributeComparison<'a>, CompareResult<'a>) -> CompareResult<'a>>;

/// Ordered policy lists for the six stage instantiations.
///
/// [`DiffingPipeline::default`] registers the stock strategies; [`DiffingPipeline::new`]
/// starts empty.
pub struct DiffingPipeline {
    filter_mode: FilterMode,
    node_filters: Vec<NodeFilter>,
    attribute_filters: Vec<AttributeFilter>,
    node_matchers: Vec<NodeMatcher>,
    attribute_matchers: Vec<AttributeMatcher>,
    node_comparers: Vec<NodeComparer>,
    attribute_comparers: Vec<AttributeComparer>,
}

impl fmt::Debug for DiffingPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffingPipeline")
            .field("filter_mode", &self.filter_mode)
            .field("node_filters", &self.node_filters.len())
            .field("attribute_filters", &self.attribute_filters.len())
            .field("node_matchers", &self.node_matchers.len())
            .field("attribute_matchers", &self.attribute_matchers.len())
            .field("node_comparers", &self.node_comparers.len())
            .field("attribute_comparers", &self.attribute_comparers.len())
            .finish()
    }
}

impl DiffingPipeline {
    /// An empty pipeline: keeps everything, matches nothing, and every pairing
    /// compares as the stage seed.
    pub fn new() -> Self {
        Self {
            filter_mode: FilterMode::default(),
            node_filters: Vec::new(),
            attribute_filters: Vec::new(),
            node_matchers: Vec::new(),
            attribute_matchers: Vec::new(),
            node_comparers: Vec::new(),
            attribute_comparers: Vec::new(),
        }
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    pub fn set_filter_mode(&mut self, mode: FilterMode) -> &mut Self {
        self.filter_mode = mode;
        self
    }

    pub fn add_node_filter<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(&ComparisonSource<'_>, FilterDecision) -> FilterDecision + 'static,
    {
        self.node_filters.push(Box::new(filter));
        self
    }

    pub fn add_attribute_filter<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(&AttributeComparisonSource<'_>, FilterDecision) -> FilterDecision + 'static,
    {
        self.attribute_filters.push(Box::new(filter));
        self
    }

    pub fn add_node_matcher<F>(&mut self, matcher: F) -> &mut Self
    where
        F: for<'a> Fn(
                DiffContext<'a>,
                &SourceCollection<'a>,
                &SourceCollection<'a>,
            ) -> Box<dyn Iterator<Item = Comparison<'a>> + 'a>
            + 'static,
    {
        self.node_matchers.push(Box::new(matcher));
        self
    }

    pub fn add_attribute_matcher<F>(&mut self, matcher: F) -> &mut Self
    where
        F: for<'a> Fn(
                DiffContext<'a>,
                &SourceMap<'a>,
                &SourceMap<'a>,
            ) -> Box<dyn Iterator<Item = AttributeComparison<'a>> + 'a>
            + 'static,
    {
        self.attribute_matchers.push(Box::new(matcher));
        self
    }

    pub fn add_node_comparer<F>(&mut self, comparer: F) -> &mut Self
    where
        F: for<'a> Fn(&Comparison<'a>, CompareResult<'a>) -> CompareResult<'a> + 'static,
    {
        self.node_comparers.push(Box::new(comparer));
        self
    }

    pub fn add_attribute_comparer<F>(&mut self, comparer: F) -> &mut Self
    where
        F: for<'a> Fn(&AttributeComparison<'a>, CompareResult<'a>) -> CompareResult<'a> + 'static,
    {
        self.attribute_comparers.push(Box::new(comparer));
        self
    }

    /// Run the node filters over `source`.
    pub fn filter_node(&self, source: &ComparisonSource<'_>) -> FilterDecision {
        let decision = fold_filters(source, &self.node_filters, self.filter_mode);
        trace!(path = source.path(), ?decision, "filter node");
        decision
    }

    /// Run the attribute filters over `source`.
    pub fn filter_attribute(&self, source: &AttributeComparisonSource<'_>) -> FilterDecision {
        let decision = fold_filters(source, &self.attribute_filters, self.filter_mode);
        trace!(path = source.path(), ?decision, "filter attribute");
        decision
    }

    /// Pair the node sources of one sibling group.
    ///
    /// The returned iterator is lazy: a matcher is only invoked once every
    /// earlier matcher is exhausted, and each pairing is marked matched in
    /// `control` and `test` before the next one is pulled.
    pub fn match_nodes<'p, 'a>(
        &'p self,
        context: DiffContext<'a>,
        control: &SourceCollection<'a>,
        test: &SourceCollection<'a>,
    ) -> Matches<'p, 'a, SourceCollection<'a>, NodeMatcher> {
        debug!(
            control = control.len(),
            test = test.len(),
            matchers = self.node_matchers.len(),
            "match nodes"
        );
        Matches::new(context, control.clone(), test.clone(), &self.node_matchers)
    }

    /// Pair the attribute sources of two elements. Same laziness as [`Self::match_nodes`].
    pub fn match_attributes<'p, 'a>(
        &'p self,
        context: DiffContext<'a>,
        control: &SourceMap<'a>,
        test: &SourceMap<'a>,
    ) -> Matches<'p, 'a, SourceMap<'a>, AttributeMatcher> {
        debug!(
            control = control.len(),
            test = test.len(),
            matchers = self.attribute_matchers.len(),
            "match attributes"
        );
        Matches::new(context, control.clone(), test.clone(), &self.attribute_matchers)
    }

    /// Fold the node comparers over `comparison`, seeded with `DIFFERENT_AND_BREAK`.
    pub fn compare_nodes<'a>(&self, comparison: &Comparison<'a>) -> CompareResult<'a> {
        let result = fold_comparers(
            comparison,
            &self.node_comparers,
            CompareResult::DIFFERENT_AND_BREAK,
        );
        trace!(path = comparison.primary().path(), decision = ?result.decision, "compare nodes");
        result
    }

    /// Fold the attribute comparers over `comparison`, seeded with `DIFFERENT`.
    pub fn compare_attributes<'a>(&self, comparison: &AttributeComparison<'a>) -> CompareResult<'a> {
        let result = fold_comparers(comparison, &self.attribute_comparers, CompareResult::DIFFERENT);
        trace!(path = comparison.primary().path(), decision = ?result.decision, "compare attributes");
        result
    }
}

fn fold_filters<S, F>(source: &S, filters: &[F], mode: FilterMode) -> FilterDecision
where
    F: Fn(&S, FilterDecision) -> FilterDecision,
{
    let mut decision = FilterDecision::Keep;
    for filter in filters {
        let next = filter(source, decision);
        decision = match mode {
            FilterMode::Permissive => next,
            FilterMode::Monotonic if decision.is_exclude() => decision,
            FilterMode::Monotonic => next,
        };
    }
    decision
}

fn fold_comparers<'a, S, F>(
    comparison: &Pairing<S>,
    comparers: &[F],
    seed: CompareResult<'a>,
) -> CompareResult<'a>
where
    F: Fn(&Pairing<S>, CompareResult<'a>) -> CompareResult<'a>,
{
    comparers
        .iter()
        .fold(seed, |result, comparer| comparer(comparison, result))
}

/// Lazy, flattened output of the match stage.
///
/// Yields the pairings of every matcher in registration order. Dropping it
/// early leaves later matchers uninvoked.
pub struct Matches<'p, 'a, C: SourceSet, M> {
    context: DiffContext<'a>,
    control: C,
    test: C,
    matchers: std::slice::Iter<'p, M>,
    current: Option<Box<dyn Iterator<Item = Pairing<C::Source>> + 'a>>,
}

impl<'p, 'a, C: SourceSet, M> Matches<'p, 'a, C, M> {
    fn new(context: DiffContext<'a>, control: C, test: C, matchers: &'p [M]) -> Self {
        Self {
            context,
            control,
            test,
            matchers: matchers.iter(),
            current: None,
        }
    }

    /// The control collection these matches are marked in.
    pub fn control(&self) -> &C {
        &self.control
    }

    /// The test collection these matches are marked in.
    pub fn test(&self) -> &C {
        &self.test
    }

    fn mark(&self, pairing: &Pairing<C::Source>) {
        if let Some(control) = pairing.control() {
            let fresh = self.control.mark_as_matched(control);
            debug_assert!(fresh, "matcher paired a control source that was already matched");
        }
        if let Some(test) = pairing.test() {
            let fresh = self.test.mark_as_matched(test);
            debug_assert!(fresh, "matcher paired a test source that was already matched");
        }
    }
}

impl<'p, 'a, C, M> Iterator for Matches<'p, 'a, C, M>
where
    C: SourceSet,
    M: Fn(DiffContext<'a>, &C, &C) -> Box<dyn Iterator<Item = Pairing<C::Source>> + 'a>,
{
    type Item = Pairing<C::Source>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(current) = self.current.as_mut() {
                if let Some(pairing) = current.next() {
                    self.mark(&pairing);
                    return Some(pairing);
                }
                self.current = None;
            }
            let matcher = self.matchers.next()?;
            self.current = Some(matcher(self.context, &self.control, &self.test));
        }
    }
}
