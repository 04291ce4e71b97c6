//! Stock filters, matchers and comparers, and the options that pick them.

pub mod comparers;
pub mod filters;
pub mod matchers;

use crate::pipeline::{DiffingPipeline, FilterMode};

/// Which stock strategies [`DiffingPipeline::with_options`] registers.
///
/// Use struct update syntax to change a single knob:
///
/// ```
/// use tastetest::DiffOptions;
///
/// let options = DiffOptions {
///     ignore_comments: false,
///     ..Default::default()
/// };
/// assert!(options.ignore_whitespace);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Drop comment nodes before matching.
    pub ignore_comments: bool,

    /// Drop whitespace-only text nodes outside whitespace-preserving elements.
    pub ignore_whitespace: bool,

    /// Drop `diff:*` attributes before attribute matching.
    pub ignore_diff_attributes: bool,

    pub filter_mode: FilterMode,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            ignore_comments: true,
            ignore_whitespace: true,
            ignore_diff_attributes: true,
            filter_mode: FilterMode::Permissive,
        }
    }
}

impl DiffingPipeline {
    /// A pipeline with the stock strategies, registered in this order:
    ///
    /// - node filters: comments, whitespace text (each when enabled)
    /// - attribute filters: `diff:*` attributes (when enabled)
    /// - node matchers: forward searching by name, then one to one
    /// - attribute matchers: by name
    /// - node comparers: node type, element, text, comment, then the `diff:ignore*` family
    /// - attribute comparers: value, boolean, then `:ignore`
    pub fn with_options(options: &DiffOptions) -> Self {
        let mut pipeline = Self::new();
        pipeline.set_filter_mode(options.filter_mode);

        if options.ignore_comments {
            pipeline.add_node_filter(filters::ignore_comments);
        }
        if options.ignore_whitespace {
            pipeline.add_node_filter(filters::ignore_whitespace_text);
        }
        if options.ignore_diff_attributes {
            pipeline.add_attribute_filter(filters::ignore_diff_attributes);
        }

        pipeline
            .add_node_matcher(matchers::forward_searching_node_matcher)
            .add_node_matcher(matchers::one_to_one_node_matcher)
            .add_attribute_matcher(matchers::attribute_name_matcher);

        pipeline
            .add_node_comparer(comparers::node_type_comparer)
            .add_node_comparer(comparers::element_comparer)
            .add_node_comparer(comparers::text_comparer)
            .add_node_comparer(comparers::comment_comparer)
            .add_node_comparer(comparers::ignore_element_comparer)
            .add_node_comparer(comparers::ignore_children_comparer)
            .add_node_comparer(comparers::ignore_attributes_comparer);

        pipeline
            .add_attribute_comparer(comparers::attribute_comparer)
            .add_attribute_comparer(comparers::boolean_attribute_comparer)
            .add_attribute_comparer(comparers::ignore_attribute_comparer);

        pipeline
    }
}

impl Default for DiffingPipeline {
    fn default() -> Self {
        Self::with_options(&DiffOptions::default())
    }
}
