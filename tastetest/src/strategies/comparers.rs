//! Default node and attribute comparers.
//!
//! Every comparer passes the running result through untouched when the
//! pairing is not its business, so they can be registered in any combination.

use super::filters::preserves_whitespace;
use super::matchers::strip_ignore_postfix;
use crate::compare_result::{CompareDecision, CompareResult};
use crate::comparison::{AttributeComparison, Comparison};
use crate::diff::Diff;
use crate::source::ComparisonSource;

/// Control attribute that ignores an element and its subtree.
pub const IGNORE_ATTRIBUTE: &str = "diff:ignore";

/// Control attribute that ignores an element's children.
pub const IGNORE_CHILDREN_ATTRIBUTE: &str = "diff:ignorechildren";

/// Control attribute that ignores an element's attributes.
pub const IGNORE_ATTRIBUTES_ATTRIBUTE: &str = "diff:ignoreattributes";

/// Attributes whose presence is their value.
pub const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "allowfullscreen",
    "async",
    "autofocus",
    "autoplay",
    "checked",
    "controls",
    "default",
    "defer",
    "disabled",
    "formnovalidate",
    "hidden",
    "inert",
    "ismap",
    "itemscope",
    "loop",
    "multiple",
    "muted",
    "nomodule",
    "novalidate",
    "open",
    "playsinline",
    "readonly",
    "required",
    "reversed",
    "selected",
];

/// Pairings of different node kinds are different, and nothing below them is compared.
pub fn node_type_comparer<'a>(
    comparison: &Comparison<'a>,
    result: CompareResult<'a>,
) -> CompareResult<'a> {
    if comparison.is_one_sided() || comparison.same_node_type() {
        return result;
    }
    CompareResult::different_and_break(Diff::node(comparison.clone()))
}

/// Elements with the same (case-insensitive) tag are the same.
pub fn element_comparer<'a>(
    comparison: &Comparison<'a>,
    result: CompareResult<'a>,
) -> CompareResult<'a> {
    let Some((control, test)) = comparison.sources() else {
        return result;
    };
    if !comparison.both_elements() {
        return result;
    }
    if control.node_name() == test.node_name() {
        CompareResult::SAME
    } else {
        CompareResult::different_and_break(Diff::node(comparison.clone()))
    }
}

/// Text nodes are the same when their whitespace-normalized content is equal.
///
/// Inside `<pre>`, `<textarea>`, `<script>` and `<style>` the content must
/// match exactly.
pub fn text_comparer<'a>(
    comparison: &Comparison<'a>,
    result: CompareResult<'a>,
) -> CompareResult<'a> {
    let Some((control, test)) = comparison.sources() else {
        return result;
    };
    let (Some(control_text), Some(test_text)) = (control.data().as_text(), test.data().as_text())
    else {
        return result;
    };

    let same = if preserves_whitespace(control) {
        control_text == test_text
    } else {
        normalized_eq(control_text, test_text)
    };
    if same {
        CompareResult::SAME
    } else {
        CompareResult::different(Diff::node(comparison.clone()))
    }
}

/// Comments are the same when their trimmed content is equal.
pub fn comment_comparer<'a>(
    comparison: &Comparison<'a>,
    result: CompareResult<'a>,
) -> CompareResult<'a> {
    let Some((control, test)) = comparison.sources() else {
        return result;
    };
    let (Some(control_text), Some(test_text)) =
        (control.data().as_comment(), test.data().as_comment())
    else {
        return result;
    };
    if control_text.trim() == test_text.trim() {
        CompareResult::SAME
    } else {
        CompareResult::different(Diff::node(comparison.clone()))
    }
}

/// `diff:ignore` on the control element makes the pairing the same and stops
/// the walk there.
///
/// An empty value or `true` (any case) ignores; any other value leaves the
/// running result alone.
pub fn ignore_element_comparer<'a>(
    comparison: &Comparison<'a>,
    result: CompareResult<'a>,
) -> CompareResult<'a> {
    match control_flag(comparison, IGNORE_ATTRIBUTE) {
        Some(true) => CompareResult::SAME_AND_BREAK,
        _ => result,
    }
}

/// `diff:ignorechildren` on a control element that compared the same skips its children.
pub fn ignore_children_comparer<'a>(
    comparison: &Comparison<'a>,
    result: CompareResult<'a>,
) -> CompareResult<'a> {
    if result.is_same() && control_flag(comparison, IGNORE_CHILDREN_ATTRIBUTE) == Some(true) {
        result.with_decision(CompareDecision::SKIP_CHILDREN)
    } else {
        result
    }
}

/// `diff:ignoreattributes` on a control element that compared the same skips its attributes.
pub fn ignore_attributes_comparer<'a>(
    comparison: &Comparison<'a>,
    result: CompareResult<'a>,
) -> CompareResult<'a> {
    if result.is_same() && control_flag(comparison, IGNORE_ATTRIBUTES_ATTRIBUTE) == Some(true) {
        result.with_decision(CompareDecision::SKIP_ATTRIBUTES)
    } else {
        result
    }
}

/// Attributes with the same name and value are the same.
///
/// A control name ending in `:ignore` is compared without the postfix.
pub fn attribute_comparer<'a>(
    comparison: &AttributeComparison<'a>,
    result: CompareResult<'a>,
) -> CompareResult<'a> {
    let Some((control, test)) = comparison.sources() else {
        return result;
    };
    let same_name = strip_ignore_postfix(control.name()).eq_ignore_ascii_case(test.name());
    if same_name && control.value() == test.value() {
        CompareResult::SAME
    } else {
        CompareResult::different(Diff::attr(comparison.clone()))
    }
}

/// Control attributes named `name:ignore` are the same whatever the test value.
pub fn ignore_attribute_comparer<'a>(
    comparison: &AttributeComparison<'a>,
    result: CompareResult<'a>,
) -> CompareResult<'a> {
    match comparison.control() {
        Some(control) if strip_ignore_postfix(control.name()).len() < control.name().len() => {
            CompareResult::SAME
        }
        _ => result,
    }
}

/// Boolean attributes are the same when both sides carry them, whatever the values.
pub fn boolean_attribute_comparer<'a>(
    comparison: &AttributeComparison<'a>,
    result: CompareResult<'a>,
) -> CompareResult<'a> {
    let Some((control, test)) = comparison.sources() else {
        return result;
    };
    let name = strip_ignore_postfix(control.name());
    let boolean = BOOLEAN_ATTRIBUTES
        .iter()
        .any(|known| known.eq_ignore_ascii_case(name));
    if boolean && name.eq_ignore_ascii_case(test.name()) {
        CompareResult::SAME
    } else {
        result
    }
}

/// Value of a boolean `diff:*` flag on the control element.
///
/// `None` when the attribute is absent or the control side is not an element.
fn control_flag(comparison: &Comparison<'_>, name: &str) -> Option<bool> {
    let value = comparison
        .control()
        .and_then(ComparisonSource::element)?
        .attr_value(name)?;
    Some(value.is_empty() || value.eq_ignore_ascii_case("true"))
}

fn normalized_eq(a: &str, b: &str) -> bool {
    a.split_ascii_whitespace().eq(b.split_ascii_whitespace())
}
