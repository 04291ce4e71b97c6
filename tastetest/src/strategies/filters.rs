//! Default filters.

use crate::pipeline::FilterDecision;
use crate::source::{AttributeComparisonSource, ComparisonSource};

/// Elements whose text content is compared byte for byte.
pub const WHITESPACE_PRESERVING_ELEMENTS: &[&str] = &["pre", "textarea", "script", "style"];

/// Prefix of the attributes that steer the differ itself.
pub const DIFF_ATTRIBUTE_PREFIX: &str = "diff:";

/// Excludes comment nodes.
pub fn ignore_comments(source: &ComparisonSource<'_>, decision: FilterDecision) -> FilterDecision {
    if source.data().is_comment() {
        FilterDecision::Exclude
    } else {
        decision
    }
}

/// Excludes whitespace-only text nodes, except inside whitespace-preserving elements.
pub fn ignore_whitespace_text(
    source: &ComparisonSource<'_>,
    decision: FilterDecision,
) -> FilterDecision {
    let Some(text) = source.data().as_text() else {
        return decision;
    };
    if !text.trim().is_empty() || preserves_whitespace(source) {
        return decision;
    }
    FilterDecision::Exclude
}

/// Excludes `diff:*` attributes so they never show up as attribute diffs.
pub fn ignore_diff_attributes(
    source: &AttributeComparisonSource<'_>,
    decision: FilterDecision,
) -> FilterDecision {
    let prefix = source.name().get(..DIFF_ATTRIBUTE_PREFIX.len());
    if prefix.is_some_and(|prefix| prefix.eq_ignore_ascii_case(DIFF_ATTRIBUTE_PREFIX)) {
        FilterDecision::Exclude
    } else {
        decision
    }
}

/// Whether `source` sits inside `<pre>`, `<textarea>`, `<script>` or `<style>`.
pub(crate) fn preserves_whitespace(source: &ComparisonSource<'_>) -> bool {
    source
        .document()
        .has_ancestor_tag(source.node(), WHITESPACE_PRESERVING_ELEMENTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse;
    use crate::source::SourceKind;
    use facet_testhelpers::test;

    #[test]
    fn test_comments_excluded() {
        let doc = parse("<!-- note --><p></p>");
        let sources = ComparisonSource::root_sources(&doc, SourceKind::Control);
        assert_eq!(
            ignore_comments(&sources[0], FilterDecision::Keep),
            FilterDecision::Exclude
        );
        assert_eq!(
            ignore_comments(&sources[1], FilterDecision::Keep),
            FilterDecision::Keep
        );
    }

    #[test]
    fn test_running_decision_passes_through() {
        let doc = parse("<p></p>");
        let p = &ComparisonSource::root_sources(&doc, SourceKind::Control)[0];
        assert_eq!(
            ignore_comments(p, FilterDecision::Exclude),
            FilterDecision::Exclude
        );
        assert_eq!(
            ignore_whitespace_text(p, FilterDecision::Exclude),
            FilterDecision::Exclude
        );
    }

    #[test]
    fn test_whitespace_text_outside_pre() {
        let doc = parse("<div>\n  <p>x</p>\n</div><pre>  </pre>");
        let roots = ComparisonSource::root_sources(&doc, SourceKind::Control);
        let div_children = roots[0].child_sources();
        assert!(div_children[0].data().is_text());
        assert_eq!(
            ignore_whitespace_text(&div_children[0], FilterDecision::Keep),
            FilterDecision::Exclude
        );

        let pre_text = &roots[1].child_sources()[0];
        assert_eq!(
            ignore_whitespace_text(pre_text, FilterDecision::Keep),
            FilterDecision::Keep
        );

        let x = &div_children[1].child_sources()[0];
        assert_eq!(
            ignore_whitespace_text(x, FilterDecision::Keep),
            FilterDecision::Keep
        );
    }

    #[test]
    fn test_diff_attributes_excluded() {
        let doc = parse(r#"<p DIFF:ignore class="x" different="y"></p>"#);
        let p = &ComparisonSource::root_sources(&doc, SourceKind::Control)[0];
        let decisions: Vec<_> = AttributeComparisonSource::all(p)
            .iter()
            .map(|attr| ignore_diff_attributes(attr, FilterDecision::Keep))
            .collect();
        assert_eq!(
            decisions,
            vec![
                FilterDecision::Exclude,
                FilterDecision::Keep,
                FilterDecision::Keep
            ]
        );
    }
}
