//! Policy-driven HTML tree comparison for test assertions.
//!
//! tastetest compares a **control** tree (what you expect) with a **test** tree
//! (what you got) and yields the differences lazily:
//! - **Filter**: ordered policies decide which nodes and attributes take part
//! - **Match**: ordered policies pair control and test sources per sibling group
//! - **Compare**: ordered policies fold a decision for every pairing
//!
//! Registration order is the only precedence rule. The stock strategies live in
//! [`strategies`] and are registered by [`DiffingPipeline::default`].
//!
//! # Example
//!
//! ```rust
//! use tastetest::{DiffResult, DiffingPipeline, HtmlDiffer, parse};
//!
//! let control = parse(r#"<ul><li class="item">one</li></ul>"#);
//! let test = parse(r#"<ul><li class="item">one</li><li>two</li></ul>"#);
//!
//! let pipeline = DiffingPipeline::default();
//! let diffs: Vec<_> = HtmlDiffer::new(&pipeline).compare(&control, &test).collect();
//!
//! assert_eq!(diffs.len(), 1);
//! assert_eq!(diffs[0].result_kind(), DiffResult::Unexpected);
//! assert_eq!(diffs[0].path(), "ul(0) > li(1)");
//! ```

mod tracing_macros;

pub mod collections;
pub mod compare_result;
pub mod comparison;
pub mod diff;
pub mod differ;
pub mod dom;
pub mod pipeline;
pub mod source;
pub mod strategies;

pub use collections::{SourceCollection, SourceMap, SourceSet};
pub use compare_result::{CompareDecision, CompareResult};
pub use comparison::{AttributeComparison, Comparison, Pairing};
pub use diff::{Diff, DiffResult, DiffTarget};
pub use differ::{Diffs, HtmlDiffer};
pub use dom::{Document, parse};
pub use pipeline::{DiffContext, DiffingPipeline, FilterDecision, FilterMode};
pub use source::{AttributeComparisonSource, ComparisonSource, SourceError, SourceKind};
pub use strategies::DiffOptions;
