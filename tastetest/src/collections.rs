//! Per-sibling-group source collections with "matched" markers.
//!
//! A collection is created for one side of one sibling group (or one element's
//! attributes), handed to the match stage, and dropped once the group has been
//! compared. Handles are cheap to clone and share the same markers, so a lazy
//! matcher can hold on to its inputs while the match stage keeps marking
//! pairings between pulls.

use crate::source::{AttributeComparisonSource, ComparisonSource, SourceKind};
use indexmap::IndexMap;
use indextree::NodeId;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Operations the match stage needs from either kind of collection.
pub trait SourceSet: Clone {
    type Source: Clone;

    /// Lazy iterator over sources that are not matched yet.
    type Unmatched: Iterator<Item = Self::Source>;

    /// Which tree the sources come from.
    fn kind(&self) -> SourceKind;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mark `source` as matched. Returns `false` when it was already matched
    /// or does not belong to this collection.
    fn mark_as_matched(&self, source: &Self::Source) -> bool;

    fn is_matched(&self, source: &Self::Source) -> bool;

    /// Sources not matched so far, in order.
    ///
    /// The markers are re-read on every step, so a source matched after the
    /// iterator was created is skipped.
    fn unmatched(&self) -> Self::Unmatched;
}

struct Entry<S> {
    source: S,
    matched: Cell<bool>,
}

impl<S> Entry<S> {
    fn new(source: S) -> Self {
        Self {
            source,
            matched: Cell::new(false),
        }
    }

    /// Flip the marker; `false` if it was already set.
    fn mark(&self) -> bool {
        !self.matched.replace(true)
    }
}

/// The node sources of one sibling group, from one tree, keyed by node id.
#[derive(Clone)]
pub struct SourceCollection<'a> {
    kind: SourceKind,
    entries: Rc<IndexMap<NodeId, Entry<ComparisonSource<'a>>>>,
}

impl<'a> SourceCollection<'a> {
    /// Build a collection from the sources of one sibling group.
    ///
    /// Sources are expected to point at distinct nodes; a repeated node keeps
    /// its first source.
    pub fn new(kind: SourceKind, sources: impl IntoIterator<Item = ComparisonSource<'a>>) -> Self {
        let sources = sources.into_iter();
        let mut entries = IndexMap::with_capacity(sources.size_hint().0);
        for source in sources {
            let node = source.node();
            let fresh = !entries.contains_key(&node);
            debug_assert!(fresh, "node at {} added to a collection twice", source.path());
            entries.entry(node).or_insert_with(|| Entry::new(source));
        }
        Self {
            kind,
            entries: Rc::new(entries),
        }
    }

    /// All sources, matched or not.
    pub fn iter(&self) -> impl Iterator<Item = &ComparisonSource<'a>> + '_ {
        self.entries.values().map(|entry| &entry.source)
    }

    /// Source at `position` within the collection (not the node's child index).
    pub fn get(&self, position: usize) -> Option<&ComparisonSource<'a>> {
        self.entries.get_index(position).map(|(_, entry)| &entry.source)
    }

    /// Whether the source at `position` is matched.
    pub fn is_matched_at(&self, position: usize) -> bool {
        self.entries
            .get_index(position)
            .is_some_and(|(_, entry)| entry.matched.get())
    }

    /// Unmatched sources together with their positions in the collection.
    pub fn unmatched_positions(&self) -> UnmatchedPositions<'a> {
        UnmatchedPositions {
            entries: Rc::clone(&self.entries),
            next: 0,
        }
    }

    fn entry_for(&self, source: &ComparisonSource<'a>) -> Option<&Entry<ComparisonSource<'a>>> {
        self.entries
            .get(&source.node())
            .filter(|entry| &entry.source == source)
    }
}

impl<'a> SourceSet for SourceCollection<'a> {
    type Source = ComparisonSource<'a>;
    type Unmatched = UnmatchedNodes<'a>;

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn mark_as_matched(&self, source: &ComparisonSource<'a>) -> bool {
        self.entry_for(source).is_some_and(Entry::mark)
    }

    fn is_matched(&self, source: &ComparisonSource<'a>) -> bool {
        self.entry_for(source)
            .is_some_and(|entry| entry.matched.get())
    }

    fn unmatched(&self) -> UnmatchedNodes<'a> {
        UnmatchedNodes(self.unmatched_positions())
    }
}

impl fmt::Debug for SourceCollection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.entries
                    .values()
                    .map(|entry| (&entry.source, entry.matched.get())),
            )
            .finish()
    }
}

/// Lazy walk over the unmatched entries of a [`SourceCollection`], with positions.
pub struct UnmatchedPositions<'a> {
    entries: Rc<IndexMap<NodeId, Entry<ComparisonSource<'a>>>>,
    next: usize,
}

impl<'a> Iterator for UnmatchedPositions<'a> {
    type Item = (usize, ComparisonSource<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((_, entry)) = self.entries.get_index(self.next) {
            let position = self.next;
            self.next += 1;
            if !entry.matched.get() {
                return Some((position, entry.source.clone()));
            }
        }
        None
    }
}

/// Lazy walk over the unmatched sources of a [`SourceCollection`].
pub struct UnmatchedNodes<'a>(UnmatchedPositions<'a>);

impl<'a> Iterator for UnmatchedNodes<'a> {
    type Item = ComparisonSource<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, source)| source)
    }
}

/// The attribute sources of one element, from one tree, keyed by lowercase name.
#[derive(Clone)]
pub struct SourceMap<'a> {
    kind: SourceKind,
    entries: Rc<IndexMap<String, Entry<AttributeComparisonSource<'a>>>>,
}

impl<'a> SourceMap<'a> {
    /// Build a map from the attribute sources of one element.
    ///
    /// Names must be unique ignoring ASCII case; a repeated name keeps its
    /// first source, like the parser does for duplicated attributes.
    pub fn new(
        kind: SourceKind,
        sources: impl IntoIterator<Item = AttributeComparisonSource<'a>>,
    ) -> Self {
        let mut entries = IndexMap::new();
        for source in sources {
            let key = source.name().to_ascii_lowercase();
            let fresh = !entries.contains_key(&key);
            debug_assert!(fresh, "attribute {} added to a map twice", source.path());
            entries.entry(key).or_insert_with(|| Entry::new(source));
        }
        Self {
            kind,
            entries: Rc::new(entries),
        }
    }

    /// Attribute source by ASCII case-insensitive name.
    pub fn get(&self, name: &str) -> Option<&AttributeComparisonSource<'a>> {
        self.entry(name).map(|entry| &entry.source)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Whether the attribute called `name` is present and matched.
    pub fn is_matched_name(&self, name: &str) -> bool {
        self.entry(name).is_some_and(|entry| entry.matched.get())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeComparisonSource<'a>> + '_ {
        self.entries.values().map(|entry| &entry.source)
    }

    fn entry(&self, name: &str) -> Option<&Entry<AttributeComparisonSource<'a>>> {
        match self.entries.get(name) {
            Some(entry) => Some(entry),
            None => self.entries.get(name.to_ascii_lowercase().as_str()),
        }
    }

    fn entry_for(
        &self,
        source: &AttributeComparisonSource<'a>,
    ) -> Option<&Entry<AttributeComparisonSource<'a>>> {
        self.entry(source.name())
            .filter(|entry| &entry.source == source)
    }
}

impl<'a> SourceSet for SourceMap<'a> {
    type Source = AttributeComparisonSource<'a>;
    type Unmatched = UnmatchedAttributes<'a>;

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn mark_as_matched(&self, source: &AttributeComparisonSource<'a>) -> bool {
        self.entry_for(source).is_some_and(Entry::mark)
    }

    fn is_matched(&self, source: &AttributeComparisonSource<'a>) -> bool {
        self.entry_for(source)
            .is_some_and(|entry| entry.matched.get())
    }

    fn unmatched(&self) -> UnmatchedAttributes<'a> {
        UnmatchedAttributes {
            entries: Rc::clone(&self.entries),
            next: 0,
        }
    }
}

impl fmt::Debug for SourceMap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(name, entry)| (name, (&entry.source, entry.matched.get()))),
            )
            .finish()
    }
}

/// Lazy walk over the unmatched sources of a [`SourceMap`].
pub struct UnmatchedAttributes<'a> {
    entries: Rc<IndexMap<String, Entry<AttributeComparisonSource<'a>>>>,
    next: usize,
}

impl<'a> Iterator for UnmatchedAttributes<'a> {
    type Item = AttributeComparisonSource<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((_, entry)) = self.entries.get_index(self.next) {
            self.next += 1;
            if !entry.matched.get() {
                return Some(entry.source.clone());
            }
        }
        None
    }
}
