//! Comparison sources: tagged references to one node or attribute in one tree.

use crate::dom::Document;
use facet::Facet;
use indextree::NodeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Which of the two trees a source was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// The expected tree
    Control,
    /// The tree under test
    Test,
}

/// Errors raised while constructing sources.
///
/// These signal a broken contract between a policy and the tree it reads,
/// never a diffing outcome.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum SourceError {
    /// source at {path} is not an element
    NotAnElement { path: String },

    /// attribute {name} does not exist on element at {path}
    MissingAttribute { name: String, path: String },
}

/// A node in either the control or the test tree.
///
/// Borrows the document it points into; the path is computed once, when the
/// source is created, from the node's position in the tree.
#[derive(Clone)]
pub struct ComparisonSource<'a> {
    document: &'a Document,
    node: NodeId,
    index: usize,
    path: Rc<str>,
    kind: SourceKind,
}

impl<'a> ComparisonSource<'a> {
    /// Create a source for `node`, which sits at `index` among its parent's children.
    ///
    /// `parent_path` is the path of the parent source, or `None` for the
    /// top-level sibling group.
    pub fn new(
        document: &'a Document,
        node: NodeId,
        index: usize,
        parent_path: Option<&str>,
        kind: SourceKind,
    ) -> Self {
        let name = document.get(node).node_name();
        let path: Rc<str> = match parent_path {
            Some(parent) if !parent.is_empty() => format!("{parent} > {name}({index})").into(),
            _ => format!("{name}({index})").into(),
        };
        Self {
            document,
            node,
            index,
            path,
            kind,
        }
    }

    /// Sources for the top-level sibling group of `document`.
    pub fn root_sources(document: &'a Document, kind: SourceKind) -> Vec<Self> {
        document
            .content()
            .enumerate()
            .map(|(index, node)| Self::new(document, node, index, None, kind))
            .collect()
    }

    /// The `<head>` element of `document`, as the only member of its group.
    pub fn head_sources(document: &'a Document, kind: SourceKind) -> Vec<Self> {
        document
            .children(document.root)
            .enumerate()
            .filter(|&(_, node)| Some(node) == document.head())
            .map(|(index, node)| Self::new(document, node, index, None, kind))
            .collect()
    }

    /// Sources for the children of this node, in source order.
    pub fn child_sources(&self) -> Vec<Self> {
        self.document
            .children(self.node)
            .enumerate()
            .map(|(index, node)| Self::new(self.document, node, index, Some(self.path()), self.kind))
            .collect()
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Position among the parent's children, counted before any filtering.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// The node data this source points at.
    pub fn data(&self) -> &'a crate::dom::NodeData {
        self.document.get(self.node)
    }

    pub fn node_name(&self) -> std::borrow::Cow<'a, str> {
        self.data().node_name()
    }

    /// The element behind this source, if it is one.
    pub fn element(&self) -> Option<&'a crate::dom::ElementData> {
        self.data().as_element()
    }
}

impl PartialEq for ComparisonSource<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.document, other.document)
            && self.node == other.node
            && self.path == other.path
    }
}

impl Eq for ComparisonSource<'_> {}

impl Hash for ComparisonSource<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.document, state);
        self.node.hash(state);
        self.path.hash(state);
    }
}

impl fmt::Debug for ComparisonSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.kind, self.path)
    }
}

/// An attribute on an element in either tree.
#[derive(Clone)]
pub struct AttributeComparisonSource<'a> {
    element: ComparisonSource<'a>,
    position: usize,
    name: &'a str,
    value: &'a str,
    path: Rc<str>,
}

impl<'a> AttributeComparisonSource<'a> {
    /// Create a source for the attribute called `name` (ASCII case-insensitive)
    /// on `element`.
    ///
    /// Fails when `element` is not an element or has no such attribute.
    pub fn new(name: &str, element: &ComparisonSource<'a>) -> Result<Self, SourceError> {
        let data = element.element().ok_or_else(|| SourceError::NotAnElement {
            path: element.path().to_string(),
        })?;
        let (position, stored_name, value) =
            data.attr(name).ok_or_else(|| SourceError::MissingAttribute {
                name: name.to_string(),
                path: element.path().to_string(),
            })?;
        Ok(Self::at(element.clone(), position, stored_name, value))
    }

    /// Sources for every attribute of `element`, in source order.
    ///
    /// Non-element sources have no attributes.
    pub fn all(element: &ComparisonSource<'a>) -> Vec<Self> {
        let Some(data) = element.element() else {
            return Vec::new();
        };
        data.attrs
            .iter()
            .enumerate()
            .map(|(position, (name, value))| {
                Self::at(element.clone(), position, name.as_str(), value.as_ref())
            })
            .collect()
    }

    fn at(element: ComparisonSource<'a>, position: usize, name: &'a str, value: &'a str) -> Self {
        let path = format!("{}[{}]", element.path(), name.to_ascii_lowercase()).into();
        Self {
            element,
            position,
            name,
            value,
            path,
        }
    }

    /// The element source this attribute belongs to.
    pub fn element(&self) -> &ComparisonSource<'a> {
        &self.element
    }

    /// Attribute name as stored on the element.
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn value(&self) -> &'a str {
        self.value
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> SourceKind {
        self.element.kind()
    }
}

impl PartialEq for AttributeComparisonSource<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position && self.path == other.path && self.element == other.element
    }
}

impl Eq for AttributeComparisonSource<'_> {}

impl Hash for AttributeComparisonSource<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.element.hash(state);
        self.position.hash(state);
    }
}

impl fmt::Debug for AttributeComparisonSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}={:?}", self.kind(), self.path, self.value)
    }
}
