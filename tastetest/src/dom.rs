//! Arena-based DOM that the differ reads from.
//!
//! Both trees handed to the differ are parsed into this representation:
//! - **indextree Arena**: All nodes in contiguous memory, addressed by `NodeId`
//! - **StrTendril strings**: Tags, attribute values and text share the source buffer
//! - **Read-only**: The differ never mutates a `Document`, it only walks it

use html5ever::tree_builder::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute, LocalName, QualName, local_name, ns, parse_document};
use indexmap::IndexMap;
use indextree::{Arena, NodeId};
use std::borrow::Cow;
use std::cell::RefCell;
use tendril::{StrTendril, TendrilSink};

/// Document = Arena (strings are StrTendrils with refcounted sharing)
#[derive(Debug, Clone)]
pub struct Document {
    /// THE tree - all nodes live here
    pub arena: Arena<NodeData>,

    /// Root node (usually `<html>` element)
    pub root: NodeId,

    /// DOCTYPE if present (usually "html")
    pub doctype: Option<StrTendril>,
}

impl Document {
    /// Get immutable reference to node data
    pub fn get(&self, id: NodeId) -> &NodeData {
        self.arena[id].get()
    }

    /// Iterate children of a node
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// Get the `<body>` element if present
    pub fn body(&self) -> Option<NodeId> {
        self.find_root_child("body")
    }

    /// Get the `<head>` element if present
    pub fn head(&self) -> Option<NodeId> {
        self.find_root_child("head")
    }

    /// Whether `<head>` has any children, either written out or hoisted there
    /// by the parser (`<style>`, `<title>`, `<meta>` and friends).
    pub fn has_head_content(&self) -> bool {
        self.head()
            .is_some_and(|head| self.children(head).next().is_some())
    }

    fn find_root_child(&self, tag: &str) -> Option<NodeId> {
        self.root
            .children(&self.arena)
            .find(|&id| matches!(&self.get(id).kind, NodeKind::Element(elem) if elem.tag.as_ref() == tag))
    }

    /// The node that parents the top-level sibling group.
    ///
    /// Markup snippets end up inside `<body>`, so that is where comparison starts.
    /// Documents without a body (rare, html5ever always synthesizes one) fall back
    /// to the root.
    pub fn content_parent(&self) -> NodeId {
        self.body().unwrap_or(self.root)
    }

    /// The top-level sibling group, in source order.
    pub fn content(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children(self.content_parent())
    }

    /// Returns the element data for `id`, or `None` for non-element nodes.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).as_element()
    }

    /// Whether `id` sits (at any depth) inside an element with one of the given tags.
    pub fn has_ancestor_tag(&self, id: NodeId, tags: &[&str]) -> bool {
        id.ancestors(&self.arena)
            .skip(1)
            .filter_map(|ancestor| self.element(ancestor))
            .any(|elem| tags.contains(&elem.tag.as_ref()))
    }
}

/// What goes in each arena slot
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    pub ns: Namespace,
}

impl NodeData {
    /// Node name as it appears in source paths: lowercase tag for elements,
    /// `#text`, `#comment` and `#document` otherwise.
    pub fn node_name(&self) -> Cow<'_, str> {
        match &self.kind {
            NodeKind::Document => Cow::Borrowed("#document"),
            NodeKind::Element(elem) => {
                let tag = elem.tag.as_ref();
                if tag.bytes().any(|b| b.is_ascii_uppercase()) {
                    Cow::Owned(tag.to_ascii_lowercase())
                } else {
                    Cow::Borrowed(tag)
                }
            }
            NodeKind::Text(_) => Cow::Borrowed("#text"),
            NodeKind::Comment(_) => Cow::Borrowed("#comment"),
        }
    }

    /// Get as element reference.
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }

    /// Get as text content.
    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(t) => Some(t.as_ref()),
            _ => None,
        }
    }

    /// Get as comment content.
    pub fn as_comment(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Comment(t) => Some(t.as_ref()),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, NodeKind::Comment(_))
    }
}

/// Node types
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Document root (invisible, parent of `<html>`)
    Document,
    /// Element with tag and attributes
    Element(ElementData),
    /// Text content (StrTendril is refcounted - cheap to clone)
    Text(StrTendril),
    /// HTML comment
    Comment(StrTendril),
}

/// Element data (tag + attributes)
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name (StrTendril shares buffer with source via refcounting)
    pub tag: StrTendril,

    /// Attributes - keys are String (to avoid clippy mutable_key_type), values are StrTendril
    /// IndexMap preserves insertion order so attribute sources come out in source order
    pub attrs: IndexMap<String, StrTendril>,
}

impl ElementData {
    /// Resolve an attribute by ASCII case-insensitive name.
    ///
    /// Returns the attribute's position, its stored name and its value.
    pub fn attr(&self, name: &str) -> Option<(usize, &str, &str)> {
        self.attrs
            .iter()
            .enumerate()
            .find(|(_, (key, _))| key.eq_ignore_ascii_case(name))
            .map(|(index, (key, value))| (index, key.as_str(), value.as_ref()))
    }

    /// Attribute value by ASCII case-insensitive name.
    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attr(name).map(|(_, _, value)| value)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }
}

/// XML namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    pub fn from_url(url: &str) -> Self {
        match url {
            "http://www.w3.org/2000/svg" => Namespace::Svg,
            "http://www.w3.org/1998/Math/MathML" => Namespace::MathMl,
            _ => Namespace::Html,
        }
    }
}

/// Parse HTML into arena-based Document
pub fn parse(html: &str) -> Document {
    let sink = ArenaSink::new();
    // html5ever will create subtendrils that share this buffer via refcounting
    let tendril = StrTendril::from(html);
    parse_document(sink, Default::default()).one(tendril)
}

/// Owned element name wrapper
#[derive(Debug, Clone)]
struct OwnedElemName(QualName);

impl ElemName for OwnedElemName {
    fn ns(&self) -> &html5ever::Namespace {
        &self.0.ns
    }

    fn local_name(&self) -> &LocalName {
        &self.0.local
    }
}

/// TreeSink implementation for building arena-based DOM
struct ArenaSink {
    arena: RefCell<Arena<NodeData>>,

    /// Document node (parent of `<html>`)
    document: NodeId,

    doctype: RefCell<Option<StrTendril>>,
}

impl ArenaSink {
    fn new() -> Self {
        let mut arena = Arena::new();
        let document = arena.new_node(NodeData {
            kind: NodeKind::Document,
            ns: Namespace::Html,
        });

        ArenaSink {
            arena: RefCell::new(arena),
            document,
            doctype: RefCell::new(None),
        }
    }

    fn new_text(arena: &mut Arena<NodeData>, text: StrTendril) -> NodeId {
        arena.new_node(NodeData {
            kind: NodeKind::Text(text),
            ns: Namespace::Html,
        })
    }
}

impl TreeSink for ArenaSink {
    type Handle = NodeId;
    type Output = Document;
    type ElemName<'a>
        = OwnedElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        let arena = self.arena.into_inner();

        // Find the root element (usually <html>)
        let root = self
            .document
            .children(&arena)
            .find(|&id| arena[id].get().is_element())
            .unwrap_or(self.document);

        Document {
            arena,
            root,
            doctype: self.doctype.into_inner(),
        }
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {
        // html5ever recovers on its own
    }

    fn get_document(&self) -> Self::Handle {
        self.document
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn same_node(&self, a: &Self::Handle, b: &Self::Handle) -> bool {
        a == b
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> OwnedElemName {
        let arena = self.arena.borrow();
        let node = arena[*target].get();

        if let NodeKind::Element(elem) = &node.kind {
            let ns = match node.ns {
                Namespace::Html => ns!(html),
                Namespace::Svg => ns!(svg),
                Namespace::MathMl => ns!(mathml),
            };

            OwnedElemName(QualName {
                prefix: None,
                ns,
                local: LocalName::from(elem.tag.as_ref()),
            })
        } else {
            OwnedElemName(QualName {
                prefix: None,
                ns: ns!(html),
                local: local_name!(""),
            })
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let tag = StrTendril::from(name.local.as_ref());
        let ns = Namespace::from_url(name.ns.as_ref());

        // First occurrence of a duplicated attribute wins, like browsers do
        let mut attr_map: IndexMap<String, StrTendril> = IndexMap::with_capacity(attrs.len());
        for attr in attrs {
            attr_map
                .entry(qualified_attr_name(&attr.name))
                .or_insert(attr.value);
        }

        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Element(ElementData {
                tag,
                attrs: attr_map,
            }),
            ns,
        })
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Comment(text),
            ns: Namespace::Html,
        })
    }

    fn create_pi(&self, _target: StrTendril, data: StrTendril) -> Self::Handle {
        // Processing instructions only show up in bogus markup; keep them as comments
        self.arena.borrow_mut().new_node(NodeData {
            kind: NodeKind::Comment(data),
            ns: Namespace::Html,
        })
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => {
                parent.append(node, &mut arena);
            }
            NodeOrText::AppendText(text) => {
                // Merge with previous text node (html5ever behavior)
                let last_child_id = parent.children(&arena).next_back();

                if let Some(last_child) = last_child_id
                    && let NodeKind::Text(existing) = &mut arena[last_child].get_mut().kind
                {
                    existing.push_tendril(&text);
                    return;
                }

                let text_node = Self::new_text(&mut arena, text);
                parent.append(text_node, &mut arena);
            }
        }
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        let node = match new_node {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => Self::new_text(&mut arena, text),
        };
        sibling.insert_before(node, &mut arena);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self.arena.borrow()[*element].parent().is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        *self.doctype.borrow_mut() = Some(name);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // Template contents are compared as regular children
        *target
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let mut arena = self.arena.borrow_mut();
        if let NodeKind::Element(elem) = &mut arena[*target].get_mut().kind {
            for attr in attrs {
                elem.attrs
                    .entry(qualified_attr_name(&attr.name))
                    .or_insert(attr.value);
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        target.detach(&mut self.arena.borrow_mut());
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut arena = self.arena.borrow_mut();
        let children: Vec<NodeId> = node.children(&arena).collect();
        for child in children {
            child.detach(&mut arena);
            new_parent.append(child, &mut arena);
        }
    }
}

/// Attribute name as written in markup: `prefix:local` when a prefix exists.
///
/// html5ever splits `diff:ignore` only for foreign content; in HTML it stays a
/// single local name, so both spellings resolve the same way.
fn qualified_attr_name(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", prefix.as_ref(), name.local.as_ref()),
        None => name.local.to_string(),
    }
}
