use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Index of a node inside its [`StyledTree`] arena.
pub type NodeId = usize;

/// Attribute names the heuristics read. Styling values are plain strings on
/// the node; typing happens at resolution time.
pub mod attrs {
    pub const FONT_SIZE: &str = "font-size";
    pub const TOP: &str = "top";
    pub const LEFT: &str = "left";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
    pub const PAGE: &str = "page";
    pub const NAME: &str = "name";
    pub const STYLE: &str = "style";
}

/// Node names produced by the layout converter.
pub mod tags {
    pub const DOCUMENT: &str = "#document";
    pub const TEXT: &str = "#text";
    pub const SPAN: &str = "span";
    pub const LINK: &str = "a";
    pub const LINE_BREAK: &str = "br";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyledNode {
    pub name: String,
    /// Parent index; `None` only for the root. Lookup only, never ownership.
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub attributes: HashMap<String, String>,
    /// Character data, present only on text nodes.
    pub text: Option<String>,
}

impl StyledNode {
    pub(crate) fn element(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            parent,
            children: Vec::new(),
            attributes: HashMap::new(),
            text: None,
        }
    }

    pub(crate) fn text_node(text: String, parent: NodeId) -> Self {
        Self {
            name: tags::TEXT.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            attributes: HashMap::new(),
            text: Some(text),
        }
    }

    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).map(String::as_str)
    }
}

/// Bounding rect resolved through ancestors. Each side may come from a
/// different ancestor; `None` means no ancestor defines it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRect {
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub w: Option<i64>,
    pub h: Option<i64>,
}

/// Arena-backed tree of styled layout fragments.
///
/// Nodes are only ever appended under an existing parent (see
/// [`TreeBuilder`](super::TreeBuilder)), so every parent index is smaller
/// than its child's index and the ancestor chain always terminates.
/// Deserialized trees are checked for the same invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawTree")]
pub struct StyledTree {
    pub(crate) nodes: Vec<StyledNode>,
}

#[derive(Deserialize)]
struct RawTree {
    nodes: Vec<StyledNode>,
}

impl TryFrom<RawTree> for StyledTree {
    type Error = TreeError;

    fn try_from(raw: RawTree) -> Result<Self, TreeError> {
        Self::from_nodes(raw.nodes)
    }
}

impl StyledTree {
    pub const ROOT: NodeId = 0;

    /// Adopt an externally built arena after checking that parents precede
    /// their children and that parent and child links agree.
    pub fn from_nodes(nodes: Vec<StyledNode>) -> Result<Self, TreeError> {
        match nodes.first() {
            Some(root) if root.parent.is_none() => {}
            _ => return Err(TreeError::MissingRoot),
        }

        for (id, node) in nodes.iter().enumerate().skip(1) {
            match node.parent {
                Some(parent) if parent < id => {}
                parent => return Err(TreeError::InvalidParent { node: id, parent }),
            }
        }

        for (id, node) in nodes.iter().enumerate() {
            if node.is_text() && !node.children.is_empty() {
                return Err(TreeError::TextNodeParent(id));
            }
            for &child in &node.children {
                let linked = nodes
                    .get(child)
                    .map(|candidate| candidate.parent == Some(id))
                    .unwrap_or(false);
                if !linked {
                    return Err(TreeError::InvalidChild { node: id, child });
                }
            }
        }

        Ok(Self { nodes })
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // The root always exists
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> Option<&StyledNode> {
        self.nodes.get(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// Local (non-inherited) attribute lookup.
    pub fn attr(&self, id: NodeId, attribute: &str) -> Option<&str> {
        self.nodes.get(id).and_then(|node| node.get(attribute))
    }

    pub(crate) fn set_attr(&mut self, id: NodeId, attribute: &str, value: String) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.attributes.insert(attribute.to_string(), value);
        }
    }

    pub(crate) fn remove_attr(&mut self, id: NodeId, attribute: &str) -> Option<String> {
        self.nodes
            .get_mut(id)
            .and_then(|node| node.attributes.remove(attribute))
    }

    /// Walk from `id` up to the root, starting with `id` itself.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.nodes.get(id).map(|_| id),
        }
    }

    /// Inherited attribute lookup: the value on the nearest node (self first)
    /// that defines it, or `None` if no ancestor does.
    pub fn resolve(&self, id: NodeId, attribute: &str) -> Option<&str> {
        self.ancestors(id)
            .find_map(|ancestor| self.attr(ancestor, attribute))
    }

    /// Inherited lookup typed by `cast`. A cast failure on the defining node
    /// makes the whole lookup `None`; farther ancestors are not consulted.
    pub fn resolve_with<T, F>(&self, id: NodeId, attribute: &str, cast: F) -> Option<T>
    where
        F: Fn(&str) -> Option<T>,
    {
        self.resolve(id, attribute).and_then(|value| cast(value.trim()))
    }

    /// Inherited lookup parsed with [`FromStr`].
    pub fn resolve_as<T: FromStr>(&self, id: NodeId, attribute: &str) -> Option<T> {
        self.resolve_with(id, attribute, |value| value.parse::<T>().ok())
    }

    /// Resolve `left`, `top`, `width` and `height` in a single climb. Each
    /// side stops as soon as some ancestor defines it.
    pub fn resolve_rect(&self, id: NodeId) -> NodeRect {
        const SIDES: [&str; 4] = [attrs::LEFT, attrs::TOP, attrs::WIDTH, attrs::HEIGHT];

        let mut values: [Option<i64>; 4] = [None; 4];
        let mut settled = [false; 4];

        for ancestor in self.ancestors(id) {
            for (slot, side) in SIDES.iter().enumerate() {
                if settled[slot] {
                    continue;
                }
                if let Some(raw) = self.attr(ancestor, side) {
                    values[slot] = raw.trim().parse::<i64>().ok();
                    settled[slot] = true;
                }
            }
            if settled.iter().all(|done| *done) {
                break;
            }
        }

        NodeRect {
            x: values[0],
            y: values[1],
            w: values[2],
            h: values[3],
        }
    }

    /// Concatenated text of all descendant text nodes, in document order.
    pub fn text(&self, id: NodeId) -> String {
        let mut content = String::new();
        for descendant in self.descendants(id) {
            if let Some(text) = self.nodes[descendant].text.as_deref() {
                content.push_str(text);
            }
        }
        content
    }

    /// Pre-order (document order) traversal of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = if id < self.nodes.len() { vec![id] } else { Vec::new() };
        Descendants { tree: self, stack }
    }

    /// All element nodes in document order, text nodes excluded.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(Self::ROOT)
            .filter(move |id| !self.nodes[*id].is_text())
    }

    /// Elements named `name` in document order.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.elements().filter(move |id| self.nodes[*id].is(name))
    }
}

pub struct Ancestors<'a> {
    tree: &'a StyledTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    tree: &'a StyledTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let current = self.stack.pop()?;
            if let Some(node) = self.tree.nodes.get(current) {
                self.stack.extend(node.children.iter().rev().copied());
                return Some(current);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeBuilder;

    fn nested() -> (StyledTree, NodeId, NodeId) {
        let mut builder = TreeBuilder::new();
        let root = builder.root();
        let div = builder
            .element(root, "div", [("font-size", "12"), ("left", "72"), ("width", "400")])
            .unwrap();
        let span = builder.element(div, "span", [("top", "140")]).unwrap();
        builder.text(span, "Fast ").unwrap();
        builder.text(span, "Graphs").unwrap();
        (builder.build(), div, span)
    }

    #[test]
    fn test_inherited_font_size_from_parent() {
        let (tree, _, span) = nested();
        assert_eq!(tree.attr(span, attrs::FONT_SIZE), None);
        assert_eq!(tree.resolve_as::<i64>(span, attrs::FONT_SIZE), Some(12));
    }

    #[test]
    fn test_missing_attribute_is_undefined() {
        let (tree, div, _) = nested();
        assert_eq!(tree.resolve(div, attrs::TOP), None);
        assert_eq!(tree.resolve_as::<i64>(div, attrs::HEIGHT), None);
    }

    #[test]
    fn test_cast_failure_is_not_retried_upwards() {
        let mut builder = TreeBuilder::new();
        let root = builder.root();
        let outer = builder.element(root, "div", [("font-size", "10")]).unwrap();
        let inner = builder.element(outer, "span", [("font-size", "large")]).unwrap();
        let tree = builder.build();

        assert_eq!(tree.resolve_as::<i64>(inner, attrs::FONT_SIZE), None);
        assert_eq!(tree.resolve(inner, attrs::FONT_SIZE), Some("large"));
    }

    #[test]
    fn test_rect_sides_come_from_different_ancestors() {
        let (tree, _, span) = nested();
        let rect = tree.resolve_rect(span);
        assert_eq!(
            rect,
            NodeRect {
                x: Some(72),
                y: Some(140),
                w: Some(400),
                h: None,
            }
        );
    }

    #[test]
    fn test_text_concatenates_descendants_in_order() {
        let (tree, div, span) = nested();
        assert_eq!(tree.text(span), "Fast Graphs");
        assert_eq!(tree.text(div), "Fast Graphs");
    }

    #[test]
    fn test_elements_follow_document_order() {
        let mut builder = TreeBuilder::new();
        let root = builder.root();
        let first = builder.element(root, "div", [] as [(&str, &str); 0]).unwrap();
        let second = builder.element(root, "div", [] as [(&str, &str); 0]).unwrap();
        // Appended later, but nested under the first div
        let nested = builder.element(first, "span", [] as [(&str, &str); 0]).unwrap();
        let tree = builder.build();

        let order: Vec<NodeId> = tree.elements().collect();
        assert_eq!(order, vec![root, first, nested, second]);
        assert_eq!(tree.find_all("span").collect::<Vec<_>>(), vec![nested]);
    }

    #[test]
    fn test_ancestors_terminate_at_root() {
        let (tree, div, span) = nested();
        let chain: Vec<NodeId> = tree.ancestors(span).collect();
        assert_eq!(chain, vec![span, div, StyledTree::ROOT]);
        assert_eq!(tree.ancestors(999).count(), 0);
    }

    #[test]
    fn test_serialized_tree_roundtrip() {
        let (tree, _, span) = nested();
        let restored: StyledTree =
            serde_json::from_str(&serde_json::to_string(&tree).unwrap()).unwrap();
        assert_eq!(restored.text(StyledTree::ROOT), "Fast Graphs");
        assert_eq!(restored.resolve_as::<i64>(span, "font-size"), Some(12));
    }

    #[test]
    fn test_malformed_serialized_tree_rejected() {
        let dangling_child = serde_json::json!({
            "nodes": [
                { "name": "#document", "parent": null, "children": [5], "attributes": {}, "text": null }
            ]
        });
        let err = serde_json::from_value::<StyledTree>(dangling_child).unwrap_err();
        assert!(err.to_string().contains("invalid child 5"));

        let cycle = serde_json::json!({
            "nodes": [
                { "name": "#document", "parent": null, "children": [], "attributes": {}, "text": null },
                { "name": "div", "parent": 2, "children": [2], "attributes": {}, "text": null },
                { "name": "div", "parent": 1, "children": [1], "attributes": {}, "text": null }
            ]
        });
        let err = serde_json::from_value::<StyledTree>(cycle).unwrap_err();
        assert!(err.to_string().contains("node 1 has invalid parent"));
    }

    #[test]
    fn test_from_nodes_requires_root() {
        let orphan = StyledNode::element("div", Some(3));
        assert_eq!(
            StyledTree::from_nodes(vec![orphan]).unwrap_err(),
            TreeError::MissingRoot
        );
        assert_eq!(
            StyledTree::from_nodes(Vec::new()).unwrap_err(),
            TreeError::MissingRoot
        );
    }
}
