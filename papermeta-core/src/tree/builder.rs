use super::node::{attrs, tags, NodeId, StyledNode, StyledTree};
use crate::error::TreeError;

/// Builds a [`StyledTree`] one node at a time.
///
/// The only way to add a node is under a parent that already exists, which
/// keeps the arena acyclic: a node's parent index is always lower than its own.
pub struct TreeBuilder {
    nodes: Vec<StyledNode>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            nodes: vec![StyledNode::element(tags::DOCUMENT, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        StyledTree::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Name of an already-added node.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id).map(|node| node.name.as_str())
    }

    /// Append an element under `parent` and return its id.
    pub fn element<I, K, V>(
        &mut self,
        parent: NodeId,
        name: &str,
        attributes: I,
    ) -> Result<NodeId, TreeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.check_parent(parent)?;

        let mut node = StyledNode::element(name, Some(parent));
        node.attributes = attributes
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();

        Ok(self.push(parent, node))
    }

    /// Append a text leaf under `parent`.
    pub fn text(&mut self, parent: NodeId, text: impl Into<String>) -> Result<NodeId, TreeError> {
        self.check_parent(parent)?;
        let node = StyledNode::text_node(text.into(), parent);
        Ok(self.push(parent, node))
    }

    pub fn build(self) -> StyledTree {
        StyledTree { nodes: self.nodes }
    }

    fn check_parent(&self, parent: NodeId) -> Result<(), TreeError> {
        match self.nodes.get(parent) {
            None => Err(TreeError::UnknownParent {
                parent,
                len: self.nodes.len(),
            }),
            Some(node) if node.is_text() => Err(TreeError::TextNodeParent(parent)),
            Some(_) => Ok(()),
        }
    }

    fn push(&mut self, parent: NodeId, node: StyledNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        self.nodes[parent].children.push(id);
        id
    }
}

/// Tag every element with the page it belongs to.
///
/// Walks the tree in document order carrying a running page index, starting
/// at `"0"`. A link whose text starts with `Page` and that carries a `name`
/// switches the index to that name (the link itself already gets the new
/// page). Line breaks are left untagged.
///
/// Returns the number of page markers seen.
pub fn assign_pages(tree: &mut StyledTree) -> usize {
    let order: Vec<NodeId> = tree.elements().collect();
    let mut page_index = "0".to_string();
    let mut markers = 0;

    for id in order {
        let node = &tree.nodes[id];
        if node.is(tags::LINK) {
            if let Some(name) = node.get(attrs::NAME) {
                let name = name.to_string();
                if tree.text(id).trim().starts_with("Page") {
                    page_index = name;
                    markers += 1;
                }
            }
        }
        if !tree.nodes[id].is(tags::LINE_BREAK) {
            tree.set_attr(id, attrs::PAGE, page_index.clone());
        }
    }

    markers
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_ATTRS: [(&str, &str); 0] = [];

    #[test]
    fn test_unknown_parent_rejected() {
        let mut builder = TreeBuilder::new();
        let err = builder.element(7, "span", NO_ATTRS).unwrap_err();
        assert_eq!(err, TreeError::UnknownParent { parent: 7, len: 1 });
    }

    #[test]
    fn test_text_nodes_cannot_have_children() {
        let mut builder = TreeBuilder::new();
        let root = builder.root();
        let text = builder.text(root, "leaf").unwrap();
        assert_eq!(
            builder.element(text, "span", NO_ATTRS).unwrap_err(),
            TreeError::TextNodeParent(text)
        );
    }

    #[test]
    fn test_parent_index_always_lower() {
        let mut builder = TreeBuilder::new();
        let root = builder.root();
        let div = builder.element(root, "div", NO_ATTRS).unwrap();
        let span = builder.element(div, "span", NO_ATTRS).unwrap();
        let tree = builder.build();

        for id in [div, span] {
            let parent = tree.parent(id).unwrap();
            assert!(parent < id);
        }
    }

    #[test]
    fn test_assign_pages_follows_markers() {
        let mut builder = TreeBuilder::new();
        let root = builder.root();
        let before = builder.element(root, "span", NO_ATTRS).unwrap();

        let marker_div = builder.element(root, "div", NO_ATTRS).unwrap();
        let marker = builder.element(marker_div, "a", [("name", "1")]).unwrap();
        builder.text(marker, "Page 1").unwrap();
        let first = builder.element(root, "span", NO_ATTRS).unwrap();
        let br = builder.element(first, "br", NO_ATTRS).unwrap();

        // A named link that is not a page marker does not switch pages
        let anchor = builder.element(root, "a", [("name", "fn1")]).unwrap();
        builder.text(anchor, "footnote").unwrap();

        let second_marker = builder.element(root, "a", [("name", "2")]).unwrap();
        builder.text(second_marker, "Page 2").unwrap();
        let second = builder.element(root, "span", NO_ATTRS).unwrap();

        let mut tree = builder.build();
        assert_eq!(assign_pages(&mut tree), 2);

        assert_eq!(tree.attr(before, attrs::PAGE), Some("0"));
        assert_eq!(tree.attr(marker, attrs::PAGE), Some("1"));
        assert_eq!(tree.attr(first, attrs::PAGE), Some("1"));
        assert_eq!(tree.attr(br, attrs::PAGE), None);
        assert_eq!(tree.attr(anchor, attrs::PAGE), Some("1"));
        assert_eq!(tree.attr(second, attrs::PAGE), Some("2"));
    }
}
