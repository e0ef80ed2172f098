// Styled layout tree
//
// - node.rs: arena tree, inherited attribute resolution, document-order traversal
// - builder.rs: acyclic construction and the page assignment pass

pub mod builder;
pub mod node;

pub use builder::{assign_pages, TreeBuilder};
pub use node::{attrs, tags, NodeId, NodeRect, StyledNode, StyledTree};
