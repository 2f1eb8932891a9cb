use crate::dom::selector::ElementSelector;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity of one live node instance.
///
/// Identities are never reused: when the host application destroys a node and
/// renders a structurally identical one, the new node has a new `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The live document the policy runs against.
///
/// Reads are side-effect free. Writes are limited to attributes, inline
/// styles and a simulated click.
pub trait Document {
    /// Bring any cached view of the page up to date. Called once at the start of every tick.
    fn refresh(&mut self) -> Result<()> {
        Ok(())
    }

    /// The root element of the document
    fn document_element(&self) -> NodeId;

    /// First element in document order matching `selector`
    fn query(&self, selector: &ElementSelector) -> Option<NodeId>;

    /// All descendants of `root` (excluding `root`) matching `selector`, in document order
    fn query_all_within(&self, root: NodeId, selector: &ElementSelector) -> Vec<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn matches(&self, node: NodeId, selector: &ElementSelector) -> bool;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Concatenated text of the node and its descendants; `None` if the node is gone
    fn text_content(&self, node: NodeId) -> Option<String>;

    /// Whether the node is still attached to the document
    fn contains(&self, node: NodeId) -> bool;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()>;

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()>;

    /// Set an inline style property with `!important` priority
    fn set_style_important(&mut self, node: NodeId, property: &str, value: &str) -> Result<()>;

    /// Simulate a user activation of the node
    fn click(&mut self, node: NodeId) -> Result<()>;

    /// Nearest strict ancestor of `node` matching `selector`
    fn closest_ancestor(&self, node: NodeId, selector: &ElementSelector) -> Option<NodeId> {
        let mut current = self.parent(node);
        while let Some(candidate) = current {
            if self.matches(candidate, selector) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }
}
