use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Tag given to text segments that sit between child elements
pub const TEXT_NODE_TAG: &str = "#text";

/// Represents a DOM element node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ElementNode {
    /// HTML tag name (e.g., "div", "a", "span")
    pub tag_name: String,

    /// Element attributes in source order (e.g., role, aria-selected, data-testid)
    #[serde(default)]
    pub attributes: IndexMap<String, String>,

    /// Text owned directly by the element, read before any children.
    /// Text interleaved with child elements is carried by [`TEXT_NODE_TAG`] children instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,
}

impl ElementNode {
    /// Create a new ElementNode
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            ..Default::default()
        }
    }

    /// A bare text segment, kept in place among its siblings
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(TEXT_NODE_TAG).with_text(value)
    }

    /// Builder method: add an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Builder method: append a single child
    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    /// Get attribute value by key
    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    /// Largest numeric value of `name` anywhere in this subtree
    pub fn max_numeric_attribute(&self, name: &str) -> Option<u64> {
        let own = self.get_attribute(name).and_then(|v| v.parse::<u64>().ok());
        self.children
            .iter()
            .filter_map(|child| child.max_numeric_attribute(name))
            .chain(own)
            .max()
    }

    /// Parse an element tree from its JSON form
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
