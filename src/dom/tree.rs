use crate::dom::document::{Document, NodeId};
use crate::dom::element::ElementNode;
use crate::dom::selector::ElementSelector;
use crate::error::{Result, WardenError};
use crate::observer::{MutationKind, MutationRecord, MutationSource};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet, VecDeque};

/// An inline style declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleValue {
    pub value: String,
    pub important: bool,
}

/// One write performed through the [`Document`] interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomWrite {
    SetAttribute { node: NodeId, name: String, value: String },
    RemoveAttribute { node: NodeId, name: String },
    Style { node: NodeId, property: String, value: String },
    Click(NodeId),
}

impl DomWrite {
    /// Node the write was applied to
    pub fn node(&self) -> NodeId {
        match self {
            Self::SetAttribute { node, .. } | Self::RemoveAttribute { node, .. } | Self::Style { node, .. } => *node,
            Self::Click(node) => *node,
        }
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    tag_name: String,
    attributes: IndexMap<String, String>,
    text: Option<String>,
    styles: IndexMap<String, StyleValue>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// In-memory DOM tree with stable, never-reused node identities.
///
/// Structural edits (`append_child`, `remove_node`, `replace_node`) are queued as
/// mutation records, the way a page-side subtree observer would see them. Writes
/// coming through [`Document`] are journaled so callers can inspect exactly what
/// a policy pass did.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: HashMap<NodeId, NodeData>,
    root: NodeId,
    next_id: u64,
    writes: Vec<DomWrite>,
    failing_clicks: HashSet<NodeId>,
    failing_writes: HashSet<NodeId>,
    mutations: VecDeque<MutationRecord>,
}

impl DomTree {
    /// Build a tree from an element description, assigning fresh identities
    pub fn new(root: ElementNode) -> Self {
        Self::build(root, None)
    }

    /// Build a tree whose identities come from a numeric attribute stamped on each
    /// element; elements without it get fresh identities.
    pub fn with_id_attribute(root: ElementNode, id_attribute: &str) -> Self {
        Self::build(root, Some(id_attribute))
    }

    fn build(root: ElementNode, id_attribute: Option<&str>) -> Self {
        let mut tree = Self {
            nodes: HashMap::new(),
            root: NodeId(0),
            next_id: 1,
            writes: Vec::new(),
            failing_clicks: HashSet::new(),
            failing_writes: HashSet::new(),
            mutations: VecDeque::new(),
        };

        if let Some(attr) = id_attribute {
            tree.next_id = root.max_numeric_attribute(attr).map_or(1, |max| max + 1);
        }

        tree.root = tree.insert_recursive(root, None, id_attribute);
        tree
    }

    fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert_recursive(&mut self, element: ElementNode, parent: Option<NodeId>, id_attribute: Option<&str>) -> NodeId {
        let stamped = id_attribute
            .and_then(|attr| element.get_attribute(attr))
            .and_then(|v| v.parse::<u64>().ok())
            .map(NodeId)
            .filter(|id| !self.nodes.contains_key(id));
        let id = match stamped {
            Some(id) => id,
            None => self.allocate(),
        };

        let ElementNode {
            tag_name,
            attributes,
            text_content,
            children,
        } = element;

        self.nodes.insert(
            id,
            NodeData {
                tag_name,
                attributes,
                text: text_content,
                styles: IndexMap::new(),
                parent,
                children: Vec::new(),
            },
        );

        for child in children {
            let child_id = self.insert_recursive(child, Some(id), id_attribute);
            if let Some(data) = self.nodes.get_mut(&id) {
                data.children.push(child_id);
            }
        }

        id
    }

    fn node(&self, id: NodeId) -> Result<&NodeData> {
        self.nodes
            .get(&id)
            .ok_or_else(|| WardenError::NodeNotFound(id.to_string()))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| WardenError::NodeNotFound(id.to_string()))
    }

    fn detach_recursive(&mut self, id: NodeId) {
        if let Some(data) = self.nodes.remove(&id) {
            for child in data.children {
                self.detach_recursive(child);
            }
        }
        self.failing_clicks.remove(&id);
        self.failing_writes.remove(&id);
    }

    fn walk_preorder(&self, start: NodeId, out: &mut Vec<NodeId>) {
        if let Some(data) = self.nodes.get(&start) {
            out.push(start);
            for &child in &data.children {
                self.walk_preorder(child, out);
            }
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let Some(data) = self.nodes.get(&id) {
            if let Some(text) = &data.text {
                out.push_str(text);
            }
            for &child in &data.children {
                self.collect_text(child, out);
            }
        }
    }

    /// Root node identity
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Append a new subtree under `parent`, returning the identity of its root
    pub fn append_child(&mut self, parent: NodeId, element: ElementNode) -> Result<NodeId> {
        self.node(parent)?;
        let id = self.insert_recursive(element, Some(parent), None);
        self.node_mut(parent)?.children.push(id);
        self.mutations.push_back(MutationRecord {
            kind: MutationKind::ChildAdded,
            parent,
        });
        Ok(id)
    }

    /// Remove a node and its subtree
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        let parent = self
            .node(id)?
            .parent
            .ok_or_else(|| WardenError::NodeNotFound(format!("{id} is the document root")))?;
        self.node_mut(parent)?.children.retain(|&child| child != id);
        self.detach_recursive(id);
        self.mutations.push_back(MutationRecord {
            kind: MutationKind::ChildRemoved,
            parent,
        });
        Ok(())
    }

    /// Replace a node with a freshly built subtree at the same position.
    ///
    /// This is what a host re-render looks like: same structure, new identities.
    pub fn replace_node(&mut self, id: NodeId, element: ElementNode) -> Result<NodeId> {
        let parent = self
            .node(id)?
            .parent
            .ok_or_else(|| WardenError::NodeNotFound(format!("{id} is the document root")))?;
        let position = self
            .node(parent)?
            .children
            .iter()
            .position(|&child| child == id)
            .ok_or_else(|| WardenError::NodeNotFound(id.to_string()))?;

        self.detach_recursive(id);
        let new_id = self.insert_recursive(element, Some(parent), None);
        self.node_mut(parent)?.children[position] = new_id;

        self.mutations.push_back(MutationRecord {
            kind: MutationKind::ChildRemoved,
            parent,
        });
        self.mutations.push_back(MutationRecord {
            kind: MutationKind::ChildAdded,
            parent,
        });
        Ok(new_id)
    }

    /// Update an attribute as the host application would (not journaled)
    pub fn host_set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        self.node_mut(id)?.attributes.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Make clicks on `id` fail
    pub fn fail_clicks_on(&mut self, id: NodeId) {
        self.failing_clicks.insert(id);
    }

    /// Make attribute writes on `id` fail
    pub fn fail_writes_on(&mut self, id: NodeId) {
        self.failing_writes.insert(id);
    }

    /// Inline style declared on a node
    pub fn style(&self, id: NodeId, property: &str) -> Option<&StyleValue> {
        self.nodes.get(&id).and_then(|data| data.styles.get(property))
    }

    /// Every write performed through [`Document`], oldest first
    pub fn writes(&self) -> &[DomWrite] {
        &self.writes
    }

    /// Nodes that received a simulated click, oldest first
    pub fn clicks(&self) -> Vec<NodeId> {
        self.writes
            .iter()
            .filter_map(|w| match w {
                DomWrite::Click(node) => Some(*node),
                _ => None,
            })
            .collect()
    }

    /// Convert a subtree back into its element description
    pub fn to_element(&self, id: NodeId) -> Option<ElementNode> {
        let data = self.nodes.get(&id)?;
        Some(ElementNode {
            tag_name: data.tag_name.clone(),
            attributes: data.attributes.clone(),
            text_content: data.text.clone(),
            children: data.children.iter().filter_map(|&child| self.to_element(child)).collect(),
        })
    }

    /// Serialize the whole tree to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_element(self.root))?)
    }

    /// Count elements attached to the tree
    pub fn count_elements(&self) -> usize {
        self.nodes.len()
    }
}

impl Document for DomTree {
    fn document_element(&self) -> NodeId {
        self.root
    }

    fn query(&self, selector: &ElementSelector) -> Option<NodeId> {
        let mut order = Vec::new();
        self.walk_preorder(self.root, &mut order);
        order.into_iter().find(|&id| self.matches(id, selector))
    }

    fn query_all_within(&self, root: NodeId, selector: &ElementSelector) -> Vec<NodeId> {
        let mut order = Vec::new();
        self.walk_preorder(root, &mut order);
        order
            .into_iter()
            .skip(1)
            .filter(|&id| self.matches(id, selector))
            .collect()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|data| data.parent)
    }

    fn matches(&self, node: NodeId, selector: &ElementSelector) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|data| selector.matches(&data.tag_name, &data.attributes))
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.get(&node).and_then(|data| data.attributes.get(name).cloned())
    }

    fn text_content(&self, node: NodeId) -> Option<String> {
        if !self.nodes.contains_key(&node) {
            return None;
        }
        let mut out = String::new();
        self.collect_text(node, &mut out);
        Some(out)
    }

    fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        if self.failing_writes.contains(&node) {
            return Err(WardenError::Script(format!("setAttribute on {node} threw")));
        }
        self.node_mut(node)?.attributes.insert(name.to_string(), value.to_string());
        self.writes.push(DomWrite::SetAttribute {
            node,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()> {
        self.node_mut(node)?.attributes.shift_remove(name);
        self.writes.push(DomWrite::RemoveAttribute {
            node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn set_style_important(&mut self, node: NodeId, property: &str, value: &str) -> Result<()> {
        self.node_mut(node)?.styles.insert(
            property.to_string(),
            StyleValue {
                value: value.to_string(),
                important: true,
            },
        );
        self.writes.push(DomWrite::Style {
            node,
            property: property.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn click(&mut self, node: NodeId) -> Result<()> {
        self.node(node)?;
        if self.failing_clicks.contains(&node) {
            return Err(WardenError::ClickFailed(format!("click handler on {node} threw")));
        }
        self.writes.push(DomWrite::Click(node));
        Ok(())
    }
}

impl MutationSource for DomTree {
    fn take_records(&mut self) -> Vec<MutationRecord> {
        self.mutations.drain(..).collect()
    }
}
