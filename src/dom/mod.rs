//! DOM model the policy runs against
//!
//! This module provides:
//! - ElementNode: serializable description of an element subtree
//! - ElementSelector: structural selector (tag + attribute conditions)
//! - Document: the read/write interface the engine needs from a live page
//! - DomTree: in-memory Document with stable node identities

pub mod document;
pub mod element;
pub mod selector;
pub mod tree;

pub use document::{Document, NodeId};
pub use element::{ElementNode, TEXT_NODE_TAG};
pub use selector::{AttributeMatch, ElementSelector};
pub use tree::{DomTree, DomWrite, StyleValue};
