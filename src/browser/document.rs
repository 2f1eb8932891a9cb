use crate::config::WardenConfig;
use crate::dom::{Document, DomTree, ElementNode, ElementSelector, NodeId};
use crate::error::{Result, WardenError};
use headless_chrome::Tab;
use serde_json::Value;
use std::sync::Arc;

/// Attribute stamped on page elements to give them a stable identity
pub const NODE_ID_ATTRIBUTE: &str = "data-tab-warden-id";

const SNAPSHOT_JS: &str = include_str!("snapshot.js");

/// [`Document`] backed by a live tab.
///
/// Each [`refresh`](Document::refresh) takes a snapshot of the tab container
/// (with its ancestor chain) into a [`DomTree`]; reads are served from the
/// snapshot and writes go to the page and the snapshot alike.
pub struct CdpDocument {
    tab: Arc<Tab>,
    container_css: String,
    binding: Option<String>,
    id_floor: u64,
    snapshot: DomTree,
}

impl CdpDocument {
    pub fn new(tab: Arc<Tab>, config: &WardenConfig) -> Self {
        Self {
            tab,
            container_css: config.container_selector.to_css(),
            binding: None,
            id_floor: 0,
            snapshot: DomTree::new(ElementNode::new("html")),
        }
    }

    /// Have every snapshot make sure the page-side observer reporting to `binding` is installed
    pub fn with_signal_binding(mut self, binding: impl Into<String>) -> Self {
        self.binding = Some(binding.into());
        self
    }

    /// The most recent snapshot
    pub fn snapshot(&self) -> &DomTree {
        &self.snapshot
    }

    fn evaluate(&self, script: &str) -> Result<Option<Value>> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| WardenError::Script(e.to_string()))?;
        Ok(result.value)
    }

    /// Run `body` with `el` bound to the page element behind `node`
    fn run_on(&self, node: NodeId, body: &str) -> Result<()> {
        let selector = serde_json::to_string(&format!("[{}=\"{}\"]", NODE_ID_ATTRIBUTE, node.0))?;
        let script = format!(
            "(function () {{ const el = document.querySelector({selector}); if (!el) return false; \
             try {{ {body}; }} catch (e) {{ return String(e); }} return true; }})()"
        );

        match self.evaluate(&script)? {
            Some(Value::Bool(true)) => Ok(()),
            Some(Value::Bool(false)) | None => Err(WardenError::NodeNotFound(node.to_string())),
            Some(Value::String(message)) => Err(WardenError::Script(message)),
            Some(other) => Err(WardenError::Script(format!("unexpected result {other}"))),
        }
    }
}

fn js(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Snapshot call for the page. New ids start above `id_floor`.
fn snapshot_script(container_css: &str, binding: Option<&str>, id_floor: u64) -> Result<String> {
    let binding = match binding {
        Some(name) => js(name)?,
        None => "null".to_string(),
    };
    Ok(format!(
        "({})({}, {}, {}, {})",
        SNAPSHOT_JS.trim_end(),
        js(container_css)?,
        js(NODE_ID_ATTRIBUTE)?,
        binding,
        id_floor
    ))
}

impl Document for CdpDocument {
    fn refresh(&mut self) -> Result<()> {
        let script = snapshot_script(&self.container_css, self.binding.as_deref(), self.id_floor)?;

        let value = self
            .evaluate(&script)?
            .ok_or_else(|| WardenError::Script("No value returned from snapshot".to_string()))?;

        // The script returns a JSON string, so unwrap the string first
        let json: String = serde_json::from_value(value)?;
        let root = ElementNode::from_json(&json)?;
        if let Some(max) = root.max_numeric_attribute(NODE_ID_ATTRIBUTE) {
            self.id_floor = self.id_floor.max(max);
        }

        self.snapshot = DomTree::with_id_attribute(root, NODE_ID_ATTRIBUTE);
        Ok(())
    }

    fn document_element(&self) -> NodeId {
        self.snapshot.document_element()
    }

    fn query(&self, selector: &ElementSelector) -> Option<NodeId> {
        self.snapshot.query(selector)
    }

    fn query_all_within(&self, root: NodeId, selector: &ElementSelector) -> Vec<NodeId> {
        self.snapshot.query_all_within(root, selector)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.snapshot.parent(node)
    }

    fn matches(&self, node: NodeId, selector: &ElementSelector) -> bool {
        self.snapshot.matches(node, selector)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.snapshot.attribute(node, name)
    }

    fn text_content(&self, node: NodeId) -> Option<String> {
        self.snapshot.text_content(node)
    }

    fn contains(&self, node: NodeId) -> bool {
        self.snapshot.contains(node)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.run_on(node, &format!("el.setAttribute({}, {})", js(name)?, js(value)?))?;
        self.snapshot.set_attribute(node, name, value)
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()> {
        self.run_on(node, &format!("el.removeAttribute({})", js(name)?))?;
        if self.snapshot.contains(node) {
            self.snapshot.remove_attribute(node, name)?;
        }
        Ok(())
    }

    fn set_style_important(&mut self, node: NodeId, property: &str, value: &str) -> Result<()> {
        self.run_on(
            node,
            &format!("el.style.setProperty({}, {}, 'important')", js(property)?, js(value)?),
        )?;
        self.snapshot.set_style_important(node, property, value)
    }

    fn click(&mut self, node: NodeId) -> Result<()> {
        self.run_on(node, "el.click()").map_err(|e| WardenError::ClickFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_script_is_a_function_expression() {
        let trimmed = SNAPSHOT_JS.trim();
        assert!(trimmed.starts_with("(function (containerSelector, idAttribute, bindingName, idFloor)"));
        assert!(trimmed.ends_with(')'));
        assert!(trimmed.contains("text_content"));
        assert!(trimmed.contains("tag_name"));
    }

    #[test]
    fn test_snapshot_script_passes_id_floor() {
        let script = snapshot_script("[role=tablist]", Some("__bind"), 73).unwrap();

        assert!(script.ends_with(r#"("[role=tablist]", "data-tab-warden-id", "__bind", 73)"#));
        assert!(SNAPSHOT_JS.contains("Math.max(window.__tabWardenNextId || 0, idFloor || 0)"));

        let unbound = snapshot_script("[role=tablist]", None, 0).unwrap();
        assert!(unbound.ends_with(", null, 0)"));
    }

    #[test]
    fn test_interleaved_label_survives_snapshot_shape() {
        // what the snapshot reports for <a role=tab><span>For</span> you</a>
        let json = r##"{"tag_name":"a","attributes":{"role":"tab","data-tab-warden-id":"5"},
            "children":[{"tag_name":"span","attributes":{"data-tab-warden-id":"6"},"text_content":"For"},
                        {"tag_name":"#text","text_content":" you"}]}"##;
        let tree = DomTree::with_id_attribute(ElementNode::from_json(json).unwrap(), NODE_ID_ATTRIBUTE);

        assert_eq!(tree.text_content(NodeId(5)).as_deref(), Some("For you"));
        assert!(SNAPSHOT_JS.contains("tag_name: '#text'"));
    }

    #[test]
    fn test_js_string_escaping() {
        assert_eq!(js(r#"[role="tab"]"#).unwrap(), r#""[role=\"tab\"]""#);
        assert_eq!(js("a'b").unwrap(), "\"a'b\"");
    }
}
