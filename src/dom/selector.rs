use crate::dom::element::ElementNode;
use crate::error::{Result, WardenError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single `[name]` or `[name=value]` condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMatch {
    /// Attribute name
    pub name: String,

    /// Required value; `None` only requires presence
    pub value: Option<String>,
}

/// Structural selector used to locate elements without looking at their content.
///
/// The accepted syntax is a compound CSS selector restricted to an optional tag
/// followed by attribute conditions, e.g. `div[role=tablist][data-testid="ScrollSnap-List"]`.
/// It renders back to valid CSS so the same selector can be handed to the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ElementSelector {
    /// Tag name (case-insensitive), if constrained
    pub tag: Option<String>,

    /// Attribute conditions, all of which must hold
    pub attributes: Vec<AttributeMatch>,
}

impl ElementSelector {
    /// Selector matching any element with the given tag
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            attributes: Vec::new(),
        }
    }

    /// Selector matching any element carrying `role="<role>"`
    pub fn role(role: impl Into<String>) -> Self {
        Self::default().with_attribute("role", role)
    }

    /// Builder method: require an attribute value
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(AttributeMatch {
            name: name.into(),
            value: Some(value.into()),
        });
        self
    }

    /// Builder method: require attribute presence
    pub fn with_attribute_present(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(AttributeMatch {
            name: name.into(),
            value: None,
        });
        self
    }

    /// Parse a selector string
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| WardenError::InvalidSelector {
            selector: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty selector"));
        }

        let tag_end = trimmed.find('[').unwrap_or(trimmed.len());
        let tag = &trimmed[..tag_end];
        if !tag.is_empty() && tag != "*" && !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(invalid("tag may only contain letters, digits and '-'"));
        }

        let mut attributes = Vec::new();
        let mut rest = &trimmed[tag_end..];
        while !rest.is_empty() {
            let body_end = rest.find(']').ok_or_else(|| invalid("unterminated attribute"))?;
            let body = &rest[1..body_end];
            attributes.push(Self::parse_attribute(body).ok_or_else(|| invalid("malformed attribute condition"))?);

            rest = &rest[body_end + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return Err(invalid("only compound attribute selectors are supported"));
            }
        }

        Ok(Self {
            tag: (!tag.is_empty() && tag != "*").then(|| tag.to_ascii_lowercase()),
            attributes,
        })
    }

    fn parse_attribute(body: &str) -> Option<AttributeMatch> {
        let (name, value) = match body.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (body.trim(), None),
        };

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return None;
        }

        let value = match value {
            Some(raw) => {
                let unquoted = ['"', '\'']
                    .iter()
                    .find_map(|q| raw.strip_prefix(*q).and_then(|v| v.strip_suffix(*q)))
                    .unwrap_or(raw);
                if unquoted.contains(['"', '\'', '[', ']']) {
                    return None;
                }
                Some(unquoted.to_string())
            }
            None => None,
        };

        Some(AttributeMatch {
            name: name.to_string(),
            value,
        })
    }

    /// Check the selector against a tag name and attribute set
    pub fn matches(&self, tag_name: &str, attributes: &IndexMap<String, String>) -> bool {
        if let Some(tag) = &self.tag {
            if !tag.eq_ignore_ascii_case(tag_name) {
                return false;
            }
        }

        self.attributes.iter().all(|cond| match (&cond.value, attributes.get(&cond.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(expected), Some(actual)) => expected == actual,
        })
    }

    /// Check the selector against an element description
    pub fn matches_element(&self, element: &ElementNode) -> bool {
        self.matches(&element.tag_name, &element.attributes)
    }

    /// Render as a CSS selector usable with `querySelector`
    pub fn to_css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ElementSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{tag}")?,
            None if self.attributes.is_empty() => write!(f, "*")?,
            None => {}
        }
        for cond in &self.attributes {
            match &cond.value {
                Some(value) => write!(f, "[{}=\"{}\"]", cond.name, value)?,
                None => write!(f, "[{}]", cond.name)?,
            }
        }
        Ok(())
    }
}

impl FromStr for ElementSelector {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ElementSelector {
    type Error = WardenError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ElementSelector> for String {
    fn from(selector: ElementSelector) -> Self {
        selector.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compound_selector() {
        let selector = ElementSelector::parse(r#"div[role=tablist][data-testid="ScrollSnap-List"]"#).unwrap();

        assert_eq!(selector.tag.as_deref(), Some("div"));
        assert_eq!(selector.attributes.len(), 2);
        assert_eq!(selector.attributes[0].name, "role");
        assert_eq!(selector.attributes[0].value.as_deref(), Some("tablist"));
        assert_eq!(selector.attributes[1].value.as_deref(), Some("ScrollSnap-List"));
    }

    #[test]
    fn test_parse_presence_and_universal() {
        let selector = ElementSelector::parse("*[aria-selected]").unwrap();
        assert!(selector.tag.is_none());
        assert_eq!(selector.attributes[0].value, None);

        let selector = ElementSelector::parse("[role='presentation']").unwrap();
        assert_eq!(selector.attributes[0].value.as_deref(), Some("presentation"));
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(ElementSelector::parse("").is_err());
        assert!(ElementSelector::parse("[role=tab").is_err());
        assert!(ElementSelector::parse("div > a").is_err());
        assert!(ElementSelector::parse("[role=tab] span").is_err());
        assert!(ElementSelector::parse("[=tab]").is_err());
        assert!(ElementSelector::parse(r#"[role="ta"b"]"#).is_err());
    }

    #[test]
    fn test_matches() {
        let selector = ElementSelector::role("tab").with_attribute_present("href");

        let tab = ElementNode::new("a").with_attribute("role", "tab").with_attribute("href", "/");
        let plain = ElementNode::new("a").with_attribute("role", "tab");
        let other = ElementNode::new("a").with_attribute("role", "link").with_attribute("href", "/");

        assert!(selector.matches_element(&tab));
        assert!(!selector.matches_element(&plain));
        assert!(!selector.matches_element(&other));
    }

    #[test]
    fn test_tag_match_is_case_insensitive() {
        let selector = ElementSelector::parse("DIV").unwrap();
        assert!(selector.matches_element(&ElementNode::new("div")));
        assert!(!selector.matches_element(&ElementNode::new("span")));
    }

    #[test]
    fn test_to_css() {
        let selector = ElementSelector::parse("[role=tablist][data-testid=ScrollSnap-List]").unwrap();
        assert_eq!(selector.to_css(), r#"[role="tablist"][data-testid="ScrollSnap-List"]"#);
        assert_eq!(ElementSelector::default().to_css(), "*");
    }

    #[test]
    fn test_selector_serialization() {
        let selector = ElementSelector::tag("div").with_attribute("role", "presentation");

        let json = serde_json::to_string(&selector).unwrap();
        assert_eq!(json, r#""div[role=\"presentation\"]""#);

        let deserialized: ElementSelector = serde_json::from_str(&json).unwrap();
        assert_eq!(selector, deserialized);

        let bad: std::result::Result<ElementSelector, _> = serde_json::from_str(r#""[role""#);
        assert!(bad.is_err());
    }
}
