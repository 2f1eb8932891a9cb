//! Tab discovery and role classification
//!
//! Classification is a pure read of the document: it never mutates anything
//! and can be repeated freely.

use crate::config::{RoleMatcherConfig, WardenConfig};
use crate::dom::{Document, ElementSelector, NodeId};
use crate::error::{Result, WardenError};
use crate::text::normalize;
use regex::Regex;

/// Matches tab labels for one role
#[derive(Debug, Clone)]
pub struct RoleMatcher {
    patterns: Vec<Regex>,
    exact: Vec<String>,
}

impl RoleMatcher {
    /// Compile a matcher; exact labels are stored normalized and blank ones are dropped
    pub fn compile(config: &RoleMatcherConfig) -> Result<Self> {
        let patterns = config
            .patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| WardenError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let exact = config
            .exact
            .iter()
            .map(|label| normalize(Some(label)))
            .filter(|label| !label.is_empty())
            .collect();

        Ok(Self { patterns, exact })
    }

    /// Patterns see the raw label, exact labels the normalized one
    pub fn is_match(&self, raw: &str, normalized: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(raw)) || self.exact.iter().any(|label| normalized.contains(label.as_str()))
    }
}

/// One selectable tab, captured fresh on every classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabCandidate {
    pub node: NodeId,
    pub raw_text: String,
    pub normalized_text: String,
    pub selected: bool,
}

/// Result of classifying a container's tabs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Tabs in document order
    pub candidates: Vec<TabCandidate>,

    /// Index into `candidates` of the first tab matching the suppress role
    pub suppress: Option<usize>,

    /// Index into `candidates` of the first tab matching the preferred role
    pub preferred: Option<usize>,
}

impl Classification {
    pub fn suppress(&self) -> Option<&TabCandidate> {
        self.suppress.and_then(|i| self.candidates.get(i))
    }

    pub fn preferred(&self) -> Option<&TabCandidate> {
        self.preferred.and_then(|i| self.candidates.get(i))
    }

    /// The (suppress, preferred) pair, only when the container is actionable:
    /// at least two tabs and both roles matched by distinct tabs.
    pub fn resolved(&self) -> Option<(&TabCandidate, &TabCandidate)> {
        if self.candidates.len() < 2 || self.suppress == self.preferred {
            return None;
        }
        Some((self.suppress()?, self.preferred()?))
    }
}

/// Finds the tabs of a container and decides which one to suppress and which to prefer
#[derive(Debug, Clone)]
pub struct TabClassifier {
    tab_selector: ElementSelector,
    selected_attribute: String,
    suppress: RoleMatcher,
    preferred: RoleMatcher,
}

impl TabClassifier {
    pub fn new(config: &WardenConfig) -> Result<Self> {
        Ok(Self {
            tab_selector: config.tab_selector.clone(),
            selected_attribute: config.selected_attribute.clone(),
            suppress: RoleMatcher::compile(&config.classifier.suppress)?,
            preferred: RoleMatcher::compile(&config.classifier.preferred)?,
        })
    }

    /// Classify the tabs under `container`.
    ///
    /// Tabs beyond the two known roles are listed but otherwise ignored.
    pub fn classify<D: Document + ?Sized>(&self, doc: &D, container: NodeId) -> Classification {
        let candidates: Vec<TabCandidate> = doc
            .query_all_within(container, &self.tab_selector)
            .into_iter()
            .map(|node| {
                let raw_text = doc.text_content(node).unwrap_or_default();
                let normalized_text = normalize(Some(&raw_text));
                let selected = doc
                    .attribute(node, &self.selected_attribute)
                    .is_some_and(|value| value == "true");
                TabCandidate {
                    node,
                    raw_text,
                    normalized_text,
                    selected,
                }
            })
            .collect();

        let suppress = candidates
            .iter()
            .position(|c| self.suppress.is_match(&c.raw_text, &c.normalized_text));
        let preferred = candidates
            .iter()
            .position(|c| self.preferred.is_match(&c.raw_text, &c.normalized_text));

        Classification {
            candidates,
            suppress,
            preferred,
        }
    }
}
