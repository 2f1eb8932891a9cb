use crate::dom::ElementSelector;
use crate::error::{Result, WardenError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Label matchers for one tab role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleMatcherConfig {
    /// Regular expressions tested against the raw label text
    pub patterns: Vec<String>,

    /// Strings whose whitespace-free form is searched for in the whitespace-free label
    pub exact: Vec<String>,
}

impl RoleMatcherConfig {
    pub fn new(patterns: &[&str], exact: &[&str]) -> Self {
        Self {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            exact: exact.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.exact.iter().all(|e| e.trim().is_empty())
    }
}

/// Which tab to hide and which to keep selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub suppress: RoleMatcherConfig,
    pub preferred: RoleMatcherConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            suppress: RoleMatcherConfig::new(&[r"(?i)^\s*for\s+you\s*$"], &["For you", "おすすめ"]),
            preferred: RoleMatcherConfig::new(&[r"(?i)^\s*following\s*$"], &["Following", "フォロー中"]),
        }
    }
}

/// Warden configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Structural signature of the tab container
    pub container_selector: ElementSelector,

    /// Tabs inside the container
    pub tab_selector: ElementSelector,

    /// Ancestor hidden instead of the bare tab when present
    pub wrapper_selector: ElementSelector,

    /// Attribute whose value is `"true"` on the selected tab
    pub selected_attribute: String,

    /// Marker set on a node once it has been hidden
    pub hidden_marker: String,

    /// Marker set on the container while a selection redirect is in flight
    pub guard_marker: String,

    /// Document-level attribute announcing the warden is active
    pub debug_flag_attribute: String,
    pub debug_flag_value: String,

    /// Coalescing quantum in milliseconds
    pub frame_interval_ms: u64,

    /// How long the redirect guard stays set, in milliseconds
    pub guard_cooldown_ms: u64,

    pub classifier: ClassifierConfig,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            container_selector: ElementSelector::role("tablist").with_attribute("data-testid", "ScrollSnap-List"),
            tab_selector: ElementSelector::role("tab"),
            wrapper_selector: ElementSelector::role("presentation"),
            selected_attribute: "aria-selected".to_string(),
            hidden_marker: "data-tab-warden-hidden".to_string(),
            guard_marker: "data-tab-warden-switching".to_string(),
            debug_flag_attribute: "data-tab-warden".to_string(),
            debug_flag_value: "active".to_string(),
            frame_interval_ms: 16,
            guard_cooldown_ms: 1500,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl WardenConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a JSON configuration file; missing fields take defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method: set the container selector
    pub fn container_selector(mut self, selector: ElementSelector) -> Self {
        self.container_selector = selector;
        self
    }

    /// Builder method: set the wrapper selector
    pub fn wrapper_selector(mut self, selector: ElementSelector) -> Self {
        self.wrapper_selector = selector;
        self
    }

    /// Builder method: set the coalescing quantum
    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Builder method: set the redirect guard cooldown
    pub fn guard_cooldown(mut self, cooldown: Duration) -> Self {
        self.guard_cooldown_ms = cooldown.as_millis() as u64;
        self
    }

    /// Builder method: set the label matchers
    pub fn classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn frame_interval_duration(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn guard_cooldown_duration(&self) -> Duration {
        Duration::from_millis(self.guard_cooldown_ms)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let markers = [
            ("selected_attribute", &self.selected_attribute),
            ("hidden_marker", &self.hidden_marker),
            ("guard_marker", &self.guard_marker),
            ("debug_flag_attribute", &self.debug_flag_attribute),
        ];
        for (field, value) in markers {
            if value.trim().is_empty() {
                return Err(WardenError::Config(format!("{field} must not be empty")));
            }
        }

        if self.hidden_marker == self.guard_marker {
            return Err(WardenError::Config(
                "hidden_marker and guard_marker must differ".to_string(),
            ));
        }

        if self.guard_cooldown_ms == 0 {
            return Err(WardenError::Config("guard_cooldown_ms must be positive".to_string()));
        }

        if self.classifier.suppress.is_empty() || self.classifier.preferred.is_empty() {
            return Err(WardenError::Config(
                "both suppress and preferred need at least one pattern or exact label".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WardenConfig::default();

        assert_eq!(config.frame_interval_duration(), Duration::from_millis(16));
        assert_eq!(config.guard_cooldown_duration(), Duration::from_millis(1500));
        assert_eq!(
            config.container_selector.to_css(),
            r#"[role="tablist"][data-testid="ScrollSnap-List"]"#
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = WardenConfig::new()
            .frame_interval(Duration::from_millis(50))
            .guard_cooldown(Duration::from_secs(3))
            .wrapper_selector(ElementSelector::tag("li"));

        assert_eq!(config.frame_interval_ms, 50);
        assert_eq!(config.guard_cooldown_ms, 3000);
        assert_eq!(config.wrapper_selector.tag.as_deref(), Some("li"));
    }

    #[test]
    fn test_from_json_partial() {
        let config = WardenConfig::from_json(
            r#"{
                "container_selector": "nav[role=tablist]",
                "classifier": { "suppress": { "exact": ["Recommended"] }, "preferred": { "patterns": ["^Latest$"] } }
            }"#,
        )
        .unwrap();

        assert_eq!(config.container_selector.tag.as_deref(), Some("nav"));
        assert_eq!(config.classifier.suppress.exact, vec!["Recommended"]);
        assert!(config.classifier.suppress.patterns.is_empty());
        assert_eq!(config.guard_cooldown_ms, 1500);
    }

    #[test]
    fn test_from_json_bad_selector() {
        let err = WardenConfig::from_json(r#"{ "tab_selector": "[role=tab" }"#).unwrap_err();
        assert!(matches!(err, WardenError::Json(_)));
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = WardenConfig::default();
        config.guard_marker = config.hidden_marker.clone();
        assert!(matches!(config.validate(), Err(WardenError::Config(_))));

        let config = WardenConfig::default().guard_cooldown(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = WardenConfig::default().classifier(ClassifierConfig {
            suppress: RoleMatcherConfig::new(&[], &["  "]),
            preferred: RoleMatcherConfig::default(),
        });
        assert!(config.validate().is_err());

        let mut config = WardenConfig::default();
        config.hidden_marker = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warden.json");
        std::fs::write(&path, r#"{ "frame_interval_ms": 33 }"#).unwrap();

        let config = WardenConfig::from_file(&path).unwrap();
        assert_eq!(config.frame_interval_ms, 33);

        let missing = WardenConfig::from_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(WardenError::Io(_))));
    }
}
