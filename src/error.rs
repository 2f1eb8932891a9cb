use thiserror::Error;

/// Errors produced while configuring or driving the warden
#[derive(Debug, Error)]
pub enum WardenError {
    /// A selector string could not be parsed
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A classifier pattern is not a valid regular expression
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration is structurally valid JSON but semantically unusable
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A node handle no longer refers to a live node
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Simulated activation of an element failed
    #[error("Click failed: {0}")]
    ClickFailed(String),

    /// A script evaluated in the page failed or returned something unexpected
    #[error("Script evaluation failed: {0}")]
    Script(String),

    /// Browser could not be launched
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Could not connect to an existing browser
    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    /// Navigation in the page failed
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, WardenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WardenError::InvalidSelector {
            selector: "[role".to_string(),
            reason: "unterminated attribute".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid selector '[role': unterminated attribute");

        let err = WardenError::ClickFailed("detached".to_string());
        assert_eq!(err.to_string(), "Click failed: detached");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: WardenError = parse.unwrap_err().into();
        assert!(matches!(err, WardenError::Json(_)));
    }
}
