use crate::error::{Result, WardenError};
use crate::navigation::History;
use headless_chrome::Tab;
use serde_json::Value;
use std::sync::Arc;

/// [`History`] of a live tab, driven through `window.history`
pub struct PageHistory {
    tab: Arc<Tab>,
}

impl PageHistory {
    pub fn new(tab: Arc<Tab>) -> Self {
        Self { tab }
    }

    fn call(&self, method: &str, state: &Value, url: Option<&str>) -> Result<()> {
        let script = history_script(method, state, url)?;
        self.tab
            .evaluate(&script, false)
            .map_err(|e| WardenError::NavigationFailed(format!("history.{} failed: {}", method, e)))?;
        Ok(())
    }
}

fn history_script(method: &str, state: &Value, url: Option<&str>) -> Result<String> {
    let state = serde_json::to_string(state)?;
    Ok(match url {
        Some(url) => format!("window.history.{}({}, '', {})", method, state, serde_json::to_string(url)?),
        None => format!("window.history.{}({}, '')", method, state),
    })
}

impl History for PageHistory {
    fn push_state(&mut self, state: &Value, url: Option<&str>) -> Result<()> {
        self.call("pushState", state, url)
    }

    fn replace_state(&mut self, state: &Value, url: Option<&str>) -> Result<()> {
        self.call("replaceState", state, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_script() {
        assert_eq!(
            history_script("pushState", &json!({"tab": "following"}), Some("/home")).unwrap(),
            r#"window.history.pushState({"tab":"following"}, '', "/home")"#
        );
        assert_eq!(
            history_script("replaceState", &Value::Null, None).unwrap(),
            "window.history.replaceState(null, '')"
        );
    }
}
