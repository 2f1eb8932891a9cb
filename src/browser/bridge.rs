use crate::error::{Result, WardenError};
use crate::scheduler::{Signal, SignalSink};
use headless_chrome::Tab;
use headless_chrome::browser::tab::EventListener;
use headless_chrome::protocol::cdp::types::Event;
use serde_json::Value;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::UnboundedSender;

type Listener = dyn EventListener<Event> + Send + Sync;

/// Forwards page-side change hints into the engine's signal channel.
///
/// Two sources feed it: a page binding called by the in-page subtree observer
/// (installed by the snapshot script), and the DevTools navigation events for
/// same-document history changes.
pub struct SignalBridge {
    tab: Arc<Tab>,
    listener: Option<Weak<Listener>>,
}

impl SignalBridge {
    /// Name of the page binding the in-page observer calls
    pub const BINDING_NAME: &'static str = "__tabWardenSignal";

    pub fn install(tab: Arc<Tab>, sender: UnboundedSender<Signal>) -> Result<Self> {
        let binding_sender = sender.clone();
        tab.expose_function(
            Self::BINDING_NAME,
            Arc::new(move |payload: Value| {
                let mut sink = binding_sender.clone();
                sink.emit(signal_from_payload(&payload));
            }),
        )
        .map_err(|e| WardenError::Script(format!("Failed to expose signal binding: {}", e)))?;

        let listener = tab
            .add_event_listener(Arc::new(move |event: &Event| {
                if let Event::PageNavigatedWithinDocument(_) | Event::PageFrameNavigated(_) = event {
                    let mut sink = sender.clone();
                    sink.emit(Signal::Navigation);
                }
            }))
            .map_err(|e| WardenError::Script(format!("Failed to listen for navigation: {}", e)))?;

        Ok(Self {
            tab,
            listener: Some(listener),
        })
    }

    /// Stop listening for navigation events
    pub fn uninstall(&mut self) {
        if let Some(listener) = self.listener.take() {
            if let Err(e) = self.tab.remove_event_listener(&listener) {
                log::debug!("Failed to remove navigation listener: {}", e);
            }
        }
    }
}

impl Drop for SignalBridge {
    fn drop(&mut self) {
        self.uninstall();
    }
}

/// Map a binding payload to a signal; anything unrecognised counts as a mutation
pub fn signal_from_payload(payload: &Value) -> Signal {
    let text = match payload {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.contains("visibility") {
        Signal::Visibility
    } else if text.contains("navigation") {
        Signal::Navigation
    } else {
        Signal::Mutation
    }
}
