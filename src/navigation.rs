//! SPA navigation interception
//!
//! [`NavigationWatcher`] decorates a [`History`] implementation: every call is
//! forwarded untouched and its result returned as-is, after which a
//! [`Signal::Navigation`] is emitted.

use crate::error::Result;
use crate::scheduler::{Signal, SignalSink};
use serde_json::Value;

/// Programmatic history entry points of a page
pub trait History {
    /// Equivalent of `history.pushState(state, "", url)`
    fn push_state(&mut self, state: &Value, url: Option<&str>) -> Result<()>;

    /// Equivalent of `history.replaceState(state, "", url)`
    fn replace_state(&mut self, state: &Value, url: Option<&str>) -> Result<()>;
}

/// History decorator that reports navigations to a signal sink
pub struct NavigationWatcher<H, S> {
    inner: H,
    sink: S,
}

impl<H: History, S: SignalSink> NavigationWatcher<H, S> {
    pub fn new(inner: H, sink: S) -> Self {
        Self { inner, sink }
    }

    /// Back/forward notification (the `popstate` equivalent)
    pub fn pop_state(&mut self) {
        self.sink.emit(Signal::Navigation);
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_inner(self) -> (H, S) {
        (self.inner, self.sink)
    }
}

impl<H: History, S: SignalSink> History for NavigationWatcher<H, S> {
    fn push_state(&mut self, state: &Value, url: Option<&str>) -> Result<()> {
        let result = self.inner.push_state(state, url);
        self.sink.emit(Signal::Navigation);
        result
    }

    fn replace_state(&mut self, state: &Value, url: Option<&str>) -> Result<()> {
        let result = self.inner.replace_state(state, url);
        self.sink.emit(Signal::Navigation);
        result
    }
}
