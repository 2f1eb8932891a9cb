//! Live browser host
//!
//! Runs the engine against a real page over the Chrome DevTools Protocol:
//! - BrowserSession: launch or attach to Chrome and hold the managed tab
//! - CdpDocument: Document implementation over page snapshots
//! - PageHistory: History implementation over `window.history`
//! - SignalBridge: page-side change hints into the engine's signal channel
//! - run_until: the host loop

pub mod bridge;
pub mod config;
pub mod document;
pub mod history;
pub mod runtime;
pub mod session;

pub use bridge::SignalBridge;
pub use config::{ConnectionOptions, LaunchOptions};
pub use document::CdpDocument;
pub use history::PageHistory;
pub use runtime::run_until;
pub use session::BrowserSession;
