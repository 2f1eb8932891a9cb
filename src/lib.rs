//! # tab-warden
//!
//! Keeps one tab hidden and another selected inside a single-page application
//! whose DOM is rebuilt by client-side navigation.
//!
//! The hiding itself is a couple of style writes. The work is in the loop
//! around it: noticing when the tab container (re)appears, running the policy
//! exactly once per burst of changes, and never fighting the host page's own
//! re-renders.
//!
//! ## Running against a browser
//!
//! ```bash
//! # Launch Chrome with a persistent profile and keep the policy enforced
//! cargo run --bin tab-warden -- --url https://x.com/home --headed --user-data-dir ~/.tab-warden
//!
//! # Attach to an already running Chrome
//! cargo run --bin tab-warden -- --url https://x.com/home --ws-endpoint ws://127.0.0.1:9222/devtools/browser/<id>
//! ```
//!
//! ## Library usage
//!
//! The engine works against any [`Document`]. [`DomTree`] is an in-memory
//! implementation, handy for replaying page fixtures:
//!
//! ```rust
//! use std::time::Duration;
//! use tab_warden::{ApplyOutcome, DomTree, ElementNode, Engine, WardenConfig};
//!
//! # fn main() -> tab_warden::Result<()> {
//! let tab = |label: &str, selected: bool| {
//!     ElementNode::new("div").with_attribute("role", "presentation").with_child(
//!         ElementNode::new("a")
//!             .with_attribute("role", "tab")
//!             .with_attribute("aria-selected", if selected { "true" } else { "false" })
//!             .with_text(label),
//!     )
//! };
//! let page = DomTree::new(
//!     ElementNode::new("html").with_child(
//!         ElementNode::new("div")
//!             .with_attribute("role", "tablist")
//!             .with_attribute("data-testid", "ScrollSnap-List")
//!             .with_child(tab("For you", true))
//!             .with_child(tab("Following", false)),
//!     ),
//! );
//!
//! let mut engine = Engine::new(page, WardenConfig::default())?;
//! engine.start(Duration::ZERO)?;
//! engine.run_due(Duration::from_millis(16));
//!
//! assert!(matches!(engine.last_outcome(), Some(ApplyOutcome::Hidden { redirected: true, .. })));
//! assert_eq!(engine.document().clicks().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`text`]: label normalization
//! - [`classifier`]: tab discovery and role classification
//! - [`policy`]: the idempotent hide/redirect pass
//! - [`scheduler`]: change coalescing and the timer queue
//! - [`navigation`]: history decorator reporting SPA navigations
//! - [`observer`]: subtree observation
//! - [`engine`]: owner of all of the above, with start/stop lifecycle
//! - [`dom`]: element model, selectors, the `Document` trait and `DomTree`
//! - [`browser`]: live Chrome host over CDP
//! - [`config`], [`error`]

pub mod browser;
pub mod classifier;
pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod navigation;
pub mod observer;
pub mod policy;
pub mod scheduler;
pub mod text;

pub use browser::{BrowserSession, CdpDocument, ConnectionOptions, LaunchOptions, PageHistory, SignalBridge};
pub use classifier::{Classification, TabCandidate, TabClassifier};
pub use config::{ClassifierConfig, RoleMatcherConfig, WardenConfig};
pub use dom::{Document, DomTree, ElementNode, ElementSelector, NodeId};
pub use engine::Engine;
pub use error::{Result, WardenError};
pub use navigation::{History, NavigationWatcher};
pub use observer::{MutationSource, SubtreeObserver};
pub use policy::{ApplyOutcome, PolicyApplier};
pub use scheduler::{ChangeScheduler, Signal, SignalSink};
