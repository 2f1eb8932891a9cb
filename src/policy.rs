//! The idempotent policy pass.
//!
//! Per hide target: `unseen -> hidden` (terminal for that node instance).
//! Per container: `unlocked -> locked -> unlocked` around a selection redirect,
//! with the unlock scheduled a fixed cooldown after the lock.

use crate::classifier::TabClassifier;
use crate::config::WardenConfig;
use crate::dom::{Document, ElementSelector, NodeId};
use crate::error::Result;
use crate::scheduler::ChangeScheduler;
use log::debug;
use std::time::Duration;

/// What a policy pass did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// No tab container in the document
    NoContainer,
    /// Container present but not actionable
    Unresolved { candidates: usize },
    /// The hide target already carries the hidden marker
    AlreadyHidden { target: NodeId },
    /// The hide target was hidden on this pass
    Hidden { target: NodeId, redirected: bool },
}

/// Hides the suppress tab and moves selection to the preferred one
#[derive(Debug, Clone)]
pub struct PolicyApplier {
    classifier: TabClassifier,
    container_selector: ElementSelector,
    wrapper_selector: ElementSelector,
    hidden_marker: String,
    guard_marker: String,
    guard_cooldown: Duration,
}

impl PolicyApplier {
    pub fn new(config: &WardenConfig) -> Result<Self> {
        Ok(Self {
            classifier: TabClassifier::new(config)?,
            container_selector: config.container_selector.clone(),
            wrapper_selector: config.wrapper_selector.clone(),
            hidden_marker: config.hidden_marker.clone(),
            guard_marker: config.guard_marker.clone(),
            guard_cooldown: config.guard_cooldown_duration(),
        })
    }

    pub fn classifier(&self) -> &TabClassifier {
        &self.classifier
    }

    /// Run one pass against the document.
    ///
    /// A guard clear is scheduled on `timers` whenever the guard is set, before
    /// anything else can fail.
    pub fn apply<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        timers: &mut ChangeScheduler,
        now: Duration,
    ) -> Result<ApplyOutcome> {
        let Some(container) = doc.query(&self.container_selector) else {
            return Ok(ApplyOutcome::NoContainer);
        };

        let classification = self.classifier.classify(&*doc, container);
        let Some((suppress, preferred)) = classification.resolved() else {
            return Ok(ApplyOutcome::Unresolved {
                candidates: classification.candidates.len(),
            });
        };

        let target = doc
            .closest_ancestor(suppress.node, &self.wrapper_selector)
            .unwrap_or(suppress.node);

        if doc.attribute(target, &self.hidden_marker).is_some() {
            return Ok(ApplyOutcome::AlreadyHidden { target });
        }

        let mut redirected = false;
        if suppress.selected && doc.attribute(container, &self.guard_marker).is_none() {
            // no click without the lock, or every pass would redirect again
            match doc.set_attribute(container, &self.guard_marker, "1") {
                Ok(()) => {
                    timers.schedule_guard_clear(container, now + self.guard_cooldown);
                    match doc.click(preferred.node) {
                        Ok(()) => redirected = true,
                        Err(e) => debug!("Selection redirect to {} failed: {}", preferred.node, e),
                    }
                }
                Err(e) => debug!("Failed to lock {} for a redirect: {}", container, e),
            }
        }

        doc.set_style_important(target, "display", "none")?;
        doc.set_style_important(target, "pointer-events", "none")?;
        doc.set_attribute(target, &self.hidden_marker, "1")?;

        Ok(ApplyOutcome::Hidden { target, redirected })
    }

    /// Drop the redirect guard; a container that is gone is ignored
    pub fn clear_guard<D: Document + ?Sized>(&self, doc: &mut D, container: NodeId) -> Result<()> {
        if !doc.contains(container) || doc.attribute(container, &self.guard_marker).is_none() {
            return Ok(());
        }
        doc.remove_attribute(container, &self.guard_marker)
    }

    pub fn guard_marker(&self) -> &str {
        &self.guard_marker
    }

    pub fn hidden_marker(&self) -> &str {
        &self.hidden_marker
    }
}
