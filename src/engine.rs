//! The engine ties the components together and is owned by whoever drives it.
//!
//! ```rust
//! use std::time::Duration;
//! use tab_warden::{DomTree, ElementNode, Engine, Signal, WardenConfig};
//!
//! # fn main() -> tab_warden::Result<()> {
//! let page = DomTree::new(ElementNode::new("html"));
//! let mut engine = Engine::new(page, WardenConfig::default())?;
//!
//! engine.start(Duration::ZERO)?;
//! engine.signal(Signal::Navigation, Duration::from_millis(5));
//! engine.run_due(Duration::from_millis(16));
//! # Ok(())
//! # }
//! ```

use crate::config::WardenConfig;
use crate::dom::Document;
use crate::error::Result;
use crate::observer::{MutationSource, SubtreeObserver};
use crate::policy::{ApplyOutcome, PolicyApplier};
use crate::scheduler::{ChangeScheduler, SchedulerStats, Signal, Task};
use log::{debug, info, warn};
use std::time::Duration;

/// Keeps the tab policy enforced on one document
pub struct Engine<D: Document> {
    document: D,
    applier: PolicyApplier,
    scheduler: ChangeScheduler,
    observer: SubtreeObserver,
    debug_flag: (String, String),
    running: bool,
    last_outcome: Option<ApplyOutcome>,
}

impl<D: Document> Engine<D> {
    /// Validate the configuration and build an engine in the stopped state
    pub fn new(document: D, config: WardenConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            document,
            applier: PolicyApplier::new(&config)?,
            scheduler: ChangeScheduler::new(config.frame_interval_duration()),
            observer: SubtreeObserver::new(),
            debug_flag: (config.debug_flag_attribute, config.debug_flag_value),
            running: false,
            last_outcome: None,
        })
    }

    /// Mark the document as managed, start observing and schedule the first pass
    pub fn start(&mut self, now: Duration) -> Result<()> {
        if self.running {
            return Ok(());
        }

        self.document.refresh()?;
        let root = self.document.document_element();
        let (name, value) = &self.debug_flag;
        self.document.set_attribute(root, name, value)?;

        self.observer.observe();
        self.running = true;
        info!("tab-warden active");

        self.scheduler.notify(now);
        Ok(())
    }

    /// Stop reacting to signals and drop everything scheduled.
    ///
    /// Guards whose cooldown has not run out yet are released on the way out.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.observer.disconnect();
        for container in self.scheduler.clear() {
            if let Err(e) = self.applier.clear_guard(&mut self.document, container) {
                debug!("Failed to release redirect guard on {}: {}", container, e);
            }
        }
        debug!("tab-warden stopped after {} ticks", self.scheduler.stats().ticks);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Feed a change hint. Returns `true` if it scheduled a new tick.
    pub fn signal(&mut self, signal: Signal, now: Duration) -> bool {
        if !self.running {
            return false;
        }
        let scheduled = self.scheduler.notify(now);
        if scheduled {
            debug!("{:?} scheduled a tick", signal);
        }
        scheduled
    }

    /// Run every task due at `now`. Returns how many ran.
    pub fn run_due(&mut self, now: Duration) -> usize {
        let mut ran = 0;
        while let Some(task) = self.scheduler.pop_due(now) {
            ran += 1;
            match task {
                Task::Tick => self.tick(now),
                Task::ClearGuard(container) => {
                    if let Err(e) = self.applier.clear_guard(&mut self.document, container) {
                        debug!("Failed to clear redirect guard on {}: {}", container, e);
                    }
                }
            }
        }
        ran
    }

    fn tick(&mut self, now: Duration) {
        self.scheduler.begin_tick();
        let result = self
            .document
            .refresh()
            .and_then(|()| self.applier.apply(&mut self.document, &mut self.scheduler, now));

        match result {
            Ok(outcome) => {
                debug!("Tick at {:?}: {:?}", now, outcome);
                self.last_outcome = Some(outcome);
            }
            Err(e) => {
                warn!("tab-warden tick failed: {}", e);
                self.scheduler.record_failure();
            }
        }
    }

    /// Earliest scheduled task, for the host loop to sleep until
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    /// Outcome of the most recent successful tick
    pub fn last_outcome(&self) -> Option<ApplyOutcome> {
        self.last_outcome
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn into_document(self) -> D {
        self.document
    }
}

impl<D: Document + MutationSource> Engine<D> {
    /// Drain the document's structural changes through the subtree observer
    pub fn pump_mutations(&mut self, now: Duration) -> bool {
        match self.observer.pump(&mut self.document) {
            Some(signal) => self.signal(signal, now),
            None => false,
        }
    }
}
