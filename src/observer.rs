use crate::dom::NodeId;
use crate::scheduler::Signal;

/// Kind of structural change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    ChildAdded,
    ChildRemoved,
}

/// One structural change at any depth of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    /// Node whose child list changed
    pub parent: NodeId,
}

/// Something that accumulates structural changes until they are taken
pub trait MutationSource {
    /// Take every record queued since the last call, as one batch
    fn take_records(&mut self) -> Vec<MutationRecord>;
}

/// Watches a document subtree and turns each non-empty batch of structural
/// changes into a single [`Signal::Mutation`]. Records are not inspected; the
/// policy recomputes everything from scratch on each tick.
#[derive(Debug, Default)]
pub struct SubtreeObserver {
    connected: bool,
}

impl SubtreeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self) {
        self.connected = true;
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Drain pending records. Returns a signal when connected and the batch is non-empty.
    pub fn pump<S: MutationSource + ?Sized>(&mut self, source: &mut S) -> Option<Signal> {
        let batch = source.take_records();
        if !self.connected || batch.is_empty() {
            return None;
        }
        log::trace!("Observed {} structural changes", batch.len());
        Some(Signal::Mutation)
    }
}
