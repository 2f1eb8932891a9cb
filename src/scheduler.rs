//! Change coalescing and the single-consumer timer queue.
//!
//! Time is expressed as a [`Duration`] offset from an arbitrary origin chosen
//! by whoever drives the engine (the live host uses the moment the engine
//! started; tests pick their own values).

use crate::dom::NodeId;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

/// A hint that the page may have changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Structural change somewhere in the document
    Mutation,
    /// History push/replace or back/forward
    Navigation,
    /// Page visibility changed
    Visibility,
}

/// Receives signals from watchers
pub trait SignalSink {
    fn emit(&mut self, signal: Signal);
}

impl SignalSink for tokio::sync::mpsc::UnboundedSender<Signal> {
    fn emit(&mut self, signal: Signal) {
        if self.send(signal).is_err() {
            log::debug!("Dropping {:?} signal: engine is gone", signal);
        }
    }
}

impl SignalSink for Vec<Signal> {
    fn emit(&mut self, signal: Signal) {
        self.push(signal);
    }
}

/// Deferred work
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Task {
    /// Run one policy pass
    Tick,
    /// Drop the redirect guard from a container
    ClearGuard(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Scheduled {
    deadline: Duration,
    seq: u64,
    task: Task,
}

/// Timer queue ordered by deadline, then by insertion order
#[derive(Debug, Default)]
pub struct TaskQueue {
    heap: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Duration, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Scheduled { deadline, seq, task }));
    }

    /// Remove and return the earliest task whose deadline is `<= now`
    pub fn pop_due(&mut self, now: Duration) -> Option<Task> {
        let Reverse(next) = self.heap.peek()?;
        if next.deadline > now {
            return None;
        }
        self.heap.pop().map(|Reverse(scheduled)| scheduled.task)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse(scheduled)| scheduled.deadline)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Remove every task, earliest first
    pub fn drain(&mut self) -> Vec<Task> {
        let mut tasks = Vec::with_capacity(self.heap.len());
        while let Some(Reverse(scheduled)) = self.heap.pop() {
            tasks.push(scheduled.task);
        }
        tasks
    }
}

/// Diagnostic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Total notify() calls
    pub notifications: u64,
    /// notify() calls absorbed by an already pending tick
    pub coalesced: u64,
    /// Ticks started
    pub ticks: u64,
    /// Ticks whose policy pass failed
    pub failures: u64,
}

/// Collapses bursts of change signals into at most one tick per quantum
#[derive(Debug)]
pub struct ChangeScheduler {
    frame_interval: Duration,
    pending: bool,
    queue: TaskQueue,
    stats: SchedulerStats,
}

impl ChangeScheduler {
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            frame_interval,
            pending: false,
            queue: TaskQueue::new(),
            stats: SchedulerStats::default(),
        }
    }

    /// Request a policy pass. Returns `true` if this call scheduled a new tick,
    /// `false` if one was already pending.
    pub fn notify(&mut self, now: Duration) -> bool {
        self.stats.notifications += 1;
        if self.pending {
            self.stats.coalesced += 1;
            return false;
        }
        self.pending = true;
        self.queue.schedule(now + self.frame_interval, Task::Tick);
        true
    }

    /// Whether a tick is scheduled but has not started yet
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Mark the pending tick as started; later notifies schedule a new one
    pub fn begin_tick(&mut self) {
        self.pending = false;
        self.stats.ticks += 1;
    }

    pub fn record_failure(&mut self) {
        self.stats.failures += 1;
    }

    /// Arrange for the guard on `container` to be dropped at `at`
    pub fn schedule_guard_clear(&mut self, container: NodeId, at: Duration) {
        self.queue.schedule(at, Task::ClearGuard(container));
    }

    pub fn pop_due(&mut self, now: Duration) -> Option<Task> {
        self.queue.pop_due(now)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.next_deadline()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Drop everything that is scheduled.
    ///
    /// Returns the containers whose guard clear had not run yet; their guards
    /// are still set and it is up to the caller to release them.
    pub fn clear(&mut self) -> Vec<NodeId> {
        self.pending = false;
        self.queue
            .drain()
            .into_iter()
            .filter_map(|task| match task {
                Task::ClearGuard(container) => Some(container),
                Task::Tick => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_task_queue_orders_by_deadline_then_insertion() {
        let mut queue = TaskQueue::new();
        queue.schedule(ms(20), Task::ClearGuard(NodeId(1)));
        queue.schedule(ms(10), Task::Tick);
        queue.schedule(ms(20), Task::Tick);

        assert_eq!(queue.next_deadline(), Some(ms(10)));
        assert_eq!(queue.pop_due(ms(5)), None);
        assert_eq!(queue.pop_due(ms(25)), Some(Task::Tick));
        assert_eq!(queue.pop_due(ms(25)), Some(Task::ClearGuard(NodeId(1))));
        assert_eq!(queue.pop_due(ms(25)), Some(Task::Tick));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_notify_coalesces() {
        let mut scheduler = ChangeScheduler::new(ms(16));

        assert!(scheduler.notify(ms(0)));
        for i in 1..10 {
            assert!(!scheduler.notify(ms(i)));
        }

        assert_eq!(scheduler.next_deadline(), Some(ms(16)));
        assert_eq!(scheduler.pop_due(ms(15)), None);
        assert_eq!(scheduler.pop_due(ms(16)), Some(Task::Tick));
        assert_eq!(scheduler.pop_due(ms(16)), None);

        let stats = scheduler.stats();
        assert_eq!(stats.notifications, 10);
        assert_eq!(stats.coalesced, 9);
    }

    #[test]
    fn test_notify_after_begin_tick_schedules_again() {
        let mut scheduler = ChangeScheduler::new(ms(16));
        scheduler.notify(ms(0));
        assert_eq!(scheduler.pop_due(ms(16)), Some(Task::Tick));

        // still pending until the tick actually starts
        assert!(!scheduler.notify(ms(16)));
        scheduler.begin_tick();
        assert!(!scheduler.is_pending());
        assert!(scheduler.notify(ms(17)));
        assert_eq!(scheduler.next_deadline(), Some(ms(33)));
    }

    #[test]
    fn test_clear() {
        let mut scheduler = ChangeScheduler::new(ms(16));
        scheduler.notify(ms(0));
        scheduler.schedule_guard_clear(NodeId(3), ms(1500));
        scheduler.schedule_guard_clear(NodeId(2), ms(900));

        assert_eq!(scheduler.clear(), vec![NodeId(2), NodeId(3)]);

        assert!(!scheduler.is_pending());
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn test_signal_sinks() {
        let mut sink = Vec::new();
        sink.emit(Signal::Mutation);
        sink.emit(Signal::Navigation);
        assert_eq!(sink, vec![Signal::Mutation, Signal::Navigation]);

        let (mut tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.emit(Signal::Visibility);
        assert_eq!(rx.try_recv().unwrap(), Signal::Visibility);

        drop(rx);
        tx.emit(Signal::Mutation);
    }
}
