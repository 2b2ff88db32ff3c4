//! Deferred task scheduling.
//!
//! Tasks are plain values (usually an enum owned by the consumer) rather than
//! closures capturing the editor. The scheduler hands due tasks back to the
//! UI-thread owner, which dispatches them against the live editor. Timers that
//! may be superseded carry a generation taken from a [`TimerSlot`]; the
//! consumer drops a task whose generation is no longer current.
//!
//! Two implementations:
//! * [`ManualScheduler`] keeps a virtual clock; tests and single-threaded
//!   hosts advance it explicitly and receive due tasks in order.
//! * [`ChannelScheduler`] arms tokio timers and delivers due tasks into a
//!   crossbeam channel drained by a dedicated UI thread.

use crate::{TASKS_DROPPED, TASKS_POSTED};
use crossbeam_channel::Sender;
use std::cell::RefCell;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::trace;

/// Distinguishes UI-thread work from background (I/O bound) work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    Ui,
    Background,
}

pub trait TaskScheduler<T> {
    /// Post `task` to run after `delay`. Posting never blocks.
    fn post_task(&self, task: T, task_type: TaskType, delay: Duration, label: &'static str);
}

/// Cancellation token for a re-armable timer.
///
/// `arm` returns a fresh generation and invalidates every earlier one; a
/// timer callback acts only if `fire` accepts its generation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimerSlot {
    generation: u64,
    armed: bool,
}

impl TimerSlot {
    pub fn arm(&mut self) -> u64 {
        self.generation += 1;
        self.armed = true;
        self.generation
    }

    pub fn cancel(&mut self) {
        self.generation += 1;
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.armed && self.generation == generation
    }

    /// Consume the armed state if `generation` is current.
    pub fn fire(&mut self, generation: u64) -> bool {
        if self.is_current(generation) {
            self.armed = false;
            true
        } else {
            false
        }
    }
}

#[derive(Debug)]
struct Scheduled<T> {
    due: Duration,
    seq: u64,
    label: &'static str,
    task_type: TaskType,
    task: T,
}

#[derive(Debug)]
struct ManualQueue<T> {
    now: Duration,
    next_seq: u64,
    pending: Vec<Scheduled<T>>,
}

/// Virtual-clock scheduler. Due tasks come out ordered by due time, then by
/// posting order.
#[derive(Debug)]
pub struct ManualScheduler<T> {
    inner: RefCell<ManualQueue<T>>,
}

impl<T> Default for ManualScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ManualScheduler<T> {
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(ManualQueue {
                now: Duration::ZERO,
                next_seq: 0,
                pending: Vec::new(),
            }),
        }
    }

    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    pub fn pending_len(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    pub fn pending_labels(&self) -> Vec<&'static str> {
        self.inner.borrow().pending.iter().map(|s| s.label).collect()
    }

    pub fn pending_background(&self) -> usize {
        self.inner
            .borrow()
            .pending
            .iter()
            .filter(|s| s.task_type == TaskType::Background)
            .count()
    }

    /// Tasks already due at the current virtual time.
    pub fn take_due(&self) -> Vec<T> {
        self.advance(Duration::ZERO)
    }

    /// Move the clock forward and return every task due by then.
    pub fn advance(&self, by: Duration) -> Vec<T> {
        let mut inner = self.inner.borrow_mut();
        inner.now += by;
        let now = inner.now;
        let mut due: Vec<Scheduled<T>> = Vec::new();
        let mut keep = Vec::with_capacity(inner.pending.len());
        for item in inner.pending.drain(..) {
            if item.due <= now {
                due.push(item);
            } else {
                keep.push(item);
            }
        }
        inner.pending = keep;
        due.sort_by_key(|s| (s.due, s.seq));
        due.into_iter().map(|s| s.task).collect()
    }

    /// Clock value at which the earliest pending task becomes due.
    pub fn next_due(&self) -> Option<Duration> {
        self.inner.borrow().pending.iter().map(|s| s.due).min()
    }
}

impl<T> TaskScheduler<T> for ManualScheduler<T> {
    fn post_task(&self, task: T, task_type: TaskType, delay: Duration, label: &'static str) {
        let mut inner = self.inner.borrow_mut();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        let due = inner.now + delay;
        trace!(target: "events.scheduler", label, seq, delay_ms = delay.as_millis() as u64, "post_task");
        inner.pending.push(Scheduled {
            due,
            seq,
            label,
            task_type,
            task,
        });
        TASKS_POSTED.fetch_add(1, Ordering::Relaxed);
    }
}

/// Scheduler arming tokio timers and delivering due tasks into a channel.
///
/// The receiving end belongs to the UI thread. A send failure means that
/// thread is gone; the task is dropped and counted.
#[derive(Debug)]
pub struct ChannelScheduler<T> {
    tx: Sender<T>,
    handle: tokio::runtime::Handle,
}

impl<T> Clone for ChannelScheduler<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            handle: self.handle.clone(),
        }
    }
}

impl<T: Send + 'static> ChannelScheduler<T> {
    pub fn new(tx: Sender<T>, handle: tokio::runtime::Handle) -> Self {
        Self { tx, handle }
    }

    fn deliver(tx: &Sender<T>, task: T, label: &'static str) {
        if tx.send(task).is_err() {
            TASKS_DROPPED.fetch_add(1, Ordering::Relaxed);
            trace!(target: "events.scheduler", label, "task_dropped_receiver_closed");
        }
    }
}

impl<T: Send + 'static> TaskScheduler<T> for ChannelScheduler<T> {
    fn post_task(&self, task: T, task_type: TaskType, delay: Duration, label: &'static str) {
        TASKS_POSTED.fetch_add(1, Ordering::Relaxed);
        trace!(target: "events.scheduler", label, ?task_type, delay_ms = delay.as_millis() as u64, "post_task");
        if delay.is_zero() {
            Self::deliver(&self.tx, task, label);
            return;
        }
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            Self::deliver(&tx, task, label);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_scheduler_orders_by_due_then_seq() {
        let s = ManualScheduler::new();
        s.post_task("late", TaskType::Ui, Duration::from_millis(30), "late");
        s.post_task("a", TaskType::Ui, Duration::from_millis(10), "a");
        s.post_task("b", TaskType::Ui, Duration::from_millis(10), "b");
        s.post_task("now", TaskType::Background, Duration::ZERO, "now");
        assert_eq!(s.take_due(), vec!["now"]);
        assert_eq!(s.advance(Duration::from_millis(10)), vec!["a", "b"]);
        assert_eq!(s.pending_labels(), vec!["late"]);
        assert_eq!(s.next_due(), Some(Duration::from_millis(30)));
        assert_eq!(s.advance(Duration::from_millis(25)), vec!["late"]);
        assert_eq!(s.pending_len(), 0);
    }

    #[test]
    fn timer_slot_rejects_superseded_generations() {
        let mut slot = TimerSlot::default();
        let first = slot.arm();
        let second = slot.arm();
        assert!(!slot.fire(first));
        assert!(slot.fire(second));
        assert!(!slot.fire(second), "a generation fires once");
        let third = slot.arm();
        slot.cancel();
        assert!(!slot.is_current(third));
        assert!(!slot.is_armed());
    }

    #[tokio::test]
    async fn channel_scheduler_delivers_after_delay() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let sched = ChannelScheduler::new(tx, tokio::runtime::Handle::current());
        sched.post_task(2u32, TaskType::Ui, Duration::from_millis(20), "delayed");
        sched.post_task(1u32, TaskType::Ui, Duration::ZERO, "immediate");
        assert_eq!(rx.try_recv().ok(), Some(1));
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(rx.try_recv().ok(), Some(2));
    }

    #[tokio::test]
    async fn channel_scheduler_counts_drops_when_receiver_gone() {
        let (tx, rx) = crossbeam_channel::unbounded::<u8>();
        drop(rx);
        let before = TASKS_DROPPED.load(Ordering::Relaxed);
        let sched = ChannelScheduler::new(tx, tokio::runtime::Handle::current());
        sched.post_task(7, TaskType::Background, Duration::ZERO, "orphan");
        assert!(TASKS_DROPPED.load(Ordering::Relaxed) > before);
    }
}
