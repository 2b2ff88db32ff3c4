//! Bounded synchronous waits on UI-thread work.
//!
//! Used only for diagnostics: a non-UI thread posts a request carrying a
//! [`SyncReply`] and blocks on the matching [`SyncWaiter`]. The wait is always
//! bounded; on timeout the caller logs and continues without a value.

use crate::SYNC_WAIT_TIMEOUTS;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::warn;

/// Upper bound for any blocking wait on the UI thread.
pub const SYNC_TASK_TIMEOUT: Duration = Duration::from_secs(10);

/// Reply half, moved into the UI-thread request.
#[derive(Debug)]
pub struct SyncReply<T> {
    tx: Sender<T>,
}

impl<T> SyncReply<T> {
    /// Deliver the value; returns false when the waiter already gave up.
    pub fn send(self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }
}

/// Waiting half, kept by the requesting thread.
#[derive(Debug)]
pub struct SyncWaiter<T> {
    rx: Receiver<T>,
    label: &'static str,
}

impl<T> SyncWaiter<T> {
    /// Block for at most `timeout`. `None` on timeout or when the reply was dropped.
    pub fn wait(self, timeout: Duration) -> Option<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(value) => Some(value),
            Err(RecvTimeoutError::Timeout) => {
                SYNC_WAIT_TIMEOUTS.fetch_add(1, Ordering::Relaxed);
                warn!(target: "events.sync", label = self.label, timeout_ms = timeout.as_millis() as u64, "sync_task_timeout");
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!(target: "events.sync", label = self.label, "sync_task_reply_dropped");
                None
            }
        }
    }

    /// Block for at most [`SYNC_TASK_TIMEOUT`].
    pub fn wait_default(self) -> Option<T> {
        self.wait(SYNC_TASK_TIMEOUT)
    }
}

pub fn sync_pair<T>(label: &'static str) -> (SyncReply<T>, SyncWaiter<T>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (SyncReply { tx }, SyncWaiter { rx, label })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn reply_from_other_thread_is_received() {
        let (reply, waiter) = sync_pair::<u32>("dump");
        let worker = thread::spawn(move || reply.send(42));
        assert_eq!(waiter.wait(Duration::from_secs(1)), Some(42));
        assert!(worker.join().unwrap());
    }

    #[test]
    fn timeout_fails_soft() {
        let (_reply, waiter) = sync_pair::<u32>("dump");
        let before = SYNC_WAIT_TIMEOUTS.load(Ordering::Relaxed);
        assert_eq!(waiter.wait(Duration::from_millis(10)), None);
        assert!(SYNC_WAIT_TIMEOUTS.load(Ordering::Relaxed) > before);
    }

    #[derive(Clone, Default)]
    struct SharedBuf(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn timeout_is_logged_with_label() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let (_reply, waiter) = sync_pair::<u32>("dump");
            assert_eq!(waiter.wait(Duration::from_millis(5)), None);
        });
        let out = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("events.sync"));
        assert!(out.contains("sync_task_timeout"));
        assert!(out.contains("label=\"dump\""));
    }

    #[test]
    fn dropped_reply_returns_none() {
        let (reply, waiter) = sync_pair::<u32>("dump");
        drop(reply);
        assert_eq!(waiter.wait(Duration::from_secs(1)), None);
    }
}
