//! TaskQueue implementation
//!
//! A single mutex guards both the pending queue and the admission set so the
//! duplicate check and the enqueue are atomic with respect to each other;
//! every critical section is O(1) against the set plus an O(1) deque push.
//! Waiting consumers park on a `Notify`.

use crate::queue::{QueueError, SnapshotTask, TaskKey};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct QueueInner {
    pending: VecDeque<SnapshotTask>,
    admitted: HashSet<TaskKey>,
    closed: bool,
}

/// Thread-safe FIFO queue with at-most-once admission per `(tenant, timestamp)`
#[derive(Debug, Default)]
pub struct TaskQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a newly discovered task
    ///
    /// Returns `false` when the key has already been admitted this lifetime
    /// (queued, in flight, completed, or abandoned) or when the queue is
    /// closed. The admission set never forgets a member.
    pub fn offer(&self, task: SnapshotTask) -> bool {
        let key = task.key();
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.closed || !inner.admitted.insert(key) {
                return false;
            }
            inner.pending.push_back(task);
        }
        self.notify.notify_waiters();
        true
    }

    /// Re-enqueue a task that a worker decided to retry
    ///
    /// Bypasses the admission filter; the key stays admitted from its first
    /// offer. Fails only once the queue is closed, in which case the task is
    /// dropped and rediscovered on the next supervisor start.
    pub fn requeue(&self, task: SnapshotTask) -> Result<(), QueueError> {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.closed {
                return Err(QueueError::Closed);
            }
            inner.pending.push_back(task);
        }
        self.notify.notify_waiters();
        Ok(())
    }

    /// Take the next task, waiting until one arrives or the queue closes
    ///
    /// Returns `None` once the queue is closed; tasks still pending at close
    /// are deliberately not handed out.
    pub async fn take(&self) -> Option<SnapshotTask> {
        loop {
            if let Some(result) = self.try_take() {
                return result;
            }

            // Register the waiter before the re-check so a notification
            // between the check and the await cannot be lost
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(result) = self.try_take() {
                return result;
            }
            notified.await;
        }
    }

    // Some(None): closed. Some(Some(task)): got work. None: keep waiting.
    fn try_take(&self) -> Option<Option<SnapshotTask>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return Some(None);
        }
        inner.pending.pop_front().map(Some)
    }

    /// Close the queue and wake every waiter
    pub fn close(&self) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.closed = true;
        }
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }

    /// Number of tasks waiting to be taken
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys ever admitted
    pub fn admitted_len(&self) -> usize {
        self.inner.lock().unwrap().admitted.len()
    }
}
