//! Cross-thread inbox of tasks for the GUI thread, plus a one-shot latch.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// Deferred work executed on the GUI thread.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Multi-producer, single-consumer FIFO of tasks.
#[derive(Default)]
pub struct TaskQueue {
    tasks: Mutex<VecDeque<Task>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Task>> {
        match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn push(&self, task: Task) {
        self.lock().push_back(task);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Take everything queued so far. Tasks pushed afterwards wait for the next drain.
    pub fn take_batch(&self) -> VecDeque<Task> {
        std::mem::take(&mut *self.lock())
    }

    /// Run the current batch with the lock released; returns how many ran.
    pub fn run_batch(&self) -> usize {
        let batch = self.take_batch();
        let count = batch.len();
        for task in batch {
            task();
        }
        count
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.len())
            .finish()
    }
}

/// One-shot gate: waiters block until it is released.
#[derive(Debug)]
pub struct Latch {
    released: Mutex<bool>,
    cvar: Condvar,
}

impl Latch {
    pub fn new() -> Self {
        Self {
            released: Mutex::new(false),
            cvar: Condvar::new(),
        }
    }

    /// A latch that starts released, so waiting returns immediately.
    pub fn released() -> Self {
        Self {
            released: Mutex::new(true),
            cvar: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        match self.released.lock() {
            Ok(released) => released,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn release(&self) {
        let mut released = self.lock();
        *released = true;
        self.cvar.notify_all();
    }

    pub fn is_released(&self) -> bool {
        *self.lock()
    }

    pub fn wait(&self) {
        let mut released = self.lock();
        while !*released {
            released = self
                .cvar
                .wait(released)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Wait at most `timeout`; returns whether the latch was released.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let released = self.lock();
        let (released, _) = self
            .cvar
            .wait_timeout_while(released, timeout, |released| !*released)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *released
    }
}

impl Default for Latch {
    fn default() -> Self {
        Self::new()
    }
}
