//! Dedicated GUI thread with an explicit lifecycle.
//!
//! [`TextGuiThread`] owns a thread that builds a [`TextGui`] and drives it
//! until stopped. Status moves `Created -> Started -> Stopping -> Stopped`;
//! the transition to `Stopped` happens on the GUI thread when the loop exits,
//! however it exits, and releases everyone blocked in
//! [`TextGuiThread::wait_for_stop`].

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::Duration;

use crate::config::GuiConfig;
use crate::core::error::GuiError;
use crate::runtime::exception::{catch_phase, should_stop, DefaultExceptionHandler, ExceptionHandler, Phase};
use crate::runtime::task_queue::{Latch, TaskQueue};

const GUI_THREAD_NAME: &str = "tape-gui";
const INVOKE_AND_WAIT_POLL: Duration = Duration::from_millis(10);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Created,
    Started,
    Stopping,
    Stopped,
}

/// A GUI that can be driven one step at a time by [`TextGuiThread`].
pub trait TextGui {
    /// Read and dispatch at most one input event; returns whether one arrived.
    fn process_input(&mut self) -> Result<bool, GuiError>;

    /// Redraw the screen unconditionally.
    fn update_screen(&mut self) -> Result<(), GuiError>;

    /// Whether a redraw is needed.
    fn is_pending_update(&self) -> bool;

    /// Run work the GUI queued for itself; returns how many tasks ran.
    fn run_pending_tasks(&mut self) -> usize {
        0
    }
}

struct ThreadShared {
    status: Mutex<Status>,
    tasks: TaskQueue,
    gui_thread: Mutex<Option<ThreadId>>,
    stopped: Mutex<Arc<Latch>>,
    exception_handler: Mutex<Box<dyn ExceptionHandler>>,
    idle_sleep: Duration,
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl ThreadShared {
    fn status(&self) -> Status {
        *lock(&self.status)
    }

    fn request_stop(&self) {
        let mut status = lock(&self.status);
        if *status == Status::Started {
            *status = Status::Stopping;
            tracing::debug!("GUI thread stopping");
        }
    }

    fn should_stop(&self, phase: Phase, error: &GuiError) -> bool {
        let mut handler = lock(&self.exception_handler);
        should_stop(handler.as_mut(), phase, error)
    }
}

/// Marks the loop stopped and releases waiters when the GUI thread exits.
struct StopGuard {
    shared: Arc<ThreadShared>,
    stopped: Arc<Latch>,
}

impl Drop for StopGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            tracing::error!("GUI thread panicked; marking stopped");
        }
        *lock(&self.shared.status) = Status::Stopped;
        // Tasks that will never run are dropped so their waiters can observe the stop.
        drop(self.shared.tasks.take_batch());
        self.stopped.release();
        tracing::debug!("GUI thread stopped");
    }
}

/// Handle to the GUI thread; clones share the same thread.
#[derive(Clone)]
pub struct TextGuiThread {
    shared: Arc<ThreadShared>,
}

impl TextGuiThread {
    pub fn new() -> Self {
        Self::with_config(&GuiConfig::from_env())
    }

    pub fn with_config(config: &GuiConfig) -> Self {
        Self {
            shared: Arc::new(ThreadShared {
                status: Mutex::new(Status::Created),
                tasks: TaskQueue::new(),
                gui_thread: Mutex::new(None),
                stopped: Mutex::new(Arc::new(Latch::released())),
                exception_handler: Mutex::new(Box::new(DefaultExceptionHandler)),
                idle_sleep: config.idle_sleep,
            }),
        }
    }

    /// Spawn the GUI thread; `factory` builds the GUI on that thread.
    ///
    /// Fails with [`GuiError::IllegalState`] if a loop is already running.
    pub fn start<G, F>(&self, factory: F) -> Result<(), GuiError>
    where
        G: TextGui + 'static,
        F: FnOnce() -> G + Send + 'static,
    {
        let stopped = Arc::new(Latch::new());
        {
            let mut status = lock(&self.shared.status);
            if matches!(*status, Status::Started | Status::Stopping) {
                return Err(GuiError::illegal_state("start", *status));
            }
            // Started before the spawn so the loop never observes a stale status.
            *status = Status::Started;
            *lock(&self.shared.stopped) = Arc::clone(&stopped);
        }

        let shared = Arc::clone(&self.shared);
        let guard_latch = Arc::clone(&stopped);
        let spawned = thread::Builder::new()
            .name(GUI_THREAD_NAME.to_string())
            .spawn(move || {
                *lock(&shared.gui_thread) = Some(thread::current().id());
                let _guard = StopGuard {
                    shared: Arc::clone(&shared),
                    stopped: guard_latch,
                };
                let mut gui = factory();
                main_loop(&shared, &mut gui);
            });

        match spawned {
            Ok(_) => {
                tracing::debug!("GUI thread started");
                Ok(())
            }
            Err(err) => {
                *lock(&self.shared.status) = Status::Stopped;
                stopped.release();
                Err(GuiError::ThreadSpawn(err))
            }
        }
    }

    /// Ask the loop to finish. No-op unless started.
    pub fn stop(&self) {
        self.shared.request_stop();
    }

    /// Block until the loop has stopped. Returns immediately if it never started.
    pub fn wait_for_stop(&self) {
        let stopped = Arc::clone(&*lock(&self.shared.stopped));
        stopped.wait();
    }

    /// Like [`TextGuiThread::wait_for_stop`], bounded; returns whether it stopped.
    pub fn wait_for_stop_timeout(&self, timeout: Duration) -> bool {
        let stopped = Arc::clone(&*lock(&self.shared.stopped));
        stopped.wait_timeout(timeout)
    }

    pub fn status(&self) -> Status {
        self.shared.status()
    }

    pub fn is_in_event_thread(&self) -> bool {
        *lock(&self.shared.gui_thread) == Some(thread::current().id())
    }

    /// Run `task` on the GUI thread: inline when already there, queued otherwise.
    pub fn invoke_later(&self, task: impl FnOnce() + Send + 'static) -> Result<(), GuiError> {
        let status = self.status();
        if status != Status::Started {
            return Err(GuiError::illegal_state("invoke_later", status));
        }
        if self.is_in_event_thread() {
            task();
        } else {
            self.shared.tasks.push(Box::new(task));
        }
        Ok(())
    }

    /// Run `task` on the GUI thread and block until it has run.
    ///
    /// Fails if the loop stops before the task gets its turn.
    pub fn invoke_and_wait(&self, task: impl FnOnce() + Send + 'static) -> Result<(), GuiError> {
        let done = Arc::new(Latch::new());
        let release = Arc::clone(&done);
        self.invoke_later(move || {
            task();
            release.release();
        })?;
        loop {
            if done.wait_timeout(INVOKE_AND_WAIT_POLL) {
                return Ok(());
            }
            let status = self.status();
            if status == Status::Stopped {
                return Err(GuiError::illegal_state("invoke_and_wait", status));
            }
        }
    }

    pub fn set_exception_handler(&self, handler: Box<dyn ExceptionHandler>) {
        *lock(&self.shared.exception_handler) = handler;
    }
}

impl Default for TextGuiThread {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextGuiThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextGuiThread")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

fn main_loop<G: TextGui>(shared: &ThreadShared, gui: &mut G) {
    // Draw once up front; afterwards only when the GUI reports pending work.
    if let Err(err) = catch_phase(|| gui.update_screen()) {
        if shared.should_stop(Phase::Update, &err) {
            shared.request_stop();
            return;
        }
    }

    while shared.status() == Status::Started {
        if let Err(err) = catch_phase(|| gui.process_input()) {
            if shared.should_stop(Phase::Input, &err) {
                shared.request_stop();
                break;
            }
        }

        shared.tasks.run_batch();
        gui.run_pending_tasks();

        if gui.is_pending_update() {
            if let Err(err) = catch_phase(|| gui.update_screen()) {
                if shared.should_stop(Phase::Update, &err) {
                    shared.request_stop();
                    break;
                }
            }
        } else {
            thread::sleep(shared.idle_sleep);
        }
    }
}
