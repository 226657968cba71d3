//! Window manager: window stack, full-screen repaint, and the nested event loop.
//!
//! Invariant: a [`GuiScreen`] lives on exactly one thread (it is `!Send`). Every
//! stack mutation, layout pass, and paint happens there. Other threads reach it
//! only through [`GuiHandle`].

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::Duration;

use unicode_width::UnicodeWidthStr;

use crate::config::GuiConfig;
use crate::core::error::GuiError;
use crate::core::geometry::TerminalPosition;
use crate::core::screen::Screen;
use crate::core::theme::{default_theme, ThemeCategory, ThemeHandle};
use crate::core::window::{Invalidate, InvalidationListener, Window};
use crate::render::graphics::TextGraphics;
use crate::render::memory;
use crate::runtime::exception::{
    catch_phase, should_stop, DefaultExceptionHandler, ExceptionHandler, Phase,
};
use crate::runtime::gui_thread::TextGui;
use crate::runtime::placement::{Position, SHADOW_OFFSET};
use crate::runtime::stack::WindowStack;
use crate::runtime::task_queue::{Latch, TaskQueue};

const TITLE_POSITION: TerminalPosition = TerminalPosition::new(3, 0);

/// GUI-wide state reachable from any thread.
///
/// Flags use relaxed atomics: a racing writer can at worst cause one stale
/// repaint. Title and theme are swapped whole under a mutex.
struct GuiShared {
    needs_refresh: AtomicBool,
    show_memory_usage: AtomicBool,
    title: Mutex<String>,
    theme: Mutex<ThemeHandle>,
    tasks: TaskQueue,
    event_thread: ThreadId,
}

impl GuiShared {
    fn title(&self) -> MutexGuard<'_, String> {
        match self.title.lock() {
            Ok(title) => title,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn theme(&self) -> MutexGuard<'_, ThemeHandle> {
        match self.theme.lock() {
            Ok(theme) => theme,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn mark_dirty(&self) {
        self.needs_refresh.store(true, Ordering::Relaxed);
    }
}

impl Invalidate for GuiShared {
    fn on_invalidate(&self) {
        self.mark_dirty();
    }
}

/// Thread-safe handle to a [`GuiScreen`].
#[derive(Clone)]
pub struct GuiHandle {
    shared: Arc<GuiShared>,
}

impl GuiHandle {
    /// Request a full repaint before the next idle cycle.
    pub fn invalidate(&self) {
        self.shared.mark_dirty();
    }

    pub fn set_title(&self, title: impl Into<String>) {
        *self.shared.title() = title.into();
        self.shared.mark_dirty();
    }

    pub fn set_theme(&self, theme: ThemeHandle) {
        *self.shared.theme() = theme;
        self.shared.mark_dirty();
    }

    pub fn set_show_memory_usage(&self, show: bool) {
        self.shared.show_memory_usage.store(show, Ordering::Relaxed);
        self.shared.mark_dirty();
    }

    pub fn is_in_event_thread(&self) -> bool {
        thread::current().id() == self.shared.event_thread
    }

    /// Queue `task` for the next loop iteration, even when called on the GUI thread.
    pub fn run_in_event_thread(&self, task: impl FnOnce() + Send + 'static) {
        self.shared.tasks.push(Box::new(task));
    }

    /// Run `task` on the GUI thread: inline when already there, queued otherwise.
    pub fn invoke_later(&self, task: impl FnOnce() + Send + 'static) {
        if self.is_in_event_thread() {
            task();
        } else {
            self.run_in_event_thread(task);
        }
    }

    /// Run `task` on the GUI thread and block until it has run.
    ///
    /// Blocks indefinitely if no event loop drains the queue.
    pub fn invoke_and_wait(&self, task: impl FnOnce() + Send + 'static) {
        if self.is_in_event_thread() {
            task();
            return;
        }
        let latch = Arc::new(Latch::new());
        let done = Arc::clone(&latch);
        self.run_in_event_thread(move || {
            task();
            done.release();
        });
        latch.wait();
    }
}

impl std::fmt::Debug for GuiHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuiHandle")
            .field("event_thread", &self.shared.event_thread)
            .finish_non_exhaustive()
    }
}

/// The window manager.
///
/// Windows are shown with [`GuiScreen::show_window`], which blocks in a nested
/// event loop until that window is closed. Showing a window from inside a key
/// handler stacks it above the current one and nests another loop.
pub struct GuiScreen {
    screen: RefCell<Box<dyn Screen>>,
    stack: RefCell<WindowStack>,
    shared: Arc<GuiShared>,
    exception_handler: RefCell<Box<dyn ExceptionHandler>>,
    idle_sleep: Duration,
}

impl GuiScreen {
    /// Create a GUI on the current thread, configured from the environment.
    pub fn new(screen: impl Screen + 'static) -> Self {
        Self::with_config(screen, &GuiConfig::from_env())
    }

    pub fn with_config(screen: impl Screen + 'static, config: &GuiConfig) -> Self {
        Self {
            screen: RefCell::new(Box::new(screen)),
            stack: RefCell::new(WindowStack::new()),
            shared: Arc::new(GuiShared {
                needs_refresh: AtomicBool::new(false),
                show_memory_usage: AtomicBool::new(config.show_memory_usage),
                title: Mutex::new(String::new()),
                theme: Mutex::new(default_theme()),
                tasks: TaskQueue::new(),
                event_thread: thread::current().id(),
            }),
            exception_handler: RefCell::new(Box::new(DefaultExceptionHandler)),
            idle_sleep: config.idle_sleep,
        }
    }

    pub fn handle(&self) -> GuiHandle {
        GuiHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Run `f` with the underlying screen, e.g. to start or stop it.
    ///
    /// Panics if called from inside a repaint.
    pub fn with_screen<R>(&self, f: impl FnOnce(&mut dyn Screen) -> R) -> R {
        let mut screen = self.screen.borrow_mut();
        f(&mut **screen)
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.handle().set_title(title);
    }

    pub fn title(&self) -> String {
        self.shared.title().clone()
    }

    pub fn set_theme(&self, theme: ThemeHandle) {
        self.handle().set_theme(theme);
    }

    pub fn theme(&self) -> ThemeHandle {
        ThemeHandle::clone(&self.shared.theme())
    }

    pub fn set_show_memory_usage(&self, show: bool) {
        self.handle().set_show_memory_usage(show);
    }

    pub fn is_showing_memory_usage(&self) -> bool {
        self.shared.show_memory_usage.load(Ordering::Relaxed)
    }

    pub fn invalidate(&self) {
        self.shared.mark_dirty();
    }

    pub fn needs_refresh(&self) -> bool {
        self.shared.needs_refresh.load(Ordering::Relaxed)
    }

    pub fn set_exception_handler(&self, handler: Box<dyn ExceptionHandler>) {
        *self.exception_handler.borrow_mut() = handler;
    }

    pub fn is_in_event_thread(&self) -> bool {
        self.handle().is_in_event_thread()
    }

    /// Queue `task` for the next loop iteration.
    pub fn run_in_event_thread(&self, task: impl FnOnce() + Send + 'static) {
        self.handle().run_in_event_thread(task);
    }

    pub fn window_count(&self) -> usize {
        self.stack.borrow().len()
    }

    pub fn active_window(&self) -> Option<Rc<dyn Window>> {
        self.stack.borrow().top_window()
    }

    /// Stored top-left corner of every shown window, bottom to top.
    pub fn window_positions(&self) -> Vec<TerminalPosition> {
        self.stack
            .borrow()
            .iter()
            .map(|placement| placement.top_left())
            .collect()
    }

    /// Push `window` without entering an event loop.
    ///
    /// Returns `false` if the window is already shown.
    pub fn add_window(&self, window: Rc<dyn Window>, position: Position) -> bool {
        let pushed = self
            .stack
            .borrow_mut()
            .push(Rc::clone(&window), position);
        let Some(top_left) = pushed else {
            tracing::debug!("window already shown; ignoring push");
            return false;
        };
        tracing::debug!(?position, %top_left, "window shown");

        window.add_invalidation_listener(InvalidationListener::new(&self.shared));
        window.on_visible();
        self.invalidate();
        true
    }

    /// Show `window` and block until it is closed.
    ///
    /// Returns early with the failure if the loop was stopped by the exception
    /// handler or by the end of input; the window then stays on the stack.
    pub fn show_window(&self, window: Rc<dyn Window>, position: Position) -> Result<(), GuiError> {
        if !self.add_window(window, position) {
            return Ok(());
        }
        self.run_event_loop()
    }

    /// Close the active window. No-op when no window is shown.
    pub fn close_window(&self) {
        let popped = self.stack.borrow_mut().pop();
        let Some(placement) = popped else {
            return;
        };
        tracing::debug!(remaining = self.window_count(), "window closed");
        placement.window().on_closed();
        self.invalidate();
    }

    /// Repaint if something was invalidated or the screen was resized.
    pub fn update(&self) -> Result<bool, GuiError> {
        let resize_pending = self.screen.borrow().is_resize_pending();
        if self.needs_refresh() || resize_pending {
            self.repaint()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Repaint the whole screen.
    pub fn repaint(&self) -> Result<(), GuiError> {
        // Cleared first so invalidations raised while painting are not lost.
        self.shared.needs_refresh.store(false, Ordering::Relaxed);
        let theme = self.theme();
        let title = self.title();
        let show_memory_usage = self.is_showing_memory_usage();

        let mut screen = self.screen.borrow_mut();
        if screen.is_resize_pending() {
            screen.refresh()?;
        }
        let size = screen.size();
        let layouts = self.stack.borrow_mut().visible_layouts(size);
        let active = self.active_window();

        {
            let mut graphics = TextGraphics::new(&mut **screen, theme);
            graphics.apply_theme(ThemeCategory::ScreenBackground);
            graphics.fill(' ');
            graphics.draw_string(TITLE_POSITION.column, TITLE_POSITION.row, &title);

            if show_memory_usage {
                if let Some(usage) = memory::current_usage() {
                    let label = usage.label();
                    let column = size.columns as i32 - UnicodeWidthStr::width(label.as_str()) as i32 - 1;
                    graphics.draw_string(column, size.rows as i32 - 1, &label);
                }
            }

            for (window, layout) in layouts {
                let clipped = graphics.sub_area(layout.top_left, layout.size).size();
                graphics.apply_theme(ThemeCategory::Shadow);
                graphics.fill_rectangle(
                    ' ',
                    layout.top_left.offset(SHADOW_OFFSET.0, SHADOW_OFFSET.1),
                    clipped,
                );

                let mut area = graphics.sub_area(layout.top_left, layout.size);
                area.apply_theme(ThemeCategory::DialogArea);
                window.paint(&mut area);
            }
        }

        let cursor = active
            .and_then(|window| window.hotspot())
            .unwrap_or_else(|| {
                TerminalPosition::new(size.columns as i32 - 1, size.rows as i32 - 1)
            });
        screen.set_cursor_position(Some(cursor));
        screen.refresh()?;
        Ok(())
    }

    /// Read one key and hand it to the active window. Returns whether a key arrived.
    pub fn process_input(&self) -> Result<bool, GuiError> {
        let key = self.screen.borrow_mut().read_input()?;
        let Some(key) = key else {
            return Ok(false);
        };
        if let Some(window) = self.active_window() {
            window.on_key_pressed(&key, self);
        }
        self.invalidate();
        Ok(true)
    }

    /// Run queued tasks; returns how many ran.
    pub fn run_pending_tasks(&self) -> usize {
        self.shared.tasks.run_batch()
    }

    fn should_stop(&self, phase: Phase, error: &GuiError) -> bool {
        let mut handler = self.exception_handler.borrow_mut();
        should_stop(handler.as_mut(), phase, error)
    }

    fn run_event_loop(&self) -> Result<(), GuiError> {
        let entry_len = self.window_count();
        if entry_len == 0 {
            return Ok(());
        }

        loop {
            if self.window_count() < entry_len {
                // The window this loop was started for has been closed.
                return Ok(());
            }

            self.run_pending_tasks();

            let repainted = match catch_phase(|| self.update()) {
                Ok(repainted) => repainted,
                Err(err) => {
                    if self.should_stop(Phase::Update, &err) {
                        return Err(err);
                    }
                    false
                }
            };

            match catch_phase(|| self.process_input()) {
                Ok(true) => {}
                Ok(false) => {
                    if !repainted {
                        thread::sleep(self.idle_sleep);
                    }
                }
                Err(err) => {
                    if self.should_stop(Phase::Input, &err) {
                        return Err(err);
                    }
                }
            }
        }
    }
}

impl TextGui for GuiScreen {
    fn process_input(&mut self) -> Result<bool, GuiError> {
        GuiScreen::process_input(self)
    }

    fn update_screen(&mut self) -> Result<(), GuiError> {
        self.repaint()
    }

    fn is_pending_update(&self) -> bool {
        self.needs_refresh() || self.screen.borrow().is_resize_pending()
    }

    fn run_pending_tasks(&mut self) -> usize {
        GuiScreen::run_pending_tasks(self)
    }
}

impl std::fmt::Debug for GuiScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuiScreen")
            .field("windows", &self.window_count())
            .field("needs_refresh", &self.needs_refresh())
            .finish_non_exhaustive()
    }
}
