//! Window contract and invalidation back-reference.

use std::sync::{Arc, Weak};

use crate::core::geometry::{TerminalPosition, TerminalSize};
use crate::core::input::Key;
use crate::render::graphics::TextGraphics;
use crate::runtime::gui_screen::GuiScreen;

/// Capability the window manager exposes to windows that need a repaint.
pub trait Invalidate: Send + Sync {
    fn on_invalidate(&self);
}

/// Weak back-reference from a window to the GUI that shows it.
///
/// Holding one does not keep the GUI alive; invalidating after the GUI is gone
/// is a no-op.
#[derive(Clone)]
pub struct InvalidationListener {
    target: Weak<dyn Invalidate>,
}

impl InvalidationListener {
    pub fn new<T: Invalidate + 'static>(target: &Arc<T>) -> Self {
        let target: Arc<dyn Invalidate> = Arc::clone(target) as Arc<dyn Invalidate>;
        Self {
            target: Arc::downgrade(&target),
        }
    }

    /// Request a repaint. Returns `false` if the GUI no longer exists.
    pub fn invalidate(&self) -> bool {
        match self.target.upgrade() {
            Some(target) => {
                target.on_invalidate();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for InvalidationListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationListener")
            .field("alive", &(self.target.strong_count() > 0))
            .finish()
    }
}

/// A window shown by [`GuiScreen`].
///
/// All methods take `&self`: handlers may reenter the GUI (for example, show a
/// nested dialog from `on_key_pressed`) while other windows are painted, so
/// implementations keep their mutable state behind `Cell`/`RefCell`.
pub trait Window {
    /// Desired size before the window manager clamps it to the screen.
    fn preferred_size(&self) -> TerminalSize;

    /// Draw the window content; `graphics` is clipped to the window area.
    fn paint(&self, graphics: &mut TextGraphics<'_>);

    /// Handle a key while this window is topmost.
    fn on_key_pressed(&self, _key: &Key, _gui: &GuiScreen) {}

    fn on_visible(&self) {}

    fn on_closed(&self) {}

    fn maximizes_horizontally(&self) -> bool {
        false
    }

    fn maximizes_vertically(&self) -> bool {
        false
    }

    /// Solo windows hide every window below them in the stack.
    fn is_solo_window(&self) -> bool {
        false
    }

    /// Absolute screen position for the hardware cursor while this window is active.
    fn hotspot(&self) -> Option<TerminalPosition> {
        None
    }

    /// Called once when the window is pushed; keep the listener to request repaints.
    fn add_invalidation_listener(&self, _listener: InvalidationListener) {}
}

#[cfg(test)]
mod tests {
    use super::{Invalidate, InvalidationListener};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl Invalidate for Counter {
        fn on_invalidate(&self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn listener_forwards_until_target_dropped() {
        let counter = Arc::new(Counter::default());
        let listener = InvalidationListener::new(&counter);
        assert!(listener.invalidate());
        assert!(listener.clone().invalidate());
        assert_eq!(counter.0.load(Ordering::Relaxed), 2);

        drop(counter);
        assert!(!listener.invalidate());
    }
}
