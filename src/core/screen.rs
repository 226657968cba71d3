//! Display surface trait and lifecycle helpers.

use std::io;

use crate::core::error::GuiError;
use crate::core::geometry::{TerminalPosition, TerminalSize};
use crate::core::input::Key;
use crate::core::theme::Style;

/// Character-cell display surface the window manager paints onto.
///
/// Implementations buffer cell writes and publish them on [`Screen::refresh`].
pub trait Screen {
    /// Prepare the surface (raw mode, alternate buffer, ...).
    fn start(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Restore the terminal.
    fn stop(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Current size in cells.
    fn size(&self) -> TerminalSize;

    /// Whether the terminal changed size since the last refresh.
    fn is_resize_pending(&self) -> bool;

    /// Flush buffered cells; also acknowledges a pending resize.
    fn refresh(&mut self) -> io::Result<()>;

    /// Write one cell into the back buffer. Out-of-range positions are ignored.
    fn set_character(&mut self, position: TerminalPosition, character: char, style: Style);

    /// Place the hardware cursor, or hide it with `None`.
    fn set_cursor_position(&mut self, position: Option<TerminalPosition>);

    /// Read one key.
    ///
    /// May block, but should return `Ok(None)` after a short bounded wait so the
    /// event loop stays responsive. A closed stream is reported as
    /// [`GuiError::EndOfInput`].
    fn read_input(&mut self) -> Result<Option<Key>, GuiError>;
}

impl<S: Screen + ?Sized> Screen for Box<S> {
    fn start(&mut self) -> io::Result<()> {
        (**self).start()
    }

    fn stop(&mut self) -> io::Result<()> {
        (**self).stop()
    }

    fn size(&self) -> TerminalSize {
        (**self).size()
    }

    fn is_resize_pending(&self) -> bool {
        (**self).is_resize_pending()
    }

    fn refresh(&mut self) -> io::Result<()> {
        (**self).refresh()
    }

    fn set_character(&mut self, position: TerminalPosition, character: char, style: Style) {
        (**self).set_character(position, character, style)
    }

    fn set_cursor_position(&mut self, position: Option<TerminalPosition>) {
        (**self).set_cursor_position(position)
    }

    fn read_input(&mut self) -> Result<Option<Key>, GuiError> {
        (**self).read_input()
    }
}

/// RAII guard that stops the screen on drop.
pub struct ScreenGuard<S: Screen> {
    screen: Option<S>,
}

impl<S: Screen> ScreenGuard<S> {
    /// Start `screen` and wrap it.
    pub fn start(mut screen: S) -> io::Result<Self> {
        screen.start()?;
        Ok(Self {
            screen: Some(screen),
        })
    }

    pub fn screen_mut(&mut self) -> Option<&mut S> {
        self.screen.as_mut()
    }

    /// Consume the guard without stopping the screen.
    pub fn into_inner(mut self) -> Option<S> {
        self.screen.take()
    }
}

impl<S: Screen> Drop for ScreenGuard<S> {
    fn drop(&mut self) {
        if let Some(screen) = self.screen.as_mut() {
            if let Err(err) = screen.stop() {
                tracing::warn!(error = %err, "failed to stop screen");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Screen, ScreenGuard};
    use crate::core::error::GuiError;
    use crate::core::geometry::{TerminalPosition, TerminalSize};
    use crate::core::input::Key;
    use crate::core::theme::Style;
    use std::cell::Cell;
    use std::io;
    use std::rc::Rc;

    #[derive(Default)]
    struct Lifecycle {
        starts: Rc<Cell<usize>>,
        stops: Rc<Cell<usize>>,
    }

    impl Screen for Lifecycle {
        fn start(&mut self) -> io::Result<()> {
            self.starts.set(self.starts.get() + 1);
            Ok(())
        }

        fn stop(&mut self) -> io::Result<()> {
            self.stops.set(self.stops.get() + 1);
            Ok(())
        }

        fn size(&self) -> TerminalSize {
            TerminalSize::new(1, 1)
        }

        fn is_resize_pending(&self) -> bool {
            false
        }

        fn refresh(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn set_character(&mut self, _position: TerminalPosition, _character: char, _style: Style) {}

        fn set_cursor_position(&mut self, _position: Option<TerminalPosition>) {}

        fn read_input(&mut self) -> Result<Option<Key>, GuiError> {
            Ok(None)
        }
    }

    #[test]
    fn guard_stops_the_screen_on_drop() {
        let screen = Lifecycle::default();
        let (starts, stops) = (Rc::clone(&screen.starts), Rc::clone(&screen.stops));

        let mut guard = ScreenGuard::start(screen).expect("start");
        assert_eq!(starts.get(), 1);
        assert!(guard.screen_mut().is_some());
        drop(guard);
        assert_eq!(stops.get(), 1);
    }

    #[test]
    fn into_inner_releases_without_stopping() {
        let screen = Lifecycle::default();
        let stops = Rc::clone(&screen.stops);
        let guard = ScreenGuard::start(Box::new(screen) as Box<dyn Screen>).expect("start");
        let screen = guard.into_inner();
        assert!(screen.is_some());
        assert_eq!(stops.get(), 0);
    }
}
