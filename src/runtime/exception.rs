//! Pluggable supervision of the fallible event-loop phases.

use std::io;
use std::panic::{self, AssertUnwindSafe};

use crate::core::error::GuiError;

/// Decides whether the event loop stops after a failure.
///
/// Return `true` to stop the loop. End of input never reaches the handler: it
/// always stops the loop.
pub trait ExceptionHandler: Send {
    fn on_io_error(&mut self, error: &io::Error) -> bool;

    fn on_internal_error(&mut self, error: &GuiError) -> bool;
}

/// Logs the failure and stops the loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultExceptionHandler;

impl ExceptionHandler for DefaultExceptionHandler {
    fn on_io_error(&mut self, error: &io::Error) -> bool {
        tracing::error!(error = %error, "terminal I/O failed; stopping GUI loop");
        true
    }

    fn on_internal_error(&mut self, error: &GuiError) -> bool {
        tracing::error!(error = %error, "GUI callback failed; stopping GUI loop");
        true
    }
}

/// Supervised phase of one loop iteration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Input,
    Update,
}

/// Run `f`, turning a panic into [`GuiError::Panicked`].
pub fn catch_phase<T>(f: impl FnOnce() -> Result<T, GuiError>) -> Result<T, GuiError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(GuiError::from_panic(payload)),
    }
}

/// Whether the loop must stop after `error` occurred in `phase`.
pub fn should_stop(handler: &mut dyn ExceptionHandler, phase: Phase, error: &GuiError) -> bool {
    if error.is_end_of_input() {
        tracing::debug!(?phase, "input closed; stopping GUI loop");
        return true;
    }
    let stop = match error {
        GuiError::Io(io_error) => handler.on_io_error(io_error),
        other => handler.on_internal_error(other),
    };
    if !stop {
        tracing::warn!(?phase, error = %error, "GUI loop continuing after failure");
    }
    stop
}

#[cfg(test)]
mod tests {
    use super::{catch_phase, should_stop, ExceptionHandler, Phase};
    use crate::core::error::GuiError;
    use std::io;

    #[derive(Default)]
    struct Recording {
        io_calls: usize,
        internal_calls: usize,
        stop: bool,
    }

    impl ExceptionHandler for Recording {
        fn on_io_error(&mut self, _error: &io::Error) -> bool {
            self.io_calls += 1;
            self.stop
        }

        fn on_internal_error(&mut self, _error: &GuiError) -> bool {
            self.internal_calls += 1;
            self.stop
        }
    }

    #[test]
    fn end_of_input_bypasses_handler() {
        let mut handler = Recording::default();
        assert!(should_stop(&mut handler, Phase::Input, &GuiError::EndOfInput));
        let eof = GuiError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert!(should_stop(&mut handler, Phase::Input, &eof));
        assert_eq!(handler.io_calls + handler.internal_calls, 0);
    }

    #[test]
    fn handler_decides_for_other_failures() {
        let mut handler = Recording::default();
        let io_error = GuiError::Io(io::Error::other("broken pipe"));
        assert!(!should_stop(&mut handler, Phase::Update, &io_error));
        assert!(!should_stop(
            &mut handler,
            Phase::Input,
            &GuiError::Panicked("boom".to_string())
        ));
        assert_eq!(handler.io_calls, 1);
        assert_eq!(handler.internal_calls, 1);

        handler.stop = true;
        assert!(should_stop(&mut handler, Phase::Update, &io_error));
    }

    #[test]
    fn catch_phase_converts_panics() {
        let result: Result<(), GuiError> = catch_phase(|| panic!("window exploded"));
        assert!(matches!(result, Err(GuiError::Panicked(ref m)) if m == "window exploded"));
        assert_eq!(catch_phase(|| Ok::<_, GuiError>(7)).ok(), Some(7));
    }
}
