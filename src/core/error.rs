use std::io;

use thiserror::Error;

use crate::runtime::gui_thread::Status;

/// Errors surfaced by the window manager and its event loops.
#[derive(Debug, Error)]
pub enum GuiError {
    /// Misuse of the event loop lifecycle (for example starting it twice).
    #[error("cannot {operation} while the GUI thread is {status:?}")]
    IllegalState {
        operation: &'static str,
        status: Status,
    },

    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The input stream is closed; the loop must stop.
    #[error("end of terminal input")]
    EndOfInput,

    /// A window, task, or screen callback panicked inside a supervised phase.
    #[error("GUI callback panicked: {0}")]
    Panicked(String),

    #[error("failed to spawn the GUI thread: {0}")]
    ThreadSpawn(#[source] io::Error),
}

impl GuiError {
    #[must_use]
    pub fn illegal_state(operation: &'static str, status: Status) -> Self {
        Self::IllegalState { operation, status }
    }

    /// Whether this error means no further input will ever arrive.
    pub fn is_end_of_input(&self) -> bool {
        match self {
            Self::EndOfInput => true,
            Self::Io(err) => err.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&'static str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(message)
    }
}
