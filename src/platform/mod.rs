//! Platform-specific terminal integrations.

#[cfg(unix)]
pub mod ansi_screen;

#[cfg(unix)]
pub use ansi_screen::AnsiScreen;
