//! Character-cell window manager for terminals.
//!
//! Invariant: single output gate: only `core::output::OutputGate::flush(..)` writes to the
//! terminal.
//!
//! # Public API Overview
//! - Implement [`Window`] and show it on a [`GuiScreen`]; `show_window` blocks until the
//!   window is closed, and windows stack with a cascading [`Position`] policy.
//! - Reach the GUI from other threads through [`GuiHandle`] (`invoke_later`,
//!   `invoke_and_wait`, `invalidate`).
//! - Drive any [`TextGui`] on a dedicated thread with [`TextGuiThread`].
//! - Paint through [`TextGraphics`] onto any [`Screen`]; [`AnsiScreen`] is the tty backend.

pub mod config;
pub mod logging;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;

/// Configuration and logging.
pub use crate::config::GuiConfig;
pub use crate::logging::init_file_logging;

/// Errors.
pub use crate::core::error::GuiError;

/// Geometry, keys, and themes.
pub use crate::core::geometry::{TerminalPosition, TerminalSize};
pub use crate::core::input::{parse_key, Key, KeyDecoder, KeyKind};
pub use crate::core::theme::{
    default_theme, Color, DefaultTheme, Style, Theme, ThemeCategory, ThemeHandle,
};

/// Display surface and window contracts.
pub use crate::core::screen::{Screen, ScreenGuard};
pub use crate::core::window::{Invalidate, InvalidationListener, Window};
pub use crate::render::TextGraphics;

/// Window manager and event loops.
pub use crate::runtime::exception::{DefaultExceptionHandler, ExceptionHandler};
pub use crate::runtime::{GuiHandle, GuiScreen, Position, Status, TextGui, TextGuiThread};

/// Terminal backend.
#[cfg(unix)]
pub use crate::platform::AnsiScreen;
