//! Window placement policy and per-repaint layout resolution.

use std::rc::Rc;

use crate::core::geometry::{TerminalPosition, TerminalSize};
use crate::core::window::Window;

/// Top-left corner used when no cascade applies.
pub const DEFAULT_TOP_LEFT: TerminalPosition = TerminalPosition::new(2, 1);
/// Offset between a window and the next overlapping one.
pub const CASCADE_STEP: (i32, i32) = (2, 1);
/// Offset of a window's drop shadow from its top-left corner.
pub const SHADOW_OFFSET: (i32, i32) = (2, 1);

/// Where to put a window when it is shown.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Position {
    /// Cascade down-right from the previous window.
    #[default]
    Overlapping,
    /// Start a new cascade from the top-left corner.
    NewCornerWindow,
    /// Centered; re-resolved on every repaint so it follows screen resizes.
    Center,
}

/// Resolved geometry of one window for one repaint.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WindowLayout {
    pub top_left: TerminalPosition,
    pub size: TerminalSize,
}

/// Inputs to [`resolve_layout`] that come from the window itself.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SizeHints {
    pub preferred: TerminalSize,
    pub maximize_horizontally: bool,
    pub maximize_vertically: bool,
}

impl SizeHints {
    pub fn of(window: &dyn Window) -> Self {
        Self {
            preferred: window.preferred_size(),
            maximize_horizontally: window.maximizes_horizontally(),
            maximize_vertically: window.maximizes_vertically(),
        }
    }
}

/// Initial top-left for a window pushed above `previous`.
pub fn initial_top_left(policy: Position, previous: Option<&WindowPlacement>) -> TerminalPosition {
    match (policy, previous) {
        (Position::Overlapping, Some(previous)) if previous.policy != Position::Center => {
            previous.top_left.offset(CASCADE_STEP.0, CASCADE_STEP.1)
        }
        // Center is resolved at repaint time; its stored corner is only a placeholder.
        (Position::Overlapping | Position::NewCornerWindow | Position::Center, _) => DEFAULT_TOP_LEFT,
    }
}

/// Resolve the top-left and clamped size of a window on a screen of `screen` cells.
///
/// Order matters: the available space is measured from the unclamped corner,
/// and only then are negative coordinates pulled back to zero.
pub fn resolve_layout(
    policy: Position,
    top_left: TerminalPosition,
    hints: SizeHints,
    screen: TerminalSize,
) -> WindowLayout {
    let screen_columns = screen.columns as i64;
    let screen_rows = screen.rows as i64;
    let preferred_columns = hints.preferred.columns as i64;
    let preferred_rows = hints.preferred.rows as i64;

    let mut column = top_left.column as i64;
    let mut row = top_left.row as i64;
    if policy == Position::Center {
        column = if hints.maximize_horizontally {
            DEFAULT_TOP_LEFT.column as i64
        } else {
            screen_columns / 2 - preferred_columns / 2
        };
        row = if hints.maximize_vertically {
            DEFAULT_TOP_LEFT.row as i64
        } else {
            screen_rows / 2 - preferred_rows / 2
        };
    }

    let max_columns = screen_columns - column - 1;
    let max_rows = screen_rows - row - 1;

    let columns = if preferred_columns > max_columns || hints.maximize_horizontally {
        max_columns
    } else {
        preferred_columns
    };
    let rows = if preferred_rows > max_rows || hints.maximize_vertically {
        max_rows
    } else {
        preferred_rows
    };

    WindowLayout {
        top_left: TerminalPosition::new(column.max(0) as i32, row.max(0) as i32),
        size: TerminalSize::new(columns.max(0) as usize, rows.max(0) as usize),
    }
}

/// One shown window and where it sits.
pub struct WindowPlacement {
    window: Rc<dyn Window>,
    policy: Position,
    top_left: TerminalPosition,
}

impl WindowPlacement {
    pub fn new(window: Rc<dyn Window>, policy: Position, top_left: TerminalPosition) -> Self {
        Self {
            window,
            policy,
            top_left,
        }
    }

    pub fn window(&self) -> &Rc<dyn Window> {
        &self.window
    }

    pub fn policy(&self) -> Position {
        self.policy
    }

    pub fn top_left(&self) -> TerminalPosition {
        self.top_left
    }

    /// Whether this placement holds `window` (pointer identity).
    pub fn holds(&self, window: &Rc<dyn Window>) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.window) as *const (),
            Rc::as_ptr(window) as *const (),
        )
    }

    /// Resolve layout for this repaint and store the resulting corner.
    pub fn resolve(&mut self, screen: TerminalSize) -> WindowLayout {
        let layout = resolve_layout(
            self.policy,
            self.top_left,
            SizeHints::of(self.window.as_ref()),
            screen,
        );
        self.top_left = layout.top_left;
        layout
    }
}

impl std::fmt::Debug for WindowPlacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowPlacement")
            .field("policy", &self.policy)
            .field("top_left", &self.top_left)
            .finish_non_exhaustive()
    }
}
