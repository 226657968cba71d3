//! Cell-grid coordinates and sizes.

use std::fmt;

/// A cell coordinate on the display surface.
///
/// Signed so layout can produce off-screen coordinates that are clamped later.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct TerminalPosition {
    pub column: i32,
    pub row: i32,
}

impl TerminalPosition {
    pub const TOP_LEFT: Self = Self { column: 0, row: 0 };

    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    #[must_use]
    pub const fn offset(self, columns: i32, rows: i32) -> Self {
        Self {
            column: self.column + columns,
            row: self.row + rows,
        }
    }

    /// Clamp negative coordinates to zero.
    #[must_use]
    pub fn clamp_to_origin(self) -> Self {
        Self {
            column: self.column.max(0),
            row: self.row.max(0),
        }
    }
}

impl fmt::Display for TerminalPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// A size in cells.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct TerminalSize {
    pub columns: usize,
    pub rows: usize,
}

impl TerminalSize {
    pub const fn new(columns: usize, rows: usize) -> Self {
        Self { columns, rows }
    }

    pub const fn is_empty(self) -> bool {
        self.columns == 0 || self.rows == 0
    }

    /// Whether `position` falls inside a region of this size anchored at the origin.
    pub fn contains(self, position: TerminalPosition) -> bool {
        position.column >= 0
            && position.row >= 0
            && (position.column as usize) < self.columns
            && (position.row as usize) < self.rows
    }
}

impl fmt::Display for TerminalSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::{TerminalPosition, TerminalSize};

    #[test]
    fn clamp_to_origin_only_touches_negative_axes() {
        assert_eq!(
            TerminalPosition::new(-3, 4).clamp_to_origin(),
            TerminalPosition::new(0, 4)
        );
        assert_eq!(
            TerminalPosition::new(5, -1).clamp_to_origin(),
            TerminalPosition::new(5, 0)
        );
    }

    #[test]
    fn contains_rejects_out_of_range_cells() {
        let size = TerminalSize::new(10, 2);
        assert!(size.contains(TerminalPosition::new(9, 1)));
        assert!(!size.contains(TerminalPosition::new(10, 1)));
        assert!(!size.contains(TerminalPosition::new(0, -1)));
    }
}
