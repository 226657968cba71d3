//! Clipped drawing region over a [`Screen`].
//!
//! Coordinates passed to a [`TextGraphics`] are relative to its own top-left
//! corner; anything outside its area is silently dropped.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::core::geometry::{TerminalPosition, TerminalSize};
use crate::core::screen::Screen;
use crate::core::theme::{Style, Theme, ThemeCategory, ThemeHandle};

pub struct TextGraphics<'a> {
    screen: &'a mut (dyn Screen + 'static),
    theme: ThemeHandle,
    origin: TerminalPosition,
    size: TerminalSize,
    style: Style,
}

impl<'a> TextGraphics<'a> {
    /// Graphics covering the whole screen.
    pub fn new(screen: &'a mut (dyn Screen + 'static), theme: ThemeHandle) -> Self {
        let size = screen.size();
        Self {
            screen,
            theme,
            origin: TerminalPosition::TOP_LEFT,
            size,
            style: Style::default(),
        }
    }

    pub fn size(&self) -> TerminalSize {
        self.size
    }

    pub fn width(&self) -> usize {
        self.size.columns
    }

    pub fn height(&self) -> usize {
        self.size.rows
    }

    /// Absolute screen position of this region's top-left cell.
    pub fn origin(&self) -> TerminalPosition {
        self.origin
    }

    pub fn theme(&self) -> &ThemeHandle {
        &self.theme
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn set_style(&mut self, style: Style) {
        self.style = style;
    }

    /// Use the theme's style for `category` for subsequent drawing.
    pub fn apply_theme(&mut self, category: ThemeCategory) {
        self.style = self.theme.definition(category);
    }

    /// Translate a region-relative position to absolute screen coordinates.
    pub fn to_screen(&self, position: TerminalPosition) -> TerminalPosition {
        position.offset(self.origin.column, self.origin.row)
    }

    pub fn set_character(&mut self, column: i32, row: i32, character: char) {
        let position = TerminalPosition::new(column, row);
        if !self.size.contains(position) {
            return;
        }
        let absolute = self.to_screen(position);
        self.screen.set_character(absolute, character, self.style);
    }

    /// Draw `text` starting at (`column`, `row`), clipped to the region.
    ///
    /// Returns the number of columns the text occupies (including clipped ones).
    pub fn draw_string(&mut self, column: i32, row: i32, text: &str) -> usize {
        let mut cursor = column;
        let mut total = 0;
        for grapheme in text.graphemes(true) {
            let width = UnicodeWidthStr::width(grapheme);
            if width == 0 {
                continue;
            }
            let Some(first) = grapheme.chars().next() else {
                continue;
            };
            // A wide glyph must fit entirely or it is not drawn.
            let last = TerminalPosition::new(cursor + width as i32 - 1, row);
            if self.size.contains(TerminalPosition::new(cursor, row)) && self.size.contains(last) {
                self.set_character(cursor, row, first);
            }
            cursor += width as i32;
            total += width;
        }
        total
    }

    /// Fill a rectangle (region-relative) with `character`.
    pub fn fill_rectangle(&mut self, character: char, top_left: TerminalPosition, size: TerminalSize) {
        let start_col = top_left.column.max(0);
        let start_row = top_left.row.max(0);
        let end_col = (top_left.column + size.columns as i32).min(self.size.columns as i32);
        let end_row = (top_left.row + size.rows as i32).min(self.size.rows as i32);
        for row in start_row..end_row {
            for column in start_col..end_col {
                self.set_character(column, row, character);
            }
        }
    }

    /// Fill the whole region.
    pub fn fill(&mut self, character: char) {
        self.fill_rectangle(character, TerminalPosition::TOP_LEFT, self.size);
    }

    /// Derive a graphics for a sub-rectangle, intersected with this region.
    ///
    /// The sub-region inherits the current style and theme.
    pub fn sub_area(&mut self, top_left: TerminalPosition, size: TerminalSize) -> TextGraphics<'_> {
        let top_left = top_left.clamp_to_origin();
        let max_columns = self.size.columns.saturating_sub(top_left.column as usize);
        let max_rows = self.size.rows.saturating_sub(top_left.row as usize);
        let origin = self.to_screen(top_left);
        TextGraphics {
            screen: &mut *self.screen,
            theme: ThemeHandle::clone(&self.theme),
            origin,
            size: TerminalSize::new(size.columns.min(max_columns), size.rows.min(max_rows)),
            style: self.style,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TextGraphics;
    use crate::core::error::GuiError;
    use crate::core::geometry::{TerminalPosition, TerminalSize};
    use crate::core::input::Key;
    use crate::core::screen::Screen;
    use crate::core::theme::{default_theme, Style, Theme, ThemeCategory};
    use std::io;

    struct GridScreen {
        size: TerminalSize,
        cells: Vec<char>,
        styles: Vec<Style>,
    }

    impl GridScreen {
        fn new(columns: usize, rows: usize) -> Self {
            Self {
                size: TerminalSize::new(columns, rows),
                cells: vec!['.'; columns * rows],
                styles: vec![Style::default(); columns * rows],
            }
        }

        fn row(&self, row: usize) -> String {
            let start = row * self.size.columns;
            self.cells[start..start + self.size.columns].iter().collect()
        }
    }

    impl Screen for GridScreen {
        fn size(&self) -> TerminalSize {
            self.size
        }

        fn is_resize_pending(&self) -> bool {
            false
        }

        fn refresh(&mut self) -> io::Result<()> {
            Ok(())
        }

        fn set_character(&mut self, position: TerminalPosition, character: char, style: Style) {
            if !self.size.contains(position) {
                return;
            }
            let index = position.row as usize * self.size.columns + position.column as usize;
            self.cells[index] = character;
            self.styles[index] = style;
        }

        fn set_cursor_position(&mut self, _position: Option<TerminalPosition>) {}

        fn read_input(&mut self) -> Result<Option<Key>, GuiError> {
            Ok(None)
        }
    }

    #[test]
    fn draw_string_clips_at_region_edge() {
        let mut screen = GridScreen::new(8, 1);
        {
            let mut graphics = TextGraphics::new(&mut screen, default_theme());
            assert_eq!(graphics.draw_string(5, 0, "hello"), 5);
        }
        assert_eq!(screen.row(0), ".....hel");
    }

    #[test]
    fn sub_area_translates_and_clips() {
        let mut screen = GridScreen::new(6, 3);
        {
            let mut graphics = TextGraphics::new(&mut screen, default_theme());
            let mut sub = graphics.sub_area(TerminalPosition::new(2, 1), TerminalSize::new(10, 10));
            assert_eq!(sub.size(), TerminalSize::new(4, 2));
            sub.fill('#');
            sub.set_character(-1, 0, '!');
        }
        assert_eq!(screen.row(0), "......");
        assert_eq!(screen.row(1), "..####");
        assert_eq!(screen.row(2), "..####");
    }

    #[test]
    fn apply_theme_styles_following_writes() {
        let mut screen = GridScreen::new(2, 1);
        let shadow = default_theme().definition(ThemeCategory::Shadow);
        {
            let mut graphics = TextGraphics::new(&mut screen, default_theme());
            graphics.apply_theme(ThemeCategory::Shadow);
            graphics.set_character(1, 0, ' ');
        }
        assert_eq!(screen.styles[1], shadow);
        assert_eq!(screen.styles[0], Style::default());
    }

    #[test]
    fn wide_glyph_is_not_split_at_edge() {
        let mut screen = GridScreen::new(3, 1);
        {
            let mut graphics = TextGraphics::new(&mut screen, default_theme());
            assert_eq!(graphics.draw_string(1, 0, "a界"), 3);
        }
        assert_eq!(screen.row(0), ".a.");
    }
}
