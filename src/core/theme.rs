//! Theme handle applied when painting.
//!
//! The window manager only looks styles up by category; what a style means on
//! screen is up to the [`Screen`](crate::core::screen::Screen) backend.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Color {
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Style {
    pub foreground: Color,
    pub background: Color,
    pub bold: bool,
}

impl Style {
    pub const fn new(foreground: Color, background: Color) -> Self {
        Self {
            foreground,
            background,
            bold: false,
        }
    }

    #[must_use]
    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Style slots a theme provides.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ThemeCategory {
    ScreenBackground,
    Shadow,
    DialogArea,
    Border,
    RaisedBorder,
    ButtonActive,
    ButtonInactive,
    TextBox,
    TextBoxFocused,
}

pub trait Theme: fmt::Debug + Send + Sync {
    fn definition(&self, category: ThemeCategory) -> Style;
}

/// Shared handle to a theme.
pub type ThemeHandle = Arc<dyn Theme>;

/// Table-backed theme; categories without an entry fall back to `fallback`.
#[derive(Clone, Debug)]
pub struct DefaultTheme {
    styles: HashMap<ThemeCategory, Style>,
    fallback: Style,
}

impl DefaultTheme {
    pub fn empty(fallback: Style) -> Self {
        Self {
            styles: HashMap::new(),
            fallback,
        }
    }

    #[must_use]
    pub fn with(mut self, category: ThemeCategory, style: Style) -> Self {
        self.styles.insert(category, style);
        self
    }
}

impl Default for DefaultTheme {
    fn default() -> Self {
        Self::empty(Style::new(Color::Black, Color::White))
            .with(
                ThemeCategory::ScreenBackground,
                Style::new(Color::Cyan, Color::Blue).bold(),
            )
            .with(ThemeCategory::Shadow, Style::new(Color::Black, Color::Black))
            .with(ThemeCategory::DialogArea, Style::new(Color::Black, Color::White))
            .with(ThemeCategory::Border, Style::new(Color::Black, Color::White))
            .with(
                ThemeCategory::RaisedBorder,
                Style::new(Color::White, Color::White).bold(),
            )
            .with(
                ThemeCategory::ButtonActive,
                Style::new(Color::Yellow, Color::Blue).bold(),
            )
            .with(
                ThemeCategory::ButtonInactive,
                Style::new(Color::Black, Color::White),
            )
            .with(ThemeCategory::TextBox, Style::new(Color::White, Color::Blue))
            .with(
                ThemeCategory::TextBoxFocused,
                Style::new(Color::Yellow, Color::Blue).bold(),
            )
    }
}

impl Theme for DefaultTheme {
    fn definition(&self, category: ThemeCategory) -> Style {
        self.styles.get(&category).copied().unwrap_or(self.fallback)
    }
}

static DEFAULT_THEME: Lazy<ThemeHandle> = Lazy::new(|| Arc::new(DefaultTheme::default()));

/// Process-wide default theme, shared between GUI instances.
pub fn default_theme() -> ThemeHandle {
    Arc::clone(&DEFAULT_THEME)
}
