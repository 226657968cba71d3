//! Typed terminal output commands and a single output gate.
//!
//! Invariant: all terminal writes must flow through `OutputGate::flush(..)`.

use std::fmt::Write as _;
use std::io;

use crate::core::geometry::TerminalPosition;
use crate::core::theme::{Color, Style};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCmd {
    /// Text written at the current cursor position.
    Bytes(String),
    /// Static raw bytes/control sequences.
    BytesStatic(&'static str),

    /// Cursor visibility.
    HideCursor,
    ShowCursor,

    /// Alternate screen buffer.
    AltScreenEnable,
    AltScreenDisable,

    ClearScreen,
    /// Absolute cursor move; the position is zero-based.
    MoveTo(TerminalPosition),
    SetStyle(Style),
    ResetStyle,
}

impl TerminalCmd {
    pub fn bytes(data: impl Into<String>) -> Self {
        Self::Bytes(data.into())
    }

    fn encode_into(&self, out: &mut String) {
        match self {
            TerminalCmd::Bytes(data) => out.push_str(data),
            TerminalCmd::BytesStatic(data) => out.push_str(data),
            TerminalCmd::HideCursor => out.push_str("\x1b[?25l"),
            TerminalCmd::ShowCursor => out.push_str("\x1b[?25h"),
            TerminalCmd::AltScreenEnable => out.push_str("\x1b[?1049h"),
            TerminalCmd::AltScreenDisable => out.push_str("\x1b[?1049l"),
            TerminalCmd::ClearScreen => out.push_str("\x1b[2J"),
            TerminalCmd::MoveTo(position) => {
                let _ = write!(
                    out,
                    "\x1b[{};{}H",
                    position.row.max(0) + 1,
                    position.column.max(0) + 1
                );
            }
            TerminalCmd::SetStyle(style) => {
                out.push_str("\x1b[0");
                if style.bold {
                    out.push_str(";1");
                }
                let _ = write!(
                    out,
                    ";{};{}m",
                    30 + color_index(style.foreground),
                    40 + color_index(style.background)
                );
            }
            TerminalCmd::ResetStyle => out.push_str("\x1b[0m"),
        }
    }
}

/// SGR color offset; 9 selects the terminal default.
fn color_index(color: Color) -> u8 {
    match color {
        Color::Black => 0,
        Color::Red => 1,
        Color::Green => 2,
        Color::Yellow => 3,
        Color::Blue => 4,
        Color::Magenta => 5,
        Color::Cyan => 6,
        Color::White => 7,
        Color::Default => 9,
    }
}

#[derive(Debug, Default)]
pub struct OutputGate {
    cmds: Vec<TerminalCmd>,
}

impl OutputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: TerminalCmd) {
        self.cmds.push(cmd);
    }

    pub fn extend<I>(&mut self, cmds: I)
    where
        I: IntoIterator<Item = TerminalCmd>,
    {
        self.cmds.extend(cmds);
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    /// Drain buffered commands into their escape-sequence encoding.
    pub fn encode(&mut self) -> String {
        let mut out = String::new();
        for cmd in self.cmds.drain(..) {
            cmd.encode_into(&mut out);
        }
        out
    }

    /// Flush buffered commands to the terminal in one write.
    ///
    /// This is the single write gate: nothing else writes to the terminal.
    pub fn flush<W: io::Write>(&mut self, out: &mut W) -> io::Result<()> {
        let data = self.encode();
        if data.is_empty() {
            return Ok(());
        }
        out.write_all(data.as_bytes())?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::{OutputGate, TerminalCmd};
    use crate::core::geometry::TerminalPosition;
    use crate::core::theme::{Color, Style};

    #[test]
    fn commands_encode_in_order() {
        let mut gate = OutputGate::new();
        gate.push(TerminalCmd::MoveTo(TerminalPosition::new(2, 1)));
        gate.push(TerminalCmd::SetStyle(Style::new(Color::White, Color::Blue).bold()));
        gate.push(TerminalCmd::bytes("hi"));
        gate.push(TerminalCmd::ResetStyle);
        assert_eq!(gate.encode(), "\x1b[2;3H\x1b[0;1;37;44mhi\x1b[0m");
        assert!(gate.is_empty());
    }

    #[test]
    fn default_colors_use_sgr_default() {
        let mut gate = OutputGate::new();
        gate.push(TerminalCmd::SetStyle(Style::default()));
        assert_eq!(gate.encode(), "\x1b[0;39;49m");
    }

    #[test]
    fn flush_writes_everything_once() {
        let mut gate = OutputGate::new();
        gate.extend([TerminalCmd::HideCursor, TerminalCmd::ClearScreen]);
        let mut out = Vec::new();
        gate.flush(&mut out).expect("flush to vec");
        assert_eq!(out, b"\x1b[?25l\x1b[2J");

        gate.flush(&mut out).expect("empty flush");
        assert_eq!(out.len(), 10);
    }
}
