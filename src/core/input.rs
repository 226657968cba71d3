//! Key events and legacy ANSI key decoding.

use std::collections::VecDeque;
use std::fmt;

/// Logical key identity, independent of modifiers.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KeyKind {
    Character(char),
    Escape,
    Backspace,
    Enter,
    Tab,
    ReverseTab,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

/// A single key press delivered to the active window.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Key {
    pub kind: KeyKind,
    pub ctrl: bool,
    pub alt: bool,
}

impl Key {
    pub const fn new(kind: KeyKind) -> Self {
        Self {
            kind,
            ctrl: false,
            alt: false,
        }
    }

    pub const fn character(ch: char) -> Self {
        Self::new(KeyKind::Character(ch))
    }

    #[must_use]
    pub const fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    #[must_use]
    pub const fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn is_character(&self, ch: char) -> bool {
        self.kind == KeyKind::Character(ch) && !self.ctrl && !self.alt
    }
}

impl From<KeyKind> for Key {
    fn from(kind: KeyKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.alt {
            f.write_str("alt+")?;
        }
        match self.kind {
            KeyKind::Character(' ') => f.write_str("space"),
            KeyKind::Character(ch) => write!(f, "{ch}"),
            KeyKind::Escape => f.write_str("escape"),
            KeyKind::Backspace => f.write_str("backspace"),
            KeyKind::Enter => f.write_str("enter"),
            KeyKind::Tab => f.write_str("tab"),
            KeyKind::ReverseTab => f.write_str("shift+tab"),
            KeyKind::ArrowUp => f.write_str("up"),
            KeyKind::ArrowDown => f.write_str("down"),
            KeyKind::ArrowLeft => f.write_str("left"),
            KeyKind::ArrowRight => f.write_str("right"),
            KeyKind::Insert => f.write_str("insert"),
            KeyKind::Delete => f.write_str("delete"),
            KeyKind::Home => f.write_str("home"),
            KeyKind::End => f.write_str("end"),
            KeyKind::PageUp => f.write_str("pageUp"),
            KeyKind::PageDown => f.write_str("pageDown"),
            KeyKind::F(n) => write!(f, "f{n}"),
        }
    }
}

/// Decode one complete input sequence into a key.
pub fn parse_key(data: &str) -> Option<Key> {
    if let Some(kind) = legacy_sequence_key(data) {
        return Some(Key::new(kind));
    }

    let mut chars = data.chars();
    let first = chars.next()?;
    let rest = chars.as_str();

    if first == '\x1b' {
        if rest.is_empty() {
            return Some(Key::new(KeyKind::Escape));
        }
        // ESC prefix on a plain key is the legacy alt modifier.
        return parse_key(rest).map(Key::with_alt);
    }

    if !rest.is_empty() {
        return None;
    }

    let key = match first {
        '\r' | '\n' => Key::new(KeyKind::Enter),
        '\t' => Key::new(KeyKind::Tab),
        '\x7f' | '\x08' => Key::new(KeyKind::Backspace),
        '\x00' => Key::character(' ').with_ctrl(),
        ch @ '\x01'..='\x1a' => {
            Key::character(char::from(b'a' + (ch as u8 - 1))).with_ctrl()
        }
        ch if ch.is_control() => return None,
        ch => Key::character(ch),
    };
    Some(key)
}

fn legacy_sequence_key(data: &str) -> Option<KeyKind> {
    match data {
        "\x1b[A" | "\x1bOA" => Some(KeyKind::ArrowUp),
        "\x1b[B" | "\x1bOB" => Some(KeyKind::ArrowDown),
        "\x1b[C" | "\x1bOC" => Some(KeyKind::ArrowRight),
        "\x1b[D" | "\x1bOD" => Some(KeyKind::ArrowLeft),
        "\x1b[H" | "\x1bOH" | "\x1b[1~" | "\x1b[7~" => Some(KeyKind::Home),
        "\x1b[F" | "\x1bOF" | "\x1b[4~" | "\x1b[8~" => Some(KeyKind::End),
        "\x1b[2~" => Some(KeyKind::Insert),
        "\x1b[3~" => Some(KeyKind::Delete),
        "\x1b[5~" | "\x1b[[5~" => Some(KeyKind::PageUp),
        "\x1b[6~" | "\x1b[[6~" => Some(KeyKind::PageDown),
        "\x1b[Z" => Some(KeyKind::ReverseTab),
        "\x1bOP" | "\x1b[11~" | "\x1b[[A" => Some(KeyKind::F(1)),
        "\x1bOQ" | "\x1b[12~" | "\x1b[[B" => Some(KeyKind::F(2)),
        "\x1bOR" | "\x1b[13~" | "\x1b[[C" => Some(KeyKind::F(3)),
        "\x1bOS" | "\x1b[14~" | "\x1b[[D" => Some(KeyKind::F(4)),
        "\x1b[15~" | "\x1b[[E" => Some(KeyKind::F(5)),
        "\x1b[17~" => Some(KeyKind::F(6)),
        "\x1b[18~" => Some(KeyKind::F(7)),
        "\x1b[19~" => Some(KeyKind::F(8)),
        "\x1b[20~" => Some(KeyKind::F(9)),
        "\x1b[21~" => Some(KeyKind::F(10)),
        "\x1b[23~" => Some(KeyKind::F(11)),
        "\x1b[24~" => Some(KeyKind::F(12)),
        _ => None,
    }
}

/// Splits a raw input stream into key sequences.
///
/// Bytes are accumulated until they form complete UTF-8 characters; escape
/// sequences are cut at their final byte. A lone ESC is held until
/// [`KeyDecoder::flush_pending`] is called, which the reader does when the
/// input goes idle.
#[derive(Debug, Default)]
pub struct KeyDecoder {
    pending: Vec<u8>,
    keys: VecDeque<Key>,
}

impl KeyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        self.split_pending(false);
    }

    /// Treat any held partial sequence as complete.
    pub fn flush_pending(&mut self) {
        self.split_pending(true);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn next_key(&mut self) -> Option<Key> {
        self.keys.pop_front()
    }

    fn split_pending(&mut self, force: bool) {
        loop {
            let checked = std::str::from_utf8(&self.pending)
                .map(str::len)
                .map_err(|err| (err.valid_up_to(), err.error_len()));
            let valid = match checked {
                Ok(len) => len,
                Err((0, Some(_))) => {
                    // Invalid leading byte: drop it so the stream keeps moving.
                    self.pending.remove(0);
                    continue;
                }
                Err((valid, _)) => valid,
            };
            if valid == 0 {
                if force {
                    // A truncated UTF-8 tail will never complete.
                    self.pending.clear();
                }
                return;
            }
            let text = std::str::from_utf8(&self.pending[..valid]).unwrap_or_default();

            let Some(len) = sequence_len(text, force) else {
                return;
            };
            let sequence = text[..len].to_string();
            self.pending.drain(..len);
            if let Some(key) = parse_key(&sequence) {
                self.keys.push_back(key);
            }
        }
    }
}

/// Length in bytes of the first complete sequence in `text`, or `None` if it
/// is still incomplete.
fn sequence_len(text: &str, force: bool) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes[0] != 0x1b {
        return text.chars().next().map(char::len_utf8);
    }
    if bytes.len() == 1 {
        return force.then_some(1);
    }
    match bytes[1] {
        b'[' => {
            // CSI: parameters then a final byte in 0x40..=0x7e. `ESC [ [ X` is the
            // linux console function-key form.
            if bytes.len() >= 3 && bytes[2] == b'[' {
                return if bytes.len() >= 4 {
                    Some(4)
                } else {
                    force.then_some(bytes.len())
                };
            }
            for (index, byte) in bytes.iter().enumerate().skip(2) {
                if (0x40..=0x7e).contains(byte) {
                    return Some(index + 1);
                }
            }
            force.then_some(bytes.len())
        }
        b'O' => {
            if bytes.len() >= 3 {
                Some(3)
            } else {
                force.then_some(bytes.len())
            }
        }
        0x1b => Some(1),
        _ => {
            let next = text[1..].chars().next().map_or(0, char::len_utf8);
            Some(1 + next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_key, Key, KeyDecoder, KeyKind};

    #[test]
    fn parses_printable_and_control_keys() {
        assert_eq!(parse_key("a"), Some(Key::character('a')));
        assert_eq!(parse_key("\r"), Some(Key::new(KeyKind::Enter)));
        assert_eq!(parse_key("\x03"), Some(Key::character('c').with_ctrl()));
        assert_eq!(parse_key("\x1b"), Some(Key::new(KeyKind::Escape)));
        assert_eq!(parse_key("\x1bx"), Some(Key::character('x').with_alt()));
    }

    #[test]
    fn parses_legacy_escape_sequences() {
        assert_eq!(parse_key("\x1b[A"), Some(Key::new(KeyKind::ArrowUp)));
        assert_eq!(parse_key("\x1bOP"), Some(Key::new(KeyKind::F(1))));
        assert_eq!(parse_key("\x1b[6~"), Some(Key::new(KeyKind::PageDown)));
        assert_eq!(parse_key("\x1b[Z"), Some(Key::new(KeyKind::ReverseTab)));
    }

    #[test]
    fn decoder_splits_mixed_stream() {
        let mut decoder = KeyDecoder::new();
        decoder.push_bytes(b"q\x1b[Bz");
        assert_eq!(decoder.next_key(), Some(Key::character('q')));
        assert_eq!(decoder.next_key(), Some(Key::new(KeyKind::ArrowDown)));
        assert_eq!(decoder.next_key(), Some(Key::character('z')));
        assert_eq!(decoder.next_key(), None);
    }

    #[test]
    fn decoder_holds_partial_sequences_until_complete() {
        let mut decoder = KeyDecoder::new();
        decoder.push_bytes(b"\x1b[");
        assert_eq!(decoder.next_key(), None);
        assert!(decoder.has_pending());
        decoder.push_bytes(b"C");
        assert_eq!(decoder.next_key(), Some(Key::new(KeyKind::ArrowRight)));
    }

    #[test]
    fn lone_escape_is_emitted_on_flush() {
        let mut decoder = KeyDecoder::new();
        decoder.push_bytes(b"\x1b");
        assert_eq!(decoder.next_key(), None);
        decoder.flush_pending();
        assert_eq!(decoder.next_key(), Some(Key::new(KeyKind::Escape)));
    }

    #[test]
    fn decoder_reassembles_split_utf8() {
        let mut decoder = KeyDecoder::new();
        let bytes = "é".as_bytes();
        decoder.push_bytes(&bytes[..1]);
        assert_eq!(decoder.next_key(), None);
        decoder.push_bytes(&bytes[1..]);
        assert_eq!(decoder.next_key(), Some(Key::character('é')));
    }
}
