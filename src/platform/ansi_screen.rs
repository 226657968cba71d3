//! ANSI tty implementation of [`Screen`].
//!
//! Cells are painted into a back buffer; `refresh` redraws every row that
//! differs from what the terminal shows and flushes it through the output
//! gate in one write. Resizes are flagged by a `SIGWINCH` listener thread and
//! picked up on the next refresh.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::error::GuiError;
use crate::core::geometry::{TerminalPosition, TerminalSize};
use crate::core::input::{Key, KeyDecoder};
use crate::core::output::{OutputGate, TerminalCmd};
use crate::core::screen::Screen;
use crate::core::theme::Style;

use libc::{self, c_int};
use signal_hook::iterator::Signals;

const FALLBACK_SIZE: TerminalSize = TerminalSize::new(80, 24);
/// Upper bound on one `read_input` wait; also the lone-ESC timeout.
const INPUT_POLL: Duration = Duration::from_millis(10);

fn wait_writable(fd: c_int) -> io::Result<()> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };
    loop {
        let result = unsafe { libc::poll(&mut fds, 1, -1) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if result == 0 {
            continue;
        }
        if (fds.revents & libc::POLLOUT) != 0 {
            return Ok(());
        }
        return Err(io::Error::other(format!(
            "poll(POLLOUT) returned revents=0x{:x}",
            fds.revents
        )));
    }
}

fn write_all_fd_with<FWrite, FWait>(
    fd: c_int,
    bytes: &[u8],
    mut write_once: FWrite,
    mut wait_writable: FWait,
) -> io::Result<()>
where
    FWrite: FnMut(c_int, &[u8]) -> io::Result<usize>,
    FWait: FnMut(c_int) -> io::Result<()>,
{
    let mut written = 0;
    while written < bytes.len() {
        match write_once(fd, &bytes[written..]) {
            Ok(0) => {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0"));
            }
            Ok(count) => {
                if count > bytes.len() - written {
                    return Err(io::Error::other("write returned more bytes than requested"));
                }
                written += count;
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => wait_writable(fd)?,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

/// Unbuffered writer over a raw file descriptor.
struct FdWriter(c_int);

impl io::Write for FdWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_all(buf)?;
        Ok(buf.len())
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        write_all_fd_with(
            self.0,
            buf,
            |fd, buf| {
                let result =
                    unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
                if result < 0 {
                    Err(io::Error::last_os_error())
                } else {
                    Ok(result as usize)
                }
            },
            wait_writable,
        )
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn read_winsize(fd: c_int) -> Option<TerminalSize> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some(TerminalSize::new(size.ws_col as usize, size.ws_row as usize))
    } else {
        None
    }
}

/// Wait until `fd` is readable or hung up. An interrupted wait counts as a timeout.
fn poll_readable(fd: c_int, timeout: Duration) -> io::Result<bool> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as i32;
    let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    if result < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    Ok(result > 0 && (fds.revents & (libc::POLLIN | libc::POLLHUP)) != 0)
}

fn get_termios(fd: c_int) -> io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

fn set_termios(fd: c_int, termios: &libc::termios) -> io::Result<()> {
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Cell {
    character: char,
    style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            character: ' ',
            style: Style::default(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct CellBuffer {
    size: TerminalSize,
    cells: Vec<Cell>,
}

impl CellBuffer {
    fn new(size: TerminalSize) -> Self {
        Self {
            size,
            cells: vec![Cell::default(); size.columns * size.rows],
        }
    }

    fn index(&self, position: TerminalPosition) -> Option<usize> {
        self.size
            .contains(position)
            .then(|| position.row as usize * self.size.columns + position.column as usize)
    }

    fn set(&mut self, position: TerminalPosition, cell: Cell) {
        if let Some(index) = self.index(position) {
            self.cells[index] = cell;
        }
    }

    fn row(&self, row: usize) -> &[Cell] {
        let start = row * self.size.columns;
        &self.cells[start..start + self.size.columns]
    }
}

/// Queue commands redrawing every row of `back` that differs from `front`.
///
/// With no `front` (first frame, or after a resize) every row is drawn.
fn render_rows(front: Option<&CellBuffer>, back: &CellBuffer, gate: &mut OutputGate) {
    let front = front.filter(|front| front.size == back.size);
    let mut current_style = None;
    for row in 0..back.size.rows {
        let cells = back.row(row);
        if front.is_some_and(|front| front.row(row) == cells) {
            continue;
        }
        gate.push(TerminalCmd::MoveTo(TerminalPosition::new(0, row as i32)));
        let mut text = String::new();
        let mut skip = 0usize;
        for cell in cells {
            if skip > 0 {
                // Covered by the right half of a wide glyph.
                skip -= 1;
                continue;
            }
            if current_style != Some(cell.style) {
                if !text.is_empty() {
                    gate.push(TerminalCmd::Bytes(std::mem::take(&mut text)));
                }
                gate.push(TerminalCmd::SetStyle(cell.style));
                current_style = Some(cell.style);
            }
            text.push(cell.character);
            skip = unicode_width::UnicodeWidthChar::width(cell.character)
                .unwrap_or(1)
                .saturating_sub(1);
        }
        if !text.is_empty() {
            gate.push(TerminalCmd::Bytes(text));
        }
    }
    if current_style.is_some() {
        gate.push(TerminalCmd::ResetStyle);
    }
}

/// Full-screen terminal display on the process's stdin/stdout.
pub struct AnsiScreen {
    stdin_fd: c_int,
    stdout_fd: c_int,
    original_termios: Option<libc::termios>,
    size: TerminalSize,
    back: CellBuffer,
    front: Option<CellBuffer>,
    cursor: Option<TerminalPosition>,
    gate: OutputGate,
    decoder: KeyDecoder,
    resize_pending: Arc<AtomicBool>,
    resize_signal_handle: Option<signal_hook::iterator::Handle>,
    resize_thread: Option<JoinHandle<()>>,
    started: bool,
}

impl AnsiScreen {
    pub fn new() -> Self {
        Self::with_fds(libc::STDIN_FILENO, libc::STDOUT_FILENO)
    }

    pub(crate) fn with_fds(stdin_fd: c_int, stdout_fd: c_int) -> Self {
        let size = read_winsize(stdout_fd).unwrap_or(FALLBACK_SIZE);
        Self {
            stdin_fd,
            stdout_fd,
            original_termios: None,
            size,
            back: CellBuffer::new(size),
            front: None,
            cursor: None,
            gate: OutputGate::new(),
            decoder: KeyDecoder::new(),
            resize_pending: Arc::new(AtomicBool::new(false)),
            resize_signal_handle: None,
            resize_thread: None,
            started: false,
        }
    }

    fn enable_raw_mode(&mut self) -> io::Result<()> {
        let original = match self.original_termios {
            Some(original) => original,
            None => {
                let original = get_termios(self.stdin_fd)?;
                self.original_termios = Some(original);
                original
            }
        };
        let mut raw = original;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        set_termios(self.stdin_fd, &raw)
    }

    fn restore_raw_mode(&mut self) -> io::Result<()> {
        if let Some(original) = self.original_termios.as_ref() {
            set_termios(self.stdin_fd, original)?;
        }
        Ok(())
    }

    fn start_resize_thread(&mut self) -> io::Result<()> {
        let mut signals = Signals::new([libc::SIGWINCH])?;
        let handle = signals.handle();
        let resize_pending = Arc::clone(&self.resize_pending);

        let thread = thread::Builder::new()
            .name("tape-gui-resize".to_string())
            .spawn(move || {
                for _ in signals.forever() {
                    resize_pending.store(true, Ordering::SeqCst);
                }
            })?;

        self.resize_signal_handle = Some(handle);
        self.resize_thread = Some(thread);
        Ok(())
    }

    fn stop_resize_thread(&mut self) {
        if let Some(handle) = self.resize_signal_handle.take() {
            handle.close();
        }
        if let Some(thread) = self.resize_thread.take() {
            let _ = thread.join();
        }
    }

    fn flush_gate(&mut self) -> io::Result<()> {
        self.gate.flush(&mut FdWriter(self.stdout_fd))
    }

    fn apply_resize(&mut self) {
        let size = read_winsize(self.stdout_fd).unwrap_or(self.size);
        tracing::debug!(%size, "terminal resized");
        self.size = size;
        self.back = CellBuffer::new(size);
        self.front = None;
        self.gate.push(TerminalCmd::ClearScreen);
    }
}

impl Default for AnsiScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for AnsiScreen {
    fn start(&mut self) -> io::Result<()> {
        if self.started {
            return Ok(());
        }
        self.enable_raw_mode()?;
        if let Err(err) = self.start_resize_thread() {
            let _ = self.restore_raw_mode();
            return Err(err);
        }
        self.started = true;
        self.front = None;
        self.gate.extend([
            TerminalCmd::AltScreenEnable,
            TerminalCmd::HideCursor,
            TerminalCmd::ClearScreen,
        ]);
        self.flush_gate()
    }

    fn stop(&mut self) -> io::Result<()> {
        if !self.started {
            return Ok(());
        }
        self.started = false;
        self.stop_resize_thread();

        self.gate.extend([
            TerminalCmd::ResetStyle,
            TerminalCmd::ShowCursor,
            TerminalCmd::AltScreenDisable,
        ]);
        let flushed = self.flush_gate();

        // Flush input before leaving raw mode to avoid buffered bytes leaking to the shell.
        let _ = unsafe { libc::tcflush(self.stdin_fd, libc::TCIFLUSH) };

        self.restore_raw_mode()?;
        flushed
    }

    fn size(&self) -> TerminalSize {
        self.size
    }

    fn is_resize_pending(&self) -> bool {
        self.resize_pending.load(Ordering::SeqCst)
    }

    fn refresh(&mut self) -> io::Result<()> {
        if self.resize_pending.swap(false, Ordering::SeqCst) {
            self.apply_resize();
        }

        render_rows(self.front.as_ref(), &self.back, &mut self.gate);
        match self.cursor.filter(|cursor| self.size.contains(*cursor)) {
            Some(cursor) => self
                .gate
                .extend([TerminalCmd::MoveTo(cursor), TerminalCmd::ShowCursor]),
            None => self.gate.push(TerminalCmd::HideCursor),
        }
        self.flush_gate()?;
        self.front = Some(self.back.clone());
        Ok(())
    }

    fn set_character(&mut self, position: TerminalPosition, character: char, style: Style) {
        self.back.set(position, Cell { character, style });
    }

    fn set_cursor_position(&mut self, position: Option<TerminalPosition>) {
        self.cursor = position;
    }

    fn read_input(&mut self) -> Result<Option<Key>, GuiError> {
        if let Some(key) = self.decoder.next_key() {
            return Ok(Some(key));
        }
        if !poll_readable(self.stdin_fd, INPUT_POLL)? {
            // Idle input completes a held lone ESC.
            self.decoder.flush_pending();
            return Ok(self.decoder.next_key());
        }

        let mut buffer = [0u8; 1024];
        let read_len =
            unsafe { libc::read(self.stdin_fd, buffer.as_mut_ptr() as *mut _, buffer.len()) };
        if read_len < 0 {
            let err = io::Error::last_os_error();
            return match err.kind() {
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => Ok(None),
                _ => Err(err.into()),
            };
        }
        if read_len == 0 {
            self.decoder.flush_pending();
            return match self.decoder.next_key() {
                Some(key) => Ok(Some(key)),
                None => Err(GuiError::EndOfInput),
            };
        }
        self.decoder.push_bytes(&buffer[..read_len as usize]);
        Ok(self.decoder.next_key())
    }
}

impl Drop for AnsiScreen {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!(error = %err, "failed to restore terminal");
        }
    }
}

impl std::fmt::Debug for AnsiScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsiScreen")
            .field("size", &self.size)
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}
