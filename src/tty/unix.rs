//! Unix specific definitions: raw mode, the keycode lexer and the ANSI
//! renderer.
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::os::unix::io::{AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use anstyle::Style;
use log::debug;
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::termios::{
    self, ControlFlags, InputFlags, LocalFlags, SetArg, SpecialCharacterIndices, Termios,
};
use nix::unistd;

use crate::config::Config;
use crate::keys::{EventKind, KeyCode, KeyEvent, Modifiers, VirtualKey};
use crate::tty::{RawMode, RawReader, Renderer, StopSignal, Term};
use crate::{ReadlineError, Result};

fn borrow_fd(fd: RawFd) -> BorrowedFd<'static> {
    unsafe { BorrowedFd::borrow_raw(fd) }
}

fn read_byte(fd: RawFd) -> Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), 1) };
        if n < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(ReadlineError::Io(err));
        }
        return Ok(if n == 0 { None } else { Some(buf[0]) });
    }
}

fn write_all(fd: RawFd, buf: &[u8]) -> Result<()> {
    let mut rest = buf;
    while !rest.is_empty() {
        let n = unsafe { libc::write(fd, rest.as_ptr().cast(), rest.len()) };
        if n < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            return Err(ReadlineError::Io(err));
        }
        rest = &rest[n as usize..];
    }
    Ok(())
}

static SIGWINCH: OnceLock<Arc<AtomicBool>> = OnceLock::new();

fn sigwinch_flag() -> Arc<AtomicBool> {
    SIGWINCH
        .get_or_init(|| {
            let flag = Arc::new(AtomicBool::new(false));
            if let Err(err) =
                signal_hook::flag::register(signal_hook::consts::SIGWINCH, flag.clone())
            {
                debug!(target: "inkline", "cannot register SIGWINCH: {err}");
            }
            flag
        })
        .clone()
}

#[derive(Default)]
struct Pushback {
    keys: VecDeque<KeyEvent>,
    bytes: VecDeque<u8>,
}

type SharedPushback = Arc<Mutex<Pushback>>;

/// Raw-mode guard restoring the saved termios state.
pub struct PosixMode {
    orig: Termios,
    tty_in: RawFd,
}

impl RawMode for PosixMode {
    fn disable_raw_mode(&self) -> Result<()> {
        termios::tcsetattr(borrow_fd(self.tty_in), SetArg::TCSADRAIN, &self.orig)?;
        Ok(())
    }
}

impl Drop for PosixMode {
    fn drop(&mut self) {
        // raw mode must not outlive the read, whatever the exit path
        let _ = termios::tcsetattr(borrow_fd(self.tty_in), SetArg::TCSADRAIN, &self.orig);
    }
}

enum Input {
    Byte(u8),
    Stop,
    Timeout,
    Resized,
}

/// Decodes the raw byte stream into key events.
pub struct PosixRawReader {
    tty_in: RawFd,
    stop_rx: Arc<OwnedFd>,
    pushback: SharedPushback,
    resize: Arc<AtomicBool>,
    initial_esc_delay_ms: u64,
    followup_esc_delay_ms: u64,
}

impl PosixRawReader {
    /// Wait for input on the device or the stop pipe, at most `timeout_ms`
    /// (`None` blocks).
    fn wait_input(&self, timeout_ms: Option<u64>) -> Result<Input> {
        let timeout = match timeout_ms {
            None => PollTimeout::NONE,
            Some(ms) => PollTimeout::from(ms.min(u64::from(u16::MAX)) as u16),
        };
        loop {
            let mut fds = [
                PollFd::new(borrow_fd(self.tty_in), PollFlags::POLLIN),
                PollFd::new(borrow_fd(self.stop_rx.as_raw_fd()), PollFlags::POLLIN),
            ];
            match poll(&mut fds, timeout) {
                Err(Errno::EINTR) => {
                    if self.resize.load(Ordering::Relaxed) {
                        return Ok(Input::Resized);
                    }
                    // interrupted by an unrelated signal, wait again
                }
                Err(err) => return Err(err.into()),
                Ok(0) => return Ok(Input::Timeout),
                Ok(_) => {
                    if fds[1]
                        .revents()
                        .is_some_and(|r| r.contains(PollFlags::POLLIN))
                    {
                        let _ = read_byte(self.stop_rx.as_raw_fd());
                        return Ok(Input::Stop);
                    }
                    return match read_byte(self.tty_in)? {
                        Some(b) => Ok(Input::Byte(b)),
                        None => Err(ReadlineError::Eof),
                    };
                }
            }
        }
    }

    /// Next raw byte: the push-back queue first, then the device.
    fn next_byte(&mut self, timeout_ms: Option<u64>) -> Result<Option<u8>> {
        if let Some(b) = self.pushback.lock().unwrap().bytes.pop_front() {
            return Ok(Some(b));
        }
        match self.wait_input(timeout_ms)? {
            Input::Byte(b) => Ok(Some(b)),
            _ => Ok(None),
        }
    }

    /// Decode one key event from the byte stream. `None` means a dropped
    /// (unrecognized) sequence.
    fn decode(&mut self, b0: u8) -> Result<Option<KeyEvent>> {
        match b0 {
            0x1b => self.decode_esc(),
            0x7f => Ok(Some(KeyEvent::BACKSPACE)),
            b if b < 0x80 => Ok(Some(KeyEvent::from_code(u32::from(b)))),
            b => Ok(Some(self.decode_utf8(b)?)),
        }
    }

    fn decode_utf8(&mut self, b0: u8) -> Result<KeyEvent> {
        #[derive(Default)]
        struct Receiver {
            c: Option<char>,
            invalid: bool,
        }
        impl utf8parse::Receiver for Receiver {
            fn codepoint(&mut self, c: char) {
                self.c = Some(c);
            }
            fn invalid_sequence(&mut self) {
                self.invalid = true;
            }
        }
        let mut parser = utf8parse::Parser::new();
        let mut recv = Receiver::default();
        parser.advance(&mut recv, b0);
        while recv.c.is_none() && !recv.invalid {
            match self.next_byte(Some(self.followup_esc_delay_ms))? {
                Some(b) => parser.advance(&mut recv, b),
                None => recv.invalid = true,
            }
        }
        // malformed input decodes to the replacement code point
        Ok(KeyEvent::from_char(
            recv.c.unwrap_or(char::REPLACEMENT_CHARACTER),
        ))
    }

    fn decode_esc(&mut self) -> Result<Option<KeyEvent>> {
        let Some(b1) = self.next_byte(Some(self.initial_esc_delay_ms))? else {
            return Ok(Some(KeyEvent::ESC)); // lone ESC
        };
        match b1 {
            b'[' => self.decode_csi(),
            b'O' => self.decode_ss3(),
            0x1b => Ok(Some(KeyEvent::ESC)),
            0x7f => Ok(Some(KeyEvent(KeyCode::Char('\x08'), Modifiers::ALT))),
            b if b < 0x80 => {
                let key = KeyEvent::from_code(u32::from(b));
                Ok(Some(KeyEvent(key.0, key.1 | Modifiers::ALT)))
            }
            b => {
                let key = self.decode_utf8(b)?;
                Ok(Some(KeyEvent(key.0, key.1 | Modifiers::ALT)))
            }
        }
    }

    fn decode_csi(&mut self) -> Result<Option<KeyEvent>> {
        let mut params = Vec::new();
        let final_byte = loop {
            match self.next_byte(Some(self.followup_esc_delay_ms))? {
                None => return Ok(None),
                Some(b @ 0x30..=0x3f) => params.push(b),
                Some(b) => break b,
            }
        };
        let mut numbers = params
            .split(|b| *b == b';')
            .map(|p| std::str::from_utf8(p).ok().and_then(|s| s.parse::<u32>().ok()));
        let first = numbers.next().flatten();
        let mods = numbers
            .next()
            .flatten()
            .map_or(Modifiers::NONE, decode_mods);

        let key = match final_byte {
            b'A' => KeyCode::Virt(VirtualKey::Up),
            b'B' => KeyCode::Virt(VirtualKey::Down),
            b'C' => KeyCode::Virt(VirtualKey::Right),
            b'D' => KeyCode::Virt(VirtualKey::Left),
            b'H' => KeyCode::Virt(VirtualKey::Home),
            b'F' => KeyCode::Virt(VirtualKey::End),
            b'Z' => return Ok(Some(KeyEvent(KeyCode::Char('\t'), Modifiers::SHIFT))),
            b'~' => match first {
                Some(1 | 7) => KeyCode::Virt(VirtualKey::Home),
                Some(2) => KeyCode::Virt(VirtualKey::Insert),
                Some(3) => KeyCode::Virt(VirtualKey::Delete),
                Some(4 | 8) => KeyCode::Virt(VirtualKey::End),
                Some(5) => KeyCode::Virt(VirtualKey::PageUp),
                Some(6) => KeyCode::Virt(VirtualKey::PageDown),
                Some(n @ 11..=15) => KeyCode::Virt(VirtualKey::F((n - 10) as u8)),
                Some(n @ 17..=21) => KeyCode::Virt(VirtualKey::F((n - 11) as u8)),
                Some(n @ 23..=26) => KeyCode::Virt(VirtualKey::F((n - 12) as u8)),
                Some(n @ 28..=29) => KeyCode::Virt(VirtualKey::F((n - 13) as u8)),
                Some(n @ 31..=34) => KeyCode::Virt(VirtualKey::F((n - 14) as u8)),
                _ => {
                    debug!(target: "inkline", "unknown CSI ~ sequence: {params:?}");
                    return Ok(None);
                }
            },
            _ => {
                debug!(target: "inkline", "unknown CSI final byte: {final_byte:#x}");
                return Ok(None);
            }
        };
        Ok(Some(KeyEvent(key, mods)))
    }

    fn decode_ss3(&mut self) -> Result<Option<KeyEvent>> {
        let Some(b) = self.next_byte(Some(self.followup_esc_delay_ms))? else {
            return Ok(None);
        };
        let key = match b {
            b'A' => KeyCode::Virt(VirtualKey::Up),
            b'B' => KeyCode::Virt(VirtualKey::Down),
            b'C' => KeyCode::Virt(VirtualKey::Right),
            b'D' => KeyCode::Virt(VirtualKey::Left),
            b'H' => KeyCode::Virt(VirtualKey::Home),
            b'F' => KeyCode::Virt(VirtualKey::End),
            b'P' => KeyCode::Virt(VirtualKey::F(1)),
            b'Q' => KeyCode::Virt(VirtualKey::F(2)),
            b'R' => KeyCode::Virt(VirtualKey::F(3)),
            b'S' => KeyCode::Virt(VirtualKey::F(4)),
            _ => {
                debug!(target: "inkline", "unknown SS3 byte: {b:#x}");
                return Ok(None);
            }
        };
        Ok(Some(KeyEvent(key, Modifiers::NONE)))
    }

    fn read_key_impl(&mut self, timeout_ms: Option<u64>) -> Result<Option<KeyEvent>> {
        loop {
            if let Some(key) = self.pushback.lock().unwrap().keys.pop_front() {
                return Ok(Some(key));
            }
            let b0 = if self.pushback.lock().unwrap().bytes.front().is_some() {
                self.next_byte(Some(0))?.unwrap()
            } else {
                match self.wait_input(timeout_ms)? {
                    Input::Byte(b) => b,
                    Input::Stop => return Ok(Some(KeyEvent::event(EventKind::Stop))),
                    Input::Resized => return Ok(Some(KeyEvent::event(EventKind::Resize))),
                    Input::Timeout => return Ok(None),
                }
            };
            if let Some(key) = self.decode(b0)? {
                return Ok(Some(key));
            }
            // unknown sequence dropped, keep reading
        }
    }
}

fn decode_mods(code: u32) -> Modifiers {
    let bits = code.saturating_sub(1);
    let mut mods = Modifiers::NONE;
    if bits & 1 != 0 {
        mods |= Modifiers::SHIFT;
    }
    if bits & 2 != 0 {
        mods |= Modifiers::ALT;
    }
    if bits & 4 != 0 {
        mods |= Modifiers::CTRL;
    }
    mods
}

impl RawReader for PosixRawReader {
    fn read_key(&mut self) -> Result<KeyEvent> {
        match self.read_key_impl(None)? {
            Some(key) => Ok(key),
            // blocking read only times out on EOF-ish conditions
            None => Err(ReadlineError::Eof),
        }
    }

    fn read_key_timeout(&mut self, timeout_ms: u64) -> Result<Option<KeyEvent>> {
        self.read_key_impl(Some(timeout_ms))
    }

    fn take_resize(&mut self) -> bool {
        self.resize.swap(false, Ordering::Relaxed)
    }

    fn set_esc_delays(&mut self, initial_ms: u64, followup_ms: u64) {
        self.initial_esc_delay_ms = initial_ms;
        self.followup_esc_delay_ms = followup_ms;
    }
}

/// ANSI renderer writing buffered output to the terminal.
pub struct PosixRenderer {
    tty_out: RawFd,
    buffer: String,
    cols: usize,
    rows: usize,
    colors: bool,
    beep_enabled: bool,
}

impl PosixRenderer {
    fn query_size(fd: RawFd) -> Option<(usize, usize)> {
        let mut ws = libc::winsize {
            ws_row: 0,
            ws_col: 0,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        let rc = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut ws) };
        if rc == 0 && ws.ws_col != 0 {
            Some((usize::from(ws.ws_col), usize::from(ws.ws_row)))
        } else {
            None
        }
    }
}

impl Renderer for PosixRenderer {
    fn write(&mut self, s: &str) {
        self.buffer.push_str(s);
    }

    fn write_styled(&mut self, s: &str, style: Style) {
        if self.colors && style != Style::new() {
            let _ = write!(self.buffer, "{}{s}{}", style.render(), style.render_reset());
        } else {
            self.buffer.push_str(s);
        }
    }

    fn start_of_line(&mut self) {
        self.buffer.push('\r');
    }

    fn move_up(&mut self, n: usize) {
        if n > 0 {
            let _ = write!(self.buffer, "\x1b[{n}A");
        }
    }

    fn move_down(&mut self, n: usize) {
        if n > 0 {
            let _ = write!(self.buffer, "\x1b[{n}B");
        }
    }

    fn move_right(&mut self, n: usize) {
        if n > 0 {
            let _ = write!(self.buffer, "\x1b[{n}C");
        }
    }

    fn clear_line(&mut self) {
        self.buffer.push_str("\x1b[2K");
    }

    fn clear_to_eol(&mut self) {
        self.buffer.push_str("\x1b[K");
    }

    fn clear_screen(&mut self) {
        self.buffer.push_str("\x1b[H\x1b[2J");
    }

    fn delete_lines(&mut self, n: usize) {
        if n > 0 {
            let _ = write!(self.buffer, "\x1b[{n}M");
        }
    }

    fn beep(&mut self) {
        if self.beep_enabled {
            self.buffer.push('\x07');
        }
    }

    fn flush(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            write_all(self.tty_out, self.buffer.as_bytes())?;
            self.buffer.clear();
        }
        Ok(())
    }

    fn update_size(&mut self) {
        if let Some((cols, rows)) = Self::query_size(self.tty_out) {
            self.cols = cols;
            self.rows = rows;
        }
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn colors_enabled(&self) -> bool {
        self.colors
    }
}

/// Thread-safe async-stop handle writing to the reader's self-pipe.
#[derive(Clone)]
pub struct StopHandle {
    stop_tx: Arc<OwnedFd>,
}

impl StopSignal for StopHandle {
    fn stop(&self) -> bool {
        let n = unsafe { libc::write(self.stop_tx.as_raw_fd(), [3u8].as_ptr().cast(), 1) };
        n == 1
    }
}

/// The Unix terminal.
pub struct Terminal {
    tty_in: RawFd,
    tty_out: RawFd,
    is_in_tty: bool,
    is_out_tty: bool,
    unsupported: bool,
    pushback: SharedPushback,
    stop_rx: Arc<OwnedFd>,
    stop_tx: Arc<OwnedFd>,
}

impl Term for Terminal {
    type Mode = PosixMode;
    type Reader = PosixRawReader;
    type Stop = StopHandle;
    type Writer = PosixRenderer;

    fn new(_config: &Config) -> Result<Self> {
        let tty_in = libc::STDIN_FILENO;
        let tty_out = libc::STDOUT_FILENO;
        let is_in_tty = unsafe { libc::isatty(tty_in) } == 1;
        let is_out_tty = unsafe { libc::isatty(tty_out) } == 1;
        let (stop_rx, stop_tx) = unistd::pipe()?;
        Ok(Self {
            tty_in,
            tty_out,
            is_in_tty,
            is_out_tty,
            unsupported: super::is_unsupported_term(),
            pushback: SharedPushback::default(),
            stop_rx: Arc::new(stop_rx),
            stop_tx: Arc::new(stop_tx),
        })
    }

    fn is_unsupported(&self) -> bool {
        self.unsupported
    }

    fn is_input_tty(&self) -> bool {
        self.is_in_tty
    }

    fn is_output_tty(&self) -> bool {
        self.is_out_tty
    }

    fn enable_raw_mode(&self) -> Result<Self::Mode> {
        let orig = termios::tcgetattr(borrow_fd(self.tty_in))?;
        let mut raw = orig.clone();
        // no echo, no canonical mode, no signals, 8-bit chars
        raw.input_flags &= !(InputFlags::BRKINT
            | InputFlags::ICRNL
            | InputFlags::INPCK
            | InputFlags::ISTRIP
            | InputFlags::IXON);
        raw.control_flags |= ControlFlags::CS8;
        raw.local_flags &=
            !(LocalFlags::ECHO | LocalFlags::ICANON | LocalFlags::IEXTEN | LocalFlags::ISIG);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        termios::tcsetattr(borrow_fd(self.tty_in), SetArg::TCSADRAIN, &raw)?;
        Ok(PosixMode {
            orig,
            tty_in: self.tty_in,
        })
    }

    fn create_reader(&self, config: &Config) -> Self::Reader {
        let (initial, followup) = config.esc_delays();
        PosixRawReader {
            tty_in: self.tty_in,
            stop_rx: self.stop_rx.clone(),
            pushback: self.pushback.clone(),
            resize: sigwinch_flag(),
            initial_esc_delay_ms: initial,
            followup_esc_delay_ms: followup,
        }
    }

    fn create_writer(&self, config: &Config) -> Self::Writer {
        let (cols, rows) = PosixRenderer::query_size(self.tty_out).unwrap_or((80, 24));
        PosixRenderer {
            tty_out: self.tty_out,
            buffer: String::with_capacity(1024),
            cols,
            rows,
            colors: config.color() && self.is_out_tty,
            beep_enabled: config.beep(),
        }
    }

    fn push_key(&self, key: KeyEvent) {
        self.pushback.lock().unwrap().keys.push_front(key);
    }

    fn push_bytes(&self, bytes: &[u8]) {
        self.pushback.lock().unwrap().bytes.extend(bytes);
    }

    fn stop_handle(&self) -> Self::Stop {
        StopHandle {
            stop_tx: self.stop_tx.clone(),
        }
    }
}
