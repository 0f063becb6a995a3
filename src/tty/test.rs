//! Tests specific definitions: an in-memory terminal double.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anstyle::Style;

use crate::config::Config;
use crate::keys::{EventKind, KeyEvent};
use crate::tty::{RawMode, RawReader, Renderer, StopSignal, Term};
use crate::{ReadlineError, Result};

pub type Mode = ();

impl RawMode for Mode {
    fn disable_raw_mode(&self) -> Result<()> {
        Ok(())
    }
}

/// Reads scripted key events.
pub struct DummyReader {
    keys: Arc<Mutex<VecDeque<KeyEvent>>>,
    stopped: Arc<AtomicBool>,
    resized: Arc<AtomicBool>,
}

impl RawReader for DummyReader {
    fn read_key(&mut self) -> Result<KeyEvent> {
        if self.stopped.swap(false, Ordering::Relaxed) {
            return Ok(KeyEvent::event(EventKind::Stop));
        }
        match self.keys.lock().unwrap().pop_front() {
            Some(key) => Ok(key),
            None => Err(ReadlineError::Eof),
        }
    }

    fn read_key_timeout(&mut self, _timeout_ms: u64) -> Result<Option<KeyEvent>> {
        // scripted keys arrive instantly
        Ok(self.keys.lock().unwrap().pop_front())
    }

    fn take_resize(&mut self) -> bool {
        self.resized.swap(false, Ordering::Relaxed)
    }

    fn set_esc_delays(&mut self, _initial_ms: u64, _followup_ms: u64) {}
}

/// Captures rendered output.
pub struct Sink {
    out: Arc<Mutex<String>>,
    cols: usize,
    rows: usize,
}

impl Renderer for Sink {
    fn write(&mut self, s: &str) {
        self.out.lock().unwrap().push_str(s);
    }

    fn write_styled(&mut self, s: &str, _style: Style) {
        self.out.lock().unwrap().push_str(s);
    }

    fn start_of_line(&mut self) {
        self.out.lock().unwrap().push('\r');
    }

    fn move_up(&mut self, _n: usize) {}
    fn move_down(&mut self, _n: usize) {}

    fn move_right(&mut self, _n: usize) {}

    fn clear_line(&mut self) {}

    fn clear_to_eol(&mut self) {}

    fn clear_screen(&mut self) {}

    fn delete_lines(&mut self, _n: usize) {}

    fn beep(&mut self) {
        self.out.lock().unwrap().push('\x07');
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn update_size(&mut self) {}

    fn cols(&self) -> usize {
        self.cols
    }

    fn rows(&self) -> usize {
        self.rows
    }

    fn colors_enabled(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopSignal for StopHandle {
    fn stop(&self) -> bool {
        self.stopped.store(true, Ordering::Relaxed);
        true
    }
}

pub type Terminal = DummyTerminal;

/// In-memory terminal for the test suite.
#[derive(Clone)]
pub struct DummyTerminal {
    pub keys: Arc<Mutex<VecDeque<KeyEvent>>>,
    pub out: Arc<Mutex<String>>,
    pub cols: usize,
    pub rows: usize,
    stopped: Arc<AtomicBool>,
    resized: Arc<AtomicBool>,
}

impl DummyTerminal {
    /// Queue scripted keys at the back (played in order).
    pub fn feed(&self, keys: &[KeyEvent]) {
        self.keys.lock().unwrap().extend(keys.iter().copied());
    }

    /// Everything written so far.
    pub fn output(&self) -> String {
        self.out.lock().unwrap().clone()
    }
}

impl Term for DummyTerminal {
    type Mode = Mode;
    type Reader = DummyReader;
    type Stop = StopHandle;
    type Writer = Sink;

    fn new(_config: &Config) -> Result<Self> {
        Ok(Self {
            keys: Arc::new(Mutex::new(VecDeque::new())),
            out: Arc::new(Mutex::new(String::new())),
            cols: 80,
            rows: 24,
            stopped: Arc::new(AtomicBool::new(false)),
            resized: Arc::new(AtomicBool::new(false)),
        })
    }

    fn is_unsupported(&self) -> bool {
        false
    }

    fn is_input_tty(&self) -> bool {
        true
    }

    fn is_output_tty(&self) -> bool {
        true
    }

    fn enable_raw_mode(&self) -> Result<Self::Mode> {
        Ok(())
    }

    fn create_reader(&self, _config: &Config) -> Self::Reader {
        DummyReader {
            keys: self.keys.clone(),
            stopped: self.stopped.clone(),
            resized: self.resized.clone(),
        }
    }

    fn create_writer(&self, _config: &Config) -> Self::Writer {
        Sink {
            out: self.out.clone(),
            cols: self.cols,
            rows: self.rows,
        }
    }

    fn push_key(&self, key: KeyEvent) {
        self.keys.lock().unwrap().push_front(key);
    }

    fn push_bytes(&self, _bytes: &[u8]) {
        // raw byte replay is exercised through the unix lexer
    }

    fn stop_handle(&self) -> Self::Stop {
        StopHandle {
            stopped: self.stopped.clone(),
        }
    }
}
