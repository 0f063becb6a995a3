//! This module implements and describes common TTY methods & traits
use anstyle::Style;

use crate::config::Config;
use crate::keys::KeyEvent;
use crate::Result;

/// Terminals that don't support raw mode
const UNSUPPORTED_TERM: [&str; 3] = ["dumb", "cons25", "emacs"];

/// Terminal state guard
pub trait RawMode: Sized {
    /// Disable RAW mode for the terminal.
    fn disable_raw_mode(&self) -> Result<()>;
}

/// Translate bytes read from the input device to key events.
pub trait RawReader {
    /// Blocking read of the next key event.
    fn read_key(&mut self) -> Result<KeyEvent>;
    /// Read the next key event, waiting at most `timeout_ms`. `None` on
    /// timeout.
    fn read_key_timeout(&mut self, timeout_ms: u64) -> Result<Option<KeyEvent>>;
    /// Consume-and-clear the "terminal resized since last query" flag.
    fn take_resize(&mut self) -> bool;
    /// Update the ESC disambiguation delays.
    fn set_esc_delays(&mut self, initial_ms: u64, followup_ms: u64);
}

/// Low-level output primitives used by the refresh pipeline. Writes are
/// buffered; nothing reaches the device before [`Renderer::flush`].
pub trait Renderer {
    /// Append plain text to the output buffer.
    fn write(&mut self, s: &str);
    /// Append styled text (a no-op style writes plain text).
    fn write_styled(&mut self, s: &str, style: Style);
    /// Move the cursor to the first column.
    fn start_of_line(&mut self);
    /// Move the cursor up `n` rows.
    fn move_up(&mut self, n: usize);
    /// Move the cursor down `n` rows.
    fn move_down(&mut self, n: usize);
    /// Move the cursor right `n` columns.
    fn move_right(&mut self, n: usize);
    /// Clear the entire current row.
    fn clear_line(&mut self);
    /// Clear from the cursor to the end of the row.
    fn clear_to_eol(&mut self);
    /// Clear the whole screen and home the cursor.
    fn clear_screen(&mut self);
    /// Delete `n` rows at the cursor, shifting the rest up.
    fn delete_lines(&mut self, n: usize);
    /// Ring the terminal bell.
    fn beep(&mut self);
    /// Flush buffered output to the device.
    fn flush(&mut self) -> Result<()>;
    /// Re-query the terminal dimensions.
    fn update_size(&mut self);
    /// Number of columns.
    fn cols(&self) -> usize;
    /// Number of rows.
    fn rows(&self) -> usize;
    /// Whether styles should be emitted.
    fn colors_enabled(&self) -> bool;
}

/// The single thread-safe entry point: delivers an asynchronous stop that
/// behaves as if Ctrl-C was pressed.
pub trait StopSignal: Clone + Send + Sync {
    /// Unblock the current read with a `Stop` event. Returns `false` when
    /// the event could not be delivered.
    fn stop(&self) -> bool;
}

/// Terminal contract
pub trait Term: Sized {
    /// Key-event source
    type Reader: RawReader;
    /// Output sink
    type Writer: Renderer;
    /// Raw-mode guard
    type Mode: RawMode;
    /// Async stop handle
    type Stop: StopSignal;

    /// Open the terminal.
    fn new(config: &Config) -> Result<Self>;
    /// Check if the current terminal can provide a rich line-editing user
    /// interface.
    fn is_unsupported(&self) -> bool;
    /// Check if the input stream is connected to a terminal.
    fn is_input_tty(&self) -> bool;
    /// Check if the output stream is connected to a terminal.
    fn is_output_tty(&self) -> bool;
    /// Enable raw mode; the returned guard restores the previous state.
    fn enable_raw_mode(&self) -> Result<Self::Mode>;
    /// Create a key-event reader.
    fn create_reader(&self, config: &Config) -> Self::Reader;
    /// Create an output writer.
    fn create_writer(&self, config: &Config) -> Self::Writer;
    /// Queue an already-decoded key so it is consumed before the device.
    /// Queued keys form a FIFO; push a sequence in reverse order.
    fn push_key(&self, key: KeyEvent);
    /// Queue raw input bytes (including escape sequences).
    fn push_bytes(&self, bytes: &[u8]);
    /// Thread-safe handle delivering an asynchronous stop.
    fn stop_handle(&self) -> Self::Stop;
}

/// Check the TERM environment variable for terminals in the unsupported
/// list
pub(crate) fn is_unsupported_term() -> bool {
    match std::env::var("TERM") {
        Ok(term) => UNSUPPORTED_TERM
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&term)),
        Err(_) => false,
    }
}

#[cfg(all(unix, not(target_arch = "wasm32")))]
mod unix;
#[cfg(all(unix, not(target_arch = "wasm32"), not(test)))]
pub use self::unix::*;

#[cfg(any(test, target_arch = "wasm32"))]
mod test;
#[cfg(any(test, target_arch = "wasm32"))]
pub use self::test::*;

#[cfg(test)]
mod test_ {
    #[test]
    fn unsupported_term() {
        std::env::set_var("TERM", "xterm");
        assert!(!super::is_unsupported_term());
        std::env::set_var("TERM", "dumb");
        assert!(super::is_unsupported_term());
        std::env::set_var("TERM", "xterm");
    }
}
