//! Inkline, a readline replacement with multi-line editing, history
//! search, context-sensitive completion with a menu, inline hints, syntax
//! highlighting, brace matching and configurable key-binding profiles.
//!
//! Usage
//!
//! ```no_run
//! let mut editor = inkline::Editor::new()?;
//! loop {
//!     match editor.readline("demo") {
//!         Ok(line) => println!("Line: {line}"),
//!         Err(inkline::ReadlineError::Interrupted) => break,
//!         Err(inkline::ReadlineError::Eof) => break,
//!         Err(err) => {
//!             println!("Error: {err:?}");
//!             break;
//!         }
//!     }
//! }
//! # Ok::<(), inkline::ReadlineError>(())
//! ```
use log::debug;

mod binding;
mod completion;
mod config;
mod edit;
mod error;
mod help;
mod highlight;
mod history;
mod keys;
mod layout;
mod line_buffer;
mod menu;
mod search;
mod style;
mod tty;
mod undo;

#[cfg(test)]
mod test;

pub use anstyle::Style;

pub use crate::binding::{
    format_key_spec, parse_key_spec, profile_by_name, Action, BindingEntry, Bindings, Profile,
    EMACS, PROFILES, VIM,
};
pub use crate::completion::{
    complete_filename, complete_qword, complete_qword_ex, complete_word, Candidate, Completer,
    CompletionCtx,
};
pub use crate::config::{Builder, Config};
pub use crate::error::ReadlineError;
pub use crate::highlight::{HighlightEnv, Highlighter};
pub use crate::history::{History, SearchDirection, SearchResult, DEFAULT_HISTORY_SIZE};
pub use crate::keys::{EventKind, KeyCode, KeyCode32, KeyEvent, Modifiers, VirtualKey};
pub use crate::line_buffer::{
    char_is_digit, char_is_filename_letter, char_is_hexdigit, char_is_idletter, char_is_letter,
    char_is_nonseparator, char_is_nonwhite, char_is_separator, char_is_white, is_token,
    match_any_token, match_token,
};
pub use crate::style::{names as style_names, ColorDepth, StyleTable};
pub use crate::tty::StopSignal;

use crate::edit::{EditCtx, State};
use crate::highlight::AttrBuffer;
use crate::keys::EVENT_BASE;
use crate::tty::{RawMode, RawReader, Renderer, Term, Terminal};

/// The error type for I/O and Unix syscall errors.
pub type Result<T> = std::result::Result<T, ReadlineError>;

/// Async stop handle of the default terminal, see [`Editor::stop_handle`].
pub type StopHandle = <Terminal as Term>::Stop;

/// Token representing Ctrl-C in [`Editor::readline_tokens`].
pub const CTRL_C_TOKEN: &str = "<CTRL+C>";
/// Token representing Ctrl-D (EOF) in [`Editor::readline_tokens`].
pub const CTRL_D_TOKEN: &str = "<CTRL+D>";

/// How one read ended.
enum Exit {
    /// Input accepted (`via_enter` distinguishes Enter from Esc/Ctrl-G)
    Accept { via_enter: bool },
    /// Ctrl-D on an empty buffer
    Eof,
    /// Ctrl-C or an asynchronous stop
    Interrupted,
}

/// The editing environment: terminal, history, bindings, completion and
/// highlight capabilities. At most one read can be active at a time.
pub struct Editor {
    config: Config,
    styles: StyleTable,
    bindings: Bindings,
    profile: &'static Profile,
    history: History,
    completer: Option<Box<dyn Completer>>,
    highlighter: Option<Box<dyn Highlighter>>,
    term: Terminal,
}

impl Editor {
    /// Editor with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Editor with a custom configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        let term = Terminal::new(&config)?;
        let mut bindings = Bindings::new();
        EMACS.apply(&mut bindings);
        Ok(Self {
            config,
            styles: StyleTable::new(),
            bindings,
            profile: &EMACS,
            history: History::new(),
            completer: None,
            highlighter: None,
            term,
        })
    }

    //-------------------------------------------------------------
    // Reading
    //-------------------------------------------------------------

    /// Read a line with rich editing abilities.
    ///
    /// The displayed prompt is `prompt` followed by the prompt marker; a
    /// multi-line prompt prints all but its last line once, before the
    /// edit region. `Ctrl-C` returns [`ReadlineError::Interrupted`],
    /// `Ctrl-D` on an empty buffer [`ReadlineError::Eof`]; `Esc` on an
    /// empty buffer and `Ctrl-G` return an empty string.
    pub fn readline(&mut self, prompt: &str) -> Result<String> {
        self.readline_with(prompt, None, None)
    }

    /// [`Editor::readline`] with pre-filled initial input.
    pub fn readline_with_initial(&mut self, prompt: &str, initial: &str) -> Result<String> {
        self.readline_with(prompt, None, Some(initial))
    }

    /// [`Editor::readline`] with a right-aligned annotation on the input
    /// row. The annotation is display-only and disappears when the input
    /// reaches it.
    pub fn readline_inline(
        &mut self,
        prompt: &str,
        right_text: &str,
        initial: Option<&str>,
    ) -> Result<String> {
        self.readline_with(prompt, Some(right_text), initial)
    }

    /// C-style variant: maps `Ctrl-C` to [`CTRL_C_TOKEN`], `Ctrl-D` to
    /// [`CTRL_D_TOKEN`] and I/O errors to `None`.
    pub fn readline_tokens(&mut self, prompt: &str) -> Option<String> {
        match self.readline(prompt) {
            Ok(line) => Some(line),
            Err(ReadlineError::Interrupted) => Some(CTRL_C_TOKEN.to_owned()),
            Err(ReadlineError::Eof) => Some(CTRL_D_TOKEN.to_owned()),
            Err(_) => None,
        }
    }

    fn readline_with(
        &mut self,
        prompt: &str,
        right: Option<&str>,
        initial: Option<&str>,
    ) -> Result<String> {
        if self.term.is_unsupported() || !self.term.is_input_tty() {
            self.readline_direct(prompt)
        } else {
            self.readline_edit(prompt, right, initial)
        }
    }

    /// Plain line read for dumb terminals and redirected input.
    fn readline_direct(&mut self, prompt: &str) -> Result<String> {
        use std::io::{BufRead, Write};
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        write!(out, "{prompt}{}", self.config.prompt_marker())?;
        out.flush()?;
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(ReadlineError::Eof);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }

    fn readline_edit(
        &mut self,
        prompt: &str,
        right: Option<&str>,
        initial: Option<&str>,
    ) -> Result<String> {
        let Self {
            ref config,
            ref styles,
            ref bindings,
            profile,
            ref mut history,
            ref completer,
            ref highlighter,
            ref term,
        } = *self;
        let ctx = EditCtx {
            config,
            styles,
            highlighter: highlighter.as_deref(),
            completer: completer.as_deref(),
        };
        let mut reader = term.create_reader(config);
        let mut out = term.create_writer(config);
        let mode = term.enable_raw_mode()?;

        // a multi-line prompt: emit the prefix lines once, verbatim
        let (prefix, last_line) = match prompt.rfind('\n') {
            Some(i) => (&prompt[..=i], &prompt[i + 1..]),
            None => ("", prompt),
        };
        if !prefix.is_empty() {
            out.write(&prefix.replace('\n', "\r\n"));
        }
        let mut s = State::new(
            last_line.to_owned(),
            prefix.matches('\n').count(),
            right.map(str::to_owned),
            out.cols(),
        );
        if let Some(init) = initial {
            let len = init.len();
            s.line.update(init, len);
        }

        // always a history entry for the in-progress input
        history.push_placeholder();
        s.refresh(&mut out, &ctx, true)?;

        let exit = edit_loop(&mut s, &mut reader, &mut out, &ctx, bindings, history, profile);
        let exit = match exit {
            Ok(exit) => exit,
            Err(err) => {
                history.remove_last();
                return Err(err); // raw mode restored by the guard
            }
        };

        // final paint without transient brace highlights
        s.clear_hint();
        s.extra.clear();
        s.extra_attrs = AttrBuffer::new();
        s.cursor_to_end();
        s.refresh(&mut out, &ctx, false)?;

        let result = match exit {
            Exit::Accept { via_enter } => {
                let res = s.line.as_str().to_owned();
                if config.prompt_cleanup() && via_enter {
                    s.prompt_cleanup(&mut out, &ctx, &res)?;
                } else {
                    out.write("\r\n");
                    out.flush()?;
                }
                if res.len() > 1 {
                    history.update(&res);
                } else {
                    history.remove_last();
                }
                Ok(res)
            }
            Exit::Eof => {
                out.write("\r\n");
                out.flush()?;
                history.remove_last();
                Err(ReadlineError::Eof)
            }
            Exit::Interrupted => {
                out.write("\r\n");
                out.flush()?;
                history.remove_last();
                Err(ReadlineError::Interrupted)
            }
        };
        mode.disable_raw_mode()?;
        result
    }

    //-------------------------------------------------------------
    // Capabilities
    //-------------------------------------------------------------

    /// Set the completion callback. There can be only one; setting it
    /// again replaces the previous one.
    pub fn set_completer(&mut self, completer: impl Completer + 'static) {
        self.completer = Some(Box::new(completer));
    }

    /// Remove the completion callback.
    pub fn clear_completer(&mut self) {
        self.completer = None;
    }

    /// Set the syntax highlighter. There can be only one; setting it
    /// again replaces the previous one.
    pub fn set_highlighter(&mut self, highlighter: impl Highlighter + 'static) {
        self.highlighter = Some(Box::new(highlighter));
    }

    /// Remove the syntax highlighter.
    pub fn clear_highlighter(&mut self) {
        self.highlighter = None;
    }

    /// Define or redefine a named style usable from highlighters.
    pub fn style_def(&mut self, name: &str, style: Style) {
        self.styles.define(name, style);
    }

    //-------------------------------------------------------------
    // Key injection and async stop
    //-------------------------------------------------------------

    /// Queue a single key event so it is processed before the next read.
    pub fn push_key_event(&self, key: KeyEvent) {
        self.term.push_key(key);
    }

    /// Queue multiple key events in order.
    pub fn push_key_sequence(&self, keys: &[KeyEvent]) {
        // the queue is pushed at the front, so feed it in reverse
        for key in keys.iter().rev() {
            self.term.push_key(*key);
        }
    }

    /// Queue raw terminal bytes (including escape sequences).
    pub fn push_raw_input(&self, bytes: &[u8]) {
        self.term.push_bytes(bytes);
    }

    /// Thread-safe handle that unblocks the current read as if `Ctrl-C`
    /// was pressed. This is the only thread-safe entry point.
    pub fn stop_handle(&self) -> StopHandle {
        self.term.stop_handle()
    }

    //-------------------------------------------------------------
    // History
    //-------------------------------------------------------------

    /// Attach a history file (`None` keeps history in memory only) and
    /// load it. `max_entries < 0` keeps the default of
    /// [`DEFAULT_HISTORY_SIZE`] entries.
    pub fn set_history(&mut self, path: Option<&std::path::Path>, max_entries: isize) -> Result<()> {
        self.history.set_file(path, max_entries)
    }

    /// Append an entry and save the history file.
    pub fn history_add(&mut self, entry: &str) {
        self.history.push(entry);
        let _ = self.history.save();
    }

    /// Drop all history entries.
    pub fn history_clear(&mut self) {
        self.history.clear();
    }

    /// Remove the newest history entry (e.g. the just-returned input).
    pub fn history_remove_last(&mut self) {
        self.history.remove_last();
    }

    /// Force a save of the in-memory history to the history file.
    pub fn history_save(&mut self) -> Result<()> {
        self.history.save()
    }

    /// Read access to the history ring.
    pub fn history(&self) -> &History {
        &self.history
    }

    //-------------------------------------------------------------
    // Options (setters return the previous value)
    //-------------------------------------------------------------

    /// Enable or disable multi-line input (enabled by default).
    pub fn enable_multiline(&mut self, yes: bool) -> bool {
        self.config.set_multiline(yes)
    }

    /// Enable or disable the completion beep (enabled by default).
    pub fn enable_beep(&mut self, yes: bool) -> bool {
        self.config.set_beep(yes)
    }

    /// Enable or disable color output (enabled by default).
    pub fn enable_color(&mut self, yes: bool) -> bool {
        self.config.set_color(yes)
    }

    /// Enable or disable adjacent duplicates in the history (disabled by
    /// default).
    pub fn enable_history_duplicates(&mut self, yes: bool) -> bool {
        self.history.set_allow_duplicates(yes);
        self.config.set_history_duplicates(yes)
    }

    /// Enable or disable automatic completion of unique follow-ups
    /// (disabled by default).
    pub fn enable_auto_tab(&mut self, yes: bool) -> bool {
        self.config.set_auto_tab(yes)
    }

    /// Enable or disable the completion preview in the menu (enabled by
    /// default).
    pub fn enable_completion_preview(&mut self, yes: bool) -> bool {
        self.config.set_completion_preview(yes)
    }

    /// Enable or disable continuation-line indentation (enabled by
    /// default).
    pub fn enable_multiline_indent(&mut self, yes: bool) -> bool {
        self.config.set_multiline_indent(yes)
    }

    /// Enable or disable short inline help messages (enabled by default).
    pub fn enable_inline_help(&mut self, yes: bool) -> bool {
        self.config.set_inline_help(yes)
    }

    /// Enable or disable inline hints (enabled by default).
    pub fn enable_hint(&mut self, yes: bool) -> bool {
        self.config.set_hint(yes)
    }

    /// Set the hint delay in milliseconds (clamped to 0..=5000). Returns
    /// the previous delay.
    pub fn set_hint_delay(&mut self, delay_ms: u64) -> u64 {
        self.config.set_hint_delay_ms(delay_ms)
    }

    /// Enable or disable completion spell correction (disabled by
    /// default).
    pub fn enable_spell_correct(&mut self, yes: bool) -> bool {
        self.config.set_spell_correct(yes)
    }

    /// Enable or disable syntax highlighting (enabled by default).
    pub fn enable_highlight(&mut self, yes: bool) -> bool {
        self.config.set_highlight(yes)
    }

    /// Enable or disable matching-brace highlighting (enabled by
    /// default).
    pub fn enable_brace_matching(&mut self, yes: bool) -> bool {
        self.config.set_brace_matching(yes)
    }

    /// Enable or disable automatic brace insertion (enabled by default).
    pub fn enable_brace_insertion(&mut self, yes: bool) -> bool {
        self.config.set_brace_insertion(yes)
    }

    /// Enable or disable prompt cleanup after accept, erasing
    /// `extra_lines` additional terminal lines (disabled by default).
    pub fn enable_prompt_cleanup(&mut self, yes: bool, extra_lines: usize) -> bool {
        self.config.set_prompt_cleanup_extra_lines(extra_lines);
        self.config.set_prompt_cleanup(yes)
    }

    /// Enable or disable a blank line after prompt-cleanup output
    /// (disabled by default).
    pub fn enable_prompt_cleanup_empty_line(&mut self, yes: bool) -> bool {
        self.config.set_prompt_cleanup_empty_line(yes)
    }

    /// Set matching brace pairs, `None` for the default `"()[]{}"`.
    pub fn set_matching_braces(&mut self, pairs: Option<&str>) {
        self.config.set_matching_braces(pairs);
    }

    /// Set insertion brace pairs, `None` for the default
    /// `"()[]{}\"\"''"`.
    pub fn set_insertion_braces(&mut self, pairs: Option<&str>) {
        self.config.set_insertion_braces(pairs);
    }

    /// Set the prompt marker and continuation marker. `None` restores
    /// the `"> "` default / makes the continuation equal to the marker.
    pub fn set_prompt_marker(&mut self, marker: Option<&str>, cmarker: Option<&str>) {
        self.config.set_prompt_marker(marker, cmarker);
    }

    /// Set the ESC disambiguation delays in milliseconds. The defaults
    /// are 100 and 10, increase them for very slow terminals.
    pub fn set_tty_esc_delay(&mut self, initial_ms: u64, followup_ms: u64) {
        self.config.set_esc_delays(initial_ms, followup_ms);
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    //-------------------------------------------------------------
    // Key bindings
    //-------------------------------------------------------------

    /// Bind a key to an action (replacing any previous binding).
    pub fn bind_key(&mut self, key: KeyEvent, action: Action) {
        self.bindings.bind(key, action);
    }

    /// Bind a key spec like `"ctrl+left"` to a named action like
    /// `"cursor-word-prev"`. Returns `false`, leaving all bindings
    /// intact, when either fails to parse.
    pub fn bind_key_named(&mut self, key_spec: &str, action_name: &str) -> bool {
        let (Some(key), Some(action)) = (parse_key_spec(key_spec), Action::from_name(action_name))
        else {
            return false;
        };
        self.bindings.bind(key, action);
        true
    }

    /// Remove the binding of `key`. Returns `false` when none existed.
    pub fn clear_key_binding(&mut self, key: KeyEvent) -> bool {
        self.bindings.clear(key)
    }

    /// Clear the runtime bindings and re-apply the active profile.
    pub fn reset_key_bindings(&mut self) {
        self.bindings.clear_all();
        self.profile.apply(&mut self.bindings);
    }

    /// Action bound to `key`, if any.
    pub fn get_key_binding(&self, key: KeyEvent) -> Option<Action> {
        self.bindings.get(key)
    }

    /// All current bindings.
    pub fn list_key_bindings(&self) -> &[BindingEntry] {
        self.bindings.list()
    }

    /// Switch to a named binding profile (`"emacs"`, `"vim"`); `None`
    /// selects the default. Returns `false` on an unknown name, leaving
    /// the bindings untouched.
    pub fn set_key_binding_profile(&mut self, name: Option<&str>) -> bool {
        let profile = match name {
            None => &EMACS,
            Some(name) => match profile_by_name(name) {
                Some(p) => p,
                None => return false,
            },
        };
        self.profile = profile;
        self.bindings.clear_all();
        self.profile.apply(&mut self.bindings);
        true
    }

    /// Name of the active binding profile.
    pub fn key_binding_profile(&self) -> &'static str {
        self.profile.name
    }

    /// All built-in profiles as `(name, description)` pairs.
    pub fn list_key_binding_profiles(&self) -> Vec<(&'static str, &'static str)> {
        PROFILES.iter().map(|p| (p.name, p.description)).collect()
    }

    /// Default key specs of `action` in the active profile.
    pub fn profile_default_specs(&self, action: Action) -> Option<&'static str> {
        self.profile.default_specs(action)
    }
}

/// Process keys until the read terminates.
fn edit_loop<R: RawReader, W: Renderer>(
    s: &mut State,
    reader: &mut R,
    out: &mut W,
    ctx: &EditCtx<'_>,
    bindings: &Bindings,
    history: &mut crate::history::History,
    profile: &'static Profile,
) -> Result<Exit> {
    let config = ctx.config;
    loop {
        out.flush()?;

        let key = if let Some(key) = s.pending_key.take() {
            key
        } else if config.hint_delay_ms() == 0 || !s.has_hint() {
            reader.read_key()?
        } else {
            match reader.read_key_timeout(config.hint_delay_ms())? {
                // a key before the delay: the pending hint never shows
                Some(key) => {
                    s.clear_hint();
                    key
                }
                None => {
                    // hint delay expired, display it and wait
                    s.refresh(out, ctx, true)?;
                    reader.read_key()?
                }
            }
        };

        if reader.take_resize() {
            s.resize(out, ctx)?;
        }

        let had_hint = s.has_hint();
        s.clear_hint();
        let had_extra = !s.extra.is_empty();
        if had_extra {
            s.extra.clear();
            s.extra_attrs = AttrBuffer::new();
        }

        // moving right into a displayed hint accepts the completion
        if had_hint
            && key.1.is_empty()
            && matches!(key.0, KeyCode::Virt(VirtualKey::Right | VirtualKey::End))
        {
            menu::generate_completions(s, reader, out, ctx, true)?;
            continue;
        }

        // the binding table comes first (events are never bindable)
        if key.to_code() < EVENT_BASE {
            if let Some(action) = bindings.lookup(key.to_code()) {
                if let Some(exit) =
                    execute_action(s, reader, out, ctx, history, profile, action, key)?
                {
                    break Ok(exit);
                }
                continue;
            }
        }

        let plain = key.1.is_empty();
        match key.0 {
            KeyCode::Char('\r') if plain => {
                if config.multiline() && s.is_continued(config) {
                    s.continue_line(config);
                    s.refresh(out, ctx, true)?;
                } else {
                    break Ok(Exit::Accept { via_enter: true });
                }
            }
            KeyCode::Char('\x04') if plain => {
                // EOF on an empty buffer, forward delete otherwise
                if s.line.is_empty() {
                    break Ok(Exit::Eof);
                }
                s.delete_char();
                s.refresh(out, ctx, true)?;
            }
            KeyCode::Char('\x03') if plain => break Ok(Exit::Interrupted),
            KeyCode::Event(EventKind::Stop) => break Ok(Exit::Interrupted),
            KeyCode::Char('\x1b') if plain => {
                if s.line.is_empty() {
                    break Ok(Exit::Accept { via_enter: false });
                }
                s.delete_all();
                s.refresh(out, ctx, true)?;
            }
            KeyCode::Char('\x07') if plain => {
                // Ctrl-G cancels with empty input
                s.delete_all();
                break Ok(Exit::Accept { via_enter: false });
            }
            KeyCode::Event(EventKind::Resize) => s.resize(out, ctx)?,
            KeyCode::Event(EventKind::AutoTab) => {
                menu::generate_completions(s, reader, out, ctx, true)?;
            }
            KeyCode::Virt(VirtualKey::F(1)) => {
                help::show_help(s, ctx, profile);
                s.refresh(out, ctx, true)?;
            }
            _ => {
                if let Some(c) = key.as_insert_char() {
                    s.insert_char(config, c);
                    s.refresh_with_hint(out, ctx)?;
                } else if had_hint || had_extra {
                    s.refresh(out, ctx, true)?;
                } else {
                    debug!(target: "inkline", "ignored key: {key:?}");
                }
            }
        }
    }
}

/// Run a bound action. `Some(exit)` terminates the read.
#[allow(clippy::too_many_arguments)]
fn execute_action<R: RawReader, W: Renderer>(
    s: &mut State,
    reader: &mut R,
    out: &mut W,
    ctx: &EditCtx<'_>,
    history: &mut crate::history::History,
    profile: &'static Profile,
    action: Action,
    key: KeyEvent,
) -> Result<Option<Exit>> {
    let config = ctx.config;
    match action {
        Action::None => {}
        Action::Complete => {
            return menu::generate_completions(s, reader, out, ctx, false).map(|()| None)
        }
        Action::HistorySearch => {
            return search::history_search(s, reader, out, ctx, history).map(|()| None)
        }
        Action::HistoryPrev => s.history_prev(history),
        Action::HistoryNext => s.history_next(history),
        Action::ClearScreen => return s.clear_screen(out, ctx).map(|()| None),
        Action::Undo => s.undo(),
        Action::Redo => s.redo(),
        Action::ShowHelp => help::show_help(s, ctx, profile),
        Action::CursorLeft => s.cursor_left(),
        Action::CursorRight => {
            if s.line.pos() == s.line.len() {
                return menu::generate_completions(s, reader, out, ctx, false).map(|()| None);
            }
            s.cursor_right();
        }
        Action::CursorUp => s.cursor_row_up(config, history),
        Action::CursorDown => s.cursor_row_down(config, history),
        Action::CursorLineStart => s.cursor_line_start(),
        Action::CursorLineEnd => s.cursor_line_end(),
        Action::CursorWordPrev => s.cursor_word_prev(),
        Action::CursorWordNext => {
            if s.line.pos() == s.line.len() {
                return menu::generate_completions(s, reader, out, ctx, false).map(|()| None);
            }
            s.cursor_word_next();
        }
        Action::CursorInputStart => s.cursor_to_start(),
        Action::CursorInputEnd => s.cursor_to_end(),
        Action::CursorMatchBrace => s.cursor_match_brace(config),
        Action::DeleteBackward => s.backspace(),
        Action::DeleteForward => {
            // Ctrl-D doubles as EOF on an empty buffer
            if key == KeyEvent::ctrl('d') && s.line.is_empty() {
                return Ok(Some(Exit::Eof));
            }
            s.delete_char();
        }
        Action::DeleteWordEnd => s.delete_to_word_end(),
        Action::DeleteWordStartWs => s.delete_to_ws_word_start(),
        Action::DeleteWordStart => s.delete_to_word_start(),
        Action::DeleteLineStart => s.delete_to_line_start(),
        Action::DeleteLineEnd => s.delete_to_line_end(),
        Action::TransposeChars => s.transpose_chars(),
        Action::InsertNewline => {
            if config.multiline() {
                s.insert_char(config, '\n');
                s.refresh_with_hint(out, ctx)?;
                return Ok(None);
            }
        }
    }
    s.refresh(out, ctx, true)?;
    Ok(None)
}
