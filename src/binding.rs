//! Key-binding table, key-spec grammar and named binding profiles.
use std::fmt;

use crate::keys::{KeyCode, KeyCode32, KeyEvent, Modifiers, VirtualKey};

/// Editor operations a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Action {
    /// Swallow the key without any effect
    None,
    /// Generate completions / open the completion menu
    Complete,
    /// Incremental history search
    HistorySearch,
    /// Previous history entry
    HistoryPrev,
    /// Next history entry
    HistoryNext,
    /// Clear the screen and repaint
    ClearScreen,
    /// Undo the last edit
    Undo,
    /// Redo the last undone edit
    Redo,
    /// Show the key-binding help screen
    ShowHelp,
    /// Move one code point left
    CursorLeft,
    /// Move one code point right, or complete at the end of input
    CursorRight,
    /// Move one row up, or to the previous matching history entry
    CursorUp,
    /// Move one row down, or to the next matching history entry
    CursorDown,
    /// Move to the start of the current line
    CursorLineStart,
    /// Move to the end of the current line
    CursorLineEnd,
    /// Move to the start of the previous word
    CursorWordPrev,
    /// Move to the end of the next word, or complete at the end of input
    CursorWordNext,
    /// Move to the start of the input
    CursorInputStart,
    /// Move to the end of the input
    CursorInputEnd,
    /// Jump to the matching brace
    CursorMatchBrace,
    /// Delete the code point before the cursor
    DeleteBackward,
    /// Delete the code point under the cursor
    DeleteForward,
    /// Delete to the end of the current word
    DeleteWordEnd,
    /// Delete to the start of the current whitespace-delimited word
    DeleteWordStartWs,
    /// Delete to the start of the current word
    DeleteWordStart,
    /// Delete to the start of the current line
    DeleteLineStart,
    /// Delete to the end of the current line
    DeleteLineEnd,
    /// Swap the two code points around the cursor
    TransposeChars,
    /// Insert a newline (multiline input)
    InsertNewline,
}

/// Action names, first entry per action is the canonical one.
static ACTION_NAMES: &[(&str, Action)] = &[
    ("none", Action::None),
    ("suppress", Action::None),
    ("complete", Action::Complete),
    ("completion", Action::Complete),
    ("history-search", Action::HistorySearch),
    ("search-history", Action::HistorySearch),
    ("history-prev", Action::HistoryPrev),
    ("history-up", Action::HistoryPrev),
    ("history-next", Action::HistoryNext),
    ("history-down", Action::HistoryNext),
    ("clear-screen", Action::ClearScreen),
    ("cls", Action::ClearScreen),
    ("undo", Action::Undo),
    ("redo", Action::Redo),
    ("show-help", Action::ShowHelp),
    ("help", Action::ShowHelp),
    ("cursor-left", Action::CursorLeft),
    ("cursor-right", Action::CursorRight),
    ("cursor-right-smart", Action::CursorRight),
    ("cursor-up", Action::CursorUp),
    ("cursor-down", Action::CursorDown),
    ("cursor-line-start", Action::CursorLineStart),
    ("cursor-line-end", Action::CursorLineEnd),
    ("cursor-word-prev", Action::CursorWordPrev),
    ("cursor-word-next", Action::CursorWordNext),
    ("cursor-word-next-smart", Action::CursorWordNext),
    ("cursor-input-start", Action::CursorInputStart),
    ("cursor-input-end", Action::CursorInputEnd),
    ("cursor-match-brace", Action::CursorMatchBrace),
    ("delete-backward", Action::DeleteBackward),
    ("backspace", Action::DeleteBackward),
    ("delete-forward", Action::DeleteForward),
    ("delete", Action::DeleteForward),
    ("delete-word-end", Action::DeleteWordEnd),
    ("kill-word", Action::DeleteWordEnd),
    ("delete-word-start-ws", Action::DeleteWordStartWs),
    ("backward-kill-word-ws", Action::DeleteWordStartWs),
    ("delete-word-start", Action::DeleteWordStart),
    ("backward-kill-word", Action::DeleteWordStart),
    ("delete-line-start", Action::DeleteLineStart),
    ("delete-line-end", Action::DeleteLineEnd),
    ("transpose-chars", Action::TransposeChars),
    ("swap-chars", Action::TransposeChars),
    ("insert-newline", Action::InsertNewline),
    ("newline", Action::InsertNewline),
];

impl Action {
    /// Look up an action by (canonical or alias) name, case-insensitive.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        ACTION_NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, a)| *a)
    }

    /// Canonical name of this action.
    #[must_use]
    pub fn name(self) -> &'static str {
        ACTION_NAMES
            .iter()
            .find(|(_, a)| *a == self)
            .map_or("none", |(n, _)| n)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static KEY_NAMES: &[(&str, KeyEvent)] = &[
    ("tab", KeyEvent::TAB),
    ("enter", KeyEvent::ENTER),
    ("return", KeyEvent::ENTER),
    ("linefeed", KeyEvent::LINEFEED),
    ("lf", KeyEvent::LINEFEED),
    ("backspace", KeyEvent::BACKSPACE),
    ("bs", KeyEvent::BACKSPACE),
    ("delete", KeyEvent::virt(VirtualKey::Delete)),
    ("del", KeyEvent::virt(VirtualKey::Delete)),
    ("insert", KeyEvent::virt(VirtualKey::Insert)),
    ("ins", KeyEvent::virt(VirtualKey::Insert)),
    ("escape", KeyEvent::ESC),
    ("esc", KeyEvent::ESC),
    ("space", KeyEvent::from_char(' ')),
    ("left", KeyEvent::virt(VirtualKey::Left)),
    ("right", KeyEvent::virt(VirtualKey::Right)),
    ("up", KeyEvent::virt(VirtualKey::Up)),
    ("down", KeyEvent::virt(VirtualKey::Down)),
    ("home", KeyEvent::virt(VirtualKey::Home)),
    ("end", KeyEvent::virt(VirtualKey::End)),
    ("pageup", KeyEvent::virt(VirtualKey::PageUp)),
    ("pgup", KeyEvent::virt(VirtualKey::PageUp)),
    ("pagedown", KeyEvent::virt(VirtualKey::PageDown)),
    ("pgdn", KeyEvent::virt(VirtualKey::PageDown)),
];

fn lookup_named_key(token: &str) -> Option<KeyEvent> {
    if let Some((_, key)) = KEY_NAMES.iter().find(|(n, _)| n.eq_ignore_ascii_case(token)) {
        return Some(*key);
    }
    // f-keys beyond the explicit table
    let mut chars = token.chars();
    if matches!(chars.next(), Some('f' | 'F')) {
        if let Ok(n) = chars.as_str().parse::<u8>() {
            if (1..=24).contains(&n) {
                return Some(KeyEvent::virt(VirtualKey::F(n)));
            }
        }
    }
    None
}

/// Parse a human-readable key specification like `"ctrl+left"` or `"alt-b"`.
///
/// `+`, `-` and whitespace all separate tokens; modifier names are
/// `ctrl`/`control`/`c`, `alt`/`meta`/`option` and `shift`/`s`
/// (case-insensitive). Exactly one base token is required: a single
/// character, a named key (`tab`, `enter`, `backspace`, `delete`, `esc`,
/// `space`, arrows, `home`, `end`, `pageup`, `pagedown`, `insert`,
/// `f1`..`f24`) or `newline` for a linefeed. `ctrl` plus an ASCII letter
/// collapses to the compressed `CtrlA..CtrlZ` code.
#[must_use]
pub fn parse_key_spec(spec: &str) -> Option<KeyEvent> {
    let mut ctrl = false;
    let mut alt = false;
    let mut shift = false;
    let mut base: Option<(Option<char>, KeyEvent)> = None;

    for token in spec.split(['+', '-', ' ', '\t']).filter(|t| !t.is_empty()) {
        if token.eq_ignore_ascii_case("ctrl")
            || token.eq_ignore_ascii_case("control")
            || token.eq_ignore_ascii_case("c")
        {
            ctrl = true;
        } else if token.eq_ignore_ascii_case("alt")
            || token.eq_ignore_ascii_case("meta")
            || token.eq_ignore_ascii_case("option")
        {
            alt = true;
        } else if token.eq_ignore_ascii_case("shift") || token.eq_ignore_ascii_case("s") {
            shift = true;
        } else {
            if base.is_some() {
                return None; // two base tokens
            }
            let mut chars = token.chars();
            let first = chars.next()?;
            if chars.next().is_none() {
                let c = first.to_lowercase().next().unwrap_or(first);
                base = Some((Some(c), KeyEvent::from_char(c)));
            } else if let Some(named) = lookup_named_key(token) {
                base = Some((None, named));
            } else if token.eq_ignore_ascii_case("newline") {
                base = Some((None, KeyEvent::LINEFEED));
            } else {
                return None;
            }
        }
    }

    let (base_char, base_key) = base?;
    let mut key = match base_char {
        Some(c) if ctrl => {
            ctrl = false;
            KeyEvent::ctrl(c)
        }
        _ => base_key,
    };
    if ctrl {
        key.1 |= Modifiers::CTRL;
    }
    if alt {
        key.1 |= Modifiers::ALT;
    }
    if shift {
        key.1 |= Modifiers::SHIFT;
    }
    Some(key)
}

/// Format a key event back to its canonical `ctrl+alt+shift+base` spec.
///
/// Compressed control codes are rendered with the `ctrl+` prefix restored;
/// a key with no modifiers and no base formats as `"none"`. Returns `None`
/// for keys with no spec rendering (events, non-ASCII control codes).
#[must_use]
pub fn format_key_spec(key: KeyEvent) -> Option<String> {
    let mut out = String::new();
    let implicit_ctrl = key.is_implicit_ctrl();
    let mut push = |out: &mut String, token: &str| {
        if !out.is_empty() {
            out.push('+');
        }
        out.push_str(token);
    };

    if key.1.contains(Modifiers::CTRL) || implicit_ctrl {
        push(&mut out, "ctrl");
    }
    if key.1.contains(Modifiers::ALT) {
        push(&mut out, "alt");
    }
    if key.1.contains(Modifiers::SHIFT) {
        push(&mut out, "shift");
    }

    let base = match key.0 {
        _ if implicit_ctrl => {
            let KeyCode::Char(c) = key.0 else {
                unreachable!()
            };
            char::from(c as u8 - 1 + b'a').to_string()
        }
        KeyCode::Virt(VirtualKey::F(n)) if (1..=24).contains(&n) => format!("f{n}"),
        KeyCode::Virt(vk) => match vk {
            VirtualKey::Up => "up".to_owned(),
            VirtualKey::Down => "down".to_owned(),
            VirtualKey::Left => "left".to_owned(),
            VirtualKey::Right => "right".to_owned(),
            VirtualKey::Home => "home".to_owned(),
            VirtualKey::End => "end".to_owned(),
            VirtualKey::Delete => "delete".to_owned(),
            VirtualKey::PageUp => "pageup".to_owned(),
            VirtualKey::PageDown => "pagedown".to_owned(),
            VirtualKey::Insert => "insert".to_owned(),
            VirtualKey::F(_) => return None,
        },
        KeyCode::Char('\t') => "tab".to_owned(),
        KeyCode::Char('\r') => "enter".to_owned(),
        KeyCode::Char('\n') => "linefeed".to_owned(),
        KeyCode::Char('\x08') | KeyCode::Char('\x7f') => "backspace".to_owned(),
        KeyCode::Char('\x1b') => "esc".to_owned(),
        KeyCode::Char(' ') => "space".to_owned(),
        KeyCode::Char('\0') => String::new(),
        KeyCode::Char(c) if (' '..='\x7e').contains(&c) => c.to_string(),
        KeyCode::Char(_) | KeyCode::Event(_) => return None,
    };
    if !base.is_empty() {
        push(&mut out, &base);
    }
    if out.is_empty() {
        out.push_str("none");
    }
    Some(out)
}

/// A single `(keycode, action)` binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingEntry {
    /// Raw key code (see [`KeyEvent::to_code`])
    pub key: KeyCode32,
    /// Bound action
    pub action: Action,
}

/// Flat key-binding table with linear lookup.
///
/// Expected to stay small (tens of entries); re-binding a key replaces the
/// existing entry in place.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: Vec<BindingEntry>,
}

impl Bindings {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to `action`, replacing any previous binding of that key.
    pub fn bind(&mut self, key: KeyEvent, action: Action) {
        let code = key.to_code();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == code) {
            entry.action = action;
        } else {
            self.entries.push(BindingEntry { key: code, action });
        }
    }

    /// Remove the binding of `key`. Returns `false` if none existed.
    pub fn clear(&mut self, key: KeyEvent) -> bool {
        let code = key.to_code();
        let before = self.entries.len();
        self.entries.retain(|e| e.key != code);
        before != self.entries.len()
    }

    /// Action bound to `key`, if any.
    #[must_use]
    pub fn get(&self, key: KeyEvent) -> Option<Action> {
        self.lookup(key.to_code())
    }

    /// Action bound to a raw key code, if any.
    #[must_use]
    pub fn lookup(&self, code: KeyCode32) -> Option<Action> {
        self.entries.iter().find(|e| e.key == code).map(|e| e.action)
    }

    /// All current bindings, in insertion order.
    #[must_use]
    pub fn list(&self) -> &[BindingEntry] {
        &self.entries
    }

    pub(crate) fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Bind every `|`-separated key spec in `specs` to `action`.
    /// Returns `false` (leaving any already-inserted bindings) on the first
    /// spec that fails to parse.
    fn bind_specs(&mut self, action: Action, specs: &str) -> bool {
        for spec in specs.split('|').map(str::trim).filter(|s| !s.is_empty()) {
            match parse_key_spec(spec) {
                Some(key) => self.bind(key, action),
                None => return false,
            }
        }
        true
    }
}

/// A named set of default bindings, optionally inheriting from a parent.
#[derive(Debug)]
pub struct Profile {
    /// Profile name (`"emacs"`, `"vim"`)
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    parent: Option<&'static Profile>,
    /// `(action, "spec|spec|…")` describing the full effective defaults,
    /// used by help output and [`Profile::default_specs`].
    specs: &'static [(Action, &'static str)],
    /// Bindings this profile inserts on top of its parent.
    overrides: &'static [(Action, &'static str)],
}

impl Profile {
    /// Default key specs for `action` in this profile (falls back to the
    /// parent chain).
    #[must_use]
    pub fn default_specs(&self, action: Action) -> Option<&'static str> {
        self.specs
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, s)| *s)
            .or_else(|| self.parent.and_then(|p| p.default_specs(action)))
    }

    /// Apply this profile (parent first) onto `bindings`.
    pub(crate) fn apply(&self, bindings: &mut Bindings) -> bool {
        if let Some(parent) = self.parent {
            if !parent.apply(bindings) {
                return false;
            }
        }
        for (action, specs) in self.overrides {
            if !bindings.bind_specs(*action, specs) {
                return false;
            }
        }
        true
    }
}

#[cfg(not(target_os = "macos"))]
mod specs {
    pub const CURSOR_WORD_PREV: &str = "ctrl+left|shift+left|alt+b";
    pub const CURSOR_WORD_NEXT: &str = "ctrl+right|shift+right|alt+f";
    pub const INSERT_NEWLINE: &str = "ctrl+enter|ctrl+j";
}
#[cfg(target_os = "macos")]
mod specs {
    pub const CURSOR_WORD_PREV: &str = "shift+left|alt+b";
    pub const CURSOR_WORD_NEXT: &str = "shift+right|alt+f";
    pub const INSERT_NEWLINE: &str = "shift+tab|ctrl+j";
}

static EMACS_SPECS: &[(Action, &str)] = &[
    (Action::CursorLeft, "left|ctrl+b"),
    (Action::CursorRight, "right|ctrl+f"),
    (Action::CursorUp, "up"),
    (Action::CursorDown, "down"),
    (Action::CursorWordPrev, specs::CURSOR_WORD_PREV),
    (Action::CursorWordNext, specs::CURSOR_WORD_NEXT),
    (Action::CursorLineStart, "home|ctrl+a"),
    (Action::CursorLineEnd, "end|ctrl+e"),
    (Action::CursorInputStart, "ctrl+home|shift+home|pageup|alt+<"),
    (Action::CursorInputEnd, "ctrl+end|shift+end|pagedown|alt+>"),
    (Action::CursorMatchBrace, "alt+m"),
    (Action::HistoryPrev, "ctrl+p"),
    (Action::HistoryNext, "ctrl+n"),
    (Action::HistorySearch, "ctrl+r|ctrl+s"),
    (Action::DeleteForward, "delete|ctrl+d"),
    (Action::DeleteBackward, "backspace|ctrl+h"),
    (Action::DeleteWordEnd, "alt+d"),
    (Action::DeleteWordStartWs, "ctrl+w"),
    (Action::DeleteWordStart, "alt+backspace|alt+delete"),
    (Action::DeleteLineStart, "ctrl+u"),
    (Action::DeleteLineEnd, "ctrl+k"),
    (Action::TransposeChars, "ctrl+t"),
    (Action::ClearScreen, "ctrl+l"),
    (Action::Undo, "ctrl+z|ctrl+_"),
    (Action::Redo, "ctrl+y"),
    (Action::Complete, "tab|alt+?"),
    (Action::InsertNewline, specs::INSERT_NEWLINE),
];

/// Emacs-style bindings, the default profile.
pub static EMACS: Profile = Profile {
    name: "emacs",
    description: "Emacs-style bindings (default)",
    parent: None,
    specs: EMACS_SPECS,
    overrides: EMACS_SPECS,
};

static VIM_SPECS: &[(Action, &str)] = &[
    (Action::CursorLeft, "left|ctrl+b|alt+h"),
    (Action::CursorRight, "right|ctrl+f|alt+l"),
    (Action::CursorUp, "up|alt+k"),
    (Action::CursorDown, "down|alt+j"),
    (Action::CursorWordNext, "alt+w"),
];

static VIM_OVERRIDES: &[(Action, &str)] = &[
    (Action::CursorLeft, "alt+h"),
    (Action::CursorRight, "alt+l"),
    (Action::CursorUp, "alt+k"),
    (Action::CursorDown, "alt+j"),
    (Action::CursorWordNext, "alt+w"),
];

/// Vim-inspired navigation overlay on top of the emacs profile.
pub static VIM: Profile = Profile {
    name: "vim",
    description: "Vim-inspired navigation bindings (Alt+H/J/K/L, Alt+W)",
    parent: Some(&EMACS),
    specs: VIM_SPECS,
    overrides: VIM_OVERRIDES,
};

/// All built-in profiles.
pub static PROFILES: &[&Profile] = &[&EMACS, &VIM];

/// Look up a built-in profile by name, case-insensitive.
#[must_use]
pub fn profile_by_name(name: &str) -> Option<&'static Profile> {
    PROFILES
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .copied()
}
