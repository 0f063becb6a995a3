//! Scenario tests driven through the in-memory terminal.
use crate::keys::{KeyEvent, VirtualKey};
use crate::Editor;

mod common;
mod completion;
mod history;

pub(crate) const ENTER: KeyEvent = KeyEvent::ENTER;
pub(crate) const ESC: KeyEvent = KeyEvent::ESC;

pub(crate) fn right() -> KeyEvent {
    KeyEvent::virt(VirtualKey::Right)
}

pub(crate) fn home() -> KeyEvent {
    KeyEvent::virt(VirtualKey::Home)
}

/// Script of plain character keys.
pub(crate) fn chars(s: &str) -> Vec<KeyEvent> {
    s.chars().map(KeyEvent::from_char).collect()
}

pub(crate) fn init_editor(keys: &[KeyEvent]) -> Editor {
    let editor = Editor::new().expect("editor");
    editor.term.feed(keys);
    editor
}

pub(crate) fn assert_line(keys: &[KeyEvent], expected: &str) {
    let mut editor = init_editor(keys);
    let line = editor.readline("").expect("readline");
    assert_eq!(expected, line);
}

pub(crate) fn assert_line_with_initial(initial: &str, keys: &[KeyEvent], expected: &str) {
    let mut editor = init_editor(keys);
    let line = editor.readline_with_initial("", initial).expect("readline");
    assert_eq!(expected, line);
}
