//! History navigation and incremental search scenarios.
use super::{chars, init_editor, ENTER, ESC};
use crate::keys::{KeyEvent, VirtualKey};

fn editor_with_history(entries: &[&str], keys: &[KeyEvent]) -> crate::Editor {
    let mut editor = init_editor(keys);
    for e in entries {
        editor.history_add(e);
    }
    editor
}

#[test]
fn ctrl_p_walks_back() {
    let mut editor = editor_with_history(
        &["first", "second"],
        &[KeyEvent::ctrl('p'), KeyEvent::ctrl('p'), ENTER],
    );
    assert_eq!("first", editor.readline("").unwrap());
}

#[test]
fn ctrl_n_walks_forward() {
    let mut editor = editor_with_history(
        &["first", "second"],
        &[
            KeyEvent::ctrl('p'),
            KeyEvent::ctrl('p'),
            KeyEvent::ctrl('n'),
            ENTER,
        ],
    );
    assert_eq!("second", editor.readline("").unwrap());
}

#[test]
fn navigation_preserves_draft() {
    let mut keys = chars("draft");
    keys.push(KeyEvent::ctrl('p'));
    keys.push(KeyEvent::ctrl('n'));
    keys.push(ENTER);
    let mut editor = editor_with_history(&["older"], &keys);
    assert_eq!("draft", editor.readline("").unwrap());
}

#[test]
fn accepted_line_is_added_once() {
    let mut keys = chars("make");
    keys.push(ENTER);
    let mut editor = init_editor(&keys);
    assert_eq!("make", editor.readline("").unwrap());
    assert_eq!(Some("make"), editor.history().get(0));
    assert_eq!(1, editor.history().len());
}

#[test]
fn short_input_is_not_kept() {
    let mut keys = chars("x");
    keys.push(ENTER);
    let mut editor = init_editor(&keys);
    assert_eq!("x", editor.readline("").unwrap());
    assert_eq!(0, editor.history().len());
}

#[test]
fn cancelled_read_leaves_history_untouched() {
    let mut keys = chars("typed");
    keys.push(KeyEvent::ctrl('c'));
    let mut editor = editor_with_history(&["kept"], &keys);
    assert!(editor.readline("").is_err());
    assert_eq!(1, editor.history().len());
    assert_eq!(Some("kept"), editor.history().get(0));
}

#[test]
fn prefix_navigation_with_up() {
    let mut keys = chars("git");
    keys.push(KeyEvent::virt(VirtualKey::Up));
    keys.push(ENTER);
    let mut editor = editor_with_history(&["git status", "make", "git push"], &keys);
    assert_eq!("git push", editor.readline("").unwrap());
}

#[test]
fn incremental_search_accepts_match() {
    let mut keys = vec![KeyEvent::ctrl('r')];
    keys.extend(chars("ca"));
    keys.push(ENTER); // accept the match
    keys.push(ENTER); // accept the line
    let mut editor = editor_with_history(&["make test", "cargo build"], &keys);
    assert_eq!("cargo build", editor.readline("").unwrap());
}

#[test]
fn incremental_search_ctrl_r_goes_older() {
    let mut keys = vec![KeyEvent::ctrl('r')];
    keys.extend(chars("make"));
    keys.push(KeyEvent::ctrl('r')); // next older match
    keys.push(ENTER);
    keys.push(ENTER);
    let mut editor = editor_with_history(&["make check", "make test"], &keys);
    assert_eq!("make check", editor.readline("").unwrap());
}

#[test]
fn incremental_search_esc_restores_input() {
    let mut keys = chars("draft");
    keys.push(KeyEvent::ctrl('r'));
    keys.extend(chars("make"));
    keys.push(ESC);
    keys.push(ENTER);
    let mut editor = editor_with_history(&["make test"], &keys);
    assert_eq!("draft", editor.readline("").unwrap());
}

#[test]
fn search_coalesces_into_one_undo() {
    let mut keys = vec![KeyEvent::ctrl('r')];
    keys.extend(chars("ca"));
    keys.push(ENTER); // accept the match into the buffer
    keys.push(KeyEvent::ctrl('z')); // one undo restores the pre-search state
    keys.push(ENTER);
    let mut editor = editor_with_history(&["cargo build"], &keys);
    assert_eq!("", editor.readline("").unwrap());
}
