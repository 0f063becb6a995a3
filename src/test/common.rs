//! Basic editing scenarios.
use assert_matches::assert_matches;

use super::{assert_line, assert_line_with_initial, chars, home, init_editor, ENTER, ESC};
use crate::keys::KeyEvent;
use crate::{ReadlineError, CTRL_C_TOKEN, CTRL_D_TOKEN};

#[test]
fn enter_key() {
    assert_line(&[ENTER], "");
    let mut keys = chars("a");
    keys.push(ENTER);
    assert_line(&keys, "a");
    assert_line_with_initial("Hi", &[ENTER], "Hi");
}

#[test]
fn ctrl_c_on_empty_input() {
    let mut editor = init_editor(&[KeyEvent::ctrl('c')]);
    assert_matches!(editor.readline(">>"), Err(ReadlineError::Interrupted));

    let mut editor = init_editor(&[KeyEvent::ctrl('c')]);
    assert_eq!(Some(CTRL_C_TOKEN.to_owned()), editor.readline_tokens(">>"));
}

#[test]
fn ctrl_d() {
    // EOF on an empty buffer
    let mut editor = init_editor(&[KeyEvent::ctrl('d')]);
    assert_matches!(editor.readline(">>"), Err(ReadlineError::Eof));

    let mut editor = init_editor(&[KeyEvent::ctrl('d')]);
    assert_eq!(Some(CTRL_D_TOKEN.to_owned()), editor.readline_tokens(">>"));

    // forward delete otherwise
    assert_line_with_initial(
        "abc",
        &[home(), KeyEvent::ctrl('d'), ENTER],
        "bc",
    );
}

#[test]
fn esc_on_empty_input_returns_empty() {
    assert_line(&[ESC], "");
    // non-empty input is deleted first, a second esc returns empty
    assert_line_with_initial("abc", &[ESC, ESC], "");
}

#[test]
fn ctrl_g_cancels_with_empty() {
    assert_line_with_initial("abc", &[KeyEvent::ctrl('g')], "");
}

#[test]
fn backslash_continuation() {
    let mut keys = chars("hello\\");
    keys.push(ENTER); // replaces the trailing \ with a newline
    keys.push(ENTER); // accepts
    assert_line(&keys, "hello\n");
}

#[test]
fn ctrl_j_inserts_newline() {
    let mut keys = chars("a");
    keys.push(KeyEvent::ctrl('j'));
    keys.extend(chars("b"));
    keys.push(ENTER);
    assert_line(&keys, "a\nb");
}

#[test]
fn multiline_disabled_ignores_newline() {
    let mut editor = init_editor(&[KeyEvent::ctrl('j'), ENTER]);
    editor.enable_multiline(false);
    assert_eq!("", editor.readline("").unwrap());
}

#[test]
fn word_delete_backward() {
    assert_line_with_initial("hello world", &[KeyEvent::ctrl('w'), ENTER], "hello ");
}

#[test]
fn auto_brace_insertion() {
    let mut keys = chars("()");
    keys.push(ENTER);
    assert_line(&keys, "()");
}

#[test]
fn undo_redo() {
    let mut keys = chars("ab");
    keys.push(KeyEvent::ctrl('z'));
    keys.push(ENTER);
    assert_line(&keys, "a");

    let mut keys = chars("ab");
    keys.push(KeyEvent::ctrl('z'));
    keys.push(KeyEvent::ctrl('y'));
    keys.push(ENTER);
    assert_line(&keys, "ab");
}

#[test]
fn transpose() {
    let mut keys = chars("ab");
    keys.push(KeyEvent::virt(crate::VirtualKey::Left));
    keys.push(KeyEvent::ctrl('t'));
    keys.push(ENTER);
    assert_line(&keys, "ba");
}

#[test]
fn kill_line_ops() {
    assert_line_with_initial("hello", &[KeyEvent::ctrl('u'), ENTER], "");
    assert_line_with_initial(
        "hello world",
        &[home(), KeyEvent::ctrl('k'), ENTER],
        "",
    );
}

#[test]
fn inline_right_annotation_is_not_input() {
    let mut editor = init_editor(&[ENTER]);
    let line = editor.readline_inline("", "[12:00:00]", None).unwrap();
    assert_eq!("", line);
    assert!(editor.term.output().contains("[12:00:00]"));
}

#[test]
fn repaint_is_idempotent() {
    use crate::config::Config;
    use crate::edit::{EditCtx, State};
    use crate::style::StyleTable;
    use crate::tty::{Term, Terminal};

    let config = Config::default();
    let styles = StyleTable::new();
    let ctx = EditCtx {
        config: &config,
        styles: &styles,
        highlighter: None,
        completer: None,
    };
    let term = Terminal::new(&config).unwrap();
    let mut out = term.create_writer(&config);
    let mut s = State::new("p".to_owned(), 0, None, 80);
    s.line.update("hello (world)", 7);

    s.refresh(&mut out, &ctx, true).unwrap();
    let first = term.output();
    s.refresh(&mut out, &ctx, true).unwrap();
    let second = term.output();
    assert_eq!(first, &second[first.len()..]);
}

#[test]
fn prompt_cleanup_rewrites_single_line() {
    let mut keys = chars("hi");
    keys.push(ENTER);
    let mut editor = init_editor(&keys);
    editor.enable_prompt_cleanup(true, 0);
    assert_eq!("hi", editor.readline("$").unwrap());
    assert!(editor.term.output().ends_with("$> hi\r\n"));
}

#[test]
fn multiline_prompt_prefix_lines() {
    let mut editor = init_editor(&[ENTER]);
    assert_eq!("", editor.readline("first\nsecond").unwrap());
    let out = editor.term.output();
    assert!(out.starts_with("first\r\n"));
    assert!(out.contains("second"));
}

#[test]
fn binding_profile_roundtrip() {
    let mut editor = init_editor(&[]);
    let fresh: Vec<_> = editor.list_key_bindings().to_vec();
    assert!(editor.set_key_binding_profile(Some("emacs")));
    editor.reset_key_bindings();
    assert_eq!(fresh, editor.list_key_bindings().to_vec());
    assert!(!editor.set_key_binding_profile(Some("nano")));
    assert_eq!("emacs", editor.key_binding_profile());
    assert!(editor.set_key_binding_profile(Some("vim")));
    assert_eq!("vim", editor.key_binding_profile());
}

#[test]
fn bind_key_named_failure_leaves_bindings() {
    let mut editor = init_editor(&[]);
    let before: Vec<_> = editor.list_key_bindings().to_vec();
    assert!(!editor.bind_key_named("ctrl+bogus+key", "undo"));
    assert!(!editor.bind_key_named("ctrl+x", "no-such-action"));
    assert_eq!(before, editor.list_key_bindings().to_vec());
    assert!(editor.bind_key_named("ctrl+x", "clear-screen"));
}

#[test]
fn suppressed_key_does_nothing() {
    let mut editor = init_editor(&[KeyEvent::ctrl('t'), ENTER]);
    editor.bind_key_named("ctrl+t", "suppress");
    assert_eq!("", editor.readline("").unwrap());
}
