//! Completion, menu and hint scenarios.
use super::{chars, init_editor, right, ENTER, ESC};
use crate::completion::{complete_word, CompletionCtx};
use crate::keys::KeyEvent;

fn word_completer(words: &'static [&'static str]) -> impl Fn(&mut CompletionCtx<'_>, &str) {
    move |ctx: &mut CompletionCtx<'_>, _prefix: &str| {
        complete_word(ctx, None, |ctx, word| {
            for w in words {
                if w.starts_with(word) && !ctx.add(w) {
                    return;
                }
            }
        });
    }
}

#[test]
fn unique_completion_is_accepted() {
    let mut keys = chars("wo");
    keys.push(KeyEvent::TAB);
    keys.push(ENTER);
    let mut editor = init_editor(&keys);
    editor.set_completer(word_completer(&["world"]));
    assert_eq!("world", editor.readline("").unwrap());
}

#[test]
fn no_completion_beeps() {
    let mut keys = chars("zz");
    keys.push(KeyEvent::TAB);
    keys.push(ENTER);
    let mut editor = init_editor(&keys);
    editor.set_completer(word_completer(&["world"]));
    assert_eq!("zz", editor.readline("").unwrap());
    assert!(editor.term.output().contains('\x07'));
}

#[test]
fn menu_digit_selection() {
    let mut keys = chars("c");
    keys.push(KeyEvent::TAB);
    keys.extend(chars("2"));
    keys.push(ENTER);
    let mut editor = init_editor(&keys);
    editor.set_completer(word_completer(&["cat", "car", "cup"]));
    assert_eq!("car", editor.readline("").unwrap());
}

#[test]
fn menu_tab_cycles_and_enter_accepts() {
    let mut keys = chars("c");
    keys.push(KeyEvent::TAB); // open menu (selection on cat)
    keys.push(KeyEvent::TAB); // car
    keys.push(ENTER); // accept
    keys.push(ENTER); // accept the line
    let mut editor = init_editor(&keys);
    editor.set_completer(word_completer(&["cat", "car", "cup"]));
    assert_eq!("car", editor.readline("").unwrap());
}

#[test]
fn menu_esc_cancels() {
    let mut keys = chars("c");
    keys.push(KeyEvent::TAB);
    keys.push(ESC);
    keys.push(ENTER);
    let mut editor = init_editor(&keys);
    editor.set_completer(word_completer(&["cat", "car"]));
    assert_eq!("c", editor.readline("").unwrap());
}

#[test]
fn completion_undo_restores_input() {
    let mut keys = chars("wo");
    keys.push(KeyEvent::TAB);
    keys.push(KeyEvent::ctrl('z'));
    keys.push(ENTER);
    let mut editor = init_editor(&keys);
    editor.set_completer(word_completer(&["world"]));
    assert_eq!("wo", editor.readline("").unwrap());
}

#[test]
fn menu_selection_undo_restores_input() {
    let mut keys = chars("c");
    keys.push(KeyEvent::TAB);
    keys.extend(chars("1"));
    keys.push(KeyEvent::ctrl('z'));
    keys.push(ENTER);
    let mut editor = init_editor(&keys);
    editor.set_completer(word_completer(&["cat", "car"]));
    assert_eq!("c", editor.readline("").unwrap());
}

#[test]
fn hint_accept_with_right() {
    let mut keys = chars("b");
    keys.push(right());
    keys.push(ENTER);
    let mut editor = init_editor(&keys);
    editor.set_hint_delay(0);
    editor.set_completer(word_completer(&["bar"]));
    assert_eq!("bar", editor.readline("").unwrap());
}

#[test]
fn hint_is_never_returned_or_saved() {
    // a pending hint must not leak into the accepted value
    let mut keys = chars("b");
    keys.push(ENTER);
    let mut editor = init_editor(&keys);
    editor.set_hint_delay(0);
    editor.set_completer(word_completer(&["bar"]));
    assert_eq!("b", editor.readline("").unwrap());
    assert_ne!(Some("bar"), editor.history().get(0));
}

#[test]
fn spell_correction_fixes_typo() {
    let mut keys = chars("hellp");
    keys.push(KeyEvent::TAB);
    keys.push(ENTER);
    let mut editor = init_editor(&keys);
    editor.enable_spell_correct(true);
    editor.enable_hint(false);
    editor.set_completer(word_completer(&["hello"]));
    assert_eq!("hello", editor.readline("").unwrap());
}

#[test]
fn auto_tab_extends_unique_chain() {
    let mut keys = chars("a");
    keys.push(KeyEvent::TAB);
    keys.push(ENTER);
    let mut editor = init_editor(&keys);
    editor.enable_auto_tab(true);
    editor.enable_hint(false);
    editor.set_completer(|ctx: &mut CompletionCtx<'_>, _prefix: &str| {
        complete_word(ctx, None, |ctx, word| {
            // each step has exactly one longer match
            for w in ["ab", "abc", "abcd"] {
                if w.starts_with(word) && w.len() == word.len() + 1 {
                    ctx.add(w);
                }
            }
        });
    });
    assert_eq!("abcd", editor.readline("").unwrap());
}
