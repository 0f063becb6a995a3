//! Input buffer with current cursor position and word navigation.
use std::ops::Range;

use memchr::{memchr, memrchr};

/// Separator set used for word boundaries: `[ \t\r\n,.;:/\(){}[\]]` and `\\`.
/// Any code point ≥ `0x80` counts as a word character.
const SEPARATORS: &[u8] = b" \t\r\n,.;:/\\(){}[]";

/// Whitespace class `[ \t\r\n]`.
#[must_use]
pub fn char_is_white(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Non-whitespace class.
#[must_use]
pub fn char_is_nonwhite(c: char) -> bool {
    !char_is_white(c)
}

/// Separator class used for word boundaries.
#[must_use]
pub fn char_is_separator(c: char) -> bool {
    c.is_ascii() && SEPARATORS.contains(&(c as u8))
}

/// Non-separator class (word characters).
#[must_use]
pub fn char_is_nonseparator(c: char) -> bool {
    !char_is_separator(c)
}

/// Letters `[A-Za-z]` and any code point ≥ `0x80`.
#[must_use]
pub fn char_is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || !c.is_ascii()
}

/// Digits `[0-9]`.
#[must_use]
pub fn char_is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Hexadecimal digits `[A-Fa-f0-9]`.
#[must_use]
pub fn char_is_hexdigit(c: char) -> bool {
    c.is_ascii_hexdigit()
}

/// Identifier letters `[A-Za-z0-9_-]` and any code point ≥ `0x80`.
#[must_use]
pub fn char_is_idletter(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

/// Filename letters: anything not in `" \t\r\n`@$><=;|&{}()[]"`.
#[must_use]
pub fn char_is_filename_letter(c: char) -> bool {
    !c.is_ascii() || !b" \t\r\n`@$><=;|&{}()[]".contains(&(c as u8))
}

/// If a token of class `is_token_char` starts at `pos`, return its length in
/// bytes, otherwise 0.
#[must_use]
pub fn is_token(s: &str, pos: usize, is_token_char: &dyn Fn(char) -> bool) -> usize {
    if pos > s.len() || !s.is_char_boundary(pos) {
        return 0;
    }
    // not a token start if the previous char is of the same class
    if s[..pos].chars().next_back().is_some_and(is_token_char) {
        return 0;
    }
    s[pos..]
        .chars()
        .take_while(|c| is_token_char(*c))
        .map(char::len_utf8)
        .sum()
}

/// Does the token at `pos` equal `token`? Returns the match length in bytes
/// (0 on no match); never matches prefixes or suffixes.
#[must_use]
pub fn match_token(s: &str, pos: usize, is_token_char: &dyn Fn(char) -> bool, token: &str) -> usize {
    let len = is_token(s, pos, is_token_char);
    if len == token.len() && s[pos..].starts_with(token) {
        len
    } else {
        0
    }
}

/// Does any of `tokens` match at `pos`? Returns the match length in bytes.
#[must_use]
pub fn match_any_token(
    s: &str,
    pos: usize,
    is_token_char: &dyn Fn(char) -> bool,
    tokens: &[&str],
) -> usize {
    let len = is_token(s, pos, is_token_char);
    if len > 0 && tokens.iter().any(|t| t.len() == len && s[pos..].starts_with(t)) {
        len
    } else {
        0
    }
}

/// Line buffer with current cursor position.
///
/// Invariant: `pos` is always a UTF-8 code point boundary in `0..=buf.len()`.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: String, // edited line
    pos: usize,  // current cursor position (byte position)
}

impl LineBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn init(line: &str, pos: usize) -> Self {
        let mut lb = Self::new();
        lb.update(line, pos);
        lb
    }

    /// Extracts a string slice containing the entire buffer.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Current cursor position (byte position).
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Move the cursor. `pos` must be a char boundary.
    pub fn set_pos(&mut self, pos: usize) {
        debug_assert!(self.buf.is_char_boundary(pos));
        self.pos = pos;
    }

    /// Returns the length of this buffer, in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if this buffer has a length of zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Set line content and cursor position.
    pub fn update(&mut self, buf: &str, pos: usize) {
        assert!(pos <= buf.len() && buf.is_char_boundary(pos));
        self.buf.clear();
        self.buf.push_str(buf);
        self.pos = pos;
    }

    /// Empty the buffer.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.pos = 0;
    }

    /// Returns the character at the current cursor position.
    #[must_use]
    pub fn char_at_cursor(&self) -> Option<char> {
        self.buf[self.pos..].chars().next()
    }

    /// Returns the character just before the current cursor position.
    #[must_use]
    pub fn char_before_cursor(&self) -> Option<char> {
        self.buf[..self.pos].chars().next_back()
    }

    /// Position of the previous code point before `pos`.
    #[must_use]
    pub fn prev_pos(&self, pos: usize) -> Option<usize> {
        self.buf[..pos].chars().next_back().map(|c| pos - c.len_utf8())
    }

    /// Position after the code point at `pos`.
    #[must_use]
    pub fn next_pos(&self, pos: usize) -> Option<usize> {
        self.buf[pos..].chars().next().map(|c| pos + c.len_utf8())
    }

    /// Insert `ch` at the cursor and advance the cursor past it.
    pub fn insert(&mut self, ch: char) {
        self.buf.insert(self.pos, ch);
        self.pos += ch.len_utf8();
    }

    /// Insert `text` at `idx` (leaves the cursor where its byte position
    /// was, adjusting for the shift when the insertion is before it).
    /// Returns the position just after the inserted text.
    pub fn insert_str(&mut self, idx: usize, text: &str) -> usize {
        self.buf.insert_str(idx, text);
        if self.pos >= idx {
            self.pos += text.len();
        }
        idx + text.len()
    }

    /// Remove the byte `range`, clamping the cursor into the remaining text.
    pub fn delete_range(&mut self, range: Range<usize>) {
        debug_assert!(self.buf.is_char_boundary(range.start));
        debug_assert!(self.buf.is_char_boundary(range.end));
        let len = range.end - range.start;
        if self.pos >= range.end {
            self.pos -= len;
        } else if self.pos > range.start {
            self.pos = range.start;
        }
        self.buf.drain(range);
    }

    /// Delete the code point at the cursor (like the `Delete` key).
    pub fn delete_char_at_cursor(&mut self) -> bool {
        if let Some(ch) = self.char_at_cursor() {
            let pos = self.pos;
            self.delete_range(pos..pos + ch.len_utf8());
            true
        } else {
            false
        }
    }

    /// Delete the code point before the cursor (like `Backspace`).
    pub fn delete_char_before_cursor(&mut self) -> bool {
        if let Some(ch) = self.char_before_cursor() {
            let pos = self.pos;
            self.delete_range(pos - ch.len_utf8()..pos);
            true
        } else {
            false
        }
    }

    /// Exchange the char before the cursor with the char at the cursor,
    /// leaving the cursor after both.
    pub fn transpose_chars(&mut self) -> bool {
        if self.pos == 0 || self.pos == self.buf.len() {
            return false;
        }
        let at = self.char_at_cursor().unwrap();
        let before = self.char_before_cursor().unwrap();
        let start = self.pos - before.len_utf8();
        self.buf
            .replace_range(start..self.pos + at.len_utf8(), &format!("{at}{before}"));
        self.pos = start + at.len_utf8() + before.len_utf8();
        true
    }

    /// Start of the logical line containing `pos` (bounded by `\n`).
    #[must_use]
    pub fn line_start(&self, pos: usize) -> usize {
        memrchr(b'\n', self.buf[..pos].as_bytes()).map_or(0, |i| i + 1)
    }

    /// End of the logical line containing `pos` (bounded by `\n`).
    #[must_use]
    pub fn line_end(&self, pos: usize) -> usize {
        memchr(b'\n', self.buf[pos..].as_bytes()).map_or(self.buf.len(), |i| pos + i)
    }

    fn prev_boundary(&self, pos: usize, is_word: &dyn Fn(char) -> bool) -> Option<usize> {
        if pos == 0 {
            return None;
        }
        let mut p = pos;
        // eat any separators on the left
        p -= self.buf[..p]
            .chars()
            .rev()
            .take_while(|c| !is_word(*c))
            .map(char::len_utf8)
            .sum::<usize>();
        // then eat the word itself
        p -= self.buf[..p]
            .chars()
            .rev()
            .take_while(|c| is_word(*c))
            .map(char::len_utf8)
            .sum::<usize>();
        Some(p)
    }

    fn next_boundary(&self, pos: usize, is_word: &dyn Fn(char) -> bool) -> Option<usize> {
        if pos >= self.buf.len() {
            return None;
        }
        let mut p = pos;
        p += self.buf[p..]
            .chars()
            .take_while(|c| !is_word(*c))
            .map(char::len_utf8)
            .sum::<usize>();
        p += self.buf[p..]
            .chars()
            .take_while(|c| is_word(*c))
            .map(char::len_utf8)
            .sum::<usize>();
        Some(p)
    }

    /// Start of the current (or previous) word.
    #[must_use]
    pub fn word_start(&self, pos: usize) -> Option<usize> {
        self.prev_boundary(pos, &char_is_nonseparator)
    }

    /// End of the current (or next) word.
    #[must_use]
    pub fn word_end(&self, pos: usize) -> Option<usize> {
        self.next_boundary(pos, &char_is_nonseparator)
    }

    /// Start of the current (or previous) whitespace-delimited word.
    #[must_use]
    pub fn ws_word_start(&self, pos: usize) -> Option<usize> {
        self.prev_boundary(pos, &char_is_nonwhite)
    }

    /// End of the current (or next) whitespace-delimited word.
    #[must_use]
    pub fn ws_word_end(&self, pos: usize) -> Option<usize> {
        self.next_boundary(pos, &char_is_nonwhite)
    }
}

#[cfg(test)]
mod tests {
    use super::{char_is_separator, is_token, match_any_token, match_token, LineBuffer};

    #[test]
    fn insert() {
        let mut s = LineBuffer::new();
        s.insert('α');
        assert_eq!("α", s.as_str());
        assert_eq!(2, s.pos());
        s.insert('ß');
        assert_eq!("αß", s.as_str());
        assert_eq!(4, s.pos());
        s.set_pos(0);
        s.insert('γ');
        assert_eq!("γαß", s.as_str());
        assert_eq!(2, s.pos());
    }

    #[test]
    fn insert_str_keeps_cursor() {
        let mut s = LineBuffer::init("world", 0);
        let end = s.insert_str(0, "hello ");
        assert_eq!("hello world", s.as_str());
        assert_eq!(6, end);
        assert_eq!(6, s.pos());
        let mut s = LineBuffer::init("hello", 5);
        s.insert_str(5, " world");
        assert_eq!(11, s.pos());
    }

    #[test]
    fn delete() {
        let mut s = LineBuffer::init("αß", 2);
        assert!(s.delete_char_at_cursor());
        assert_eq!("α", s.as_str());
        assert_eq!(2, s.pos());
        assert!(s.delete_char_before_cursor());
        assert_eq!("", s.as_str());
        assert_eq!(0, s.pos());
        assert!(!s.delete_char_before_cursor());
    }

    #[test]
    fn delete_range_clamps_cursor() {
        let mut s = LineBuffer::init("hello world", 8);
        s.delete_range(3..9);
        assert_eq!("helld", s.as_str());
        assert_eq!(3, s.pos());
        let mut s = LineBuffer::init("hello", 5);
        s.delete_range(0..2);
        assert_eq!(3, s.pos());
    }

    #[test]
    fn transpose() {
        let mut s = LineBuffer::init("ab", 1);
        assert!(s.transpose_chars());
        assert_eq!("ba", s.as_str());
        assert_eq!(2, s.pos());

        let mut s = LineBuffer::init("aßc", 1);
        assert!(s.transpose_chars());
        assert_eq!("ßac", s.as_str());
        assert_eq!(3, s.pos());

        let mut s = LineBuffer::init("ab", 2);
        assert!(!s.transpose_chars());
        let mut s = LineBuffer::init("ab", 0);
        assert!(!s.transpose_chars());
    }

    #[test]
    fn lines() {
        let s = LineBuffer::init("one\ntwo\nthree", 5);
        assert_eq!(4, s.line_start(5));
        assert_eq!(7, s.line_end(5));
        assert_eq!(0, s.line_start(2));
        assert_eq!(13, s.line_end(9));
    }

    #[test]
    fn words() {
        let s = LineBuffer::init("hello world", 11);
        assert_eq!(Some(6), s.word_start(11));
        assert_eq!(Some(0), s.word_start(6));
        assert_eq!(Some(5), s.word_end(0));
        assert_eq!(Some(11), s.word_end(5));
        // separators include punctuation, not only whitespace
        let s = LineBuffer::init("a.b/c", 5);
        assert_eq!(Some(4), s.word_start(5));
        // ws-words only split on whitespace
        let s = LineBuffer::init("a.b/c x", 7);
        assert_eq!(Some(6), s.ws_word_start(7));
        assert_eq!(Some(0), s.ws_word_start(6));
        assert_eq!(Some(5), s.ws_word_end(0));
    }

    #[test]
    fn unicode_words() {
        let s = LineBuffer::init("héllo wörld", 13);
        assert_eq!(Some(7), s.word_start(13));
        assert!(s.as_str().is_char_boundary(7));
    }

    #[test]
    fn random_ops_keep_invariants() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let alphabet = ['a', ' ', 'é', '日', '\n', '('];
        let mut s = LineBuffer::new();
        for _ in 0..5000 {
            match rng.gen_range(0..6) {
                0 => s.insert(alphabet[rng.gen_range(0..alphabet.len())]),
                1 => {
                    s.delete_char_before_cursor();
                }
                2 => {
                    s.delete_char_at_cursor();
                }
                3 => {
                    if let Some(p) = s.prev_pos(s.pos()) {
                        s.set_pos(p);
                    }
                }
                4 => {
                    if let Some(p) = s.next_pos(s.pos()) {
                        s.set_pos(p);
                    }
                }
                _ => {
                    if let Some(p) = s.word_start(s.pos()) {
                        s.set_pos(p);
                    }
                }
            }
            assert!(s.pos() <= s.len());
            assert!(s.as_str().is_char_boundary(s.pos()));
        }
    }

    #[test]
    fn char_classes() {
        assert!(char_is_separator('('));
        assert!(!char_is_separator('é'));
        assert_eq!(3, is_token("fun x", 0, &|c: char| c.is_ascii_alphabetic()));
        assert_eq!(0, is_token("fun x", 1, &|c: char| c.is_ascii_alphabetic()));
        assert_eq!(
            0,
            match_token("function", 0, &|c: char| c.is_ascii_alphabetic(), "fun")
        );
        assert_eq!(
            3,
            match_token("fun x", 0, &|c: char| c.is_ascii_alphabetic(), "fun")
        );
        assert_eq!(
            4,
            match_any_token("func x", 0, &|c: char| c.is_ascii_alphabetic(), &[
                "fun", "func"
            ])
        );
    }
}
