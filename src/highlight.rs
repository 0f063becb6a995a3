//! Syntax highlighting API, the attribute buffer and brace matching.
use anstyle::Style;

use crate::style::{names, StyleTable};

/// Byte-parallel style buffer for the rendered input.
#[derive(Debug, Default)]
pub struct AttrBuffer {
    attrs: Vec<Style>,
}

impl AttrBuffer {
    /// Empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to the plain style for every byte of `text`.
    pub fn reset(&mut self, text: &str) {
        self.attrs.clear();
        self.attrs.resize(text.len(), Style::new());
    }

    /// Number of covered bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Is the buffer empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Style `count` bytes starting at `pos` (clamped to the buffer).
    pub fn set(&mut self, pos: usize, count: usize, style: Style) {
        let end = pos.saturating_add(count).min(self.attrs.len());
        for attr in &mut self.attrs[pos.min(end)..end] {
            *attr = style;
        }
    }

    /// Insert `count` styled bytes at `pos`, shifting the tail (used for
    /// the transient hint bytes).
    pub fn insert_at(&mut self, pos: usize, count: usize, style: Style) {
        let pos = pos.min(self.attrs.len());
        self.attrs.splice(pos..pos, std::iter::repeat(style).take(count));
    }

    /// Style at byte `pos`.
    #[must_use]
    pub fn get(&self, pos: usize) -> Style {
        self.attrs.get(pos).copied().unwrap_or_default()
    }

    /// Append all attributes of `other`.
    pub fn append(&mut self, other: &AttrBuffer) {
        self.attrs.extend_from_slice(&other.attrs);
    }

    /// Append `count` bytes of `style` at the end.
    pub fn push(&mut self, count: usize, style: Style) {
        self.attrs.extend(std::iter::repeat(style).take(count));
    }

    /// Group a byte range into runs of equal style.
    pub fn runs(&self, start: usize, end: usize) -> Vec<(std::ops::Range<usize>, Style)> {
        let end = end.min(self.attrs.len());
        let start = start.min(end);
        let mut out: Vec<(std::ops::Range<usize>, Style)> = Vec::new();
        for (i, attr) in self.attrs[start..end].iter().enumerate() {
            let pos = start + i;
            match out.last_mut() {
                Some((range, style)) if *style == *attr && range.end == pos => {
                    range.end = pos + 1;
                }
                _ => out.push((pos..pos + 1, *attr)),
            }
        }
        out
    }
}

/// Passed to a [`Highlighter`] so it can attach styles to the input.
pub struct HighlightEnv<'a> {
    attrs: &'a mut AttrBuffer,
    styles: &'a StyleTable,
}

impl<'a> HighlightEnv<'a> {
    pub(crate) fn new(attrs: &'a mut AttrBuffer, styles: &'a StyleTable) -> Self {
        Self { attrs, styles }
    }

    /// Style `count` bytes starting at byte `pos` with the named style.
    pub fn style(&mut self, pos: usize, count: usize, name: &str) {
        let style = self.styles.get(name);
        self.attrs.set(pos, count, style);
    }

    /// Style `count` bytes starting at byte `pos` with a concrete style.
    pub fn style_with(&mut self, pos: usize, count: usize, style: Style) {
        self.attrs.set(pos, count, style);
    }
}

/// User-provided syntax highlighter, called on every repaint.
pub trait Highlighter {
    /// Attach styles to `input` through `env`.
    fn highlight(&self, env: &mut HighlightEnv<'_>, input: &str);
}

impl<F> Highlighter for F
where
    F: Fn(&mut HighlightEnv<'_>, &str),
{
    fn highlight(&self, env: &mut HighlightEnv<'_>, input: &str) {
        self(env, input);
    }
}

/// All matched brace pairs and all offending (unmatched or mismatched)
/// brace positions of `s`, for the given `"()[]{}"`-style pair list.
fn scan_braces(s: &str, braces: &str) -> (Vec<(usize, usize)>, Vec<usize>) {
    let pairs: Vec<(char, char)> = {
        let mut it = braces.chars();
        let mut v = Vec::new();
        while let (Some(open), Some(close)) = (it.next(), it.next()) {
            v.push((open, close));
        }
        v
    };
    let mut stack: Vec<(usize, usize)> = Vec::new(); // (pair index, byte pos)
    let mut matched = Vec::new();
    let mut offending = Vec::new();
    for (i, c) in s.char_indices() {
        if let Some(kind) = pairs.iter().position(|(o, cl)| *o == c && *o == *cl) {
            // quote-like pair (open == close): toggles
            match stack.last() {
                Some((top, open_pos)) if *top == kind => {
                    matched.push((*open_pos, i));
                    stack.pop();
                }
                _ => stack.push((kind, i)),
            }
        } else if let Some(kind) = pairs.iter().position(|(o, _)| *o == c) {
            stack.push((kind, i));
        } else if let Some(kind) = pairs.iter().position(|(_, cl)| *cl == c) {
            match stack.last() {
                Some((top, open_pos)) if *top == kind => {
                    matched.push((*open_pos, i));
                    stack.pop();
                }
                _ => offending.push(i),
            }
        }
    }
    offending.extend(stack.iter().map(|(_, pos)| *pos));
    (matched, offending)
}

/// Is every brace of `s` balanced?
#[must_use]
pub fn braces_balanced(s: &str, braces: &str) -> bool {
    scan_braces(s, braces).1.is_empty()
}

/// Partner position of the brace at byte `pos`, if it has one.
#[must_use]
pub fn find_matching_brace(s: &str, pos: usize, braces: &str) -> Option<usize> {
    let (matched, _) = scan_braces(s, braces);
    matched.iter().find_map(|(open, close)| {
        if *open == pos {
            Some(*close)
        } else if *close == pos {
            Some(*open)
        } else {
            None
        }
    })
}

/// Overlay brace-match highlighting: the pair under the cursor gets the
/// `bracematch` style, offending braces the `error` style.
pub fn highlight_match_braces(
    s: &str,
    attrs: &mut AttrBuffer,
    pos: usize,
    braces: &str,
    styles: &StyleTable,
) {
    let (matched, offending) = scan_braces(s, braces);
    let error = styles.get(names::ERROR);
    for p in offending {
        attrs.set(p, 1, error);
    }
    let cursor_pair = matched
        .iter()
        .find(|(open, close)| *open == pos || *close == pos);
    if let Some((open, close)) = cursor_pair {
        let style = styles.get(names::BRACEMATCH);
        attrs.set(*open, 1, style);
        attrs.set(*close, 1, style);
    }
}

#[cfg(test)]
mod tests {
    use super::{braces_balanced, find_matching_brace, AttrBuffer, HighlightEnv};
    use crate::style::{names, StyleTable};
    use anstyle::Style;

    const BRACES: &str = "()[]{}";

    #[test]
    fn matching() {
        let s = "f(a[0], g(x))";
        assert_eq!(Some(12), find_matching_brace(s, 1, BRACES));
        assert_eq!(Some(1), find_matching_brace(s, 12, BRACES));
        assert_eq!(Some(5), find_matching_brace(s, 3, BRACES));
        assert_eq!(None, find_matching_brace(s, 0, BRACES));
        assert!(braces_balanced(s, BRACES));
    }

    #[test]
    fn unbalanced() {
        assert!(!braces_balanced("(]", BRACES));
        assert!(!braces_balanced("((", BRACES));
        assert!(braces_balanced("", BRACES));
        // a mismatched closer does not steal the later real match
        assert_eq!(Some(2), find_matching_brace("(])", 0, BRACES));
    }

    #[test]
    fn attr_runs() {
        let mut attrs = AttrBuffer::new();
        attrs.reset("hello");
        let styles = StyleTable::new();
        let mut env = HighlightEnv::new(&mut attrs, &styles);
        env.style(1, 2, names::ERROR);
        let runs = attrs.runs(0, 5);
        assert_eq!(3, runs.len());
        assert_eq!(0..1, runs[0].0);
        assert_eq!(1..3, runs[1].0);
        assert_eq!(styles.get(names::ERROR), runs[1].1);
        assert_eq!(3..5, runs[2].0);
    }

    #[test]
    fn hint_insertion_shifts() {
        let mut attrs = AttrBuffer::new();
        attrs.reset("ab");
        attrs.set(1, 1, Style::new().bold());
        attrs.insert_at(1, 3, Style::new().italic());
        assert_eq!(5, attrs.len());
        assert_eq!(Style::new().italic(), attrs.get(1));
        assert_eq!(Style::new().bold(), attrs.get(4));
    }
}
