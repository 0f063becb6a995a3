//! Wrapped-row layout: column widths, row splitting and cursor mapping.
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// A (row, column) position relative to the start of the edit region.
/// `col` does not include the prompt/continuation indent of the row.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RowCol {
    /// Row, 0-based from the first prompt row
    pub row: usize,
    /// Column within the row, excluding the indent
    pub col: usize,
    /// The position sits at the very end of its row's content
    pub last_on_row: bool,
}

/// One rendered row of a text laid out on the terminal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RowInfo {
    /// Row index, 0-based
    pub row: usize,
    /// Byte offset of the first content byte
    pub start: usize,
    /// Byte offset one past the last content byte (excludes any `\n`)
    pub end: usize,
    /// Columns of indent (prompt or continuation width)
    pub indent: usize,
    /// This row ends in a soft wrap rather than a `\n` or end of text
    pub is_wrap: bool,
}

/// Visual width of `s` in terminal columns. Combining marks take no
/// column, East-Asian wide characters take two; ANSI escape sequences are
/// skipped.
#[must_use]
pub fn str_width(s: &str) -> usize {
    let mut width = 0;
    let mut rest = s;
    while let Some(esc) = rest.find('\x1b') {
        width += rest[..esc].width();
        let tail = &rest[esc + 1..];
        // skip a CSI sequence up to its final byte, or one char otherwise
        rest = if let Some(params) = tail.strip_prefix('[') {
            match params.find(|c: char| c.is_ascii_alphabetic() || c == '~') {
                Some(end) => &params[end + 1..],
                None => "",
            }
        } else {
            let mut chars = tail.chars();
            chars.next();
            chars.as_str()
        };
    }
    width + rest.width()
}

/// Split `text` into rendered rows for a `termw`-column terminal. The first
/// row is indented by `promptw` columns, every following row (soft wraps
/// and logical lines alike) by `cpromptw`.
#[must_use]
pub fn layout_rows(text: &str, termw: usize, promptw: usize, cpromptw: usize) -> Vec<RowInfo> {
    let mut rows = Vec::new();
    let mut row = 0;
    let mut row_start = 0;
    let mut indent = promptw;
    let mut col = promptw;

    for (idx, g) in text.grapheme_indices(true) {
        if g == "\n" {
            rows.push(RowInfo {
                row,
                start: row_start,
                end: idx,
                indent,
                is_wrap: false,
            });
            row += 1;
            row_start = idx + 1;
            indent = cpromptw;
            col = cpromptw;
            continue;
        }
        let w = g.width();
        if col + w > termw && col > indent {
            rows.push(RowInfo {
                row,
                start: row_start,
                end: idx,
                indent,
                is_wrap: true,
            });
            row += 1;
            row_start = idx;
            indent = cpromptw;
            col = cpromptw;
        }
        col += w;
    }
    rows.push(RowInfo {
        row,
        start: row_start,
        end: text.len(),
        indent,
        is_wrap: false,
    });
    rows
}

/// Locate the row of byte offset `pos` within `rows`. A position exactly at
/// a soft wrap belongs to the following row.
#[must_use]
pub fn row_of(rows: &[RowInfo], pos: usize) -> usize {
    for (i, row) in rows.iter().enumerate() {
        if pos < row.end {
            return i;
        }
        if pos == row.end && (!row.is_wrap || i + 1 == rows.len()) {
            return i;
        }
    }
    rows.len() - 1
}

/// Compute `(total rows, row/col of pos)` for `text` laid out as above.
#[must_use]
pub fn rc_at_pos(
    text: &str,
    termw: usize,
    promptw: usize,
    cpromptw: usize,
    pos: usize,
) -> (usize, RowCol) {
    let rows = layout_rows(text, termw, promptw, cpromptw);
    let i = row_of(&rows, pos);
    let row = &rows[i];
    let col = str_width(&text[row.start..pos]);
    (
        rows.len(),
        RowCol {
            row: row.row,
            col,
            last_on_row: pos == row.end,
        },
    )
}

/// Byte offset of the cell at (`row`, `col`) in the laid-out `text`, or
/// `None` when `row` is out of range. Columns past the end of the row clamp
/// to the row end.
#[must_use]
pub fn pos_at_rc(
    text: &str,
    termw: usize,
    promptw: usize,
    cpromptw: usize,
    row: usize,
    col: usize,
) -> Option<usize> {
    let rows = layout_rows(text, termw, promptw, cpromptw);
    let info = rows.iter().find(|r| r.row == row)?;
    let mut width = 0;
    for (idx, g) in text[info.start..info.end].grapheme_indices(true) {
        if width >= col {
            return Some(info.start + idx);
        }
        width += g.width();
    }
    Some(info.end)
}

#[cfg(test)]
mod tests {
    use super::{layout_rows, pos_at_rc, rc_at_pos, str_width};

    #[test]
    fn widths() {
        assert_eq!(5, str_width("hello"));
        assert_eq!(4, str_width("日本")); // wide
        assert_eq!(1, str_width("e\u{301}")); // combining acute
        assert_eq!(2, str_width("\x1b[1;31mab\x1b[0m")); // ANSI skipped
    }

    #[test]
    fn wrap_rows() {
        // prompt of 2 columns, terminal of 8: first row fits 6 content cells
        let rows = layout_rows("abcdefgh", 8, 2, 0);
        assert_eq!(2, rows.len());
        assert_eq!((0, 6), (rows[0].start, rows[0].end));
        assert!(rows[0].is_wrap);
        assert_eq!((6, 8), (rows[1].start, rows[1].end));
        assert!(!rows[1].is_wrap);
    }

    #[test]
    fn logical_lines() {
        let rows = layout_rows("ab\ncd", 80, 4, 2);
        assert_eq!(2, rows.len());
        assert_eq!(4, rows[0].indent);
        assert_eq!(2, rows[1].indent);
        assert_eq!((3, 5), (rows[1].start, rows[1].end));
        assert!(!rows[0].is_wrap);
    }

    #[test]
    fn wide_char_wraps_early() {
        // "日" (2 cells) does not fit in the last single cell of the row
        let rows = layout_rows("abc日", 4, 0, 0);
        assert_eq!(2, rows.len());
        assert_eq!((0, 3), (rows[0].start, rows[0].end));
    }

    #[test]
    fn rc_and_back() {
        let text = "hello\nworld wide";
        let (rows, rc) = rc_at_pos(text, 8, 2, 2, 8);
        assert!(rows >= 2);
        assert_eq!(1, rc.row);
        assert_eq!(2, rc.col);
        assert_eq!(Some(8), pos_at_rc(text, 8, 2, 2, rc.row, rc.col));
    }

    #[test]
    fn last_on_row() {
        let (_, rc) = rc_at_pos("hello\\", 80, 2, 2, 6);
        assert!(rc.last_on_row);
        let (_, rc) = rc_at_pos("hello\\", 80, 2, 2, 3);
        assert!(!rc.last_on_row);
    }

    #[test]
    fn cursor_at_soft_wrap_moves_down() {
        let text = "abcdef";
        let (rows, rc) = rc_at_pos(text, 5, 2, 0, 3);
        assert_eq!(2, rows);
        assert_eq!((1, 0), (rc.row, rc.col));
    }

    #[test]
    fn random_widths_conserve_columns() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let text = "the quick brown 狐 jumps över the lazy 犬";
        for _ in 0..200 {
            let termw = rng.gen_range(1..=500);
            let promptw = rng.gen_range(0..4);
            let rows = layout_rows(text, termw, promptw, 1);
            let total: usize = rows.iter().map(|r| str_width(&text[r.start..r.end])).sum();
            assert_eq!(str_width(text), total, "termw {termw}");
        }
    }
}
