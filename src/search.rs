//! Incremental history search (Ctrl-R / Ctrl-S).
use crate::edit::{EditCtx, State};
use crate::highlight::AttrBuffer;
use crate::history::{History, SearchDirection, SearchResult};
use crate::keys::{KeyCode, Modifiers, VirtualKey};
use crate::style::names;
use crate::tty::{RawReader, Renderer};
use crate::Result;

/// One undoable step of the search: pattern length and match before the
/// last extension.
struct Snapshot {
    pattern_len: usize,
    matched: Option<SearchResult>,
}

/// Match `pattern` at entry `from` or any older entry.
fn find_at_or_older(history: &History, pattern: &str, from: usize) -> Option<SearchResult> {
    history
        .search_at(pattern, from)
        .or_else(|| history.search(pattern, from, SearchDirection::Reverse))
}

/// Modal incremental search over the history. The search starts from the
/// word before the cursor; all buffer changes coalesce into a single
/// undoable edit.
pub(crate) fn history_search<R: RawReader, W: Renderer>(
    s: &mut State,
    reader: &mut R,
    out: &mut W,
    ctx: &EditCtx<'_>,
    history: &mut History,
) -> Result<()> {
    let original = (s.line.as_str().to_owned(), s.line.pos());
    if s.history_idx == 0 {
        history.stash(&original.0);
    }

    // one coalesced undo step for the whole search
    s.start_modify();
    let was_disabled = s.changes.disabled;
    s.changes.disabled = true;

    let word_start = s.line.word_start(s.line.pos()).unwrap_or(s.line.pos());
    let mut pattern = original.0[word_start..original.1].to_owned();
    let mut snapshots: Vec<Snapshot> = Vec::new();
    let mut matched = if pattern.is_empty() {
        None
    } else {
        find_at_or_older(history, &pattern, s.history_idx)
    };

    let accepted = loop {
        // show the matched entry (or the original input) with a search
        // prompt below
        match matched {
            Some(m) => {
                let entry = history.get(m.idx).unwrap_or_default().to_owned();
                let end = m.end;
                s.line.update(&entry, end);
            }
            None => s.line.update(&original.0, original.1),
        }
        if ctx.config.inline_help() {
            let mut text = format!("history search: {pattern}");
            if matched.is_none() && !pattern.is_empty() {
                text.push_str("  (no match)");
            }
            let mut attrs = AttrBuffer::new();
            attrs.push(
                text.len(),
                if matched.is_none() && !pattern.is_empty() {
                    ctx.styles.get(names::ERROR)
                } else {
                    ctx.styles.get(names::INFO)
                },
            );
            s.extra = text;
            s.extra_attrs = attrs;
        }
        s.refresh(out, ctx, false)?;

        let key = reader.read_key()?;
        let plain = key.1.is_empty();
        match key.0 {
            // extend the pattern
            KeyCode::Char(c) if plain && !c.is_control() => {
                snapshots.push(Snapshot {
                    pattern_len: pattern.len(),
                    matched,
                });
                pattern.push(c);
                let from = matched.map_or(s.history_idx, |m| m.idx);
                matched = find_at_or_older(history, &pattern, from);
            }
            // next older match (ctrl+r, tab)
            KeyCode::Char('\x12' | '\t') if plain => {
                if let Some(m) = matched {
                    if let Some(next) = history.search(&pattern, m.idx, SearchDirection::Reverse) {
                        snapshots.push(Snapshot {
                            pattern_len: pattern.len(),
                            matched,
                        });
                        matched = Some(next);
                    } else {
                        out.beep();
                    }
                }
            }
            // next newer match (ctrl+s, shift+tab)
            KeyCode::Char('\x13') if plain => {
                search_newer(history, &pattern, &mut matched, &mut snapshots, out);
            }
            KeyCode::Char('\t') if key.1 == Modifiers::SHIFT => {
                search_newer(history, &pattern, &mut matched, &mut snapshots, out);
            }
            // undo the last search step (backspace, ctrl+z)
            KeyCode::Char('\x08' | '\x7f' | '\x1a') if plain => match snapshots.pop() {
                Some(snap) => {
                    pattern.truncate(snap.pattern_len);
                    matched = snap.matched;
                }
                None => break false,
            },
            KeyCode::Char('\r') if plain => break true,
            KeyCode::Char('\x1b') if plain => break false,
            KeyCode::Virt(VirtualKey::Up) => {
                search_older_key(history, &pattern, &mut matched, &mut snapshots, out);
            }
            KeyCode::Virt(VirtualKey::Down) => {
                search_newer(history, &pattern, &mut matched, &mut snapshots, out);
            }
            _ => {
                // leave search mode and re-dispatch the key
                s.pending_key = Some(key);
                break true;
            }
        }
    };

    s.changes.disabled = was_disabled;
    s.extra.clear();
    s.extra_attrs = AttrBuffer::new();
    if accepted {
        if let Some(m) = matched {
            s.history_idx = m.idx;
        }
        // the buffer already shows the accepted entry
        if s.line.as_str() == original.0 && s.line.pos() == original.1 {
            s.changes.forget_last();
        }
    } else {
        s.line.update(&original.0, original.1);
        s.changes.forget_last();
    }
    s.refresh(out, ctx, true)
}

fn search_older_key<W: Renderer>(
    history: &History,
    pattern: &str,
    matched: &mut Option<SearchResult>,
    snapshots: &mut Vec<Snapshot>,
    out: &mut W,
) {
    if let Some(m) = *matched {
        if let Some(next) = history.search(pattern, m.idx, SearchDirection::Reverse) {
            snapshots.push(Snapshot {
                pattern_len: pattern.len(),
                matched: *matched,
            });
            *matched = Some(next);
        } else {
            out.beep();
        }
    }
}

fn search_newer<W: Renderer>(
    history: &History,
    pattern: &str,
    matched: &mut Option<SearchResult>,
    snapshots: &mut Vec<Snapshot>,
    out: &mut W,
) {
    if let Some(m) = *matched {
        if let Some(next) = history.search(pattern, m.idx, SearchDirection::Forward) {
            snapshots.push(Snapshot {
                pattern_len: pattern.len(),
                matched: *matched,
            });
            *matched = Some(next);
        } else {
            out.beep();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::find_at_or_older;
    use crate::history::History;

    #[test]
    fn inclusive_search() {
        let mut history = History::new();
        for e in ["make check", "make test", ""] {
            history.push(e);
        }
        // from the placeholder the newest match wins
        let m = find_at_or_older(&history, "make", 0).unwrap();
        assert_eq!(1, m.idx);
        // searching "at or older" from an existing match keeps it
        let m = find_at_or_older(&history, "make", 1).unwrap();
        assert_eq!(1, m.idx);
        let m = find_at_or_older(&history, "check", 1).unwrap();
        assert_eq!(2, m.idx);
    }
}
