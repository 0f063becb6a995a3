//! Completion generation, acceptance, auto-tab and the menu modal loop.
use anstyle::Style;

use crate::completion::{generate, Candidate, MAX_COMPLETIONS};
use crate::edit::{EditCtx, State};
use crate::highlight::AttrBuffer;
use crate::keys::{KeyCode, Modifiers, VirtualKey};
use crate::style::names;
use crate::tty::{RawReader, Renderer};
use crate::Result;

/// Candidates shown per menu page (selectable with digits 1..9).
const MENU_PAGE: usize = 9;
/// Safety bound on auto-tab continuation rounds.
const AUTOTAB_ROUNDS: usize = 64;

/// Collect completions at the cursor and act on them: beep on none,
/// accept a unique one (continuing while `autotab` finds unique matches),
/// or run the menu.
pub(crate) fn generate_completions<R: RawReader, W: Renderer>(
    s: &mut State,
    reader: &mut R,
    out: &mut W,
    ctx: &EditCtx<'_>,
    autotab: bool,
) -> Result<()> {
    let Some(completer) = ctx.completer else {
        return Ok(());
    };
    let candidates = generate(
        completer,
        s.line.as_str(),
        s.line.pos(),
        MAX_COMPLETIONS,
        ctx.config.spell_correct(),
    );
    match candidates.len() {
        0 => {
            out.beep();
            s.refresh(out, ctx, true)
        }
        1 => {
            accept(s, &candidates[0]);
            if autotab || ctx.config.auto_tab() {
                auto_extend(s, ctx);
            }
            s.refresh(out, ctx, true)
        }
        _ => menu_loop(s, reader, out, ctx, candidates),
    }
}

/// Apply a candidate as a single undoable edit.
fn accept(s: &mut State, candidate: &Candidate) {
    s.start_modify();
    candidate.apply(&mut s.line);
}

/// Keep accepting as long as exactly one candidate is found. The whole
/// extension stays part of the undo step opened by [`accept`].
fn auto_extend(s: &mut State, ctx: &EditCtx<'_>) {
    let Some(completer) = ctx.completer else {
        return;
    };
    for _ in 0..AUTOTAB_ROUNDS {
        let candidates = generate(completer, s.line.as_str(), s.line.pos(), 2, false);
        if candidates.len() != 1 {
            break;
        }
        let before = (s.line.as_str().to_owned(), s.line.pos());
        candidates[0].apply(&mut s.line);
        if s.line.as_str() == before.0 && s.line.pos() == before.1 {
            break;
        }
    }
}

/// Build the menu block into the extra area.
fn build_menu(s: &mut State, ctx: &EditCtx<'_>, candidates: &[Candidate], sel: usize) {
    let select = ctx.styles.get(names::SELECT);
    let info = ctx.styles.get(names::INFO);
    let page = sel / MENU_PAGE;
    let start = page * MENU_PAGE;
    let end = (start + MENU_PAGE).min(candidates.len());

    let mut text = String::new();
    let mut attrs = AttrBuffer::new();
    let push_line = |text: &mut String, attrs: &mut AttrBuffer, line: &str, style: Style| {
        text.push_str(line);
        attrs.push(line.len(), style);
        text.push('\n');
        attrs.push(1, Style::new());
    };

    for (i, candidate) in candidates[start..end].iter().enumerate() {
        let idx = start + i;
        let mut line = format!("{} {}", i + 1, candidate.display());
        if let Some(source) = &candidate.source {
            line.push_str(&format!(" ({source})"));
        }
        let style = if idx == sel { select } else { Style::new() };
        push_line(&mut text, &mut attrs, &line, style);
    }
    if candidates.len() > end || start > 0 {
        let line = format!(
            "({}-{} of {}, tab or pgdn for more)",
            start + 1,
            end,
            candidates.len()
        );
        push_line(&mut text, &mut attrs, &line, info);
    }
    if ctx.config.inline_help() {
        if let Some(help) = &candidates[sel].help {
            push_line(&mut text, &mut attrs, help, info);
        }
    }
    // drop the trailing newline so the menu does not render a blank row
    if text.ends_with('\n') {
        text.pop();
    }
    s.extra = text;
    s.extra_attrs = attrs;
}

/// Modal menu loop: navigate with Tab/Shift-Tab/arrows/digits, accept with
/// Enter (or Left), cancel with Esc. While open, the selected candidate is
/// previewed in the input when enabled.
fn menu_loop<R: RawReader, W: Renderer>(
    s: &mut State,
    reader: &mut R,
    out: &mut W,
    ctx: &EditCtx<'_>,
    candidates: Vec<Candidate>,
) -> Result<()> {
    let backup = (s.line.as_str().to_owned(), s.line.pos());
    let was_disabled = s.changes.disabled;
    s.changes.disabled = true;
    let total = candidates.len();
    let mut sel = 0usize;

    let chosen = loop {
        if ctx.config.completion_preview() {
            s.line.update(&backup.0, backup.1);
            candidates[sel].apply(&mut s.line);
        }
        build_menu(s, ctx, &candidates, sel);
        s.refresh(out, ctx, true)?;

        let key = reader.read_key()?;
        let plain = key.1.is_empty();
        match key.0 {
            KeyCode::Char('\t') if plain => sel = (sel + 1) % total,
            KeyCode::Virt(VirtualKey::Down) => sel = (sel + 1) % total,
            KeyCode::Char('\t') if key.1 == Modifiers::SHIFT => sel = (sel + total - 1) % total,
            KeyCode::Virt(VirtualKey::Up) => sel = (sel + total - 1) % total,
            KeyCode::Virt(VirtualKey::PageDown) => sel = (sel + MENU_PAGE).min(total - 1),
            KeyCode::Char('\n') if plain => sel = (sel + MENU_PAGE).min(total - 1),
            KeyCode::Virt(VirtualKey::PageUp) => sel = sel.saturating_sub(MENU_PAGE),
            KeyCode::Char(c @ '1'..='9') if plain => {
                let page_start = sel / MENU_PAGE * MENU_PAGE;
                let idx = page_start + (c as usize - '1' as usize);
                if idx < total {
                    break Some(idx);
                }
                out.beep();
            }
            KeyCode::Char('\r') if plain => break Some(sel),
            KeyCode::Virt(VirtualKey::Left) => break Some(sel),
            KeyCode::Char('\x1b') if plain => break None,
            _ => {
                // any other key accepts the selection and is re-dispatched
                s.pending_key = Some(key);
                break Some(sel);
            }
        }
    };

    s.changes.disabled = was_disabled;
    s.line.update(&backup.0, backup.1);
    s.extra.clear();
    s.extra_attrs = AttrBuffer::new();
    if let Some(idx) = chosen {
        accept(s, &candidates[idx]);
    }
    s.refresh(out, ctx, true)
}

#[cfg(test)]
mod tests {
    use super::build_menu;
    use crate::completion::CompletionCtx;
    use crate::config::Config;
    use crate::edit::{EditCtx, State};
    use crate::style::StyleTable;

    fn collect(words: &[&str]) -> Vec<crate::completion::Candidate> {
        let mut ctx = CompletionCtx::new("", 0, 100);
        for w in words {
            ctx.add_prim(w, None, None, 0, 0);
        }
        ctx.into_candidates()
    }

    #[test]
    fn menu_block_lists_candidates() {
        let config = Config::default();
        let styles = StyleTable::new();
        let ctx = EditCtx {
            config: &config,
            styles: &styles,
            highlighter: None,
            completer: None,
        };
        let mut s = State::new(String::new(), 0, None, 80);
        let candidates = collect(&["alpha", "beta", "gamma"]);
        build_menu(&mut s, &ctx, &candidates, 1);
        assert!(s.extra.contains("1 alpha"));
        assert!(s.extra.contains("2 beta"));
        assert!(!s.extra.contains("of 3")); // single page, no pager line
    }

    #[test]
    fn menu_block_pages() {
        let config = Config::default();
        let styles = StyleTable::new();
        let ctx = EditCtx {
            config: &config,
            styles: &styles,
            highlighter: None,
            completer: None,
        };
        let mut s = State::new(String::new(), 0, None, 80);
        let words: Vec<String> = (0..12).map(|i| format!("cand{i:02}")).collect();
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let candidates = collect(&refs);
        build_menu(&mut s, &ctx, &candidates, 10);
        assert!(s.extra.contains("cand09"));
        assert!(s.extra.contains("(10-12 of 12"));
        assert!(!s.extra.contains("cand00"));
    }
}
