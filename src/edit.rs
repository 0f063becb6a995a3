//! Editor state and the render/refresh pipeline.
use anstyle::Style;

use crate::completion::Completer;
use crate::config::Config;
use crate::highlight::{
    braces_balanced, find_matching_brace, highlight_match_braces, AttrBuffer, HighlightEnv,
    Highlighter,
};
use crate::history::{History, SearchDirection};
use crate::keys::KeyEvent;
use crate::layout::{layout_rows, rc_at_pos, str_width, RowCol, RowInfo};
use crate::line_buffer::LineBuffer;
use crate::style::{names, StyleTable};
use crate::tty::Renderer;
use crate::undo::Changes;
use crate::Result;

/// Shared read-only collaborators of one read.
pub(crate) struct EditCtx<'a> {
    pub config: &'a Config,
    pub styles: &'a StyleTable,
    pub highlighter: Option<&'a dyn Highlighter>,
    pub completer: Option<&'a dyn Completer>,
}

/// State of the line being edited.
pub(crate) struct State {
    /// Current user input
    pub line: LineBuffer,
    /// Last physical line of the prompt (prefix lines are printed once)
    pub prompt_text: String,
    /// Number of prompt prefix lines already emitted
    pub prompt_prefix_lines: usize,
    /// Right-aligned annotation on the input row
    pub inline_right: Option<String>,
    /// Pending/displayed completion hint (display only, never input)
    pub hint: String,
    /// Help line for the current hint
    pub hint_help: Option<String>,
    /// Extra block rendered below the input (menu, help screen)
    pub extra: String,
    /// Styles for `extra`, byte-parallel
    pub extra_attrs: AttrBuffer,
    /// Rows used by the last repaint
    pub cur_rows: usize,
    /// Cursor row of the last repaint
    pub cur_row: usize,
    /// Terminal width cached from the last layout
    pub termw: usize,
    /// Current index into the history (0 is the placeholder)
    pub history_idx: usize,
    /// Undo/redo stacks
    pub changes: Changes,
    /// Key handed back by a modal sub-loop for regular dispatch
    pub pending_key: Option<KeyEvent>,
}

impl State {
    pub fn new(
        prompt_text: String,
        prompt_prefix_lines: usize,
        inline_right: Option<String>,
        termw: usize,
    ) -> Self {
        Self {
            line: LineBuffer::new(),
            prompt_text,
            prompt_prefix_lines,
            inline_right,
            hint: String::new(),
            hint_help: None,
            extra: String::new(),
            extra_attrs: AttrBuffer::new(),
            cur_rows: 1,
            cur_row: 0,
            termw: termw.max(1),
            history_idx: 0,
            changes: Changes::new(),
            pending_key: None,
        }
    }

    /// Prompt and continuation indent widths in columns.
    pub fn prompt_widths(&self, config: &Config) -> (usize, usize) {
        let promptw = str_width(&self.prompt_text) + str_width(config.prompt_marker());
        let cmarkerw = str_width(config.cprompt_marker());
        let cpromptw = if config.multiline_indent() {
            promptw.max(cmarkerw)
        } else {
            cmarkerw
        };
        (promptw, cpromptw)
    }

    /// Total rows and cursor row/col of the current input (without hint).
    pub fn rowcol(&self, config: &Config) -> (usize, RowCol) {
        let (promptw, cpromptw) = self.prompt_widths(config);
        rc_at_pos(
            self.line.as_str(),
            self.termw,
            promptw,
            cpromptw,
            self.line.pos(),
        )
    }

    pub fn clear_hint(&mut self) {
        self.hint.clear();
        self.hint_help = None;
    }

    pub fn has_hint(&self) -> bool {
        !self.hint.is_empty()
    }

    /// Capture an undo snapshot before a mutation.
    pub fn start_modify(&mut self) {
        self.changes.capture(&self.line);
    }

    //-------------------------------------------------------------
    // Editing operations (callers repaint afterwards)
    //-------------------------------------------------------------

    pub fn insert_char(&mut self, config: &Config, c: char) {
        self.start_modify();
        self.line.insert(c);
        if config.brace_insertion() {
            self.auto_brace(config, c);
        }
        if c == '\n' {
            self.auto_indent(config);
        }
    }

    /// Speculative closing-brace insertion and closer swallowing.
    fn auto_brace(&mut self, config: &Config, c: char) {
        let braces = config.insertion_braces();
        let pairs: Vec<(char, char)> = {
            let mut it = braces.chars();
            let mut v = Vec::new();
            while let (Some(o), Some(cl)) = (it.next(), it.next()) {
                v.push((o, cl));
            }
            v
        };
        // swallow a closer that is already present at the cursor
        if pairs.iter().any(|(_, cl)| *cl == c) && self.line.char_at_cursor() == Some(c) {
            self.line.delete_char_at_cursor();
            return;
        }
        if let Some((_, close)) = pairs.iter().find(|(o, _)| *o == c) {
            let pos = self.line.pos();
            self.line.insert(*close);
            self.line.set_pos(pos);
            if !braces_balanced(self.line.as_str(), braces) {
                // would leave an unbalanced expression, take it back
                self.line.delete_char_at_cursor();
            }
        }
    }

    /// After a newline between an open and close brace, indent and keep
    /// the closer on its own row.
    fn auto_indent(&mut self, config: &Config) {
        let pos = self.line.pos();
        debug_assert!(pos > 0 && &self.line.as_str()[pos - 1..pos] == "\n");
        let Some(open) = self.line.as_str()[..pos - 1].chars().next_back() else {
            return;
        };
        let Some(close) = self.line.as_str()[pos..].chars().next() else {
            return;
        };
        let is_indent_pair = {
            let mut it = config.matching_braces().chars();
            let mut found = false;
            while let (Some(o), Some(cl)) = (it.next(), it.next()) {
                if o == open && cl == close {
                    found = true;
                    break;
                }
            }
            found
        };
        if is_indent_pair {
            self.line.insert(' ');
            self.line.insert(' ');
            let p = self.line.pos();
            self.line.insert('\n');
            self.line.set_pos(p);
        }
    }

    pub fn backspace(&mut self) {
        if self.line.pos() == 0 {
            return;
        }
        self.start_modify();
        self.line.delete_char_before_cursor();
    }

    pub fn delete_char(&mut self) {
        if self.line.pos() >= self.line.len() {
            return;
        }
        self.start_modify();
        self.line.delete_char_at_cursor();
    }

    pub fn delete_all(&mut self) {
        if self.line.is_empty() {
            return;
        }
        self.start_modify();
        self.line.clear();
    }

    pub fn delete_to_line_end(&mut self) {
        let pos = self.line.pos();
        let start = self.line.line_start(pos);
        let end = self.line.line_end(pos);
        self.start_modify();
        let mut del_start = pos;
        let mut del_end = end;
        if start == end {
            if self.line.as_str()[end..].starts_with('\n') {
                // an empty line is removed completely
                del_end = end + 1;
            } else if start > 0 && self.line.as_str()[..start].ends_with('\n') {
                del_start = start - 1;
            }
        }
        self.line.delete_range(del_start..del_end);
    }

    pub fn delete_to_line_start(&mut self) {
        let pos = self.line.pos();
        let start = self.line.line_start(pos);
        let end = self.line.line_end(pos);
        self.start_modify();
        let mut del_start = start;
        // removing an empty line keeps the cursor on the same row
        let goright = start == end && start > 0 && self.line.as_str()[..start].ends_with('\n');
        if goright {
            del_start = start - 1;
        }
        self.line.delete_range(del_start..pos);
        if goright {
            self.cursor_right();
        }
    }

    pub fn delete_to_word_start(&mut self) {
        if let Some(start) = self.line.word_start(self.line.pos()) {
            if start < self.line.pos() {
                self.start_modify();
                let pos = self.line.pos();
                self.line.delete_range(start..pos);
            }
        }
    }

    pub fn delete_to_word_end(&mut self) {
        if let Some(end) = self.line.word_end(self.line.pos()) {
            if end > self.line.pos() {
                self.start_modify();
                let pos = self.line.pos();
                self.line.delete_range(pos..end);
            }
        }
    }

    pub fn delete_to_ws_word_start(&mut self) {
        if let Some(start) = self.line.ws_word_start(self.line.pos()) {
            if start < self.line.pos() {
                self.start_modify();
                let pos = self.line.pos();
                self.line.delete_range(start..pos);
            }
        }
    }

    pub fn transpose_chars(&mut self) {
        if self.line.pos() == 0 || self.line.pos() == self.line.len() {
            return;
        }
        self.start_modify();
        self.line.transpose_chars();
    }

    pub fn undo(&mut self) {
        self.changes.undo(&mut self.line);
    }

    pub fn redo(&mut self) {
        self.changes.redo(&mut self.line);
    }

    //-------------------------------------------------------------
    // Navigation
    //-------------------------------------------------------------

    pub fn cursor_left(&mut self) {
        if let Some(prev) = self.line.prev_pos(self.line.pos()) {
            self.line.set_pos(prev);
        }
    }

    pub fn cursor_right(&mut self) {
        if let Some(next) = self.line.next_pos(self.line.pos()) {
            self.line.set_pos(next);
        }
    }

    pub fn cursor_line_start(&mut self) {
        let start = self.line.line_start(self.line.pos());
        self.line.set_pos(start);
    }

    pub fn cursor_line_end(&mut self) {
        let end = self.line.line_end(self.line.pos());
        self.line.set_pos(end);
    }

    pub fn cursor_word_prev(&mut self) {
        if let Some(start) = self.line.word_start(self.line.pos()) {
            self.line.set_pos(start);
        }
    }

    pub fn cursor_word_next(&mut self) {
        if let Some(end) = self.line.word_end(self.line.pos()) {
            self.line.set_pos(end);
        }
    }

    pub fn cursor_to_start(&mut self) {
        self.line.set_pos(0);
    }

    pub fn cursor_to_end(&mut self) {
        let len = self.line.len();
        self.line.set_pos(len);
    }

    pub fn cursor_match_brace(&mut self, config: &Config) {
        if let Some(target) = find_matching_brace(
            self.line.as_str(),
            self.line.pos(),
            config.matching_braces(),
        ) {
            self.line.set_pos(target);
        }
    }

    /// Move one visual row up, or navigate history on the first row.
    pub fn cursor_row_up(&mut self, config: &Config, history: &mut History) {
        let (promptw, cpromptw) = self.prompt_widths(config);
        let (_, rc) = self.rowcol(config);
        if rc.row == 0 {
            self.history_prefix_prev(history);
        } else if let Some(pos) = crate::layout::pos_at_rc(
            self.line.as_str(),
            self.termw,
            promptw,
            cpromptw,
            rc.row - 1,
            rc.col,
        ) {
            self.line.set_pos(pos);
        }
    }

    /// Move one visual row down, or navigate history on the last row.
    pub fn cursor_row_down(&mut self, config: &Config, history: &mut History) {
        let (promptw, cpromptw) = self.prompt_widths(config);
        let (rows, rc) = self.rowcol(config);
        if rc.row + 1 >= rows {
            self.history_prefix_next(history);
        } else if let Some(pos) = crate::layout::pos_at_rc(
            self.line.as_str(),
            self.termw,
            promptw,
            cpromptw,
            rc.row + 1,
            rc.col,
        ) {
            self.line.set_pos(pos);
        }
    }

    //-------------------------------------------------------------
    // Multiline discipline
    //-------------------------------------------------------------

    /// Is the input "continued": the char before the cursor is the
    /// continuation marker and the cursor sits at the end of its row?
    pub fn is_continued(&self, config: &Config) -> bool {
        if self.line.pos() == 0 || self.line.char_before_cursor() != Some(config.multiline_eol()) {
            return false;
        }
        let (_, rc) = self.rowcol(config);
        rc.last_on_row
    }

    /// Replace the trailing continuation marker with a real newline.
    pub fn continue_line(&mut self, config: &Config) {
        debug_assert!(self.is_continued(config));
        self.start_modify();
        self.line.delete_char_before_cursor();
        self.line.insert('\n');
    }

    //-------------------------------------------------------------
    // History navigation
    //-------------------------------------------------------------

    pub fn history_prev(&mut self, history: &mut History) {
        let next_idx = self.history_idx + 1;
        let Some(entry) = history.get(next_idx).map(str::to_owned) else {
            return;
        };
        if self.history_idx == 0 {
            history.stash(self.line.as_str());
        }
        self.start_modify();
        let len = entry.len();
        self.line.update(&entry, len);
        self.history_idx = next_idx;
    }

    pub fn history_next(&mut self, history: &mut History) {
        if self.history_idx == 0 {
            return;
        }
        let idx = self.history_idx - 1;
        let Some(entry) = history.get(idx).map(str::to_owned) else {
            return;
        };
        self.start_modify();
        let len = entry.len();
        self.line.update(&entry, len);
        self.history_idx = idx;
    }

    /// History navigation that preserves the text before the cursor.
    fn history_prefix_prev(&mut self, history: &mut History) {
        let prefix = self.line.as_str()[..self.line.pos()].to_owned();
        let Some(idx) = history.starts_with(&prefix, self.history_idx, SearchDirection::Reverse)
        else {
            return;
        };
        let Some(entry) = history.get(idx).map(str::to_owned) else {
            return;
        };
        if self.history_idx == 0 {
            history.stash(self.line.as_str());
        }
        self.start_modify();
        let pos = prefix.len();
        self.line.update(&entry, pos);
        self.history_idx = idx;
    }

    fn history_prefix_next(&mut self, history: &mut History) {
        let prefix = self.line.as_str()[..self.line.pos()].to_owned();
        let Some(idx) = history.starts_with(&prefix, self.history_idx, SearchDirection::Forward)
        else {
            return;
        };
        let Some(entry) = history.get(idx).map(str::to_owned) else {
            return;
        };
        self.start_modify();
        let pos = prefix.len().min(entry.len());
        self.line.update(&entry, pos);
        self.history_idx = idx;
    }

    //-------------------------------------------------------------
    // Hints
    //-------------------------------------------------------------

    /// Probe completions for an inline hint (at most 2 candidates; only a
    /// unique one hints). With auto-tab, keep probing to grow the hint.
    pub fn hint_probe(&mut self, ctx: &EditCtx<'_>) {
        self.clear_hint();
        if !ctx.config.hint() {
            return;
        }
        let Some(completer) = ctx.completer else {
            return;
        };
        let candidates =
            crate::completion::generate(completer, self.line.as_str(), self.line.pos(), 2, false);
        if candidates.len() != 1 {
            return;
        }
        let Some(rest) = candidates[0].hint_text(&self.line) else {
            return;
        };
        self.hint = rest.to_owned();
        self.hint_help = candidates[0].help.clone();
        if !ctx.config.auto_tab() {
            return;
        }
        // grow the hint while the completion stays unique
        loop {
            let mut probe = String::with_capacity(self.line.len() + self.hint.len());
            probe.push_str(&self.line.as_str()[..self.line.pos()]);
            probe.push_str(&self.hint);
            let pos = probe.len();
            probe.push_str(&self.line.as_str()[self.line.pos()..]);
            let candidates = crate::completion::generate(completer, &probe, pos, 2, false);
            if candidates.len() != 1 {
                break;
            }
            let extend = match candidates[0].hint_text_at(&probe, pos) {
                Some(t) if !t.is_empty() => t.to_owned(),
                _ => break,
            };
            if let Some(help) = &candidates[0].help {
                self.hint_help = Some(help.clone());
            }
            self.hint.push_str(&extend);
        }
    }

    /// Refresh honoring the hint-delay discipline: with a delay the paint
    /// happens without the hint and the hint is left pending.
    pub fn refresh_with_hint<W: Renderer>(
        &mut self,
        out: &mut W,
        ctx: &EditCtx<'_>,
    ) -> Result<()> {
        if !ctx.config.hint() || ctx.config.hint_delay_ms() > 0 {
            self.clear_hint();
            self.refresh(out, ctx, true)?;
            if !ctx.config.hint() {
                return Ok(());
            }
        }
        self.hint_probe(ctx);
        if ctx.config.hint_delay_ms() == 0 {
            self.refresh(out, ctx, true)?;
        }
        Ok(())
    }

    //-------------------------------------------------------------
    // Rendering
    //-------------------------------------------------------------

    /// Input text with the transient hint spliced in at the cursor.
    fn display_text(&self) -> String {
        let pos = self.line.pos();
        let mut display = String::with_capacity(self.line.len() + self.hint.len());
        display.push_str(&self.line.as_str()[..pos]);
        display.push_str(&self.hint);
        display.push_str(&self.line.as_str()[pos..]);
        display
    }

    /// Extra block below the input: hint help first, then menu/help text.
    fn compose_extra(&self, styles: &StyleTable) -> (String, AttrBuffer) {
        let mut text = String::new();
        let mut attrs = AttrBuffer::new();
        if let Some(help) = &self.hint_help {
            text.push_str(help);
            text.push('\n');
            attrs.push(help.len(), styles.get(names::INFO));
            attrs.push(1, Style::new());
        }
        if !self.extra.is_empty() {
            text.push_str(&self.extra);
            attrs.append(&self.extra_attrs);
        }
        (text, attrs)
    }

    fn write_row_indent<W: Renderer>(
        &self,
        out: &mut W,
        ctx: &EditCtx<'_>,
        row: usize,
        cpromptw: usize,
    ) {
        let style = ctx.styles.get(names::PROMPT);
        if row == 0 {
            out.write_styled(&self.prompt_text, style);
            out.write_styled(ctx.config.prompt_marker(), style);
        } else {
            let cmarkerw = str_width(ctx.config.cprompt_marker());
            if cpromptw > cmarkerw {
                out.write(&" ".repeat(cpromptw - cmarkerw));
            }
            out.write_styled(ctx.config.cprompt_marker(), style);
        }
    }

    /// Repaint the edit region: move to its top, re-emit every visible
    /// row, blank out stale rows and restore the cursor position.
    pub fn refresh<W: Renderer>(
        &mut self,
        out: &mut W,
        ctx: &EditCtx<'_>,
        brace_match: bool,
    ) -> Result<()> {
        let config = ctx.config;
        let (promptw, cpromptw) = self.prompt_widths(config);
        let pos = self.line.pos();
        let display = self.display_text();

        let mut attrs = AttrBuffer::new();
        attrs.reset(self.line.as_str());
        if config.highlight() {
            if let Some(hl) = ctx.highlighter {
                let mut env = HighlightEnv::new(&mut attrs, ctx.styles);
                hl.highlight(&mut env, self.line.as_str());
            }
        }
        if config.brace_matching() && brace_match {
            highlight_match_braces(
                self.line.as_str(),
                &mut attrs,
                pos,
                config.matching_braces(),
                ctx.styles,
            );
        }
        if !self.hint.is_empty() {
            attrs.insert_at(pos, self.hint.len(), ctx.styles.get(names::HINT));
        }

        let (extra_text, extra_attrs) = self.compose_extra(ctx.styles);

        let input_rows = layout_rows(&display, self.termw, promptw, cpromptw);
        let n_input_rows = input_rows.len();
        let (_, rc) = rc_at_pos(&display, self.termw, promptw, cpromptw, pos);
        let extra_rows: Vec<RowInfo> = if extra_text.is_empty() {
            Vec::new()
        } else {
            layout_rows(&extra_text, self.termw, 0, 0)
        };
        let rows = n_input_rows + extra_rows.len();

        // respect the visible window when the content exceeds the screen
        let termh = out.rows().max(1);
        let (first_row, last_row) = if rows > termh {
            let first = (rc.row + 1).saturating_sub(termh);
            (first, first + termh - 1)
        } else {
            (0, rows - 1)
        };

        out.start_of_line();
        out.move_up(self.cur_row.min(termh - 1));

        let render_rows = input_rows
            .iter()
            .map(|info| (false, &display, &attrs, *info, info.row))
            .chain(
                extra_rows
                    .iter()
                    .map(|info| (true, &extra_text, &extra_attrs, *info, n_input_rows + info.row)),
            );
        for (in_extra, text, row_attrs, info, global_row) in render_rows {
            if global_row < first_row || global_row > last_row {
                continue;
            }
            if !in_extra {
                self.write_row_indent(out, ctx, info.row, cpromptw);
            }
            for (range, style) in row_attrs.runs(info.start, info.end) {
                out.write_styled(&text[range], style);
            }
            if global_row < last_row {
                let roww = str_width(&text[info.start..info.end])
                    + if in_extra {
                        0
                    } else if info.row == 0 {
                        promptw
                    } else {
                        cpromptw
                    };
                if info.is_wrap && roww < self.termw {
                    let marker = if cfg!(target_os = "macos") {
                        "\u{21b5}"
                    } else {
                        "\u{2190}"
                    };
                    out.write_styled(marker, ctx.styles.get(names::DIM));
                }
                out.clear_to_eol();
                out.write("\r\n");
            } else if global_row == 0 && !in_extra && self.inline_right.is_some() {
                self.write_inline_right(out, promptw, &display[info.start..info.end]);
            } else {
                out.clear_to_eol();
            }
        }

        // blank out trailing rows from the previous repaint
        let mut rrows = last_row - first_row + 1;
        if rows < self.cur_rows {
            let mut stale = self.cur_rows - rows;
            while rrows < termh && stale > 0 {
                stale -= 1;
                rrows += 1;
                out.write("\r\n");
                out.clear_line();
            }
        }

        // cursor back to the edit position
        out.start_of_line();
        out.move_up(first_row + rrows - 1 - rc.row);
        out.move_right(rc.col + if rc.row == 0 { promptw } else { cpromptw });
        out.flush()?;

        self.cur_rows = rows;
        self.cur_row = rc.row;
        Ok(())
    }

    /// Right-aligned annotation on the input row, written only when it
    /// fits next to the input.
    fn write_inline_right<W: Renderer>(&self, out: &mut W, promptw: usize, row_text: &str) {
        let right = self.inline_right.as_deref().unwrap_or("");
        let rightw = str_width(right);
        let curw = promptw + str_width(row_text);
        if self.termw > curw + rightw + 1 {
            out.write(&" ".repeat(self.termw - curw - rightw));
            out.write(right);
        } else {
            out.clear_to_eol();
        }
    }

    /// Recompute the layout for the new terminal width and repaint.
    pub fn resize<W: Renderer>(&mut self, out: &mut W, ctx: &EditCtx<'_>) -> Result<()> {
        out.update_size();
        let new_termw = out.cols().max(1);
        if new_termw == self.termw {
            return Ok(());
        }
        let (promptw, cpromptw) = self.prompt_widths(ctx.config);
        let display = self.display_text();
        let (input_rows, rc) = rc_at_pos(&display, new_termw, promptw, cpromptw, self.line.pos());
        let (extra_text, _) = self.compose_extra(ctx.styles);
        let extra_rows = if extra_text.is_empty() {
            0
        } else {
            layout_rows(&extra_text, new_termw, 0, 0).len()
        };
        self.cur_row = rc.row;
        // keep the larger row count so residual rows get blanked
        self.cur_rows = self.cur_rows.max(input_rows + extra_rows);
        self.termw = new_termw;
        self.refresh(out, ctx, true)
    }

    /// Clear the screen and repaint at the top.
    pub fn clear_screen<W: Renderer>(&mut self, out: &mut W, ctx: &EditCtx<'_>) -> Result<()> {
        out.clear_screen();
        self.cur_row = 0;
        self.cur_rows = 1;
        self.refresh(out, ctx, true)
    }

    /// Erase the rendered prompt region and re-emit a compact
    /// `prompt + input` line (plus an optional blank line).
    pub fn prompt_cleanup<W: Renderer>(
        &mut self,
        out: &mut W,
        ctx: &EditCtx<'_>,
        final_input: &str,
    ) -> Result<()> {
        let config = ctx.config;
        let extra = config.prompt_cleanup_extra_lines();
        let total = self.cur_rows + self.prompt_prefix_lines + extra;
        if total == 0 {
            return Ok(());
        }
        out.move_up(self.cur_row + self.prompt_prefix_lines + extra);
        out.start_of_line();
        out.delete_lines(total);

        let style = ctx.styles.get(names::PROMPT);
        out.write_styled(&self.prompt_text, style);
        out.write_styled(config.prompt_marker(), style);
        let (promptw, _) = self.prompt_widths(config);
        let mut first = true;
        for segment in final_input.split('\n') {
            if !first {
                out.write("\r\n");
                out.write(&" ".repeat(promptw));
            }
            out.write(segment);
            first = false;
        }
        out.write("\r\n");
        if config.prompt_cleanup_empty_line() {
            out.write("\r\n");
        }
        out.flush()
    }
}
