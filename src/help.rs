//! Key-binding help screen (F1).
use anstyle::Style;

use crate::binding::{Action, Profile};
use crate::edit::{EditCtx, State};
use crate::highlight::AttrBuffer;
use crate::style::names;

enum HelpLine {
    Blank,
    Heading(&'static str),
    Binding(Action, &'static str),
    Static(&'static str, &'static str),
}

static HELP_LINES: &[HelpLine] = &[
    HelpLine::Heading("Navigation:"),
    HelpLine::Binding(Action::CursorLeft, "go one character to the left"),
    HelpLine::Binding(Action::CursorRight, "go one character to the right"),
    HelpLine::Binding(Action::CursorUp, "go one row up, or back in the history"),
    HelpLine::Binding(Action::CursorDown, "go one row down, or forward in the history"),
    HelpLine::Binding(Action::CursorWordPrev, "go to the start of the previous word"),
    HelpLine::Binding(Action::CursorWordNext, "go to the end of the current word"),
    HelpLine::Binding(Action::CursorLineStart, "go to the start of the current line"),
    HelpLine::Binding(Action::CursorLineEnd, "go to the end of the current line"),
    HelpLine::Binding(Action::CursorInputStart, "go to the start of the current input"),
    HelpLine::Binding(Action::CursorInputEnd, "go to the end of the current input"),
    HelpLine::Binding(Action::CursorMatchBrace, "jump to matching brace"),
    HelpLine::Binding(Action::HistoryPrev, "go back in the history"),
    HelpLine::Binding(Action::HistoryNext, "go forward in the history"),
    HelpLine::Binding(
        Action::HistorySearch,
        "search the history starting with the current word",
    ),
    HelpLine::Blank,
    HelpLine::Heading("Deletion:"),
    HelpLine::Binding(Action::DeleteForward, "delete the current character"),
    HelpLine::Binding(Action::DeleteBackward, "delete the previous character"),
    HelpLine::Binding(Action::DeleteWordStartWs, "delete to preceding white space"),
    HelpLine::Binding(Action::DeleteWordStart, "delete to the start of the current word"),
    HelpLine::Binding(Action::DeleteWordEnd, "delete to the end of the current word"),
    HelpLine::Binding(Action::DeleteLineStart, "delete to the start of the current line"),
    HelpLine::Binding(Action::DeleteLineEnd, "delete to the end of the current line"),
    HelpLine::Static("esc", "delete the current input, or done with empty input"),
    HelpLine::Blank,
    HelpLine::Heading("Editing:"),
    HelpLine::Static("enter", "accept current input"),
    HelpLine::Binding(Action::InsertNewline, "create a new line for multi-line input"),
    HelpLine::Binding(Action::ClearScreen, "clear screen"),
    HelpLine::Binding(Action::TransposeChars, "swap with previous character"),
    HelpLine::Binding(Action::Undo, "undo"),
    HelpLine::Binding(Action::Redo, "redo"),
    HelpLine::Binding(Action::Complete, "try to complete the current input"),
    HelpLine::Blank,
    HelpLine::Heading("In the completion menu:"),
    HelpLine::Static("enter,left", "use the currently selected completion"),
    HelpLine::Static("1 - 9", "use completion N from the menu"),
    HelpLine::Static("tab,down", "select the next completion"),
    HelpLine::Static("shift-tab,up", "select the previous completion"),
    HelpLine::Static("esc", "exit menu without completing"),
    HelpLine::Blank,
    HelpLine::Heading("In incremental history search:"),
    HelpLine::Static("enter", "use the currently found history entry"),
    HelpLine::Static("backsp,^z", "go back to the previous match (undo)"),
    HelpLine::Static("tab,^r", "find the next match"),
    HelpLine::Static("shift-tab,^s", "find an earlier match"),
    HelpLine::Static("esc", "exit search"),
];

const LABEL_WIDTH: usize = 20;

/// `ctrl+x` becomes `^x`, other `+` separators become `-`.
fn beautify(spec: &str) -> String {
    if let Some(rest) = spec.strip_prefix("ctrl+") {
        if rest.chars().count() == 1 && !rest.contains('+') {
            return format!("^{rest}");
        }
    }
    spec.replace('+', "-")
}

fn binding_labels(profile: &Profile, action: Action) -> String {
    let Some(specs) = profile.default_specs(action) else {
        return String::new();
    };
    let mut labels: Vec<String> = Vec::new();
    for spec in specs.split('|').map(str::trim).filter(|s| !s.is_empty()) {
        let label = beautify(spec);
        if !labels.iter().any(|l| l.eq_ignore_ascii_case(&label)) {
            labels.push(label);
        }
    }
    labels.join(",")
}

/// Render the help screen into the extra area; it stays visible until the
/// next key press.
pub(crate) fn show_help(s: &mut State, ctx: &EditCtx<'_>, profile: &Profile) {
    let info = ctx.styles.get(names::INFO);
    let mut text = String::new();
    let mut attrs = AttrBuffer::new();
    let push = |text: &mut String, attrs: &mut AttrBuffer, line: &str, style: Style| {
        text.push_str(line);
        attrs.push(line.len(), style);
        text.push('\n');
        attrs.push(1, Style::new());
    };

    push(
        &mut text,
        &mut attrs,
        "We use ^<key> as a shorthand for ctrl-<key>.",
        info,
    );
    for line in HELP_LINES {
        match line {
            HelpLine::Blank => push(&mut text, &mut attrs, "", Style::new()),
            HelpLine::Heading(h) => push(&mut text, &mut attrs, h, info),
            HelpLine::Binding(action, desc) => {
                let labels = binding_labels(profile, *action);
                let w = LABEL_WIDTH;
                push(
                    &mut text,
                    &mut attrs,
                    &format!("  {labels:<w$} {desc}"),
                    Style::new(),
                );
            }
            HelpLine::Static(keys, desc) => {
                let w = LABEL_WIDTH;
                push(
                    &mut text,
                    &mut attrs,
                    &format!("  {keys:<w$} {desc}"),
                    Style::new(),
                );
            }
        }
    }
    if text.ends_with('\n') {
        text.pop();
    }
    s.extra = text;
    s.extra_attrs = attrs;
}

#[cfg(test)]
mod tests {
    use super::{beautify, binding_labels};
    use crate::binding::{Action, EMACS};

    #[test]
    fn beautified_labels() {
        assert_eq!("^a", beautify("ctrl+a"));
        assert_eq!("ctrl-left", beautify("ctrl+left"));
        assert_eq!("alt-backspace", beautify("alt+backspace"));
    }

    #[test]
    fn labels_from_profile() {
        assert_eq!("^p", binding_labels(&EMACS, Action::HistoryPrev));
        assert_eq!("^r,^s", binding_labels(&EMACS, Action::HistorySearch));
        assert_eq!("home,^a", binding_labels(&EMACS, Action::CursorLineStart));
    }
}
