//! Named styles used by the renderer and the highlight API.
//!
//! The bracket-tag markup language and its color-name resolver live outside
//! this crate; the editor only needs a small table of named styles that
//! user highlighters and the built-in overlays (hint, brace match, error)
//! refer to.
use anstyle::{AnsiColor, Color, Style};

/// Palette depth advertised by the terminal, from `COLORTERM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorDepth {
    /// No colors
    Monochrome,
    /// 8 ANSI colors, bold for bright
    Ansi8,
    /// 16 ANSI colors
    Ansi16,
    /// 256-color palette
    Ansi256,
    /// 24-bit RGB
    TrueColor,
}

impl ColorDepth {
    /// Parse the `COLORTERM` convention; `TERM` containing `256color`
    /// upgrades the fallback.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var("COLORTERM").unwrap_or_default().as_str() {
            "monochrome" => Self::Monochrome,
            "8color" | "3bit" => Self::Ansi8,
            "16color" | "4bit" => Self::Ansi16,
            "256color" | "8bit" => Self::Ansi256,
            "truecolor" | "24bit" | "direct" => Self::TrueColor,
            _ => {
                if std::env::var("TERM").is_ok_and(|t| t.contains("256color")) {
                    Self::Ansi256
                } else {
                    Self::Ansi16
                }
            }
        }
    }

    /// Number of bits per color channel class (1, 3, 4, 8 or 24).
    #[must_use]
    pub fn bits(self) -> u8 {
        match self {
            Self::Monochrome => 1,
            Self::Ansi8 => 3,
            Self::Ansi16 => 4,
            Self::Ansi256 => 8,
            Self::TrueColor => 24,
        }
    }
}

/// Style names the editor itself renders with.
pub mod names {
    /// Prompt text and markers
    pub const PROMPT: &str = "prompt";
    /// Inline completion hint
    pub const HINT: &str = "hint";
    /// Hint help / transient info lines
    pub const INFO: &str = "info";
    /// Unbalanced brace, failed search
    pub const ERROR: &str = "error";
    /// Matched brace pair
    pub const BRACEMATCH: &str = "bracematch";
    /// Soft-wrap markers and other de-emphasized glyphs
    pub const DIM: &str = "dim";
    /// Selected completion-menu entry
    pub const SELECT: &str = "select";
}

/// Table of named styles. User highlighters address styles by name; the
/// table resolves them to concrete [`Style`] values.
#[derive(Debug, Clone)]
pub struct StyleTable {
    entries: Vec<(String, Style)>,
}

impl Default for StyleTable {
    fn default() -> Self {
        let fg = |c: AnsiColor| Style::new().fg_color(Some(Color::Ansi(c)));
        Self {
            entries: vec![
                (names::PROMPT.to_owned(), fg(AnsiColor::Green)),
                (names::HINT.to_owned(), fg(AnsiColor::BrightBlack)),
                (names::INFO.to_owned(), fg(AnsiColor::BrightBlack).italic()),
                (names::ERROR.to_owned(), fg(AnsiColor::Red)),
                (names::BRACEMATCH.to_owned(), fg(AnsiColor::Cyan).underline()),
                (names::DIM.to_owned(), Style::new().dimmed()),
                (names::SELECT.to_owned(), Style::new().invert()),
            ],
        }
    }
}

impl StyleTable {
    /// Table with the built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a style name; unknown names resolve to the plain style.
    #[must_use]
    pub fn get(&self, name: &str) -> Style {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map_or_else(Style::new, |(_, s)| *s)
    }

    /// Define or redefine a named style.
    pub fn define(&mut self, name: &str, style: Style) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = style;
        } else {
            self.entries.push((name.to_owned(), style));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{names, ColorDepth, StyleTable};
    use anstyle::Style;

    #[test]
    fn lookup_and_define() {
        let mut table = StyleTable::new();
        assert_ne!(Style::new(), table.get(names::HINT));
        assert_eq!(Style::new(), table.get("no-such-style"));
        table.define("keyword", Style::new().bold());
        assert_eq!(Style::new().bold(), table.get("keyword"));
        table.define(names::HINT, Style::new());
        assert_eq!(Style::new(), table.get(names::HINT));
    }

    #[test]
    fn depth_bits() {
        assert_eq!(24, ColorDepth::TrueColor.bits());
        assert_eq!(4, ColorDepth::Ansi16.bits());
    }
}
