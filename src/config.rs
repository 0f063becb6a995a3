//! Customize the line editor
use std::default::Default;

/// Maximum accepted hint delay in milliseconds.
const MAX_HINT_DELAY_MS: u64 = 5000;

/// User preferences
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Multi-line input enabled
    multiline: bool,
    /// Beep when completion has nothing to offer
    beep: bool,
    /// Colored output
    color: bool,
    /// Keep adjacent duplicate history entries
    history_duplicates: bool,
    /// Keep accepting unique completions after the first one
    auto_tab: bool,
    /// Preview the selected menu candidate in the input line
    completion_preview: bool,
    /// Indent continuation lines to the prompt width
    multiline_indent: bool,
    /// Show short inline help messages (search prompts etc.)
    inline_help: bool,
    /// Show inline completion hints
    hint: bool,
    /// Delay before a hint is displayed (0..=5000 ms)
    hint_delay_ms: u64,
    /// Retry completion at edit distance 1 when nothing matches
    spell_correct: bool,
    /// Run the user highlighter
    highlight: bool,
    /// Highlight matching/offending braces
    brace_matching: bool,
    /// Auto-insert closing braces
    brace_insertion: bool,
    /// Rewrite the prompt + input compactly after accept
    prompt_cleanup: bool,
    /// Extra terminal lines to erase during prompt cleanup
    prompt_cleanup_extra_lines: usize,
    /// Emit a blank line after prompt cleanup output
    prompt_cleanup_empty_line: bool,
    /// Brace pairs used for matching, e.g. `"()[]{}"`
    matching_braces: String,
    /// Brace pairs used for automatic insertion, e.g. `"()[]{}\"\"''"`
    insertion_braces: String,
    /// Prompt marker displayed after the prompt text
    prompt_marker: String,
    /// Marker for continuation rows
    cprompt_marker: String,
    /// Line-continuation character for multiline input
    multiline_eol: char,
    /// ESC disambiguation delay for the first byte (ms)
    initial_esc_delay_ms: u64,
    /// ESC disambiguation delay between sequence bytes (ms)
    followup_esc_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            multiline: true,
            beep: true,
            color: true,
            history_duplicates: false,
            auto_tab: false,
            completion_preview: true,
            multiline_indent: true,
            inline_help: true,
            hint: true,
            hint_delay_ms: 500,
            spell_correct: false,
            highlight: true,
            brace_matching: true,
            brace_insertion: true,
            prompt_cleanup: false,
            prompt_cleanup_extra_lines: 0,
            prompt_cleanup_empty_line: false,
            matching_braces: "()[]{}".to_owned(),
            insertion_braces: "()[]{}\"\"''".to_owned(),
            prompt_marker: "> ".to_owned(),
            cprompt_marker: "> ".to_owned(),
            multiline_eol: '\\',
            initial_esc_delay_ms: 100,
            followup_esc_delay_ms: 10,
        }
    }
}

macro_rules! toggle {
    ($(#[$doc:meta])* $get:ident, $set:ident) => {
        $(#[$doc])*
        #[must_use]
        pub fn $get(&self) -> bool {
            self.$get
        }

        pub(crate) fn $set(&mut self, yes: bool) -> bool {
            std::mem::replace(&mut self.$get, yes)
        }
    };
}

impl Config {
    /// Returns a `Config` builder.
    #[must_use]
    pub fn builder() -> Builder {
        Builder::new()
    }

    toggle!(
        /// Multi-line input (enabled by default).
        multiline,
        set_multiline
    );
    toggle!(
        /// Beep when completion has nothing to offer (enabled by default).
        beep,
        set_beep
    );
    toggle!(
        /// Colored output (enabled by default).
        color,
        set_color
    );
    toggle!(
        /// Keep adjacent duplicate history entries (disabled by default).
        history_duplicates,
        set_history_duplicates
    );
    toggle!(
        /// Automatically keep completing while completions are unique
        /// (disabled by default).
        auto_tab,
        set_auto_tab
    );
    toggle!(
        /// Preview the selected completion in the input line while the menu
        /// is open (enabled by default).
        completion_preview,
        set_completion_preview
    );
    toggle!(
        /// Indent continuation rows to the prompt width (enabled by
        /// default).
        multiline_indent,
        set_multiline_indent
    );
    toggle!(
        /// Short inline help messages (enabled by default).
        inline_help,
        set_inline_help
    );
    toggle!(
        /// Inline completion hints (enabled by default).
        hint,
        set_hint
    );
    toggle!(
        /// Spell-correct completion retries (disabled by default).
        spell_correct,
        set_spell_correct
    );
    toggle!(
        /// Run the user highlighter (enabled by default).
        highlight,
        set_highlight
    );
    toggle!(
        /// Matching-brace highlighting (enabled by default).
        brace_matching,
        set_brace_matching
    );
    toggle!(
        /// Automatic closing-brace insertion (enabled by default).
        brace_insertion,
        set_brace_insertion
    );
    toggle!(
        /// Prompt cleanup after accept (disabled by default).
        prompt_cleanup,
        set_prompt_cleanup
    );
    toggle!(
        /// Blank line after prompt-cleanup output (disabled by default).
        prompt_cleanup_empty_line,
        set_prompt_cleanup_empty_line
    );

    /// Delay before a pending hint is displayed.
    ///
    /// By default, 500 ms.
    #[must_use]
    pub fn hint_delay_ms(&self) -> u64 {
        self.hint_delay_ms
    }

    pub(crate) fn set_hint_delay_ms(&mut self, delay_ms: u64) -> u64 {
        std::mem::replace(&mut self.hint_delay_ms, delay_ms.min(MAX_HINT_DELAY_MS))
    }

    /// Extra terminal lines erased during prompt cleanup.
    #[must_use]
    pub fn prompt_cleanup_extra_lines(&self) -> usize {
        self.prompt_cleanup_extra_lines
    }

    pub(crate) fn set_prompt_cleanup_extra_lines(&mut self, extra_lines: usize) {
        self.prompt_cleanup_extra_lines = extra_lines;
    }

    /// Brace pairs used for matching.
    ///
    /// By default, `"()[]{}"`.
    #[must_use]
    pub fn matching_braces(&self) -> &str {
        &self.matching_braces
    }

    /// Set matching brace pairs; `None` restores the default. Odd-length
    /// strings are rejected.
    pub(crate) fn set_matching_braces(&mut self, pairs: Option<&str>) {
        match pairs {
            None => self.matching_braces = "()[]{}".to_owned(),
            Some(p) if p.chars().count() % 2 == 0 => self.matching_braces = p.to_owned(),
            Some(_) => {}
        }
    }

    /// Brace pairs used for automatic insertion.
    ///
    /// By default, `"()[]{}\"\"''"`.
    #[must_use]
    pub fn insertion_braces(&self) -> &str {
        &self.insertion_braces
    }

    /// Set insertion brace pairs; `None` restores the default. Odd-length
    /// strings are rejected.
    pub(crate) fn set_insertion_braces(&mut self, pairs: Option<&str>) {
        match pairs {
            None => self.insertion_braces = "()[]{}\"\"''".to_owned(),
            Some(p) if p.chars().count() % 2 == 0 => self.insertion_braces = p.to_owned(),
            Some(_) => {}
        }
    }

    /// Prompt marker displayed after the prompt text.
    ///
    /// By default, `"> "`.
    #[must_use]
    pub fn prompt_marker(&self) -> &str {
        &self.prompt_marker
    }

    /// Continuation prompt marker.
    #[must_use]
    pub fn cprompt_marker(&self) -> &str {
        &self.cprompt_marker
    }

    /// Set the prompt marker and the continuation marker. `None` for the
    /// marker restores `"> "`, `None` for the continuation makes it equal
    /// to the marker.
    pub(crate) fn set_prompt_marker(&mut self, marker: Option<&str>, cmarker: Option<&str>) {
        self.prompt_marker = marker.unwrap_or("> ").to_owned();
        self.cprompt_marker = cmarker.unwrap_or(&self.prompt_marker).to_owned();
    }

    /// Line-continuation character (default `\`).
    #[must_use]
    pub fn multiline_eol(&self) -> char {
        self.multiline_eol
    }

    /// ESC disambiguation delays (initial, between sequence bytes), in ms.
    #[must_use]
    pub fn esc_delays(&self) -> (u64, u64) {
        (self.initial_esc_delay_ms, self.followup_esc_delay_ms)
    }

    pub(crate) fn set_esc_delays(&mut self, initial_ms: u64, followup_ms: u64) {
        self.initial_esc_delay_ms = initial_ms;
        self.followup_esc_delay_ms = followup_ms;
    }
}

/// Configuration builder
#[derive(Clone, Debug, Default)]
pub struct Builder {
    p: Config,
}

impl Builder {
    /// Returns a [`Config`] builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            p: Config::default(),
        }
    }

    /// Enable or disable multi-line input.
    #[must_use]
    pub fn multiline(mut self, yes: bool) -> Self {
        self.p.set_multiline(yes);
        self
    }

    /// Enable or disable the bell.
    #[must_use]
    pub fn beep(mut self, yes: bool) -> Self {
        self.p.set_beep(yes);
        self
    }

    /// Enable or disable colors.
    #[must_use]
    pub fn color(mut self, yes: bool) -> Self {
        self.p.set_color(yes);
        self
    }

    /// Enable or disable inline hints.
    #[must_use]
    pub fn hint(mut self, yes: bool) -> Self {
        self.p.set_hint(yes);
        self
    }

    /// Set the hint delay in milliseconds (clamped to 5000).
    #[must_use]
    pub fn hint_delay_ms(mut self, delay_ms: u64) -> Self {
        self.p.set_hint_delay_ms(delay_ms);
        self
    }

    /// Enable or disable auto-tab completion.
    #[must_use]
    pub fn auto_tab(mut self, yes: bool) -> Self {
        self.p.set_auto_tab(yes);
        self
    }

    /// Enable or disable completion spell correction.
    #[must_use]
    pub fn spell_correct(mut self, yes: bool) -> Self {
        self.p.set_spell_correct(yes);
        self
    }

    /// Set the prompt marker and continuation marker.
    #[must_use]
    pub fn prompt_marker(mut self, marker: &str, cmarker: Option<&str>) -> Self {
        self.p.set_prompt_marker(Some(marker), cmarker);
        self
    }

    /// Builds a [`Config`] with the settings specified so far.
    #[must_use]
    pub fn build(self) -> Config {
        self.p
    }
}
