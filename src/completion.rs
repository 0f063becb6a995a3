//! Completion API: candidate collection, transformers and spell correction.
use std::path::{Path, PathBuf};

use log::debug;

use crate::line_buffer::{char_is_filename_letter, char_is_nonseparator, LineBuffer};

/// Hard cap on collected candidates (menu collection).
pub(crate) const MAX_COMPLETIONS: usize = 1000;

/// A single completion candidate.
///
/// `delete_before`/`delete_after` describe how many bytes around the cursor
/// the replacement consumes when the candidate is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Text inserted on accept
    pub replacement: String,
    /// Menu display text (defaults to the replacement)
    pub display: Option<String>,
    /// Help line shown with hints and in the menu
    pub help: Option<String>,
    /// Where the candidate came from (e.g. "history", "file")
    pub source: Option<String>,
    /// Bytes removed before the cursor on accept
    pub delete_before: usize,
    /// Bytes removed after the cursor on accept
    pub delete_after: usize,
}

impl Candidate {
    /// Text shown in the completion menu.
    #[must_use]
    pub fn display(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.replacement)
    }

    /// Apply this candidate to `line` at the current cursor.
    pub(crate) fn apply(&self, line: &mut LineBuffer) {
        let start = line.pos().saturating_sub(self.delete_before);
        line.delete_range(start..line.pos());
        let end = line.pos().saturating_add(self.delete_after).min(line.len());
        line.delete_range(line.pos()..end);
        line.insert_str(line.pos(), &self.replacement);
    }

    /// The hint remainder this candidate would append at the cursor, if it
    /// is a pure extension of the text already typed.
    #[must_use]
    pub(crate) fn hint_text(&self, line: &LineBuffer) -> Option<&str> {
        self.hint_text_at(line.as_str(), line.pos())
    }

    /// [`Candidate::hint_text`] against an arbitrary `(text, pos)` pair.
    #[must_use]
    pub(crate) fn hint_text_at(&self, text: &str, pos: usize) -> Option<&str> {
        if self.delete_after != 0 || self.delete_before > pos {
            return None;
        }
        let typed = &text[pos - self.delete_before..pos];
        let rest = self.replacement.strip_prefix(typed)?;
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Requote {
    quote: Option<char>,
    escape: Option<char>,
    quote_chars: String,
}

/// Collection context handed to a completer callback.
pub struct CompletionCtx<'a> {
    input: &'a str,
    pos: usize,
    limit: usize,
    candidates: Vec<Candidate>,
    // geometry installed by the transformer in effect
    delete_before: usize,
    delete_after: usize,
    requote: Option<Requote>,
}

impl<'a> CompletionCtx<'a> {
    pub(crate) fn new(input: &'a str, pos: usize, limit: usize) -> Self {
        Self {
            input,
            pos,
            limit,
            candidates: Vec::new(),
            delete_before: 0,
            delete_after: 0,
            requote: None,
        }
    }

    /// The raw current input.
    #[must_use]
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// The cursor byte offset in [`CompletionCtx::input`].
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Have any candidates been collected yet?
    #[must_use]
    pub fn has_completions(&self) -> bool {
        !self.candidates.is_empty()
    }

    /// Are there already enough candidates? Callbacks should return early
    /// when this turns `true` (latency).
    #[must_use]
    pub fn stop_completing(&self) -> bool {
        self.candidates.len() >= self.limit
    }

    /// Add a completion using the geometry of the transformer in effect.
    /// Returns `false` when the callback should stop adding more.
    pub fn add(&mut self, completion: &str) -> bool {
        self.add_ex(completion, None, None)
    }

    /// Like [`CompletionCtx::add`] with a menu display string and help line.
    pub fn add_ex(&mut self, completion: &str, display: Option<&str>, help: Option<&str>) -> bool {
        self.add_with_source(completion, display, help, None)
    }

    /// Like [`CompletionCtx::add_ex`] with a source tag.
    pub fn add_with_source(
        &mut self,
        completion: &str,
        display: Option<&str>,
        help: Option<&str>,
        source: Option<&str>,
    ) -> bool {
        let replacement = match &self.requote {
            Some(rq) => requote(completion, rq),
            None => completion.to_owned(),
        };
        self.push(Candidate {
            replacement,
            display: display.map(str::to_owned),
            help: help.map(str::to_owned),
            source: source.map(str::to_owned),
            delete_before: self.delete_before,
            delete_after: self.delete_after,
        })
    }

    /// Add every entry of `completions` that starts with `prefix`.
    pub fn add_all(&mut self, prefix: &str, completions: &[&str]) -> bool {
        for completion in completions {
            if completion.starts_with(prefix) && !self.add(completion) {
                return false;
            }
        }
        true
    }

    /// Primitive completion with explicit replacement geometry; bypasses
    /// any transformer in effect.
    pub fn add_prim(
        &mut self,
        completion: &str,
        display: Option<&str>,
        help: Option<&str>,
        delete_before: usize,
        delete_after: usize,
    ) -> bool {
        self.add_prim_with_source(completion, display, help, None, delete_before, delete_after)
    }

    /// [`CompletionCtx::add_prim`] with a source tag.
    #[allow(clippy::too_many_arguments)]
    pub fn add_prim_with_source(
        &mut self,
        completion: &str,
        display: Option<&str>,
        help: Option<&str>,
        source: Option<&str>,
        delete_before: usize,
        delete_after: usize,
    ) -> bool {
        self.push(Candidate {
            replacement: completion.to_owned(),
            display: display.map(str::to_owned),
            help: help.map(str::to_owned),
            source: source.map(str::to_owned),
            delete_before,
            delete_after,
        })
    }

    fn push(&mut self, candidate: Candidate) -> bool {
        if self.stop_completing() {
            return false;
        }
        // distinct candidates only
        if !self
            .candidates
            .iter()
            .any(|c| c.replacement == candidate.replacement
                && c.delete_before == candidate.delete_before
                && c.delete_after == candidate.delete_after)
        {
            self.candidates.push(candidate);
        }
        !self.stop_completing()
    }

    fn with_geometry<R>(
        &mut self,
        delete_before: usize,
        delete_after: usize,
        requote: Option<Requote>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let saved = (self.delete_before, self.delete_after, self.requote.take());
        self.delete_before = delete_before;
        self.delete_after = delete_after;
        self.requote = requote;
        let r = f(self);
        (self.delete_before, self.delete_after, self.requote) = saved;
        r
    }

    pub(crate) fn into_candidates(self) -> Vec<Candidate> {
        self.candidates
    }
}

/// A completion callback, invoked with the collection context and a
/// transformer-dependent prefix (the raw input up to the cursor at the top
/// level).
pub trait Completer {
    /// Collect candidates for `prefix` into `ctx`.
    fn complete(&self, ctx: &mut CompletionCtx<'_>, prefix: &str);
}

impl<F> Completer for F
where
    F: Fn(&mut CompletionCtx<'_>, &str),
{
    fn complete(&self, ctx: &mut CompletionCtx<'_>, prefix: &str) {
        self(ctx, prefix);
    }
}

/// Identify the word around the cursor with `is_word_char` (default: the
/// non-separator class) and call `fun` with just that word; candidates the
/// callback adds replace the word.
pub fn complete_word(
    ctx: &mut CompletionCtx<'_>,
    is_word_char: Option<&dyn Fn(char) -> bool>,
    fun: impl FnOnce(&mut CompletionCtx<'_>, &str),
) {
    let is_word_char = is_word_char.unwrap_or(&char_is_nonseparator);
    let input = ctx.input();
    let pos = ctx.pos();
    let start = input[..pos]
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word_char(*c))
        .last()
        .map_or(pos, |(i, _)| i);
    let word = input[start..pos].to_owned();
    ctx.with_geometry(pos - start, 0, None, |ctx| fun(ctx, &word));
}

/// Like [`complete_word`] but aware of quotes and escape characters:
/// the prefix passed to `fun` is unquoted/unescaped and added completions
/// are re-quoted/re-escaped on insertion.
pub fn complete_qword(
    ctx: &mut CompletionCtx<'_>,
    is_word_char: Option<&dyn Fn(char) -> bool>,
    fun: impl FnOnce(&mut CompletionCtx<'_>, &str),
) {
    complete_qword_ex(ctx, is_word_char, Some('\\'), "'\"", fun);
}

/// [`complete_qword`] with custom escape character and quote set.
pub fn complete_qword_ex(
    ctx: &mut CompletionCtx<'_>,
    is_word_char: Option<&dyn Fn(char) -> bool>,
    escape_char: Option<char>,
    quote_chars: &str,
    fun: impl FnOnce(&mut CompletionCtx<'_>, &str),
) {
    let is_word_char = is_word_char.unwrap_or(&char_is_nonseparator);
    let input = ctx.input();
    let pos = ctx.pos();

    // forward scan to find the start of the (possibly quoted) token at the
    // cursor
    let mut token_start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut at_token = false;
    for (i, c) in input[..pos].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if let Some(q) = quote {
            if c == q {
                quote = None;
            } else if Some(c) == escape_char {
                escaped = true;
            }
            continue;
        }
        if Some(c) == escape_char {
            if !at_token {
                token_start = i;
                at_token = true;
            }
            escaped = true;
        } else if quote_chars.contains(c) {
            if !at_token {
                token_start = i;
                at_token = true;
            }
            quote = Some(c);
        } else if is_word_char(c) {
            if !at_token {
                token_start = i;
                at_token = true;
            }
        } else {
            at_token = false;
        }
    }
    if !at_token {
        token_start = pos;
    }

    // unquote/unescape the token
    let token = &input[token_start..pos];
    let mut prefix = String::with_capacity(token.len());
    let mut chars = token.chars().peekable();
    let open_quote = match chars.peek() {
        Some(c) if quote_chars.contains(*c) => chars.next(),
        _ => None,
    };
    while let Some(c) = chars.next() {
        if Some(c) == escape_char && open_quote.is_none() {
            if let Some(next) = chars.next() {
                prefix.push(next);
            }
        } else if Some(c) == open_quote {
            // closing quote before the cursor, token continues unquoted
        } else {
            prefix.push(c);
        }
    }

    // a closing quote sitting right after the cursor is consumed as well
    let delete_after = match (open_quote, input[pos..].chars().next()) {
        (Some(q), Some(c)) if q == c => q.len_utf8(),
        _ => 0,
    };

    let requote = Requote {
        quote: open_quote,
        escape: escape_char,
        quote_chars: quote_chars.to_owned(),
    };
    ctx.with_geometry(pos - token_start, delete_after, Some(requote), |ctx| {
        fun(ctx, &prefix);
    });
}

fn requote(completion: &str, rq: &Requote) -> String {
    if let Some(q) = rq.quote {
        let mut out = String::with_capacity(completion.len() + 2);
        out.push(q);
        out.push_str(completion);
        out.push(q);
        out
    } else if let Some(esc) = rq.escape {
        let mut out = String::with_capacity(completion.len());
        for c in completion.chars() {
            if c.is_whitespace() || c == esc || rq.quote_chars.contains(c) {
                out.push(esc);
            }
            out.push(c);
        }
        out
    } else {
        completion.to_owned()
    }
}

/// Complete a filename relative to the `;`-separated `roots` (default the
/// current directory) with an optional `;`-separated extension filter.
/// Directories complete with a trailing `dir_separator`.
pub fn complete_filename(
    ctx: &mut CompletionCtx<'_>,
    dir_separator: Option<char>,
    roots: Option<&str>,
    extensions: Option<&str>,
) {
    let roots: Vec<&str> = roots.map_or_else(|| vec!["."], |r| r.split(';').collect());
    let extensions: Option<Vec<&str>> = extensions.map(|e| e.split(';').collect());
    complete_qword(ctx, Some(&char_is_filename_letter), |ctx, prefix| {
        let (dir_part, name_part) = match prefix.rfind('/') {
            Some(i) => (&prefix[..=i], &prefix[i + 1..]),
            None => ("", prefix),
        };
        for root in roots {
            let base = expand_root(root, dir_part);
            let Ok(entries) = std::fs::read_dir(&base) else {
                debug!(target: "inkline", "cannot read dir {}", base.display());
                continue;
            };
            for entry in entries.flatten() {
                if ctx.stop_completing() {
                    return;
                }
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                if !name.starts_with(name_part) {
                    continue;
                }
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                if !is_dir {
                    if let Some(exts) = &extensions {
                        let matches = Path::new(name)
                            .extension()
                            .and_then(|e| e.to_str())
                            .is_some_and(|e| exts.iter().any(|x| x.trim_start_matches('.') == e));
                        if !matches {
                            continue;
                        }
                    }
                }
                let mut completion = format!("{dir_part}{name}");
                if is_dir {
                    if let Some(sep) = dir_separator {
                        completion.push(sep);
                    }
                }
                if !ctx.add(&completion) {
                    return;
                }
            }
        }
    });
}

#[cfg(feature = "with-dirs")]
fn expand_root(root: &str, dir_part: &str) -> PathBuf {
    let joined = if dir_part.is_empty() {
        root.to_owned()
    } else {
        format!("{root}/{dir_part}")
    };
    if let Some(rest) = joined.strip_prefix("~/") {
        if let Some(mut dir) = home::home_dir() {
            dir.push(rest);
            return dir;
        }
    }
    PathBuf::from(joined)
}

#[cfg(not(feature = "with-dirs"))]
fn expand_root(root: &str, dir_part: &str) -> PathBuf {
    if dir_part.is_empty() {
        PathBuf::from(root)
    } else {
        PathBuf::from(format!("{root}/{dir_part}"))
    }
}

/// Run `completer` over `(input, pos)` collecting at most `limit`
/// candidates. With `spell_correct`, zero candidates triggers a retry with
/// the current word replaced by each single-edit variant.
pub(crate) fn generate(
    completer: &dyn Completer,
    input: &str,
    pos: usize,
    limit: usize,
    spell_correct: bool,
) -> Vec<Candidate> {
    let mut ctx = CompletionCtx::new(input, pos, limit);
    let prefix = &input[..pos];
    completer.complete(&mut ctx, prefix);
    let candidates = ctx.into_candidates();
    if !candidates.is_empty() || !spell_correct {
        return candidates;
    }

    // relaxed retry: single-edit variants of the word at the cursor
    let start = input[..pos]
        .char_indices()
        .rev()
        .take_while(|(_, c)| char_is_nonseparator(*c))
        .last()
        .map_or(pos, |(i, _)| i);
    let word = &input[start..pos];
    if word.is_empty() {
        return Vec::new();
    }
    for variant in spell_variants(word) {
        let mut corrected = String::with_capacity(input.len());
        corrected.push_str(&input[..start]);
        corrected.push_str(&variant);
        corrected.push_str(&input[pos..]);
        let vpos = start + variant.len();
        let mut ctx = CompletionCtx::new(&corrected, vpos, limit);
        completer.complete(&mut ctx, &corrected[..vpos]);
        let mut candidates = ctx.into_candidates();
        if candidates.is_empty() {
            continue;
        }
        // geometry was computed against the variant word, rebase it onto
        // the actual buffer contents
        for c in &mut candidates {
            if c.delete_before == variant.len() {
                c.delete_before = word.len();
            }
        }
        debug!(target: "inkline", "spell-corrected {word:?} -> {variant:?}");
        return candidates;
    }
    Vec::new()
}

/// All edit-distance-1 variants of `word`: deletions, adjacent
/// transpositions and ASCII alphanumeric substitutions.
fn spell_variants(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut variants = Vec::new();
    for i in 0..chars.len() {
        let mut v: Vec<char> = chars.clone();
        v.remove(i);
        variants.push(v.into_iter().collect());
    }
    for i in 0..chars.len().saturating_sub(1) {
        let mut v = chars.clone();
        v.swap(i, i + 1);
        variants.push(v.into_iter().collect());
    }
    for i in 0..chars.len() {
        for sub in ('a'..='z').chain('0'..='9') {
            if chars[i] == sub {
                continue;
            }
            let mut v = chars.clone();
            v[i] = sub;
            variants.push(v.into_iter().collect());
        }
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::{
        complete_qword, complete_word, generate, CompletionCtx, Completer, MAX_COMPLETIONS,
    };
    use crate::line_buffer::LineBuffer;

    fn word_completer(words: &'static [&'static str]) -> impl Completer {
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
    fn word_geometry() {
        let completer = word_completer(&["world", "wonder"]);
        let candidates = generate(&completer, "hello wo", 8, MAX_COMPLETIONS, false);
        assert_eq!(2, candidates.len());
        assert_eq!("world", candidates[0].replacement);
        assert_eq!(2, candidates[0].delete_before);
        assert_eq!(0, candidates[0].delete_after);
    }

    #[test]
    fn apply_candidate() {
        let completer = word_completer(&["world"]);
        let mut line = LineBuffer::init("hello wo", 8);
        let candidates = generate(&completer, line.as_str(), 8, 2, false);
        candidates[0].apply(&mut line);
        assert_eq!("hello world", line.as_str());
        assert_eq!(11, line.pos());
    }

    #[test]
    fn hint_remainder() {
        let completer = word_completer(&["world"]);
        let line = LineBuffer::init("wo", 2);
        let candidates = generate(&completer, "wo", 2, 2, false);
        assert_eq!(Some("rld"), candidates[0].hint_text(&line));
    }

    #[test]
    fn distinct_candidates_only() {
        let completer = |ctx: &mut CompletionCtx<'_>, _: &str| {
            ctx.add_prim("same", None, None, 0, 0);
            ctx.add_prim("same", None, None, 0, 0);
            ctx.add_prim("other", None, None, 0, 0);
        };
        let candidates = generate(&completer, "", 0, MAX_COMPLETIONS, false);
        assert_eq!(2, candidates.len());
    }

    #[test]
    fn stop_at_limit() {
        let completer = |ctx: &mut CompletionCtx<'_>, _: &str| {
            for i in 0..10 {
                if !ctx.add_prim(&format!("c{i}"), None, None, 0, 0) {
                    return;
                }
            }
        };
        let candidates = generate(&completer, "", 0, 2, false);
        assert_eq!(2, candidates.len());
    }

    #[test]
    fn quoted_word() {
        let completer = |ctx: &mut CompletionCtx<'_>, _prefix: &str| {
            complete_qword(ctx, None, |ctx, word| {
                if "hello world".starts_with(word) {
                    ctx.add("hello world");
                }
            });
        };
        // "hel  -> "hello world"
        let candidates = generate(&completer, "\"hel", 4, 10, false);
        assert_eq!(1, candidates.len());
        assert_eq!("\"hello world\"", candidates[0].replacement);
        assert_eq!(4, candidates[0].delete_before);

        // hello\ w -> hello\ world
        let candidates = generate(&completer, "hello\\ w", 8, 10, false);
        assert_eq!(1, candidates.len());
        assert_eq!("hello\\ world", candidates[0].replacement);
        assert_eq!(8, candidates[0].delete_before);

        // hello w -> the word is just `w`, no completion
        let candidates = generate(&completer, "hello w", 7, 10, false);
        assert!(candidates.is_empty());
    }

    #[test]
    fn quoted_word_consumes_closing_quote() {
        let completer = |ctx: &mut CompletionCtx<'_>, _prefix: &str| {
            complete_qword(ctx, None, |ctx, word| {
                if "ab cd".starts_with(word) {
                    ctx.add("ab cd");
                }
            });
        };
        let candidates = generate(&completer, "\"ab\"", 3, 10, false);
        assert_eq!(1, candidates.len());
        assert_eq!(1, candidates[0].delete_after);
    }

    #[test]
    fn spell_correction() {
        let completer = word_completer(&["hello"]);
        // "hellp" has no completion, edit distance 1 from "hell"/"hello"
        let candidates = generate(&completer, "hellp", 5, 10, true);
        assert!(!candidates.is_empty());
        assert_eq!("hello", candidates[0].replacement);
        assert_eq!(5, candidates[0].delete_before);
        // without the flag nothing is found
        assert!(generate(&completer, "hellp", 5, 10, false).is_empty());
    }

    #[test]
    fn filename_completion() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("read.me"), b"").unwrap();
        std::fs::write(dir.path().join("read.rs"), b"").unwrap();
        std::fs::create_dir(dir.path().join("reader")).unwrap();
        let root = dir.path().to_str().unwrap().to_owned();
        let completer = move |ctx: &mut CompletionCtx<'_>, _prefix: &str| {
            super::complete_filename(ctx, Some('/'), Some(&root), Some("rs"));
        };
        let mut candidates = generate(&completer, "rea", 3, 100, false);
        candidates.sort_by(|a, b| a.replacement.cmp(&b.replacement));
        let names: Vec<&str> = candidates.iter().map(|c| c.replacement.as_str()).collect();
        // extension filter drops read.me, the dir gets a trailing separator
        assert_eq!(vec!["read.rs", "reader/"], names);
    }
}
