//! History ring with optional file backing, search and prefix navigation.
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use log::warn;
use regex::Regex;

use crate::Result;

/// Default maximum number of entries.
pub const DEFAULT_HISTORY_SIZE: usize = 200;

/// Direction of a history search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    /// Towards older entries
    Reverse,
    /// Towards newer entries
    Forward,
}

/// A located history match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    /// Entry index, 0 is the newest entry
    pub idx: usize,
    /// Byte offset of the match within the entry
    pub start: usize,
    /// Byte offset one past the match
    pub end: usize,
}

/// Match `pattern` against `entry`: as a regex when it compiles, as a
/// plain substring otherwise.
fn match_pattern(entry: &str, pattern: &str, regex: Option<&Regex>) -> Option<(usize, usize)> {
    match regex {
        Some(re) => re.find(entry).map(|m| (m.start(), m.end())),
        None => entry.find(pattern).map(|i| (i, i + pattern.len())),
    }
}

/// In-memory ring of input lines, newest last, with optional append-only
/// file backing.
pub struct History {
    entries: VecDeque<String>,
    max_len: usize,
    allow_duplicates: bool,
    path: Option<PathBuf>,
}

impl Default for History {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
            max_len: DEFAULT_HISTORY_SIZE,
            allow_duplicates: false,
            path: None,
        }
    }
}

impl History {
    /// Empty history with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the history empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry by index, `0` being the newest.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&str> {
        let len = self.entries.len();
        if idx < len {
            self.entries.get(len - 1 - idx).map(String::as_str)
        } else {
            None
        }
    }

    /// Allow or suppress adjacent duplicate entries. Returns the previous
    /// setting.
    pub fn set_allow_duplicates(&mut self, yes: bool) -> bool {
        std::mem::replace(&mut self.allow_duplicates, yes)
    }

    /// Change the maximum number of entries, dropping the oldest overflow.
    pub fn set_max_len(&mut self, max_len: usize) {
        self.max_len = max_len;
        while self.entries.len() > self.max_len {
            self.entries.pop_front();
        }
    }

    /// Attach a backing file (`None` detaches) and load its contents.
    /// `max_entries < 0` keeps the default capacity.
    pub fn set_file(&mut self, path: Option<&Path>, max_entries: isize) -> Result<()> {
        if max_entries >= 0 {
            self.set_max_len(max_entries as usize);
        }
        self.path = path.map(Path::to_path_buf);
        self.load()
    }

    /// Append `entry`. Adjacent duplicates are dropped unless enabled.
    pub fn push(&mut self, entry: &str) {
        if !self.allow_duplicates && self.entries.back().map(String::as_str) == Some(entry) {
            return;
        }
        self.entries.push_back(entry.to_owned());
        while self.entries.len() > self.max_len {
            self.entries.pop_front();
        }
    }

    /// Append the in-progress placeholder for an active read
    /// (unconditionally, so the newest slot always exists).
    pub(crate) fn push_placeholder(&mut self) {
        self.entries.push_back(String::new());
        while self.entries.len() > self.max_len {
            self.entries.pop_front();
        }
    }

    /// Rewrite the newest entry (the in-progress placeholder) without any
    /// duplicate filtering; used to stash the live input during history
    /// navigation.
    pub(crate) fn stash(&mut self, entry: &str) {
        if let Some(last) = self.entries.back_mut() {
            last.clear();
            last.push_str(entry);
        } else {
            self.entries.push_back(entry.to_owned());
        }
    }

    /// Rewrite the newest entry with the current input; drops it again if
    /// it duplicates its predecessor.
    pub fn update(&mut self, entry: &str) {
        if let Some(last) = self.entries.back_mut() {
            last.clear();
            last.push_str(entry);
        } else {
            self.entries.push_back(entry.to_owned());
        }
        if !self.allow_duplicates && self.entries.len() >= 2 {
            let len = self.entries.len();
            if self.entries[len - 1] == self.entries[len - 2] {
                self.entries.pop_back();
            }
        }
    }

    /// Remove the newest entry.
    pub fn remove_last(&mut self) {
        self.entries.pop_back();
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Next entry in `dir` from `start` (exclusive) whose text begins with
    /// `prefix`.
    #[must_use]
    pub fn starts_with(&self, prefix: &str, start: usize, dir: SearchDirection) -> Option<usize> {
        match dir {
            SearchDirection::Reverse => (start + 1..self.entries.len())
                .find(|&idx| self.get(idx).is_some_and(|e| e.starts_with(prefix))),
            SearchDirection::Forward => (0..start)
                .rev()
                .find(|&idx| self.get(idx).is_some_and(|e| e.starts_with(prefix))),
        }
    }

    /// Match `pattern` within the single entry `idx`.
    #[must_use]
    pub fn search_at(&self, pattern: &str, idx: usize) -> Option<SearchResult> {
        let regex = Regex::new(pattern).ok();
        let entry = self.get(idx)?;
        match_pattern(entry, pattern, regex.as_ref())
            .map(|(start, end)| SearchResult { idx, start, end })
    }

    /// Incremental search for `pattern` in `dir` from `start` (exclusive).
    /// The pattern is tried as a regex; an invalid regex degrades to a
    /// plain substring match.
    #[must_use]
    pub fn search(
        &self,
        pattern: &str,
        start: usize,
        dir: SearchDirection,
    ) -> Option<SearchResult> {
        let regex = Regex::new(pattern).ok();
        let probe = |idx: usize| -> Option<SearchResult> {
            let entry = self.get(idx)?;
            match_pattern(entry, pattern, regex.as_ref())
                .map(|(start, end)| SearchResult { idx, start, end })
        };
        match dir {
            SearchDirection::Reverse => {
                (start + 1..self.entries.len()).find_map(probe)
            }
            SearchDirection::Forward => (0..start).rev().find_map(probe),
        }
    }

    /// Reload from the backing file, replacing the in-memory ring.
    /// Missing files and I/O failures are non-fatal.
    pub fn load(&mut self) -> Result<()> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        match self.load_from(&path) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(target: "inkline", "cannot load history {}: {err}", path.display());
                Ok(())
            }
        }
    }

    #[cfg(feature = "with-file-history")]
    fn load_from(&mut self, path: &Path) -> std::io::Result<()> {
        use std::io::{BufRead, BufReader};
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        };
        let mut lock = fd_lock::RwLock::new(file);
        let guard = lock.read()?;
        self.entries.clear();
        for line in BufReader::new(&*guard).lines() {
            let entry = unescape_entry(&line?);
            self.push(&entry);
        }
        Ok(())
    }

    #[cfg(not(feature = "with-file-history"))]
    fn load_from(&mut self, _path: &Path) -> std::io::Result<()> {
        Ok(())
    }

    /// Write the ring to the backing file atomically (temp file + rename).
    /// Failures are non-fatal; the next save retries.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Err(err) = self.save_to(path) {
            warn!(target: "inkline", "cannot save history {}: {err}", path.display());
        }
        Ok(())
    }

    #[cfg(feature = "with-file-history")]
    fn save_to(&self, path: &Path) -> std::io::Result<()> {
        use std::io::Write;
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let mut lock = fd_lock::RwLock::new(file);
        let _guard = lock.write()?;
        // write a sibling temp file, then rename over the target
        let mut tmp_path = path.as_os_str().to_owned();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);
        {
            let mut tmp = std::fs::File::create(&tmp_path)?;
            for entry in &self.entries {
                writeln!(tmp, "{}", escape_entry(entry))?;
            }
            tmp.sync_all()?;
        }
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    #[cfg(not(feature = "with-file-history"))]
    fn save_to(&self, _path: &Path) -> std::io::Result<()> {
        Ok(())
    }
}

/// Entries are stored one per line; embedded newlines and backslashes are
/// escaped.
#[cfg(feature = "with-file-history")]
fn escape_entry(entry: &str) -> String {
    entry.replace('\\', "\\\\").replace('\n', "\\n")
}

#[cfg(feature = "with-file-history")]
fn unescape_entry(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{History, SearchDirection};

    fn history(entries: &[&str]) -> History {
        let mut h = History::new();
        for e in entries {
            h.push(e);
        }
        h
    }

    #[test]
    fn push_dedup() {
        let mut h = history(&["ls", "ls", "pwd"]);
        assert_eq!(2, h.len());
        assert_eq!(Some("pwd"), h.get(0));
        assert_eq!(Some("ls"), h.get(1));
        h.set_allow_duplicates(true);
        h.push("pwd");
        assert_eq!(3, h.len());
    }

    #[test]
    fn capacity() {
        let mut h = History::new();
        h.set_max_len(2);
        for e in ["a", "b", "c"] {
            h.push(e);
        }
        assert_eq!(2, h.len());
        assert_eq!(Some("c"), h.get(0));
        assert_eq!(Some("b"), h.get(1));
        assert_eq!(None, h.get(2));
    }

    #[test]
    fn placeholder_discipline() {
        let mut h = history(&["ls"]);
        h.push_placeholder();
        assert_eq!(Some(""), h.get(0));
        h.update("make");
        assert_eq!(Some("make"), h.get(0));
        h.remove_last();
        assert_eq!(Some("ls"), h.get(0));
    }

    #[test]
    fn update_dedups_against_predecessor() {
        let mut h = history(&["ls"]);
        h.push_placeholder();
        h.update("ls");
        assert_eq!(1, h.len());
    }

    #[test]
    fn prefix_navigation() {
        let h = history(&["git status", "make", "git push", ""]);
        assert_eq!(
            Some(1),
            h.starts_with("git", 0, SearchDirection::Reverse)
        );
        assert_eq!(
            Some(3),
            h.starts_with("git", 1, SearchDirection::Reverse)
        );
        assert_eq!(None, h.starts_with("git", 3, SearchDirection::Reverse));
        assert_eq!(
            Some(1),
            h.starts_with("git", 3, SearchDirection::Forward)
        );
    }

    #[test]
    fn search_substring_and_regex() {
        let h = history(&["make test", "cargo build", ""]);
        let m = h.search("te", 0, SearchDirection::Reverse).unwrap();
        assert_eq!(2, m.idx);
        assert_eq!(5, m.start);
        // regex pattern
        let m = h.search("c.rgo", 0, SearchDirection::Reverse).unwrap();
        assert_eq!(1, m.idx);
        // invalid regex degrades to substring
        assert_eq!(None, h.search("build(", 0, SearchDirection::Reverse));
    }

    #[cfg(feature = "with-file-history")]
    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        let mut h = History::new();
        h.set_file(Some(&path), -1).unwrap();
        h.push("one");
        h.push("two\nlines");
        h.save().unwrap();

        let mut h2 = History::new();
        h2.set_file(Some(&path), -1).unwrap();
        assert_eq!(2, h2.len());
        assert_eq!(Some("two\nlines"), h2.get(0));
        assert_eq!(Some("one"), h2.get(1));
    }

    #[test]
    fn missing_file_is_not_fatal() {
        let mut h = History::new();
        assert!(h
            .set_file(Some(std::path::Path::new("/nonexistent/dir/hist")), -1)
            .is_ok());
        h.push("still works");
        assert_eq!(1, h.len());
        assert!(h.save().is_ok());
    }
}
