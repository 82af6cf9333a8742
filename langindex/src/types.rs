//! Core, format-agnostic types for langindex.
//! Codecs decode into these; the index stores and serves them.

use std::{
    collections::HashMap,
    fmt::Display,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::locale::LocaleCode;

/// A zero-based line/character position in a text document.
///
/// `character` counts Unicode scalar values from the start of the line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Position { line, character }
    }
}

/// A half-open range between two positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    pub fn new(start: Position, end: Position) -> Self {
        TextRange { start, end }
    }

    /// Range on a single line.
    pub fn on_line(line: usize, start: usize, end: usize) -> Self {
        TextRange {
            start: Position::new(line, start),
            end: Position::new(line, end),
        }
    }

    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }
}

impl Display for TextRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.line + 1,
            self.start.character + 1,
            self.end.line + 1,
            self.end.character + 1
        )
    }
}

/// A single key/translated-text pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Entry {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Whitespace conventions of a resource file, reused when it is rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// One level of indentation.
    pub indent: String,
    pub trailing_newline: bool,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            indent: "    ".to_string(),
            trailing_newline: false,
        }
    }
}

/// Output of [`crate::traits::ResourceCodec::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResource {
    /// Entries in source order.
    pub entries: Vec<Entry>,
    /// Source range of each key's text.
    pub ranges: HashMap<String, TextRange>,
    pub layout: Layout,
}

/// The full key → translated-text set of one locale, backed by one file.
///
/// `entries` and `ranges` share the same key set once a parse completes;
/// ranges are navigation hints and never the source of content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBundle {
    pub code: LocaleCode,
    pub file: PathBuf,
    pub entries: Vec<Entry>,
    pub ranges: HashMap<String, TextRange>,
    pub layout: Layout,
}

impl ResourceBundle {
    pub fn new(code: impl Into<LocaleCode>, file: impl Into<PathBuf>, parsed: ParsedResource) -> Self {
        ResourceBundle {
            code: code.into(),
            file: file.into(),
            entries: parsed.entries,
            ranges: parsed.ranges,
            layout: parsed.layout,
        }
    }

    /// Finds the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    /// Keys in source order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn range_of(&self, key: &str) -> Option<TextRange> {
        self.ranges.get(key).copied()
    }

    /// Sets `key` to `value`, keeping the existing position or appending.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => entry.value = value,
            None => self.entries.push(Entry::new(key, value)),
        }
    }

    /// Removes `key` from entries and ranges; returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.key != key);
        self.ranges.remove(key);
        self.entries.len() != before
    }

    pub fn is_backed_by(&self, path: &Path) -> bool {
        self.file == path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> ResourceBundle {
        ResourceBundle::new(
            "en",
            "i18n/lang.en.json",
            ParsedResource {
                entries: vec![Entry::new("a", "A"), Entry::new("b", "B")],
                ranges: HashMap::from([
                    ("a".to_string(), TextRange::on_line(1, 5, 6)),
                    ("b".to_string(), TextRange::on_line(2, 5, 6)),
                ]),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_set_keeps_order_and_appends() {
        let mut bundle = bundle();
        bundle.set("a", "A2");
        bundle.set("c", "C");
        assert_eq!(bundle.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(bundle.get("a"), Some("A2"));
    }

    #[test]
    fn test_remove_drops_range() {
        let mut bundle = bundle();
        assert!(bundle.remove("a"));
        assert!(!bundle.remove("a"));
        assert_eq!(bundle.range_of("a"), None);
        assert_eq!(bundle.range_of("b"), Some(TextRange::on_line(2, 5, 6)));
    }

    #[test]
    fn test_range_contains_and_display() {
        let range = TextRange::on_line(3, 4, 9);
        assert!(range.contains(Position::new(3, 4)));
        assert!(range.contains(Position::new(3, 9)));
        assert!(!range.contains(Position::new(3, 10)));
        assert_eq!(range.to_string(), "4:5-4:10");
    }
}
