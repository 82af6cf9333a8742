use std::{
    collections::{HashMap, HashSet},
    iter::Peekable,
    str::Chars,
};

use serde::Serialize;
use serde_json::{Map, Value, ser::PrettyFormatter};

use crate::{
    error::Error,
    formats::join_key,
    traits::ResourceCodec,
    types::{Entry, Layout, ParsedResource, Position, TextRange},
};

/// Codec for JSON resource files.
///
/// Nested objects are flattened to dotted keys; non-string scalars are kept
/// as their JSON text. Output is one flat object. A parsed file records its
/// indent unit and trailing newline so a rewrite keeps them; without one the
/// output is indented with four spaces and has no trailing newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ResourceCodec for JsonCodec {
    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn parse_str(&self, text: &str) -> Result<ParsedResource, Error> {
        let Value::Object(map) = serde_json::from_str::<Value>(text)? else {
            return Err(Error::InvalidResource(
                "top-level JSON value must be an object".to_string(),
            ));
        };

        let mut entries = Vec::new();
        let mut seen = HashMap::new();
        flatten("", map, &mut entries, &mut seen);

        let keys: HashSet<&str> = entries.iter().map(|entry| entry.key.as_str()).collect();
        let mut ranges = locate_keys(text);
        ranges.retain(|key, _| keys.contains(key.as_str()));

        Ok(ParsedResource {
            entries,
            ranges,
            layout: detect_layout(text),
        })
    }

    fn serialize(&self, entries: &[Entry]) -> Result<Vec<u8>, Error> {
        self.serialize_with(entries, &Layout::default())
    }

    fn serialize_with(&self, entries: &[Entry], layout: &Layout) -> Result<Vec<u8>, Error> {
        let map: Map<String, Value> = entries
            .iter()
            .map(|entry| (entry.key.clone(), Value::String(entry.value.clone())))
            .collect();

        let mut out = Vec::new();
        let formatter = PrettyFormatter::with_indent(layout.indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        Value::Object(map).serialize(&mut serializer)?;
        if layout.trailing_newline {
            out.push(b'\n');
        }
        Ok(out)
    }
}

/// Indent of the first indented line, and whether the text ends a line.
fn detect_layout(text: &str) -> Layout {
    let mut layout = Layout {
        trailing_newline: text.ends_with('\n'),
        ..Layout::default()
    };
    let indent = text.lines().skip(1).find_map(|line| {
        let body = line.trim_start_matches([' ', '\t']);
        let indent = &line[..line.len() - body.len()];
        (!indent.is_empty() && !body.trim().is_empty()).then_some(indent)
    });
    if let Some(indent) = indent {
        layout.indent = indent.to_string();
    }
    layout
}

fn flatten(
    prefix: &str,
    map: Map<String, Value>,
    entries: &mut Vec<Entry>,
    seen: &mut HashMap<String, usize>,
) {
    for (key, value) in map {
        let key = join_key(prefix, &key);
        let value = match value {
            Value::Object(child) => {
                flatten(&key, child, entries, seen);
                continue;
            }
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        // A flat "a.b" and a nested {"a": {"b"}} collapse; the later one wins.
        match seen.get(&key) {
            Some(&index) => entries[index].value = value,
            None => {
                seen.insert(key.clone(), entries.len());
                entries.push(Entry { key, value });
            }
        }
    }
}

struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    character: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Scanner {
            chars: text.chars().peekable(),
            line: 0,
            character: 0,
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.character)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.character = 0;
        } else {
            self.character += 1;
        }
        Some(c)
    }

    /// Reads a string body after its opening quote; returns raw text and range.
    fn string(&mut self) -> (String, TextRange) {
        let start = self.position();
        let mut raw = String::new();
        loop {
            let end = self.position();
            match self.bump() {
                None => return (raw, TextRange::new(start, end)),
                Some('"') => return (raw, TextRange::new(start, end)),
                Some('\\') => {
                    raw.push('\\');
                    if let Some(escaped) = self.bump() {
                        raw.push(escaped);
                    }
                }
                Some(c) => raw.push(c),
            }
        }
    }

    fn skip_scalar(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, ',' | ':' | ']' | '}' | '{' | '[' | '"') {
                break;
            }
            self.bump();
        }
    }
}

enum Frame {
    /// `prefix` is `None` inside arrays, where no key gets a range.
    Object {
        prefix: Option<String>,
        key: Option<(String, TextRange)>,
    },
    Array,
}

impl Frame {
    /// Takes the pending key, returning its full dotted path if tracked.
    fn take_key(&mut self) -> Option<(String, TextRange)> {
        match self {
            Frame::Object {
                prefix: Some(prefix),
                key,
            } => key.take().map(|(key, range)| (join_key(prefix, &key), range)),
            Frame::Object { key, .. } => {
                key.take();
                None
            }
            Frame::Array => None,
        }
    }
}

fn unescape(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{}\"", raw)).unwrap_or_else(|_| raw.to_string())
}

/// Finds the source range of every leaf key, keyed by dotted path.
fn locate_keys(text: &str) -> HashMap<String, TextRange> {
    let mut ranges = HashMap::new();
    let mut scanner = Scanner::new(text);
    let mut stack: Vec<Frame> = Vec::new();

    while let Some(c) = scanner.peek() {
        match c {
            '{' => {
                scanner.bump();
                let prefix = match stack.last_mut() {
                    None => Some(String::new()),
                    Some(frame) => frame.take_key().map(|(path, _)| path),
                };
                stack.push(Frame::Object { prefix, key: None });
            }
            '[' => {
                scanner.bump();
                if let Some((path, range)) = stack.last_mut().and_then(Frame::take_key) {
                    ranges.insert(path, range);
                }
                stack.push(Frame::Array);
            }
            '}' | ']' => {
                scanner.bump();
                stack.pop();
            }
            '"' => {
                scanner.bump();
                let (raw, range) = scanner.string();
                match stack.last_mut() {
                    Some(Frame::Object { key: key @ None, .. }) => {
                        *key = Some((unescape(&raw), range));
                    }
                    Some(frame) => {
                        if let Some((path, range)) = frame.take_key() {
                            ranges.insert(path, range);
                        }
                    }
                    None => {}
                }
            }
            c if c.is_whitespace() || c == ',' || c == ':' => {
                scanner.bump();
            }
            _ => {
                scanner.skip_scalar();
                if let Some((path, range)) = stack.last_mut().and_then(Frame::take_key) {
                    ranges.insert(path, range);
                }
            }
        }
    }

    ranges
}
