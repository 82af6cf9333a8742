//! Editor features computed from an index snapshot and a source document.
//!
//! Every provider is a plain function of the index, the configuration, the
//! document text and (where relevant) a cursor position. Source documents
//! reference translations through calls like `t('greeting.hello')`.

use std::path::PathBuf;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    config::Configuration,
    index::{ResourceIndex, bundle_or_default, default_bundle},
    locale::iso_entry,
    query::translations_of,
    types::{Position, TextRange},
};

lazy_static! {
    static ref CALL: Regex =
        Regex::new(r#"\bt\(\s*(["'])([^"']*)["']\s*\)?"#).expect("valid call regex");
    static ref OPEN_CALL: Regex =
        Regex::new(r#"\bt\(\s*["']([^"']*)$"#).expect("valid open call regex");
}

/// A translation call found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCall {
    pub key: String,
    /// The key text between the quotes.
    pub key_range: TextRange,
    /// From `t` to the closing parenthesis (or quote, if unclosed).
    pub call_range: TextRange,
}

fn char_column(line: &str, byte: usize) -> usize {
    line[..byte].chars().count()
}

/// All translation calls, in document order.
pub fn find_calls(text: &str) -> Vec<KeyCall> {
    let mut calls = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        for caps in CALL.captures_iter(line) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            calls.push(KeyCall {
                key: key.as_str().to_string(),
                key_range: TextRange::on_line(
                    line_no,
                    char_column(line, key.start()),
                    char_column(line, key.end()),
                ),
                call_range: TextRange::on_line(
                    line_no,
                    char_column(line, whole.start()),
                    char_column(line, whole.end()),
                ),
            });
        }
    }
    calls
}

/// The call under `position`, if any.
pub fn find_key_at(text: &str, position: Position) -> Option<KeyCall> {
    find_calls(text)
        .into_iter()
        .find(|call| call.call_range.contains(position))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hover {
    pub range: TextRange,
    /// Markdown: the key followed by a table of per-locale values.
    pub contents: String,
}

/// Per-locale values of the key under the cursor.
pub fn hover(index: &ResourceIndex, text: &str, position: Position) -> Option<Hover> {
    let call = find_key_at(text, position)?;
    let rows = translations_of(index, &call.key);
    if rows.is_empty() {
        return None;
    }
    let mut contents = format!("**{}**\n\n| locale | text |\n| --- | --- |\n", call.key);
    for (code, value) in rows {
        let name = iso_entry(code).map(|entry| entry.name).unwrap_or(code);
        let value = value.replace('|', "\\|").replace('\n', "<br>");
        contents.push_str(&format!("| {} | {} |\n", name, value));
    }
    Some(Hover {
        range: call.key_range,
        contents,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: PathBuf,
    pub range: TextRange,
}

/// Where the key under the cursor is defined in the default bundle.
pub fn definition(
    index: &ResourceIndex,
    config: &Configuration,
    text: &str,
    position: Position,
) -> Option<Location> {
    let call = find_key_at(text, position)?;
    let bundle = default_bundle(index, config).bundle()?;
    let range = bundle.range_of(&call.key)?;
    Some(Location {
        file: bundle.file.clone(),
        range,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub label: String,
    /// Default-locale text of the key.
    pub detail: String,
}

/// Keys of the default bundle when the cursor sits inside `t('...`.
///
/// Only keys starting with the text typed so far are offered.
pub fn completion(
    index: &ResourceIndex,
    config: &Configuration,
    text: &str,
    position: Position,
) -> Vec<CompletionItem> {
    let Some(line) = text.lines().nth(position.line) else {
        return Vec::new();
    };
    let before: String = line.chars().take(position.character).collect();
    let Some(typed) = OPEN_CALL.captures(&before).and_then(|caps| caps.get(1)) else {
        return Vec::new();
    };
    let Some(bundle) = default_bundle(index, config).bundle() else {
        return Vec::new();
    };
    bundle
        .entries
        .iter()
        .filter(|entry| entry.key.starts_with(typed.as_str()))
        .map(|entry| CompletionItem {
            label: entry.key.clone(),
            detail: entry.value.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlayHint {
    /// Right after the call.
    pub position: Position,
    pub label: String,
}

/// The display locale's text after every known call.
pub fn inlay_hints(index: &ResourceIndex, config: &Configuration, text: &str) -> Vec<InlayHint> {
    let display = config.display_or_main().to_string();
    let Some(bundle) = bundle_or_default(index, config, &display) else {
        return Vec::new();
    };
    find_calls(text)
        .into_iter()
        .filter_map(|call| {
            let value = bundle.get(&call.key).filter(|value| !value.is_empty())?;
            Some(InlayHint {
                position: call.call_range.end,
                label: value.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub range: TextRange,
    pub key: String,
    pub message: String,
}

/// Calls naming keys the default bundle lacks.
pub fn diagnostics(index: &ResourceIndex, config: &Configuration, text: &str) -> Vec<Diagnostic> {
    let Some(bundle) = default_bundle(index, config).bundle() else {
        return Vec::new();
    };
    find_calls(text)
        .into_iter()
        .filter(|call| !call.key.is_empty() && !bundle.contains_key(&call.key))
        .map(|call| Diagnostic {
            range: call.key_range,
            message: format!("unknown translation key `{}`", call.key),
            key: call.key,
        })
        .collect()
}

/// A quick fix offered at an unknown key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAction {
    pub title: String,
    pub key: String,
    pub range: TextRange,
}

fn overlaps(a: &TextRange, b: &TextRange) -> bool {
    a.start <= b.end && b.start <= a.end
}

/// Offers to add each unknown key touching `range`.
pub fn code_actions(
    index: &ResourceIndex,
    config: &Configuration,
    text: &str,
    range: TextRange,
) -> Vec<CodeAction> {
    diagnostics(index, config, text)
        .into_iter()
        .filter(|diagnostic| overlaps(&diagnostic.range, &range))
        .map(|diagnostic| CodeAction {
            title: format!("Add `{}` to translations", diagnostic.key),
            key: diagnostic.key,
            range: diagnostic.range,
        })
        .collect()
}

fn is_quote(c: char) -> bool {
    matches!(c, '\'' | '"' | '`')
}

/// Grows a selection to the nearest matching quotes around it.
///
/// The opening quote is searched leftwards on the first line, the closing
/// one rightwards on the last line; the selection is kept as is unless
/// both are found and are the same character.
pub fn expand_selection_to_quotes(text: &str, selection: TextRange) -> TextRange {
    let lines: Vec<&str> = text.lines().collect();
    let (Some(first), Some(last)) = (
        lines.get(selection.start.line),
        lines.get(selection.end.line),
    ) else {
        return selection;
    };
    let first: Vec<char> = first.chars().collect();
    let last: Vec<char> = last.chars().collect();

    let open = first[..selection.start.character.min(first.len())]
        .iter()
        .rposition(|c| is_quote(*c));
    let close = last
        .iter()
        .skip(selection.end.character)
        .position(|c| is_quote(*c))
        .map(|offset| selection.end.character + offset);

    match (open, close) {
        (Some(open), Some(close)) if first[open] == last[close] => TextRange::new(
            Position::new(selection.start.line, open),
            Position::new(selection.end.line, close + 1),
        ),
        _ => selection,
    }
}

/// Text covered by a single-line or multi-line range.
pub fn text_in_range(text: &str, range: TextRange) -> String {
    let mut out = String::new();
    for (line_no, line) in text.lines().enumerate() {
        if line_no < range.start.line || line_no > range.end.line {
            continue;
        }
        let start = if line_no == range.start.line {
            range.start.character
        } else {
            0
        };
        let piece: String = if line_no == range.end.line {
            line.chars()
                .take(range.end.character)
                .skip(start)
                .collect()
        } else {
            line.chars().skip(start).collect()
        };
        if line_no > range.start.line {
            out.push('\n');
        }
        out.push_str(&piece);
    }
    out
}
