use std::collections::{HashMap, HashSet};

use serde_yaml::{Mapping, Value};

use crate::{
    error::Error,
    formats::join_key,
    traits::ResourceCodec,
    types::{Entry, ParsedResource, TextRange},
};

/// Codec for YAML resource files.
///
/// Nested mappings are flattened to dotted keys. Output is a single flat
/// mapping in entry order, as emitted by `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl ResourceCodec for YamlCodec {
    fn extensions(&self) -> &'static [&'static str] {
        &["yaml", "yml"]
    }

    fn parse_str(&self, text: &str) -> Result<ParsedResource, Error> {
        let mapping = match serde_yaml::from_str::<Value>(text)? {
            Value::Mapping(mapping) => mapping,
            // An empty document is an empty bundle.
            Value::Null => Mapping::new(),
            _ => {
                return Err(Error::InvalidResource(
                    "top-level YAML value must be a mapping".to_string(),
                ));
            }
        };

        let mut entries = Vec::new();
        let mut seen = HashMap::new();
        flatten("", mapping, &mut entries, &mut seen)?;

        let keys: HashSet<&str> = entries.iter().map(|entry| entry.key.as_str()).collect();
        let mut ranges = locate_keys(text);
        ranges.retain(|key, _| keys.contains(key.as_str()));

        Ok(ParsedResource {
            entries,
            ranges,
            ..Default::default()
        })
    }

    fn serialize(&self, entries: &[Entry]) -> Result<Vec<u8>, Error> {
        let mut mapping = Mapping::new();
        for entry in entries {
            mapping.insert(
                Value::String(entry.key.clone()),
                Value::String(entry.value.clone()),
            );
        }
        Ok(serde_yaml::to_string(&mapping)?.into_bytes())
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn flatten(
    prefix: &str,
    mapping: Mapping,
    entries: &mut Vec<Entry>,
    seen: &mut HashMap<String, usize>,
) -> Result<(), Error> {
    for (key, value) in mapping {
        let Some(key) = scalar_text(&key) else {
            return Err(Error::InvalidResource(
                "mapping keys must be scalars".to_string(),
            ));
        };
        let key = join_key(prefix, &key);
        let value = match value {
            Value::Mapping(child) => {
                flatten(&key, child, entries, seen)?;
                continue;
            }
            other => match scalar_text(&other) {
                Some(text) => text,
                None => serde_yaml::to_string(&other)?.trim_end().to_string(),
            },
        };
        match seen.get(&key) {
            Some(&index) => entries[index].value = value,
            None => {
                seen.insert(key.clone(), entries.len());
                entries.push(Entry { key, value });
            }
        }
    }
    Ok(())
}

/// A key found at the start of a line: unescaped text, char span, rest of line.
struct KeyLine<'a> {
    key: String,
    start: usize,
    end: usize,
    rest: &'a str,
}

fn split_key(line: &str) -> Option<KeyLine<'_>> {
    let quote = line.chars().next()?;
    if quote == '"' || quote == '\'' {
        let mut escaped = false;
        let mut close = None;
        for (i, c) in line.char_indices().skip(1) {
            if quote == '"' && c == '\\' && !escaped {
                escaped = true;
                continue;
            }
            if c == quote && !escaped {
                // '' is an escaped quote inside single-quoted scalars
                if quote == '\'' && line[i + 1..].starts_with('\'') {
                    escaped = true;
                    continue;
                }
                close = Some(i);
                break;
            }
            escaped = false;
        }
        let close = close?;
        let after = line[close + 1..].trim_start();
        let rest = after.strip_prefix(':')?;
        if !(rest.is_empty() || rest.starts_with(' ')) {
            return None;
        }
        let quoted = &line[..=close];
        let key = serde_yaml::from_str::<String>(quoted)
            .unwrap_or_else(|_| quoted[1..quoted.len() - 1].to_string());
        return Some(KeyLine {
            key,
            start: 1,
            end: line[..close].chars().count(),
            rest,
        });
    }

    let colon = line
        .char_indices()
        .find(|&(i, c)| c == ':' && (line[i + 1..].is_empty() || line[i + 1..].starts_with(' ')))
        .map(|(i, _)| i)?;
    let key = line[..colon].trim_end();
    if key.is_empty() {
        return None;
    }
    Some(KeyLine {
        key: key.to_string(),
        start: 0,
        end: key.chars().count(),
        rest: &line[colon + 1..],
    })
}

/// Finds the source range of every key, keyed by dotted path.
fn locate_keys(text: &str) -> HashMap<String, TextRange> {
    let mut ranges = HashMap::new();
    let mut parents: Vec<(usize, String)> = Vec::new();
    let mut block_indent: Option<usize> = None;

    for (line_no, line) in text.lines().enumerate() {
        let trimmed = line.trim_start_matches(' ');
        let indent = line.len() - trimmed.len();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some(block) = block_indent {
            if indent > block {
                continue;
            }
            block_indent = None;
        }
        if trimmed.starts_with("---") || trimmed.starts_with("...") || trimmed.starts_with('-') {
            continue;
        }
        let Some(found) = split_key(trimmed) else {
            continue;
        };

        while parents.last().is_some_and(|(depth, _)| *depth >= indent) {
            parents.pop();
        }
        let parent = parents.last().map(|(_, path)| path.as_str()).unwrap_or("");
        let path = join_key(parent, &found.key);
        ranges.insert(
            path.clone(),
            TextRange::on_line(line_no, indent + found.start, indent + found.end),
        );

        let rest = found.rest.trim();
        let is_anchor_only = rest.starts_with('&') && !rest.contains(' ');
        if rest.is_empty() || rest.starts_with('#') || is_anchor_only {
            parents.push((indent, path));
        } else if rest.starts_with('|') || rest.starts_with('>') {
            block_indent = Some(indent);
        }
    }

    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_parse_nested_mapping() {
        let text = indoc! {"
            greeting:
              hello: Hello
              bye: Bye
            # a comment
            title: Main
        "};
        let parsed = YamlCodec.parse_str(text).unwrap();
        assert_eq!(
            parsed.entries,
            vec![
                Entry::new("greeting.hello", "Hello"),
                Entry::new("greeting.bye", "Bye"),
                Entry::new("title", "Main"),
            ]
        );
        assert_eq!(
            parsed.ranges.get("greeting.hello"),
            Some(&TextRange::on_line(1, 2, 7))
        );
        assert_eq!(parsed.ranges.get("title"), Some(&TextRange::on_line(4, 0, 5)));
        assert!(!parsed.ranges.contains_key("greeting"));
    }

    #[test]
    fn test_block_scalar_lines_are_not_keys() {
        let text = indoc! {"
            intro: |
              first: line
              second line
            after: done
        "};
        let parsed = YamlCodec.parse_str(text).unwrap();
        assert_eq!(parsed.entries[0].value, "first: line\nsecond line\n");
        assert_eq!(parsed.ranges.get("after"), Some(&TextRange::on_line(3, 0, 5)));
        assert_eq!(parsed.ranges.len(), 2);
    }

    #[test]
    fn test_quoted_keys() {
        let text = indoc! {r#"
            "with: colon": a
            'it''s': b
        "#};
        let parsed = YamlCodec.parse_str(text).unwrap();
        assert_eq!(
            parsed.ranges.get("with: colon"),
            Some(&TextRange::on_line(0, 1, 12))
        );
        assert_eq!(parsed.ranges.get("it's"), Some(&TextRange::on_line(1, 1, 6)));
    }

    #[test]
    fn test_scalars_become_text() {
        let parsed = YamlCodec.parse_str("count: 3\nflag: true\nnothing:\n").unwrap();
        let values: Vec<_> = parsed.entries.iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, vec!["3", "true", ""]);
    }

    #[test]
    fn test_empty_document() {
        let parsed = YamlCodec.parse_str("").unwrap();
        assert!(parsed.entries.is_empty());
    }

    #[test]
    fn test_rejects_sequence_document() {
        assert!(matches!(
            YamlCodec.parse_str("- a\n- b\n"),
            Err(Error::InvalidResource(_))
        ));
    }

    #[test]
    fn test_serialize_flat_mapping() {
        let entries = vec![Entry::new("b", "Bee"), Entry::new("a.c", "Sea")];
        let bytes = YamlCodec.serialize(&entries).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "b: Bee\na.c: Sea\n");
    }

    #[test]
    fn test_roundtrip_serialized_bytes() {
        let entries = vec![
            Entry::new("plain", "Hello"),
            Entry::new("numeric", "42"),
            Entry::new("multi", "one\ntwo"),
            Entry::new("cjk", "你好"),
        ];
        let bytes = YamlCodec.serialize(&entries).unwrap();
        let parsed = YamlCodec.parse(&bytes).unwrap();
        assert_eq!(parsed.entries, entries);
        assert_eq!(YamlCodec.serialize(&parsed.entries).unwrap(), bytes);
    }
}
