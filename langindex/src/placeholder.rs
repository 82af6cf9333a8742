//! Parameter tokens in message text and translation-call synthesis.
//!
//! `Hello {0}, you have {count} items` carries a positional parameter `0`
//! and a named parameter `count`. When such text is extracted into a key,
//! the call that replaces it passes matching arguments:
//! `t('greeting', arg0, { count })`.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PARAMETER: Regex = Regex::new(r"\{(.*?)\}").expect("valid parameter regex");
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// `{0}`, `{1}`, ...: the digits as written, of any length.
    Positional(String),
    /// Any other `{name}`.
    Named(String),
}

/// Extracts parameter tokens in first-occurrence order, duplicates included.
pub fn parse_message_parameters(content: &str) -> Vec<Parameter> {
    PARAMETER
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|inner| {
            let inner = inner.as_str();
            if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
                Parameter::Positional(inner.to_string())
            } else {
                Parameter::Named(inner.to_string())
            }
        })
        .collect()
}

/// Builds the translation call replacing the selected text.
///
/// Positional arguments come first as `argN`, then named ones in a single
/// object literal; repeated parameters are passed once.
pub fn synthesize_call(key: &str, parameters: &[Parameter], quote: &str) -> String {
    let mut args = vec![format!("{quote}{key}{quote}")];
    let mut named: Vec<&str> = Vec::new();
    let mut positional: Vec<&str> = Vec::new();

    for parameter in parameters {
        match parameter {
            Parameter::Positional(id) if !positional.contains(&id.as_str()) => positional.push(id),
            Parameter::Named(name) if !name.is_empty() && !named.contains(&name.as_str()) => {
                named.push(name)
            }
            _ => {}
        }
    }

    args.extend(positional.iter().map(|id| format!("arg{}", id)));
    if !named.is_empty() {
        args.push(format!("{{ {} }}", named.join(", ")));
    }
    format!("t({})", args.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_then_named_in_order() {
        assert_eq!(
            parse_message_parameters("Hello {0}, you have {count} items"),
            vec![
                Parameter::Positional("0".to_string()),
                Parameter::Named("count".to_string())
            ]
        );
    }

    #[test]
    fn test_duplicates_are_preserved() {
        assert_eq!(
            parse_message_parameters("{name} and {name} and {1}"),
            vec![
                Parameter::Named("name".to_string()),
                Parameter::Named("name".to_string()),
                Parameter::Positional("1".to_string()),
            ]
        );
    }

    #[test]
    fn test_non_integer_groups_are_named() {
        assert_eq!(
            parse_message_parameters("{-1} {1a} {}"),
            vec![
                Parameter::Named("-1".to_string()),
                Parameter::Named("1a".to_string()),
                Parameter::Named(String::new()),
            ]
        );
    }

    #[test]
    fn test_long_digit_groups_stay_positional() {
        assert_eq!(
            parse_message_parameters("{4294967296} {+1}"),
            vec![
                Parameter::Positional("4294967296".to_string()),
                Parameter::Named("+1".to_string()),
            ]
        );
        let params = parse_message_parameters("{4294967296} of {4294967296}");
        assert_eq!(synthesize_call("big", &params, "'"), "t('big', arg4294967296)");
    }

    #[test]
    fn test_no_parameters() {
        assert!(parse_message_parameters("plain text").is_empty());
    }

    #[test]
    fn test_synthesize_call() {
        let params = parse_message_parameters("Hello {0}, {1} has {count} of {count} {total}");
        assert_eq!(
            synthesize_call("greeting.hello", &params, "'"),
            "t('greeting.hello', arg0, arg1, { count, total })"
        );
        assert_eq!(synthesize_call("k", &[], "\""), "t(\"k\")");
    }
}
