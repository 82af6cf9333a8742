//! Script-family language detection used to flag untranslated strings.

use crate::{
    locale::{LocaleCode, Script, script_of},
    traits::LanguageDetector,
};

/// Classifies a character by writing system; `None` for digits,
/// punctuation and symbols shared by every script.
fn script_of_char(c: char) -> Option<Script> {
    let script = match c as u32 {
        0x0041..=0x005A | 0x0061..=0x007A | 0x00C0..=0x024F | 0x1E00..=0x1EFF => Script::Latin,
        0x0370..=0x03FF | 0x1F00..=0x1FFF => Script::Greek,
        0x0400..=0x052F => Script::Cyrillic,
        0x0590..=0x05FF => Script::Hebrew,
        0x0600..=0x06FF | 0x0750..=0x077F => Script::Arabic,
        0x0900..=0x097F => Script::Devanagari,
        0x0980..=0x09FF => Script::Bengali,
        0x0A00..=0x0A7F => Script::Gurmukhi,
        0x0A80..=0x0AFF => Script::Gujarati,
        0x0B80..=0x0BFF => Script::Tamil,
        0x0C00..=0x0C7F => Script::Telugu,
        0x0C80..=0x0CFF => Script::Kannada,
        0x0D00..=0x0D7F => Script::Malayalam,
        0x0E00..=0x0E7F => Script::Thai,
        0x1100..=0x11FF | 0x3130..=0x318F | 0xAC00..=0xD7AF => Script::Hangul,
        0x3040..=0x30FF | 0x31F0..=0x31FF | 0xFF66..=0xFF9F => Script::Japanese,
        0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF | 0x20000..=0x2FA1F => Script::Han,
        _ => return None,
    };
    Some(script)
}

/// The dominant script of `text`, by character count.
///
/// Any kana makes the text Japanese, since Japanese mixes kana with Han.
pub fn dominant_script(text: &str) -> Option<Script> {
    let mut counts: Vec<(Script, usize)> = Vec::new();
    for script in text.chars().filter_map(script_of_char) {
        if script == Script::Japanese {
            return Some(Script::Japanese);
        }
        match counts.iter_mut().find(|(s, _)| *s == script) {
            Some((_, count)) => *count += 1,
            None => counts.push((script, 1)),
        }
    }
    // Ties go to the script seen first.
    counts
        .iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(script, _)| *script)
}

/// Detects a representative locale per writing system.
///
/// Latin text is reported as `en`, Han as `zh-cn`, and so on; callers
/// compare script families rather than exact codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptDetector;

impl LanguageDetector for ScriptDetector {
    fn detect(&self, text: &str) -> Option<LocaleCode> {
        let code = match dominant_script(text)? {
            Script::Latin => "en",
            Script::Cyrillic => "ru",
            Script::Greek => "el",
            Script::Arabic => "ar",
            Script::Hebrew => "he",
            Script::Devanagari => "hi",
            Script::Bengali => "bn",
            Script::Gurmukhi => "pa",
            Script::Gujarati => "gu",
            Script::Tamil => "ta",
            Script::Telugu => "te",
            Script::Kannada => "kn",
            Script::Malayalam => "ml",
            Script::Thai => "th",
            Script::Han => "zh-cn",
            Script::Japanese => "ja",
            Script::Hangul => "ko",
        };
        Some(code.to_string())
    }
}

fn compatible(expected: Script, found: Script) -> bool {
    expected == found || (expected == Script::Japanese && found == Script::Han)
}

/// Whether `value` still needs translating into the locale `code`.
///
/// Empty text is always unfinished. Otherwise the text is unfinished when
/// the detector places it in a different script family than the locale;
/// undetectable text and locales of unknown script are left alone.
pub fn is_unfinished(value: &str, code: &str, detector: &dyn LanguageDetector) -> bool {
    if value.trim().is_empty() {
        return true;
    }
    let Some(expected) = script_of(code) else {
        return false;
    };
    match detector.detect(value).as_deref().and_then(script_of) {
        Some(found) => !compatible(expected, found),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_by_dominant_script() {
        let detector = ScriptDetector;
        assert_eq!(detector.detect("Hello world").as_deref(), Some("en"));
        assert_eq!(detector.detect("你好，世界").as_deref(), Some("zh-cn"));
        assert_eq!(detector.detect("こんにちは世界").as_deref(), Some("ja"));
        assert_eq!(detector.detect("안녕하세요").as_deref(), Some("ko"));
        assert_eq!(detector.detect("Привет").as_deref(), Some("ru"));
        assert_eq!(detector.detect("设置页面 OK").as_deref(), Some("zh-cn"));
        assert_eq!(detector.detect("123 !?"), None);
    }

    #[test]
    fn test_unfinished_entries() {
        let detector = ScriptDetector;
        assert!(is_unfinished("", "fr", &detector));
        assert!(is_unfinished("   ", "en", &detector));
        assert!(is_unfinished("你好", "fr", &detector));
        assert!(is_unfinished("Hello", "zh-cn", &detector));
        assert!(!is_unfinished("Bonjour", "fr", &detector));
        assert!(!is_unfinished("你好", "zh-tw", &detector));
        // Kanji-only Japanese is still Japanese.
        assert!(!is_unfinished("設定", "ja", &detector));
        assert!(!is_unfinished("42", "zh-cn", &detector));
    }
}
