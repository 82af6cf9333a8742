//! Locale resolution from resource file names.
//!
//! Resource files in one directory share a naming scheme such as
//! `lang.en.json`, `lang.zh-cn.json`. The shared prefix/suffix is stripped and
//! the remainder is matched against a fixed ISO-639 table, then canonicalized
//! through an alias table so script/region variants collapse to one code.

use std::str::FromStr;

use unic_langid::LanguageIdentifier;

/// Canonical locale id, lower-case with `-` separators (e.g. `en`, `zh-cn`).
pub type LocaleCode = String;

/// Writing system a language is normally written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    Latin,
    Cyrillic,
    Greek,
    Arabic,
    Hebrew,
    Devanagari,
    Bengali,
    Gurmukhi,
    Gujarati,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Thai,
    Han,
    Japanese,
    Hangul,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoEntry {
    pub code: &'static str,
    pub name: &'static str,
    pub script: Script,
}

const fn iso(code: &'static str, name: &'static str, script: Script) -> IsoEntry {
    IsoEntry { code, name, script }
}

/// ISO-639 codes recognised in file names.
///
/// No code may be a substring of another. When several codes occur in a
/// file name, the one listed first wins.
pub static ISO_CODES: &[IsoEntry] = &[
    iso("af", "Afrikaans", Script::Latin),
    iso("ar", "العربية", Script::Arabic),
    iso("bg", "Български", Script::Cyrillic),
    iso("bn", "বাংলা", Script::Bengali),
    iso("ca", "Català", Script::Latin),
    iso("cs", "Čeština", Script::Latin),
    iso("da", "Dansk", Script::Latin),
    iso("de", "Deutsch", Script::Latin),
    iso("el", "Ελληνικά", Script::Greek),
    iso("en", "English", Script::Latin),
    iso("es", "Español", Script::Latin),
    iso("et", "Eesti", Script::Latin),
    iso("fa", "فارسی", Script::Arabic),
    iso("fi", "Suomi", Script::Latin),
    iso("fr", "Français", Script::Latin),
    iso("gu", "ગુજરાતી", Script::Gujarati),
    iso("he", "עברית", Script::Hebrew),
    iso("hi", "हिन्दी", Script::Devanagari),
    iso("hr", "Hrvatski", Script::Latin),
    iso("hu", "Magyar", Script::Latin),
    iso("id", "Bahasa Indonesia", Script::Latin),
    iso("it", "Italiano", Script::Latin),
    iso("ja", "日本語", Script::Japanese),
    iso("kn", "ಕನ್ನಡ", Script::Kannada),
    iso("ko", "한국어", Script::Hangul),
    iso("lt", "Lietuvių", Script::Latin),
    iso("lv", "Latviešu", Script::Latin),
    iso("mk", "Македонски", Script::Cyrillic),
    iso("ml", "മലയാളം", Script::Malayalam),
    iso("mr", "मराठी", Script::Devanagari),
    iso("ms", "Bahasa Melayu", Script::Latin),
    iso("nl", "Nederlands", Script::Latin),
    iso("no", "Norsk", Script::Latin),
    iso("pa", "ਪੰਜਾਬੀ", Script::Gurmukhi),
    iso("pl", "Polski", Script::Latin),
    iso("pt", "Português", Script::Latin),
    iso("ro", "Română", Script::Latin),
    iso("ru", "Русский", Script::Cyrillic),
    iso("sk", "Slovenčina", Script::Latin),
    iso("sl", "Slovenščina", Script::Latin),
    iso("so", "Soomaali", Script::Latin),
    iso("sq", "Shqip", Script::Latin),
    iso("sr", "Српски", Script::Cyrillic),
    iso("sv", "Svenska", Script::Latin),
    iso("sw", "Kiswahili", Script::Latin),
    iso("ta", "தமிழ்", Script::Tamil),
    iso("te", "తెలుగు", Script::Telugu),
    iso("th", "ไทย", Script::Thai),
    iso("tr", "Türkçe", Script::Latin),
    iso("uk", "Українська", Script::Cyrillic),
    iso("ur", "اردو", Script::Arabic),
    iso("vi", "Tiếng Việt", Script::Latin),
    iso("zh-cn", "简体中文", Script::Han),
    iso("zh-hans", "简体中文", Script::Han),
    iso("zh-tw", "繁體中文", Script::Han),
    iso("zh-sg", "繁體中文", Script::Han),
    iso("zh-hk", "繁體中文", Script::Han),
    iso("zh-hant", "繁體中文", Script::Han),
];

/// Raw spellings collapsed onto one canonical code.
static ALIASES: &[(&[&str], &str)] = &[
    (&["zh", "zh-cn", "zh-hans"], "zh-cn"),
    (&["zh-tw", "zh-hk", "zh-mo", "zh-sg", "zh-hant"], "zh-tw"),
];

fn normalize_fragment(raw: &str) -> String {
    raw.trim().replace('_', "-").to_lowercase()
}

/// Maps a code through the alias table; unknown spellings pass through.
pub fn canonical_code(code: &str) -> LocaleCode {
    let normalized = normalize_fragment(code);
    ALIASES
        .iter()
        .find(|(family, _)| family.contains(&normalized.as_str()))
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(normalized)
}

/// Normalizes a user-configured locale (e.g. the main locale setting).
///
/// `zh_CN`, `ZH-Hans` and bare `zh` all become `zh-cn`. Values that are not
/// valid BCP-47 identifiers are kept as typed and logged.
pub fn normalize_locale(raw: &str) -> LocaleCode {
    let canonical = canonical_code(raw);
    if !canonical.is_empty() && LanguageIdentifier::from_str(&canonical).is_err() {
        tracing::warn!(locale = %raw, "configured locale is not a valid language identifier");
    }
    canonical
}

/// Finds the first table entry whose code occurs in `candidate`.
pub fn lookup_iso(candidate: &str) -> Option<&'static IsoEntry> {
    let candidate = normalize_fragment(candidate);
    ISO_CODES.iter().find(|entry| candidate.contains(entry.code))
}

/// Table entry for a canonical code, if the code's base language is listed.
pub fn iso_entry(code: &str) -> Option<&'static IsoEntry> {
    let code = canonical_code(code);
    ISO_CODES.iter().find(|entry| entry.code == code).or_else(|| {
        let base = code.split('-').next().unwrap_or(&code);
        ISO_CODES.iter().find(|entry| entry.code == base)
    })
}

/// The writing system of a locale code.
pub fn script_of(code: &str) -> Option<Script> {
    iso_entry(code).map(|entry| entry.script)
}

fn is_separator(c: char) -> bool {
    !c.is_alphanumeric()
}

/// File name without its final extension.
pub fn file_stem(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(0) | None => filename,
        Some(dot) => &filename[..dot],
    }
}

fn longest_common_prefix<'a>(stems: &[&'a str]) -> &'a str {
    let Some(first) = stems.first() else {
        return "";
    };
    let mut prefix = *first;
    for stem in &stems[1..] {
        let common = prefix
            .char_indices()
            .zip(stem.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map(|((i, c), _)| i + c.len_utf8())
            .unwrap_or(0);
        prefix = &prefix[..common];
    }
    prefix
}

fn longest_common_suffix<'a>(stems: &[&'a str]) -> &'a str {
    let Some(first) = stems.first() else {
        return "";
    };
    let mut suffix = *first;
    for stem in &stems[1..] {
        let common = suffix
            .char_indices()
            .rev()
            .zip(stem.chars().rev())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map(|((i, _), _)| i)
            .unwrap_or(suffix.len());
        suffix = &suffix[common..];
    }
    suffix
}

/// Resolves sibling resource files to locale codes.
///
/// Built once per directory scan: the shared prefix and suffix are computed
/// over all sibling stems and aligned to separator characters so that a
/// prefix never ends inside a locale fragment.
#[derive(Debug, Clone, Default)]
pub struct LocaleResolver {
    /// Candidate prefix lengths, longest first.
    prefix_cuts: Vec<usize>,
    suffix_len: usize,
}

impl LocaleResolver {
    pub fn new<S: AsRef<str>>(siblings: &[S]) -> Self {
        let stems: Vec<&str> = siblings.iter().map(|s| file_stem(s.as_ref())).collect();

        // Only a `-` may sit inside a locale fragment (`zh-cn`), so shorter
        // prefixes are tried only while the cut ends on one.
        let prefix = longest_common_prefix(&stems);
        let mut prefix_cuts = Vec::new();
        let mut reached_start = true;
        for (i, c) in prefix.char_indices().rev().filter(|(_, c)| is_separator(*c)) {
            prefix_cuts.push(i + c.len_utf8());
            if c != '-' {
                reached_start = false;
                break;
            }
        }
        if reached_start {
            prefix_cuts.push(0);
        }

        let suffix_len = if stems.len() > 1 {
            let suffix = longest_common_suffix(&stems);
            suffix.find(is_separator).map(|i| suffix.len() - i).unwrap_or(0)
        } else {
            0
        };

        LocaleResolver {
            prefix_cuts,
            suffix_len,
        }
    }

    /// Resolves one file name to its canonical locale code.
    ///
    /// Tries the longest separator-aligned prefix first and falls back to
    /// shorter ones when the remaining fragment names no known language.
    pub fn resolve(&self, filename: &str) -> Option<LocaleCode> {
        let stem = file_stem(filename);
        let end = stem.len().saturating_sub(self.suffix_len);
        for &cut in &self.prefix_cuts {
            if cut > end {
                continue;
            }
            let Some(candidate) = stem.get(cut..end) else {
                continue;
            };
            if let Some(entry) = lookup_iso(candidate) {
                return Some(canonical_code(entry.code));
            }
        }
        None
    }
}

/// Resolves `filename` against its directory siblings.
pub fn resolve<S: AsRef<str>>(filename: &str, siblings: &[S]) -> Option<LocaleCode> {
    LocaleResolver::new(siblings).resolve(filename)
}
