//! Seams to the collaborators the index depends on: resource codecs,
//! machine translation and language detection.

use std::{
    collections::HashMap,
    fs::File,
    io::Read,
    path::Path,
};

use async_trait::async_trait;

use crate::{
    error::Error,
    locale::LocaleCode,
    types::{Entry, Layout, ParsedResource},
};

/// Decodes bytes to text, honouring a UTF-8/UTF-16 byte-order mark.
pub fn decode_text(bytes: &[u8]) -> Result<String, Error> {
    let (encoding, bom_len) =
        encoding_rs::Encoding::for_bom(bytes).unwrap_or((encoding_rs::UTF_8, 0));
    let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
    if had_errors {
        return Err(Error::InvalidResource(format!(
            "content is not valid {}",
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}

/// A key/value resource format.
///
/// Implementations must be deterministic and key-order-preserving: for input
/// already in the codec's canonical form, `serialize(parse(bytes)) == bytes`.
pub trait ResourceCodec: Send + Sync {
    /// Accepted file extensions, lower-case, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Parse decoded text into entries and key ranges.
    fn parse_str(&self, text: &str) -> Result<ParsedResource, Error>;

    /// Serialize entries in order.
    fn serialize(&self, entries: &[Entry]) -> Result<Vec<u8>, Error>;

    /// Serialize entries following the layout recorded when the file was
    /// parsed. Formats with a fixed layout ignore it.
    fn serialize_with(&self, entries: &[Entry], _layout: &Layout) -> Result<Vec<u8>, Error> {
        self.serialize(entries)
    }

    /// Parse raw file bytes.
    fn parse(&self, bytes: &[u8]) -> Result<ParsedResource, Error> {
        self.parse_str(&decode_text(bytes)?)
    }

    /// Parse from file path with BOM-aware decoding.
    fn read_from(&self, path: &Path) -> Result<ParsedResource, Error> {
        let file = File::open(path)?;
        let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
            .bom_override(true)
            .build(file);
        let mut decoded = String::new();
        decoder.read_to_string(&mut decoded)?;
        self.parse_str(&decoded)
    }

    /// Whether `path` carries one of the accepted extensions.
    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions().iter().any(|accepted| *accepted == ext)
            })
            .unwrap_or(false)
    }
}

/// Machine translation of newly authored text.
#[async_trait]
pub trait Translator: Send + Sync {
    fn name(&self) -> &str;

    /// Translate `text` into each of `targets`.
    ///
    /// Missing locales in the returned map mean "no translation"; an
    /// unreachable backend returns [`Error::TranslatorUnavailable`].
    async fn translate(
        &self,
        text: &str,
        targets: &[LocaleCode],
    ) -> Result<HashMap<LocaleCode, String>, Error>;

    /// A translator that never blocks and needs no progress indication.
    fn is_noop(&self) -> bool {
        false
    }
}

/// Default translator: produces no translations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTranslator;

#[async_trait]
impl Translator for NoopTranslator {
    fn name(&self) -> &str {
        "none"
    }

    async fn translate(
        &self,
        _text: &str,
        _targets: &[LocaleCode],
    ) -> Result<HashMap<LocaleCode, String>, Error> {
        Ok(HashMap::new())
    }

    fn is_noop(&self) -> bool {
        true
    }
}

/// A configured translator this build has no backend for.
///
/// Every call fails with [`Error::TranslatorUnavailable`], so commands fall
/// back to blank values for non-authoring locales.
#[derive(Debug, Clone)]
pub struct UnavailableTranslator {
    name: String,
}

#[async_trait]
impl Translator for UnavailableTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(
        &self,
        _text: &str,
        _targets: &[LocaleCode],
    ) -> Result<HashMap<LocaleCode, String>, Error> {
        Err(Error::TranslatorUnavailable(format!(
            "no backend for translator `{}`",
            self.name
        )))
    }
}

/// The translator configured under `name`; `none` or empty disables it.
pub fn translator_for(name: &str) -> Box<dyn Translator> {
    match name.trim() {
        "" | "none" => Box::new(NoopTranslator),
        other => Box::new(UnavailableTranslator {
            name: other.to_string(),
        }),
    }
}

/// Guesses which language a piece of text is written in.
pub trait LanguageDetector: Send + Sync {
    /// Returns `None` when the language cannot be determined.
    fn detect(&self, text: &str) -> Option<LocaleCode>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_utf8() {
        assert_eq!(decode_text("{}".as_bytes()).unwrap(), "{}");
    }

    #[test]
    fn test_decode_strips_utf8_bom() {
        let bytes = [0xEF, 0xBB, 0xBF, b'{', b'}'];
        assert_eq!(decode_text(&bytes).unwrap(), "{}");
    }

    #[test]
    fn test_decode_utf16le_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "héllo".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_text(&bytes).unwrap(), "héllo");
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert!(matches!(
            decode_text(&[0x7B, 0xFF, 0x7D]),
            Err(Error::InvalidResource(_))
        ));
    }

    #[tokio::test]
    async fn test_noop_translator_returns_nothing() {
        let translated = NoopTranslator
            .translate("Hello", &["fr".to_string()])
            .await
            .unwrap();
        assert!(translated.is_empty());
        assert!(NoopTranslator.is_noop());
    }

    #[tokio::test]
    async fn test_unknown_translator_is_unavailable() {
        let translator = translator_for("deepl");
        assert_eq!(translator.name(), "deepl");
        assert!(!translator.is_noop());
        assert!(matches!(
            translator.translate("Hello", &[]).await,
            Err(Error::TranslatorUnavailable(_))
        ));
        assert!(translator_for("none").is_noop());
    }
}
