//! Extract-unfinished / apply-changes round trip.
//!
//! Extraction collects the entries of one bundle that still need a
//! translation into a flat JSON scratch document. The user (or a tool)
//! edits that document, and applying it merges the edited values back.

use crate::{
    detect::is_unfinished,
    error::Error,
    formats::JsonCodec,
    locale::LocaleCode,
    traits::{LanguageDetector, ResourceCodec},
    types::{Entry, ResourceBundle},
};

/// An extraction awaiting its edited scratch document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTranslationSession {
    pub target_locale: LocaleCode,
    /// Flat JSON object of key to text, as handed to the editor.
    pub scratch_document: String,
}

impl PendingTranslationSession {
    pub fn new(target_locale: impl Into<LocaleCode>, scratch_document: impl Into<String>) -> Self {
        PendingTranslationSession {
            target_locale: target_locale.into(),
            scratch_document: scratch_document.into(),
        }
    }

    /// Entries of the scratch document, always read as JSON.
    pub fn edited_entries(&self) -> Result<Vec<Entry>, Error> {
        Ok(JsonCodec.parse_str(&self.scratch_document)?.entries)
    }
}

/// Entries of `bundle` that are empty or written in another script.
pub fn unfinished_entries(bundle: &ResourceBundle, detector: &dyn LanguageDetector) -> Vec<Entry> {
    bundle
        .entries
        .iter()
        .filter(|entry| is_unfinished(&entry.value, &bundle.code, detector))
        .cloned()
        .collect()
}

/// Starts a session for `bundle`, or `None` when nothing is unfinished.
pub fn extract_unfinished(
    bundle: &ResourceBundle,
    detector: &dyn LanguageDetector,
) -> Result<Option<PendingTranslationSession>, Error> {
    let entries = unfinished_entries(bundle, detector);
    if entries.is_empty() {
        return Ok(None);
    }
    let scratch = String::from_utf8(JsonCodec.serialize(&entries)?)
        .map_err(|e| Error::InvalidResource(e.to_string()))?;
    Ok(Some(PendingTranslationSession::new(
        bundle.code.clone(),
        scratch,
    )))
}

/// Writes edited values into `bundle`; returns how many entries changed.
///
/// Keys unknown to the bundle are appended like any other value.
pub fn merge_into(bundle: &mut ResourceBundle, edited: &[Entry]) -> usize {
    let mut changed = 0;
    for entry in edited {
        if bundle.get(&entry.key) != Some(entry.value.as_str()) {
            bundle.set(&entry.key, entry.value.clone());
            changed += 1;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{detect::ScriptDetector, types::ParsedResource};

    fn french() -> ResourceBundle {
        ResourceBundle::new(
            "fr",
            "/i18n/lang.fr.json",
            ParsedResource {
                entries: vec![
                    Entry::new("done", "Terminé"),
                    Entry::new("empty", ""),
                    Entry::new("copied", "你好"),
                ],
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_extract_collects_unfinished_entries() {
        let session = extract_unfinished(&french(), &ScriptDetector)
            .unwrap()
            .unwrap();
        assert_eq!(session.target_locale, "fr");
        assert_eq!(
            session.scratch_document,
            "{\n    \"empty\": \"\",\n    \"copied\": \"你好\"\n}"
        );
    }

    #[test]
    fn test_extract_nothing_unfinished() {
        let mut bundle = french();
        bundle.entries.truncate(1);
        assert!(extract_unfinished(&bundle, &ScriptDetector).unwrap().is_none());
    }

    #[test]
    fn test_merge_edited_values() {
        let mut bundle = french();
        let session = PendingTranslationSession::new(
            "fr",
            r#"{ "empty": "Vide", "copied": "Bonjour", "done": "Terminé" }"#,
        );
        let edited = session.edited_entries().unwrap();
        assert_eq!(merge_into(&mut bundle, &edited), 2);
        assert_eq!(bundle.get("empty"), Some("Vide"));
        assert_eq!(bundle.get("copied"), Some("Bonjour"));
    }

    #[test]
    fn test_malformed_scratch_is_an_error() {
        let session = PendingTranslationSession::new("fr", "{ not json");
        assert!(session.edited_entries().is_err());
    }
}
