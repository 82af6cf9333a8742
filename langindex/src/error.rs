//! All error types for the langindex crate.
//!
//! Recoverable conditions found while scanning are reported through
//! [`crate::index::ScanReport`]; these errors are returned from fallible
//! operations (parsing, persisting, mutations, commands).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot resolve a locale for `{}`", .0.display())]
    LocaleUnresolved(PathBuf),

    #[error("resource root `{}` does not exist", .0.display())]
    ConfigMissingRoot(PathBuf),

    #[error("failed to parse `{}`: {message}", file.display())]
    CodecParse { file: PathBuf, message: String },

    #[error("key `{0}` already exists")]
    DuplicateKey(String),

    #[error("translator unavailable: {0}")]
    TranslatorUnavailable(String),

    #[error("failed to write `{}`: {source}", file.display())]
    Persist {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown format `{0}`")]
    UnknownFormat(String),

    #[error("invalid resource: {0}")]
    InvalidResource(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("no resource bundle is loaded")]
    NoDefaultBundle,

    #[error("no bundle is loaded for locale `{0}`")]
    UnknownLocale(String),

    #[error("`{}` is not a loaded resource bundle", .0.display())]
    NotABundle(PathBuf),

    #[error("no translation session is pending")]
    NoPendingSession,

    #[error("selection is empty")]
    EmptySelection,

    #[error("cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Creates a parse failure attributed to `file`.
    pub fn codec_parse(file: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::CodecParse {
            file: file.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_locale_unresolved_error() {
        let error = Error::LocaleUnresolved(PathBuf::from("i18n/messages.json"));
        assert_eq!(
            error.to_string(),
            "cannot resolve a locale for `i18n/messages.json`"
        );
    }

    #[test]
    fn test_codec_parse_error() {
        let error = Error::codec_parse("i18n/en.json", "expected `:`");
        assert_eq!(
            error.to_string(),
            "failed to parse `i18n/en.json`: expected `:`"
        );
    }

    #[test]
    fn test_duplicate_key_error() {
        let error = Error::DuplicateKey("greeting.hello".to_string());
        assert_eq!(error.to_string(), "key `greeting.hello` already exists");
    }

    #[test]
    fn test_persist_error_keeps_source() {
        let error = Error::Persist {
            file: PathBuf::from("i18n/fr.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
        };
        assert!(error.to_string().contains("i18n/fr.json"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let error: Error = io::Error::new(io::ErrorKind::NotFound, "File not found").into();
        assert!(error.to_string().contains("I/O error"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let error: Error = json_error.into();
        assert!(error.to_string().contains("JSON error"));
    }
}
