#![forbid(unsafe_code)]
//! Live index of per-locale translation resources for editor tooling.
//!
//! A project keeps one key/value file per locale under a resource root
//! (`i18n/lang.en.json`, `i18n/lang.zh-cn.json`, ...). `langindex` works out
//! which file belongs to which locale, parses every file into a
//! [`ResourceBundle`] that remembers where each key sits in its file, keeps
//! the bundles current as files change, and writes key additions, deletions
//! and imports back to every locale file.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use langindex::{Configuration, IndexService, formats::ResourceFormat};
//!
//! # async fn run() -> Result<(), langindex::Error> {
//! let config = Configuration::new("i18n", "en", ResourceFormat::Json);
//! let service = IndexService::initialise(config)?;
//!
//! let values = HashMap::from([("en".to_string(), "Hello".to_string())]);
//! let report = service.insert_key("greeting.hello", "en", &values).await?;
//! assert!(report.is_complete());
//!
//! assert_eq!(service.index().lookup("en", "greeting.hello"), Some("Hello"));
//! # Ok(())
//! # }
//! ```
//!
//! # Layout
//!
//! - [`locale`]: file name to locale code resolution
//! - [`formats`]: JSON and YAML codecs behind [`traits::ResourceCodec`]
//! - [`index`]: directory scan and the in-memory index
//! - [`sync`]: the service owning the live index
//! - [`query`] / [`mutation`]: read and write operations
//! - [`providers`]: hover, definition, completion, inlay hints, diagnostics
//! - [`commands`]: add/delete/import/extract/apply pipelines over an [`commands::EditorHost`]

pub mod commands;
pub mod config;
pub mod detect;
pub mod error;
pub mod formats;
pub mod index;
pub mod locale;
pub mod mutation;
pub mod placeholder;
pub mod providers;
pub mod query;
pub mod session;
pub mod sync;
pub mod traits;
pub mod types;

// Re-export most used types for easy consumption
pub use crate::{
    config::{ConfigSource, Configuration, SettingsFile, StaticConfig},
    error::Error,
    formats::ResourceFormat,
    index::{ResourceIndex, ScanReport, build_from_directory},
    locale::{LocaleCode, LocaleResolver},
    mutation::PersistReport,
    session::PendingTranslationSession,
    sync::{DocumentChange, IndexService, Snapshot},
    types::{Entry, Layout, Position, ResourceBundle, TextRange},
};
