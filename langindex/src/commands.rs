//! User commands, each an ordered pipeline of fallible steps.
//!
//! A command talks to the user only through an [`EditorHost`] and to the
//! index only through the [`IndexService`]. The first failing step ends the
//! command; [`Error::Cancelled`] marks a prompt the user dismissed.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use async_trait::async_trait;

use crate::{
    config::{Configuration, strict_workspace_of},
    error::Error,
    index::{ResourceIndex, build_from_directory, default_bundle},
    locale::{LocaleCode, iso_entry},
    mutation::PersistReport,
    placeholder::{parse_message_parameters, synthesize_call},
    providers::{expand_selection_to_quotes, text_in_range},
    session::{self, PendingTranslationSession},
    sync::IndexService,
    traits::{LanguageDetector, Translator},
    types::{Entry, TextRange},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One option of a pick prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    pub label: String,
    pub detail: String,
}

/// The active document and its selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSelection {
    pub path: Option<PathBuf>,
    pub text: String,
    pub range: TextRange,
}

/// What a command may ask of the editor.
#[async_trait]
pub trait EditorHost: Send + Sync {
    fn selection(&self) -> Option<EditorSelection>;

    /// Single-line input; `None` when dismissed.
    async fn input(&self, title: &str, placeholder: &str) -> Option<String>;

    /// Index of the chosen item; `None` when dismissed.
    async fn pick(&self, title: &str, items: &[PickItem]) -> Option<usize>;

    /// Indices of the chosen items; `None` when dismissed.
    async fn pick_many(&self, title: &str, items: &[PickItem]) -> Option<Vec<usize>>;

    async fn pick_file(&self, title: &str) -> Option<PathBuf>;

    /// Replaces `range` of the active document with `text`.
    async fn replace(&self, range: TextRange, text: &str) -> Result<(), Error>;

    /// Shows a scratch document for the user to edit.
    async fn open_scratch(&self, locale: &str, text: &str) -> Result<(), Error>;

    /// Current text of the scratch document, if it is still open.
    async fn scratch_text(&self) -> Option<String>;

    fn notify(&self, severity: Severity, message: &str);

    fn begin_progress(&self, title: &str);

    fn end_progress(&self);
}

fn surface_failures(host: &dyn EditorHost, report: &PersistReport) {
    for failure in &report.failures {
        host.notify(Severity::Error, &failure.error.to_string());
    }
}

fn key_items(entries: &[Entry]) -> Vec<PickItem> {
    entries
        .iter()
        .map(|entry| PickItem {
            label: entry.key.clone(),
            detail: entry.value.clone(),
        })
        .collect()
}

/// Turns the selected text into a new key in every bundle.
///
/// The selection (grown to its enclosing quotes) is replaced with a
/// translation call; the selected text becomes the authoring locale's value
/// and the translator fills in the others.
pub async fn add_token(
    service: &IndexService,
    host: &dyn EditorHost,
    translator: &dyn Translator,
) -> Result<PersistReport, Error> {
    let config = service.config();
    let authoring = service.current_default()?;

    let selection = host.selection().ok_or(Error::EmptySelection)?;
    let selected = text_in_range(&selection.text, selection.range);
    if selected.is_empty() {
        return Err(Error::EmptySelection);
    }

    let key = host
        .input("New translation key", "level.module.name")
        .await
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or(Error::Cancelled)?;
    if authoring.contains_key(&key) {
        return Err(Error::DuplicateKey(key));
    }

    let call = synthesize_call(&key, &parse_message_parameters(&selected), &config.quote);
    let range = expand_selection_to_quotes(&selection.text, selection.range);
    host.replace(range, &call).await?;

    let targets: Vec<LocaleCode> = service
        .index()
        .codes()
        .filter(|code| *code != authoring.code)
        .map(str::to_string)
        .collect();
    let mut values = translate(host, translator, &selected, &targets).await;
    values.insert(authoring.code.clone(), selected);

    let report = service.insert_key(&key, &authoring.code, &values).await?;
    surface_failures(host, &report);
    Ok(report)
}

async fn translate(
    host: &dyn EditorHost,
    translator: &dyn Translator,
    text: &str,
    targets: &[LocaleCode],
) -> HashMap<LocaleCode, String> {
    if translator.is_noop() {
        return translator.translate(text, targets).await.unwrap_or_default();
    }
    host.begin_progress(&format!("Translating with {}", translator.name()));
    let result = translator.translate(text, targets).await;
    host.end_progress();
    match result {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(translator = translator.name(), error = %e, "translation failed; other locales left blank");
            host.notify(Severity::Warning, &e.to_string());
            HashMap::new()
        }
    }
}

/// Removes a picked key from every bundle.
pub async fn delete_token(service: &IndexService, host: &dyn EditorHost) -> Result<PersistReport, Error> {
    let default = service.current_default()?;
    let items = key_items(&default.entries);
    let picked = host
        .pick("Delete translation key", &items)
        .await
        .and_then(|i| items.get(i))
        .ok_or(Error::Cancelled)?;

    let report = service.delete_key(&picked.label).await;
    surface_failures(host, &report);
    Ok(report)
}

/// Loads another project's configuration and index from its
/// `.vscode/settings.json`.
pub fn load_foreign(settings_path: &Path) -> Result<(Configuration, ResourceIndex), Error> {
    let workspace = strict_workspace_of(settings_path)?;
    let text = fs::read_to_string(settings_path)?;
    let config = Configuration::from_settings_str(&text, &workspace)?;
    let (index, report) = build_from_directory(&config)?;
    if !report.is_clean() {
        tracing::warn!(
            root = %config.root.display(),
            unresolved = report.unresolved.len(),
            failed = report.failures.len(),
            "some files of the imported project were skipped"
        );
    }
    Ok((config, index))
}

/// Copies picked keys from another project into every local bundle.
///
/// Keys already present locally are kept.
pub async fn import_keys(service: &IndexService, host: &dyn EditorHost) -> Result<PersistReport, Error> {
    let settings = host
        .pick_file("Select the settings.json of the project to import from")
        .await
        .ok_or(Error::Cancelled)?;
    let (source_config, source) = load_foreign(&settings)?;
    let source_default = default_bundle(&source, &source_config)
        .bundle()
        .cloned()
        .ok_or(Error::NoDefaultBundle)?;

    let items = key_items(&source_default.entries);
    let keys: Vec<String> = host
        .pick_many("Import translation keys", &items)
        .await
        .ok_or(Error::Cancelled)?
        .into_iter()
        .filter_map(|i| items.get(i).map(|item| item.label.clone()))
        .collect();
    if keys.is_empty() {
        return Err(Error::Cancelled);
    }

    let report = service
        .import_keys(&source, &source_config, &keys, false)
        .await;
    surface_failures(host, &report);
    Ok(report)
}

/// Opens the untranslated entries of a bundle as a scratch document.
///
/// The bundle is the active document when the editor has one, which must
/// then be a loaded resource file; otherwise the user picks a locale.
/// Returns `None` when the locale has nothing left to translate.
pub async fn extract_unfinished(
    service: &IndexService,
    host: &dyn EditorHost,
    detector: &dyn LanguageDetector,
) -> Result<Option<PendingTranslationSession>, Error> {
    let index = service.index();
    let bundle = match host.selection().and_then(|selection| selection.path) {
        Some(path) => index
            .find_by_file(&path)
            .ok_or(Error::NotABundle(path))?,
        None => {
            let items: Vec<PickItem> = index
                .iter()
                .map(|bundle| PickItem {
                    label: bundle.code.clone(),
                    detail: iso_entry(&bundle.code)
                        .map(|entry| entry.name.to_string())
                        .unwrap_or_default(),
                })
                .collect();
            let code = host
                .pick("Extract untranslated entries of", &items)
                .await
                .and_then(|i| items.get(i))
                .map(|item| item.label.clone())
                .ok_or(Error::Cancelled)?;
            index
                .get(&code)
                .ok_or_else(|| Error::UnknownLocale(code.clone()))?
        }
    };

    let Some(pending) = session::extract_unfinished(bundle, detector)? else {
        host.notify(
            Severity::Info,
            &format!("`{}` has nothing left to translate", bundle.code),
        );
        return Ok(None);
    };
    host.open_scratch(&pending.target_locale, &pending.scratch_document)
        .await?;
    service.begin_session(pending.clone());
    Ok(Some(pending))
}

/// Merges the edited scratch document back into its bundle.
pub async fn apply_changes(service: &IndexService, host: &dyn EditorHost) -> Result<PersistReport, Error> {
    if let Some(text) = host.scratch_text().await {
        service.edit_scratch(text)?;
    }
    let report = service.apply_session().await?;
    surface_failures(host, &report);
    Ok(report)
}
