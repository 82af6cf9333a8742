//! One function per subcommand. Each builds the service, drives the library
//! command through an [`ArgsHost`] and prints the outcome.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use langindex::{
    Configuration, Error, IndexService, PendingTranslationSession, Position, TextRange,
    commands,
    detect::ScriptDetector,
    locale::iso_entry,
    mutation::PersistReport,
    providers, query,
    traits::translator_for,
};

use crate::{
    host::ArgsHost,
    view::{VALUE_WIDTH, print_scan, render_table, truncate},
};

fn start(config: Configuration) -> Result<Arc<IndexService>, String> {
    IndexService::initialise(config).map_err(|e| e.to_string())
}

fn finish(report: PersistReport, verb: &str) -> Result<(), String> {
    for file in &report.written {
        println!("{} {}", verb, file.display());
    }
    if report.is_complete() {
        Ok(())
    } else {
        Err(format!("{} file(s) could not be written", report.failures.len()))
    }
}

fn cancelled_as(e: Error, message: impl FnOnce() -> String) -> String {
    match e {
        Error::Cancelled => message(),
        other => other.to_string(),
    }
}

pub fn scan(config: Configuration, json: bool) -> Result<(), String> {
    let (index, report) = langindex::build_from_directory(&config).map_err(|e| e.to_string())?;
    if json {
        let bundles: Vec<serde_json::Value> = index
            .iter()
            .map(|bundle| {
                serde_json::json!({
                    "locale": bundle.code,
                    "file": bundle.file.display().to_string(),
                    "keys": bundle.entries.len(),
                })
            })
            .collect();
        let out = serde_json::json!({
            "root": config.root.display().to_string(),
            "bundles": bundles,
            "unresolved": report.unresolved.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
            "failed": report.failures.iter().map(|(p, _)| p.display().to_string()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&out).map_err(|e| e.to_string())?);
    } else {
        print_scan(&index, &report);
    }
    Ok(())
}

pub fn keys(config: Configuration, lang: Option<String>, json: bool) -> Result<(), String> {
    let service = start(config)?;
    let bundle = match lang {
        Some(lang) => service
            .index()
            .get(&langindex::locale::canonical_code(&lang))
            .cloned()
            .ok_or_else(|| Error::UnknownLocale(lang).to_string())?,
        None => service.current_default().map_err(|e| e.to_string())?,
    };
    let keys = query::all_keys_of(&bundle);
    if json {
        println!("{}", serde_json::to_string_pretty(&keys).map_err(|e| e.to_string())?);
    } else {
        for key in keys {
            println!("{}", key);
        }
    }
    Ok(())
}

pub fn lookup(config: Configuration, key: &str, lang: Option<String>, full: bool) -> Result<(), String> {
    let service = start(config)?;
    let index = service.index();
    let translations = match lang {
        Some(lang) => {
            let code = langindex::locale::canonical_code(&lang);
            query::lookup(&index, &code, key)
                .map(|value| vec![(code.clone(), value.to_string())])
                .unwrap_or_default()
        }
        None => query::translations_of(&index, key)
            .into_iter()
            .map(|(code, value)| (code.to_string(), value.to_string()))
            .collect(),
    };
    if translations.is_empty() {
        return Err(format!("Key `{}` not found", key));
    }

    let rows: Vec<Vec<String>> = translations
        .into_iter()
        .map(|(code, value)| {
            let name = iso_entry(&code).map(|e| e.name.to_string()).unwrap_or_default();
            let value = if full { value } else { truncate(&value, VALUE_WIDTH) };
            vec![code, name, value]
        })
        .collect();
    println!("{}", render_table(&["LOCALE", "NAME", "TEXT"], &rows));
    Ok(())
}

/// Where the text of a new key comes from.
pub enum AddSource {
    /// Characters `start..end` (1-based, end exclusive) of `line` in `file`.
    File {
        file: PathBuf,
        line: usize,
        start: usize,
        end: usize,
    },
    Text(String),
}

pub async fn add(config: Configuration, key: &str, source: AddSource) -> Result<(), String> {
    let translator = translator_for(&config.translator);
    let service = start(config)?;
    let host = match source {
        AddSource::File { file, line, start, end } => {
            if line == 0 || start == 0 || end < start {
                return Err("Line and columns are 1-based, with end >= start".to_string());
            }
            let range = TextRange::on_line(line - 1, start - 1, end - 1);
            ArgsHost::new().select_in_file(&file, range)?
        }
        AddSource::Text(text) => ArgsHost::new().select_text(&text),
    }
    .answer(key);

    let report = commands::add_token(&service, &host, translator.as_ref())
        .await
        .map_err(|e| e.to_string())?;
    finish(report, "Updated")
}

pub async fn delete(config: Configuration, key: &str) -> Result<(), String> {
    let service = start(config)?;
    let host = ArgsHost::new().choose(key);
    let report = commands::delete_token(&service, &host)
        .await
        .map_err(|e| cancelled_as(e, || format!("Key `{}` not found", key)))?;
    finish(report, "Updated")
}

pub async fn import(config: Configuration, from: PathBuf, keys: Vec<String>) -> Result<(), String> {
    let service = start(config)?;
    let host = ArgsHost::new().with_file(from).choose_many(keys);
    let report = commands::import_keys(&service, &host)
        .await
        .map_err(|e| cancelled_as(e, || "None of the keys exist in the source project".to_string()))?;
    if report.written.is_empty() {
        println!("Nothing to import");
    }
    finish(report, "Updated")
}

pub async fn extract(config: Configuration, lang: &str, out: Option<PathBuf>) -> Result<(), String> {
    let service = start(config)?;
    let code = langindex::locale::canonical_code(lang);
    let host = ArgsHost::new().choose(code.clone()).scratch_to(out.clone());
    let session = commands::extract_unfinished(&service, &host, &ScriptDetector)
        .await
        .map_err(|e| cancelled_as(e, || Error::UnknownLocale(code.clone()).to_string()))?;
    if let (Some(_), Some(out)) = (session, out) {
        eprintln!("Untranslated entries written to {}", out.display());
    }
    Ok(())
}

pub async fn apply(config: Configuration, lang: &str, from: &Path) -> Result<(), String> {
    let text = fs::read_to_string(from)
        .map_err(|e| format!("Cannot read {}: {}", from.display(), e))?;
    let service = start(config)?;
    service.begin_session(PendingTranslationSession::new(
        langindex::locale::canonical_code(lang),
        text,
    ));
    let report = commands::apply_changes(&service, &ArgsHost::new())
        .await
        .map_err(|e| e.to_string())?;
    finish(report, "Updated")
}

fn read_source(file: &Path) -> Result<String, String> {
    fs::read_to_string(file).map_err(|e| format!("Cannot read {}: {}", file.display(), e))
}

pub fn hover(config: Configuration, file: &Path, line: usize, column: usize) -> Result<(), String> {
    let text = read_source(file)?;
    let service = start(config)?;
    let position = Position::new(line.saturating_sub(1), column.saturating_sub(1));
    match providers::hover(&service.index(), &text, position) {
        Some(hover) => {
            println!("{}", hover.contents);
            Ok(())
        }
        None => Err(format!("No translation key at {}:{}", line, column)),
    }
}

pub fn hints(config: Configuration, file: &Path) -> Result<(), String> {
    let text = read_source(file)?;
    let service = start(config)?;
    let snapshot = service.snapshot();
    for hint in providers::inlay_hints(&snapshot.index, &snapshot.config, &text) {
        println!(
            "{}:{}:{}: {}",
            file.display(),
            hint.position.line + 1,
            hint.position.character + 1,
            hint.label
        );
    }
    Ok(())
}

pub fn check(config: Configuration, file: &Path) -> Result<(), String> {
    let text = read_source(file)?;
    let service = start(config)?;
    let snapshot = service.snapshot();
    let found = providers::diagnostics(&snapshot.index, &snapshot.config, &text);
    for diagnostic in &found {
        println!("{}:{}: {}", file.display(), diagnostic.range, diagnostic.message);
    }
    if found.is_empty() {
        Ok(())
    } else {
        Err(format!("{} missing translation key(s)", found.len()))
    }
}
