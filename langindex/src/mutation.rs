//! Write operations over the index: insert, delete and cross-project import.
//!
//! Each operation mutates an index in memory and returns the locales it
//! changed; [`persist`] then writes those bundles one after another. The
//! [`crate::sync::IndexService`] wraps both halves behind its single writer.

use std::{collections::HashMap, path::PathBuf};

use crate::{
    config::Configuration,
    error::Error,
    index::{ResourceIndex, default_bundle},
    locale::LocaleCode,
    traits::ResourceCodec,
};

/// Adds `key` to every bundle.
///
/// Fails with [`Error::DuplicateKey`] when the authoring locale's bundle
/// already has the key. Locales missing from `values` get an empty string.
pub fn insert_key(
    index: &mut ResourceIndex,
    key: &str,
    authoring: &str,
    values: &HashMap<LocaleCode, String>,
) -> Result<Vec<LocaleCode>, Error> {
    if index
        .get(authoring)
        .is_some_and(|bundle| bundle.contains_key(key))
    {
        return Err(Error::DuplicateKey(key.to_string()));
    }

    let mut changed = Vec::with_capacity(index.len());
    for bundle in index.iter_mut() {
        let value = values.get(&bundle.code).cloned().unwrap_or_default();
        bundle.set(key, value);
        changed.push(bundle.code.clone());
    }
    Ok(changed)
}

/// Removes `key` from every bundle holding it.
pub fn delete_key(index: &mut ResourceIndex, key: &str) -> Vec<LocaleCode> {
    // Check through the shared view first so untouched bundles stay shared.
    let holders: Vec<LocaleCode> = index
        .iter()
        .filter(|bundle| bundle.contains_key(key))
        .map(|bundle| bundle.code.clone())
        .collect();
    for code in &holders {
        if let Some(bundle) = index.get_mut(code) {
            bundle.remove(key);
        }
    }
    holders
}

/// Copies `keys` from `source` into every bundle of `target`.
///
/// Each target bundle reads from the source bundle of the same locale, or
/// from the source's default bundle when the source lacks that locale; keys
/// the source lacks become empty strings. Keys already present in a target
/// bundle are kept unless `overwrite` is set.
pub fn import_keys(
    source: &ResourceIndex,
    source_config: &Configuration,
    target: &mut ResourceIndex,
    keys: &[String],
    overwrite: bool,
) -> Vec<LocaleCode> {
    let fallback = default_bundle(source, source_config).bundle().cloned();
    let mut changed = Vec::new();

    let codes: Vec<LocaleCode> = target.codes().map(str::to_string).collect();
    for code in codes {
        let from = source.get(&code).or(fallback.as_ref());
        let pending: Vec<(&str, String)> = {
            let Some(bundle) = target.get(&code) else {
                continue;
            };
            keys.iter()
                .filter(|key| overwrite || !bundle.contains_key(key))
                .map(|key| {
                    let value = from.and_then(|b| b.get(key)).unwrap_or_default();
                    (key.as_str(), value.to_string())
                })
                .filter(|(key, value)| bundle.get(key) != Some(value.as_str()))
                .collect()
        };
        if pending.is_empty() {
            continue;
        }
        if let Some(bundle) = target.get_mut(&code) {
            for (key, value) in pending {
                bundle.set(key, value);
            }
            changed.push(code);
        }
    }
    changed
}

/// A bundle that could not be written.
#[derive(Debug)]
pub struct PersistFailure {
    pub code: LocaleCode,
    pub file: PathBuf,
    pub error: Error,
}

/// Per-file outcome of writing mutated bundles.
#[derive(Debug, Default)]
pub struct PersistReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<PersistFailure>,
}

impl PersistReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Serialized content of a bundle that was written successfully.
#[derive(Debug, Clone)]
pub struct Written {
    pub code: LocaleCode,
    pub bytes: Vec<u8>,
}

/// Writes the bundles for `codes` in order, awaiting each before the next.
///
/// A failure is recorded and the remaining bundles are still written;
/// nothing already written is reverted.
pub async fn persist(
    index: &ResourceIndex,
    codes: &[LocaleCode],
    codec: &dyn ResourceCodec,
) -> (PersistReport, Vec<Written>) {
    let mut report = PersistReport::default();
    let mut written = Vec::with_capacity(codes.len());

    for code in codes {
        let Some(bundle) = index.get(code) else {
            continue;
        };
        let result = match codec.serialize_with(&bundle.entries, &bundle.layout) {
            Ok(bytes) => tokio::fs::write(&bundle.file, &bytes)
                .await
                .map(|_| bytes)
                .map_err(|source| Error::Persist {
                    file: bundle.file.clone(),
                    source,
                }),
            Err(e) => Err(e),
        };
        match result {
            Ok(bytes) => {
                tracing::debug!(file = %bundle.file.display(), "resource file written");
                report.written.push(bundle.file.clone());
                written.push(Written {
                    code: code.clone(),
                    bytes,
                });
            }
            Err(error) => {
                tracing::warn!(file = %bundle.file.display(), error = %error, "failed to write resource file");
                report.failures.push(PersistFailure {
                    code: code.clone(),
                    file: bundle.file.clone(),
                    error,
                });
            }
        }
    }

    (report, written)
}
