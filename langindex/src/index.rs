//! The in-memory resource index: one [`ResourceBundle`] per locale.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    config::Configuration,
    error::Error,
    locale::{LocaleCode, LocaleResolver},
    types::ResourceBundle,
};

/// Bundles keyed by locale code, in discovery order.
///
/// Holds at most one bundle per code. Bundles are shared behind `Arc` so
/// that cloning an index to replace one bundle is cheap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceIndex {
    bundles: Vec<Arc<ResourceBundle>>,
}

impl ResourceIndex {
    pub fn new() -> Self {
        ResourceIndex::default()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Returns an iterator over all bundles in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<ResourceBundle>> {
        self.bundles.iter()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.bundles.iter().map(|bundle| bundle.code.as_str())
    }

    /// Finds a bundle by its locale code, if present.
    pub fn get(&self, code: &str) -> Option<&Arc<ResourceBundle>> {
        self.bundles.iter().find(|bundle| bundle.code == code)
    }

    /// Finds the bundle backed by `path`.
    pub fn find_by_file(&self, path: &Path) -> Option<&Arc<ResourceBundle>> {
        self.bundles.iter().find(|bundle| bundle.is_backed_by(path))
    }

    /// Inserts a bundle; one with the same code is replaced in place and returned.
    pub fn insert(&mut self, bundle: ResourceBundle) -> Option<Arc<ResourceBundle>> {
        let bundle = Arc::new(bundle);
        match self.bundles.iter_mut().find(|slot| slot.code == bundle.code) {
            Some(slot) => Some(std::mem::replace(slot, bundle)),
            None => {
                self.bundles.push(bundle);
                None
            }
        }
    }

    /// Looks up `key` in the bundle for `locale`.
    pub fn lookup(&self, locale: &str, key: &str) -> Option<&str> {
        self.get(locale).and_then(|bundle| bundle.get(key))
    }

    pub(crate) fn get_mut(&mut self, code: &str) -> Option<&mut ResourceBundle> {
        self.bundles
            .iter_mut()
            .find(|bundle| bundle.code == code)
            .map(Arc::make_mut)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ResourceBundle> {
        self.bundles.iter_mut().map(Arc::make_mut)
    }
}

impl<'a> IntoIterator for &'a ResourceIndex {
    type Item = &'a Arc<ResourceBundle>;
    type IntoIter = std::slice::Iter<'a, Arc<ResourceBundle>>;

    fn into_iter(self) -> Self::IntoIter {
        self.bundles.iter()
    }
}

/// Non-fatal findings of a directory scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Files that became (or replaced) a bundle.
    pub indexed: Vec<PathBuf>,
    /// Files whose name names no known locale.
    pub unresolved: Vec<PathBuf>,
    /// Files that failed to parse, with the reason.
    pub failures: Vec<(PathBuf, String)>,
    /// Files superseded by a later file resolving to the same locale.
    pub overwritten: Vec<PathBuf>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty() && self.failures.is_empty() && self.overwritten.is_empty()
    }
}

/// Lists resource files directly under `root` in file name order.
pub fn discover(config: &Configuration) -> Result<Vec<PathBuf>, Error> {
    if !config.root.is_dir() {
        return Err(Error::ConfigMissingRoot(config.root.clone()));
    }
    let codec = config.format.codec();
    let mut files = Vec::new();
    for entry in fs::read_dir(&config.root)? {
        let path = entry?.path();
        if path.is_file() && codec.accepts(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Builds an index from every resource file directly under `config.root`.
///
/// Unresolvable or unparsable files are skipped and reported; the scan
/// itself only fails when the root is missing or unreadable.
pub fn build_from_directory(config: &Configuration) -> Result<(ResourceIndex, ScanReport), Error> {
    let files = discover(config)?;
    let names: Vec<String> = files
        .iter()
        .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
        .collect();
    let resolver = LocaleResolver::new(&names);
    let codec = config.format.codec();

    let mut index = ResourceIndex::new();
    let mut report = ScanReport::default();

    for path in files {
        let Some(code) = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| resolver.resolve(name))
        else {
            let error = Error::LocaleUnresolved(path.clone());
            tracing::warn!(%error, "no ISO-639 code in file name; skipped");
            report.unresolved.push(path);
            continue;
        };

        let parsed = match codec.read_from(&path) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "failed to parse resource file; skipped");
                report.failures.push((path, e.to_string()));
                continue;
            }
        };

        if let Some(previous) = index.insert(ResourceBundle::new(code, path.clone(), parsed)) {
            tracing::warn!(
                code = %previous.code,
                kept = %path.display(),
                dropped = %previous.file.display(),
                "two files resolve to the same locale; the later one wins"
            );
            report.overwritten.push(previous.file.clone());
        }
        report.indexed.push(path);
    }

    tracing::info!(root = %config.root.display(), bundles = index.len(), "resource index built");
    Ok((index, report))
}

/// Result of resolving the default bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultBundle<'a> {
    /// The main locale's bundle.
    Main(&'a Arc<ResourceBundle>),
    /// The main locale is missing; the first discovered bundle stands in.
    Fallback(&'a Arc<ResourceBundle>),
    /// The index holds no bundle at all.
    Empty,
}

impl<'a> DefaultBundle<'a> {
    pub fn bundle(&self) -> Option<&'a Arc<ResourceBundle>> {
        match *self {
            DefaultBundle::Main(bundle) | DefaultBundle::Fallback(bundle) => Some(bundle),
            DefaultBundle::Empty => None,
        }
    }
}

/// The bundle lookups default to under `config`.
pub fn default_bundle<'a>(index: &'a ResourceIndex, config: &Configuration) -> DefaultBundle<'a> {
    if let Some(bundle) = index.get(&config.main_locale) {
        return DefaultBundle::Main(bundle);
    }
    match index.iter().next() {
        Some(bundle) => DefaultBundle::Fallback(bundle),
        None => DefaultBundle::Empty,
    }
}

/// The bundle for `code`, else the default bundle.
pub fn bundle_or_default<'a>(
    index: &'a ResourceIndex,
    config: &Configuration,
    code: &LocaleCode,
) -> Option<&'a Arc<ResourceBundle>> {
    index
        .get(code)
        .or_else(|| default_bundle(index, config).bundle())
}
