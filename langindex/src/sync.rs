//! The synchronization engine: owner of the live configuration and index.
//!
//! Readers take a [`Snapshot`], an immutable pair of `Arc`s, and never see a
//! half-built index: every change builds a new index and swaps it in whole.
//! All writers (rebuilds, incremental re-parses, mutations) queue on one
//! async mutex, finish their in-memory change and swap before the first
//! awaited file write, then write files one after another.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, PoisonError, RwLock,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::task::JoinHandle;

use crate::{
    config::{ConfigSource, Configuration},
    error::Error,
    index::{DefaultBundle, ResourceIndex, ScanReport, build_from_directory, default_bundle},
    locale::LocaleCode,
    mutation::{self, PersistReport},
    session::{self, PendingTranslationSession},
    types::{Entry, ResourceBundle},
};

/// Quiet period before a document change is re-parsed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// A consistent view of configuration and index.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub config: Arc<Configuration>,
    pub index: Arc<ResourceIndex>,
}

/// Content change of a document, from the editor or the file system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    pub path: PathBuf,
    /// Unsaved buffer text; `None` re-reads the file.
    pub text: Option<String>,
}

impl DocumentChange {
    pub fn saved(path: impl Into<PathBuf>) -> Self {
        DocumentChange {
            path: path.into(),
            text: None,
        }
    }

    pub fn edited(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        DocumentChange {
            path: path.into(),
            text: Some(text.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// Not a resource file of the current configuration.
    OutOfScope,
    /// A resource path no bundle is backed by; needs a full rebuild.
    Untracked,
    /// The bundle for this locale was re-parsed and replaced.
    Reindexed(LocaleCode),
}

struct PendingChange {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Process-wide owner of the resource index.
///
/// Created with [`IndexService::initialise`] and shared as `Arc`; call
/// [`IndexService::shutdown`] to drop pending debounced work.
pub struct IndexService {
    state: RwLock<Snapshot>,
    writer: tokio::sync::Mutex<()>,
    last_scan: Mutex<ScanReport>,
    pending: Mutex<HashMap<PathBuf, PendingChange>>,
    session: Mutex<Option<PendingTranslationSession>>,
    debounce: Duration,
    generation: AtomicU64,
    reindex_count: AtomicUsize,
    warned_fallback: AtomicBool,
    fallback_warnings: AtomicUsize,
}

impl std::fmt::Debug for IndexService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("IndexService")
            .field("root", &snapshot.config.root)
            .field("bundles", &snapshot.index.len())
            .field("debounce", &self.debounce)
            .finish()
    }
}

/// Scans `config.root`; a missing root yields an empty index.
fn scan(config: &Configuration) -> Result<(ResourceIndex, ScanReport), Error> {
    match build_from_directory(config) {
        Err(Error::ConfigMissingRoot(root)) => {
            tracing::debug!(root = %root.display(), "resource root missing; index left empty");
            Ok((ResourceIndex::new(), ScanReport::default()))
        }
        other => other,
    }
}

impl IndexService {
    /// Builds the initial index for `config`.
    pub fn initialise(config: Configuration) -> Result<Arc<Self>, Error> {
        Self::with_debounce(config, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(config: Configuration, debounce: Duration) -> Result<Arc<Self>, Error> {
        let (index, report) = scan(&config)?;
        Ok(Arc::new(IndexService {
            state: RwLock::new(Snapshot {
                config: Arc::new(config),
                index: Arc::new(index),
            }),
            writer: tokio::sync::Mutex::new(()),
            last_scan: Mutex::new(report),
            pending: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            debounce,
            generation: AtomicU64::new(0),
            reindex_count: AtomicUsize::new(0),
            warned_fallback: AtomicBool::new(false),
            fallback_warnings: AtomicUsize::new(0),
        }))
    }

    /// Aborts pending debounced changes and ends any translation session.
    pub fn shutdown(&self) {
        let pending: Vec<PendingChange> = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, change)| change)
            .collect();
        for change in pending {
            change.handle.abort();
        }
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        tracing::debug!("index service shut down");
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn config(&self) -> Arc<Configuration> {
        self.snapshot().config
    }

    pub fn index(&self) -> Arc<ResourceIndex> {
        self.snapshot().index
    }

    /// Report of the most recent full scan.
    pub fn last_scan(&self) -> ScanReport {
        self.last_scan
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Incremental re-parses applied so far.
    pub fn reindex_count(&self) -> usize {
        self.reindex_count.load(Ordering::SeqCst)
    }

    fn swap(&self, config: Option<Arc<Configuration>>, index: Arc<ResourceIndex>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(config) = config {
            state.config = config;
        }
        state.index = index;
    }

    /// Replaces the configuration and rebuilds the whole index.
    pub async fn on_configuration_changed(&self, config: Configuration) -> Result<ScanReport, Error> {
        let _writer = self.writer.lock().await;
        let (index, report) = scan(&config)?;
        tracing::info!(
            root = %config.root.display(),
            main = %config.main_locale,
            format = %config.format,
            "configuration changed; index rebuilt"
        );
        self.swap(Some(Arc::new(config)), Arc::new(index));
        *self.last_scan.lock().unwrap_or_else(PoisonError::into_inner) = report.clone();
        Ok(report)
    }

    /// Rebuilds with the current configuration.
    pub async fn reload(&self) -> Result<ScanReport, Error> {
        let config = (*self.config()).clone();
        self.on_configuration_changed(config).await
    }

    /// Re-reads `source` and rebuilds only if the configuration differs.
    pub async fn refresh_from(&self, source: &dyn ConfigSource) -> Result<Option<ScanReport>, Error> {
        let config = source.current()?;
        if config == *self.config() {
            return Ok(None);
        }
        self.on_configuration_changed(config).await.map(Some)
    }

    /// Points the index at another resource folder.
    pub async fn configure_root(&self, root: impl Into<PathBuf>) -> Result<ScanReport, Error> {
        let config = Configuration {
            root: root.into(),
            ..(*self.config()).clone()
        };
        self.on_configuration_changed(config).await
    }

    /// Re-parses one changed resource file and replaces its bundle.
    ///
    /// The bundle keeps its locale code. On a parse failure the previous
    /// bundle stays in place and the error is returned.
    pub async fn apply_change(&self, change: &DocumentChange) -> Result<ChangeOutcome, Error> {
        let _writer = self.writer.lock().await;
        let snapshot = self.snapshot();
        if !snapshot.config.is_resource_path(&change.path) {
            return Ok(ChangeOutcome::OutOfScope);
        }
        let Some(current) = snapshot.index.find_by_file(&change.path) else {
            tracing::debug!(file = %change.path.display(), "change to an unindexed resource file ignored");
            return Ok(ChangeOutcome::Untracked);
        };

        let codec = snapshot.config.format.codec();
        let parsed = match &change.text {
            Some(text) => codec.parse_str(text),
            None => codec.read_from(&change.path),
        }
        .map_err(|e| {
            tracing::warn!(file = %change.path.display(), error = %e, "failed to re-parse resource file; keeping previous content");
            Error::codec_parse(&change.path, e)
        })?;

        let code = current.code.clone();
        let mut index = (*snapshot.index).clone();
        index.insert(ResourceBundle::new(code.clone(), change.path.clone(), parsed));
        self.swap(None, Arc::new(index));
        self.reindex_count.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(file = %change.path.display(), code = %code, "bundle re-indexed");
        Ok(ChangeOutcome::Reindexed(code))
    }

    /// Schedules `change` after the debounce period.
    ///
    /// A newer notification for the same path cancels the older one if its
    /// work has not started yet, so a burst of edits re-indexes once.
    pub fn notify_change(self: &Arc<Self>, change: DocumentChange) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst);
        let path = change.path.clone();
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        let service = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(service.debounce).await;
            {
                let mut pending = service.pending.lock().unwrap_or_else(PoisonError::into_inner);
                match pending.get(&change.path) {
                    Some(entry) if entry.generation == generation => {
                        pending.remove(&change.path);
                    }
                    _ => return,
                }
            }
            if let Err(e) = service.apply_change(&change).await {
                tracing::warn!(file = %change.path.display(), error = %e, "debounced re-index failed");
            }
        });

        if let Some(previous) = pending.insert(path, PendingChange { generation, handle }) {
            previous.handle.abort();
        }
    }

    /// Whether a debounced change for `path` is still waiting.
    pub fn is_pending(&self, path: &Path) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path)
    }

    /// The bundle lookups default to, under the live configuration.
    ///
    /// Falling back to another bundle because the main locale is missing is
    /// logged once per service.
    pub fn current_default(&self) -> Result<Arc<ResourceBundle>, Error> {
        let snapshot = self.snapshot();
        match default_bundle(&snapshot.index, &snapshot.config) {
            DefaultBundle::Main(bundle) => Ok(Arc::clone(bundle)),
            DefaultBundle::Fallback(bundle) => {
                if !self.warned_fallback.swap(true, Ordering::SeqCst) {
                    self.fallback_warnings.fetch_add(1, Ordering::SeqCst);
                    tracing::warn!(
                        main = %snapshot.config.main_locale,
                        using = %bundle.code,
                        "no bundle for the main locale; falling back to the first bundle"
                    );
                }
                Ok(Arc::clone(bundle))
            }
            DefaultBundle::Empty if !snapshot.config.root.is_dir() => {
                Err(Error::ConfigMissingRoot(snapshot.config.root.to_path_buf()))
            }
            DefaultBundle::Empty => Err(Error::NoDefaultBundle),
        }
    }

    /// How many times the main-locale fallback has been logged.
    pub(crate) fn fallback_warnings(&self) -> usize {
        self.fallback_warnings.load(Ordering::SeqCst)
    }

    /// Swaps in `index`, writes `changed` bundles, then refreshes their
    /// key ranges from the bytes written.
    async fn write_through(
        &self,
        config: &Configuration,
        index: ResourceIndex,
        changed: &[LocaleCode],
    ) -> PersistReport {
        let index = Arc::new(index);
        self.swap(None, Arc::clone(&index));
        if changed.is_empty() {
            return PersistReport::default();
        }

        let codec = config.format.codec();
        let (report, written) = mutation::persist(&index, changed, codec).await;
        if !written.is_empty() {
            let mut refreshed = (*index).clone();
            for file in &written {
                let Ok(parsed) = codec.parse(&file.bytes) else {
                    continue;
                };
                if let Some(bundle) = refreshed.get_mut(&file.code) {
                    if bundle.entries == parsed.entries {
                        bundle.ranges = parsed.ranges;
                    }
                }
            }
            self.swap(None, Arc::new(refreshed));
        }
        report
    }

    /// Adds `key` to every bundle and persists all of them.
    pub async fn insert_key(
        &self,
        key: &str,
        authoring: &str,
        values: &HashMap<LocaleCode, String>,
    ) -> Result<PersistReport, Error> {
        let _writer = self.writer.lock().await;
        let snapshot = self.snapshot();
        let mut index = (*snapshot.index).clone();
        let changed = mutation::insert_key(&mut index, key, authoring, values)?;
        tracing::debug!(key, locales = changed.len(), "key inserted");
        Ok(self.write_through(&snapshot.config, index, &changed).await)
    }

    /// Removes `key` everywhere; bundles without it are left untouched.
    pub async fn delete_key(&self, key: &str) -> PersistReport {
        let _writer = self.writer.lock().await;
        let snapshot = self.snapshot();
        let mut index = (*snapshot.index).clone();
        let changed = mutation::delete_key(&mut index, key);
        tracing::debug!(key, locales = changed.len(), "key deleted");
        self.write_through(&snapshot.config, index, &changed).await
    }

    /// Copies `keys` from another project's index into this one.
    pub async fn import_keys(
        &self,
        source: &ResourceIndex,
        source_config: &Configuration,
        keys: &[String],
        overwrite: bool,
    ) -> PersistReport {
        let _writer = self.writer.lock().await;
        let snapshot = self.snapshot();
        let mut index = (*snapshot.index).clone();
        let changed = mutation::import_keys(source, source_config, &mut index, keys, overwrite);
        tracing::debug!(keys = keys.len(), locales = changed.len(), "keys imported");
        self.write_through(&snapshot.config, index, &changed).await
    }

    /// Records a new session, replacing (and returning) any earlier one.
    pub fn begin_session(&self, session: PendingTranslationSession) -> Option<PendingTranslationSession> {
        let previous = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(session);
        if let Some(previous) = &previous {
            tracing::warn!(locale = %previous.target_locale, "pending translation session replaced");
        }
        previous
    }

    pub fn pending_session(&self) -> Option<PendingTranslationSession> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the scratch text of the pending session.
    pub fn edit_scratch(&self, text: impl Into<String>) -> Result<(), Error> {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let session = session.as_mut().ok_or(Error::NoPendingSession)?;
        session.scratch_document = text.into();
        Ok(())
    }

    /// Merges the edited scratch document into its bundle and persists it.
    ///
    /// The session survives a malformed scratch document so it can be
    /// fixed and applied again; it ends once the merge is done, unless a
    /// newer session was begun in the meantime.
    pub async fn apply_session(&self) -> Result<PersistReport, Error> {
        let pending = self.pending_session().ok_or(Error::NoPendingSession)?;
        let edited: Vec<Entry> = pending.edited_entries()?;

        let _writer = self.writer.lock().await;
        let snapshot = self.snapshot();
        let mut index = (*snapshot.index).clone();
        let bundle = index
            .get_mut(&pending.target_locale)
            .ok_or_else(|| Error::UnknownLocale(pending.target_locale.clone()))?;
        let changed = session::merge_into(bundle, &edited);

        {
            let mut current = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            if current.as_ref() == Some(&pending) {
                current.take();
            } else {
                tracing::debug!(locale = %pending.target_locale, "session replaced while applying; newer one kept");
            }
        }
        tracing::debug!(locale = %pending.target_locale, changed, "translation session applied");

        let codes = if changed > 0 {
            vec![pending.target_locale.clone()]
        } else {
            Vec::new()
        };
        Ok(self.write_through(&snapshot.config, index, &codes).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::ResourceFormat;
    use std::fs;

    fn project() -> (tempfile::TempDir, Configuration) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("lang.en.json"), "{\n    \"a\": \"A\"\n}").unwrap();
        fs::write(dir.path().join("lang.fr.json"), "{\n    \"a\": \"Â\"\n}").unwrap();
        let config = Configuration::new(dir.path(), "en", ResourceFormat::Json);
        (dir, config)
    }

    #[tokio::test]
    async fn test_apply_change_keeps_code() {
        let (dir, config) = project();
        let service = IndexService::initialise(config).unwrap();
        let path = dir.path().join("lang.fr.json");
        let outcome = service
            .apply_change(&DocumentChange::edited(&path, r#"{ "a": "B" }"#))
            .await
            .unwrap();
        assert_eq!(outcome, ChangeOutcome::Reindexed("fr".to_string()));
        assert_eq!(service.index().lookup("fr", "a"), Some("B"));
        assert_eq!(service.reindex_count(), 1);
    }

    #[tokio::test]
    async fn test_apply_change_is_idempotent() {
        let (dir, config) = project();
        let service = IndexService::initialise(config).unwrap();
        let change = DocumentChange::edited(dir.path().join("lang.en.json"), r#"{ "a": "Z" }"#);
        service.apply_change(&change).await.unwrap();
        let first = service.index();
        service.apply_change(&change).await.unwrap();
        assert_eq!(*service.index(), *first);
    }

    #[tokio::test]
    async fn test_parse_failure_keeps_previous_bundle() {
        let (dir, config) = project();
        let service = IndexService::initialise(config).unwrap();
        let path = dir.path().join("lang.en.json");
        let result = service
            .apply_change(&DocumentChange::edited(&path, "{ broken"))
            .await;
        assert!(matches!(result, Err(Error::CodecParse { .. })));
        assert_eq!(service.index().lookup("en", "a"), Some("A"));
    }

    #[tokio::test]
    async fn test_out_of_scope_and_untracked() {
        let (dir, config) = project();
        let service = IndexService::initialise(config).unwrap();
        let outside = DocumentChange::saved("/elsewhere/lang.de.json");
        assert_eq!(
            service.apply_change(&outside).await.unwrap(),
            ChangeOutcome::OutOfScope
        );
        let new_file = DocumentChange::saved(dir.path().join("lang.de.json"));
        assert_eq!(
            service.apply_change(&new_file).await.unwrap(),
            ChangeOutcome::Untracked
        );
    }

    #[tokio::test]
    async fn test_missing_root_surfaces_on_query() {
        let config = Configuration::new("/definitely/not/here", "en", ResourceFormat::Json);
        let service = IndexService::initialise(config).unwrap();
        assert!(service.index().is_empty());
        assert!(matches!(
            service.current_default(),
            Err(Error::ConfigMissingRoot(_))
        ));
    }

    #[tokio::test]
    async fn test_configure_root_swaps_index() {
        let (_dir, config) = project();
        let service = IndexService::initialise(config).unwrap();
        let other = tempfile::tempdir().unwrap();
        fs::write(other.path().join("de.json"), r#"{ "b": "Bé" }"#).unwrap();
        let report = service.configure_root(other.path()).await.unwrap();
        assert_eq!(report.indexed.len(), 1);
        assert_eq!(service.index().codes().collect::<Vec<_>>(), vec!["de"]);
        assert_eq!(service.current_default().unwrap().code, "de");
    }

    #[tokio::test]
    async fn test_session_survives_bad_scratch() {
        let (_dir, config) = project();
        let service = IndexService::initialise(config).unwrap();
        service.begin_session(PendingTranslationSession::new("fr", "{ nope"));
        assert!(service.apply_session().await.is_err());
        assert!(service.pending_session().is_some());

        service.edit_scratch(r#"{ "a": "Ah" }"#).unwrap();
        let report = service.apply_session().await.unwrap();
        assert_eq!(report.written.len(), 1);
        assert!(service.pending_session().is_none());
        assert_eq!(service.index().lookup("fr", "a"), Some("Ah"));
        assert!(matches!(
            service.apply_session().await,
            Err(Error::NoPendingSession)
        ));
    }

    #[tokio::test]
    async fn test_insert_refreshes_ranges() {
        let (dir, config) = project();
        let service = IndexService::initialise(config).unwrap();
        let values = HashMap::from([("en".to_string(), "Bee".to_string())]);
        let report = service.insert_key("b", "en", &values).await.unwrap();
        assert!(report.is_complete());
        let en = service.index().get("en").cloned().unwrap();
        assert_eq!(en.range_of("b").map(|r| r.start.line), Some(2));
        assert_eq!(
            fs::read_to_string(dir.path().join("lang.fr.json")).unwrap(),
            "{\n    \"a\": \"Â\",\n    \"b\": \"\"\n}"
        );
    }

    #[tokio::test]
    async fn test_fallback_is_logged_once() {
        let (dir, _) = project();
        let config = Configuration::new(dir.path(), "de", ResourceFormat::Json);
        let service = IndexService::initialise(config).unwrap();
        for _ in 0..3 {
            assert_eq!(service.current_default().unwrap().code, "en");
        }
        assert_eq!(service.fallback_warnings(), 1);
    }

    #[tokio::test]
    async fn test_main_locale_is_not_a_fallback() {
        let (_dir, config) = project();
        let service = IndexService::initialise(config).unwrap();
        for _ in 0..3 {
            assert_eq!(service.current_default().unwrap().code, "en");
        }
        assert_eq!(service.fallback_warnings(), 0);
    }

    #[tokio::test]
    async fn test_session_begun_during_apply_is_kept() {
        let (_dir, config) = project();
        let service = IndexService::initialise(config).unwrap();
        service.begin_session(PendingTranslationSession::new("fr", r#"{ "a": "Ah" }"#));

        let writer = service.writer.lock().await;
        let apply = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.apply_session().await }
        });
        // let the apply read the session and queue on the writer lock
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        let newer = PendingTranslationSession::new("en", r#"{ "a": "Aye" }"#);
        service.begin_session(newer.clone());
        drop(writer);

        let report = apply.await.unwrap().unwrap();
        assert_eq!(report.written.len(), 1);
        assert_eq!(service.index().lookup("fr", "a"), Some("Ah"));
        assert_eq!(service.pending_session(), Some(newer));
    }

    #[tokio::test]
    async fn test_rewrite_keeps_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("lang.en.json"), "{\n  \"a\": \"A\"\n}\n").unwrap();
        let config = Configuration::new(dir.path(), "en", ResourceFormat::Json);
        let service = IndexService::initialise(config).unwrap();
        let values = HashMap::from([("en".to_string(), "Bee".to_string())]);
        service.insert_key("b", "en", &values).await.unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("lang.en.json")).unwrap(),
            "{\n  \"a\": \"A\",\n  \"b\": \"Bee\"\n}\n"
        );
        let en = service.index().get("en").cloned().unwrap();
        assert_eq!(en.range_of("b").map(|r| r.start.line), Some(2));
    }
}
