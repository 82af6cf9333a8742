//! Project configuration and where it is read from.
//!
//! Settings live in a workspace settings file (`.vscode/settings.json`) as
//! flat dotted keys:
//!
//! ```json
//! {
//!     "langindex.root": "i18n",
//!     "langindex.main": "en",
//!     "langindex.display": "zh-cn",
//!     "langindex.format": "json",
//!     "langindex.t-quote": "'",
//!     "langindex.translator": "none"
//! }
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;

use crate::{
    error::Error,
    formats::ResourceFormat,
    locale::{LocaleCode, normalize_locale},
};

pub const SETTINGS_DIR: &str = ".vscode";
pub const SETTINGS_FILE: &str = "settings.json";

const DEFAULT_ROOT: &str = "i18n";
const DEFAULT_MAIN: &str = "zh-cn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Directory holding one resource file per locale.
    pub root: PathBuf,
    /// Locale lookups default to.
    pub main_locale: LocaleCode,
    /// Locale shown in inline annotations; falls back to `main_locale`.
    pub display_locale: Option<LocaleCode>,
    pub format: ResourceFormat,
    /// Quote used when synthesizing translation calls.
    pub quote: String,
    /// Name of the machine translator, `none` when disabled.
    pub translator: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            root: PathBuf::from(DEFAULT_ROOT),
            main_locale: DEFAULT_MAIN.to_string(),
            display_locale: None,
            format: ResourceFormat::Json,
            quote: "'".to_string(),
            translator: "none".to_string(),
        }
    }
}

/// Raw contents of a settings file; unrelated keys are ignored.
#[derive(Debug, Default, Deserialize)]
struct Settings {
    #[serde(rename = "langindex.root")]
    root: Option<String>,
    #[serde(rename = "langindex.main")]
    main: Option<String>,
    #[serde(rename = "langindex.display")]
    display: Option<String>,
    #[serde(rename = "langindex.format")]
    format: Option<String>,
    #[serde(rename = "langindex.t-quote")]
    quote: Option<String>,
    #[serde(rename = "langindex.translator")]
    translator: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Configuration {
    pub fn new(root: impl Into<PathBuf>, main_locale: &str, format: ResourceFormat) -> Self {
        Configuration {
            root: root.into(),
            main_locale: normalize_locale(main_locale),
            format,
            ..Configuration::default()
        }
    }

    pub fn with_display_locale(mut self, display: &str) -> Self {
        self.display_locale = Some(normalize_locale(display)).filter(|code| !code.is_empty());
        self
    }

    /// Builds a configuration from settings text; relative roots resolve
    /// against `workspace`.
    pub fn from_settings_str(text: &str, workspace: &Path) -> Result<Self, Error> {
        let settings: Settings = if text.trim().is_empty() {
            Settings::default()
        } else {
            serde_json::from_str(text).map_err(|e| Error::InvalidSettings(e.to_string()))?
        };

        let root = PathBuf::from(non_empty(settings.root).unwrap_or_else(|| DEFAULT_ROOT.into()));
        let root = if root.is_absolute() {
            root
        } else {
            workspace.join(root)
        };

        let format = match non_empty(settings.format) {
            Some(format) => ResourceFormat::from_str(&format)?,
            None => ResourceFormat::default(),
        };

        let mut config = Configuration::new(
            root,
            &non_empty(settings.main).unwrap_or_else(|| DEFAULT_MAIN.into()),
            format,
        );
        if let Some(display) = non_empty(settings.display) {
            config = config.with_display_locale(&display);
        }
        if let Some(quote) = non_empty(settings.quote) {
            config.quote = quote;
        }
        if let Some(translator) = non_empty(settings.translator) {
            config.translator = translator;
        }
        Ok(config)
    }

    /// Reads a settings file. The workspace is the parent of the `.vscode`
    /// directory when the file lives in one, else the file's directory.
    pub fn from_settings_file(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Self::from_settings_str(&text, &workspace_of(path))
    }

    /// Whether `path` is a resource file this configuration indexes.
    pub fn is_resource_path(&self, path: &Path) -> bool {
        path.starts_with(&self.root) && self.format.codec().accepts(path)
    }

    /// The locale inline annotations are rendered in.
    pub fn display_or_main(&self) -> &str {
        self.display_locale.as_deref().unwrap_or(&self.main_locale)
    }
}

/// Workspace folder owning a settings file.
pub fn workspace_of(settings_path: &Path) -> PathBuf {
    let dir = settings_path.parent().unwrap_or_else(|| Path::new("."));
    if dir.file_name().is_some_and(|name| name == SETTINGS_DIR) {
        dir.parent().unwrap_or(dir).to_path_buf()
    } else {
        dir.to_path_buf()
    }
}

/// Like [`workspace_of`], but insists on a `.vscode/settings.json` path, as
/// required when importing from another project.
pub fn strict_workspace_of(settings_path: &Path) -> Result<PathBuf, Error> {
    let is_settings = settings_path
        .file_name()
        .is_some_and(|name| name == SETTINGS_FILE);
    let in_settings_dir = settings_path
        .parent()
        .and_then(Path::file_name)
        .is_some_and(|name| name == SETTINGS_DIR);
    if !is_settings || !in_settings_dir {
        return Err(Error::InvalidSettings(format!(
            "expected a {}/{} file, got `{}`",
            SETTINGS_DIR,
            SETTINGS_FILE,
            settings_path.display()
        )));
    }
    Ok(workspace_of(settings_path))
}

/// Live access to configuration, evaluated at call time.
pub trait ConfigSource: Send + Sync {
    fn current(&self) -> Result<Configuration, Error>;
}

/// A fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfig(pub Configuration);

impl ConfigSource for StaticConfig {
    fn current(&self) -> Result<Configuration, Error> {
        Ok(self.0.clone())
    }
}

/// A settings file re-read on every access.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SettingsFile { path: path.into() }
    }

    /// The conventional settings path inside `workspace`.
    pub fn in_workspace(workspace: &Path) -> Self {
        Self::new(workspace.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for SettingsFile {
    fn current(&self) -> Result<Configuration, Error> {
        if !self.path.exists() {
            return Ok(Configuration {
                root: workspace_of(&self.path).join(DEFAULT_ROOT),
                ..Configuration::default()
            });
        }
        Configuration::from_settings_file(&self.path)
    }
}
