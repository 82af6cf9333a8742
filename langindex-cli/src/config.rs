use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use langindex::{ConfigSource, Configuration, ResourceFormat, SettingsFile};

/// Command-line overrides applied on top of the settings file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub main: Option<String>,
    pub display: Option<String>,
    pub format: Option<String>,
}

/// Resolves the project configuration.
///
/// Settings are read from `settings` when given, else from
/// `.vscode/settings.json` under `workspace`. A missing settings file means
/// defaults. Overrides win over both.
pub fn resolve(
    settings: Option<&Path>,
    workspace: &Path,
    overrides: &Overrides,
) -> Result<Configuration, String> {
    let source = match settings {
        Some(path) => SettingsFile::new(path),
        None => SettingsFile::in_workspace(workspace),
    };
    let mut config = source
        .current()
        .map_err(|e| format!("Cannot read settings {}: {}", source.path().display(), e))?;

    if let Some(root) = &overrides.root {
        config.root = if root.is_absolute() {
            root.clone()
        } else {
            workspace.join(root)
        };
    }
    if let Some(format) = &overrides.format {
        config.format = ResourceFormat::from_str(format).map_err(|e| e.to_string())?;
    }
    if let Some(main) = &overrides.main {
        config = Configuration {
            display_locale: config.display_locale.clone(),
            quote: config.quote.clone(),
            translator: config.translator.clone(),
            ..Configuration::new(config.root.clone(), main, config.format)
        };
    }
    if let Some(display) = &overrides.display {
        config = config.with_display_locale(display);
    }

    tracing::debug!(
        root = %config.root.display(),
        main = %config.main_locale,
        format = %config.format,
        "configuration resolved"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = resolve(None, dir.path(), &Overrides::default()).unwrap();
        assert_eq!(config.root, dir.path().join("i18n"));
        assert_eq!(config.main_locale, "zh-cn");
        assert_eq!(config.format, ResourceFormat::Json);
    }

    #[test]
    fn test_overrides_win_over_settings() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".vscode")).unwrap();
        fs::write(
            dir.path().join(".vscode/settings.json"),
            r#"{ "langindex.root": "locales", "langindex.main": "fr", "langindex.t-quote": "\"" }"#,
        )
        .unwrap();

        let config = resolve(None, dir.path(), &Overrides::default()).unwrap();
        assert_eq!(config.root, dir.path().join("locales"));
        assert_eq!(config.main_locale, "fr");

        let overrides = Overrides {
            main: Some("EN_us".into()),
            format: Some("yaml".into()),
            ..Overrides::default()
        };
        let config = resolve(None, dir.path(), &overrides).unwrap();
        assert_eq!(config.main_locale, "en-us");
        assert_eq!(config.format, ResourceFormat::Yaml);
        assert_eq!(config.quote, "\"");
    }

    #[test]
    fn test_bad_format_override_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            format: Some("toml".into()),
            ..Overrides::default()
        };
        assert!(resolve(None, dir.path(), &overrides).is_err());
    }
}
