//! Read access for providers and commands.

use std::sync::Arc;

use crate::{
    config::ConfigSource,
    error::Error,
    index::{ResourceIndex, default_bundle},
    types::{ResourceBundle, TextRange},
};

/// Keys of `bundle` in source order.
pub fn all_keys_of(bundle: &ResourceBundle) -> Vec<String> {
    bundle.keys().map(str::to_string).collect()
}

pub fn range_of(bundle: &ResourceBundle, key: &str) -> Option<TextRange> {
    bundle.range_of(key)
}

/// Looks up `key` in `locale`'s bundle.
pub fn lookup<'a>(index: &'a ResourceIndex, locale: &str, key: &str) -> Option<&'a str> {
    index.lookup(locale, key)
}

/// The default bundle under the configuration `source` yields right now.
///
/// The configuration is read on every call, so callers that run before
/// the service has settled still see the user's current settings.
pub fn current_default(
    index: &ResourceIndex,
    source: &dyn ConfigSource,
) -> Result<Option<Arc<ResourceBundle>>, Error> {
    let config = source.current()?;
    Ok(default_bundle(index, &config).bundle().cloned())
}

/// Per-locale values of `key`, in index order; locales lacking it are skipped.
pub fn translations_of<'a>(index: &'a ResourceIndex, key: &str) -> Vec<(&'a str, &'a str)> {
    index
        .iter()
        .filter_map(|bundle| bundle.get(key).map(|value| (bundle.code.as_str(), value)))
        .collect()
}
