//! All supported resource file formats for langindex.
//!
//! This module re-exports the codec for each format and provides the
//! [`ResourceFormat`] enum used by configuration and discovery.

pub mod json;
pub mod yaml;

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

// Reexporting the codecs for easier access
pub use json::JsonCodec;
pub use yaml::YamlCodec;

use crate::{error::Error, traits::ResourceCodec};

/// The resource format configured for a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceFormat {
    /// Flat (or nested) JSON objects, `.json`.
    #[default]
    Json,
    /// YAML mappings, `.yaml` / `.yml`.
    Yaml,
}

impl ResourceFormat {
    /// Accepted file extensions for discovery.
    pub fn extensions(&self) -> &'static [&'static str] {
        self.codec().extensions()
    }

    /// The codec parsing and serializing this format.
    pub fn codec(&self) -> &'static dyn ResourceCodec {
        static JSON: JsonCodec = JsonCodec;
        static YAML: YamlCodec = YamlCodec;
        match self {
            ResourceFormat::Json => &JSON,
            ResourceFormat::Yaml => &YAML,
        }
    }
}

/// Implements [`std::fmt::Display`] for [`ResourceFormat`].
///
/// ```rust
/// use langindex::formats::ResourceFormat;
/// assert_eq!(ResourceFormat::Json.to_string(), "json");
/// assert_eq!(ResourceFormat::Yaml.to_string(), "yaml");
/// ```
impl Display for ResourceFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceFormat::Json => write!(f, "json"),
            ResourceFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// Accepts `json`, `yaml` and `yml`, case-insensitive.
///
/// ```rust
/// use langindex::formats::ResourceFormat;
/// use std::str::FromStr;
/// assert_eq!(ResourceFormat::from_str("YML").unwrap(), ResourceFormat::Yaml);
/// assert!(ResourceFormat::from_str("toml").is_err());
/// ```
impl FromStr for ResourceFormat {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ResourceFormat::Json),
            "yaml" | "yml" => Ok(ResourceFormat::Yaml),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

/// Joins a parent key path and a child key with `.`.
pub(crate) fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}
