//! Service configuration document.
//!
//! The document declares, per service name, one plugin descriptor each for the
//! extractor, authenticator and writer:
//!
//! ```yaml
//! services:
//!   github:
//!     extractor:
//!       type: HeaderExtractor
//!       parameters:
//!         signature: x-signature
//!     authenticator:
//!       type: Signer
//!       parameters: { Key: "secret", Hasher: sha256, Encrypter: hex }
//!     writer:
//!       type: FileWriter
//!       parameters: { filepath: /var/lib/receiver/github.log }
//! ```
//!
//! It can be read from a `.json`, `.yaml` or `.yml` file, or from an inline
//! JSON string.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

/// Free-form plugin parameters.
pub type Parameters = BTreeMap<String, String>;

/// Errors raised while loading the service document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON service configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML service configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("service {0:?} already exists")]
    DuplicateService(String),

    #[error("unsupported configuration file extension: {}", .0.display())]
    UnsupportedExtension(PathBuf),

    #[error("a configuration file path or inline configuration is required")]
    Missing,
}

/// `{class, parameters}` descriptor for a single plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(rename = "type")]
    pub class: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: Parameters,
}

impl PluginConfig {
    pub fn new(class: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            class: class.into(),
            parameters,
        }
    }
}

/// Plugin descriptors for one service.
///
/// Descriptors are optional here so that an incomplete service does not fail
/// the whole document; the registry rejects it instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub extractor: Option<PluginConfig>,
    #[serde(default)]
    pub authenticator: Option<PluginConfig>,
    #[serde(default)]
    pub writer: Option<PluginConfig>,
}

impl ServiceConfig {
    pub fn new(extractor: PluginConfig, authenticator: PluginConfig, writer: PluginConfig) -> Self {
        Self {
            extractor: Some(extractor),
            authenticator: Some(authenticator),
            writer: Some(writer),
        }
    }
}

/// All services declared in one document, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMap {
    #[serde(default, deserialize_with = "unique_services")]
    services: BTreeMap<String, ServiceConfig>,
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service; a name that is already present is an error.
    pub fn add(&mut self, name: impl Into<String>, config: ServiceConfig) -> Result<(), LoadError> {
        let name = name.into();
        if self.services.contains_key(&name) {
            return Err(LoadError::DuplicateService(name));
        }
        self.services.insert(name, config);
        Ok(())
    }

    /// Service names in sorted order.
    pub fn list(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ServiceConfig)> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn from_json(content: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_yaml(content: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Where the service document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    JsonFile(PathBuf),
    YamlFile(PathBuf),
    InlineJson(String),
}

impl ConfigSource {
    /// Pick a source: a file path wins over inline JSON, and the file
    /// extension selects the format.
    pub fn detect(path: Option<&Path>, inline: Option<&str>) -> Result<Self, LoadError> {
        if let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) {
            return match path.extension().and_then(|e| e.to_str()) {
                Some("json") => Ok(ConfigSource::JsonFile(path.to_path_buf())),
                Some("yaml") | Some("yml") => Ok(ConfigSource::YamlFile(path.to_path_buf())),
                _ => Err(LoadError::UnsupportedExtension(path.to_path_buf())),
            };
        }

        match inline.filter(|s| !s.trim().is_empty()) {
            Some(content) => Ok(ConfigSource::InlineJson(content.to_string())),
            None => Err(LoadError::Missing),
        }
    }

    /// Read and parse the document.
    pub fn load(&self) -> Result<ServiceMap, LoadError> {
        let map = match self {
            ConfigSource::JsonFile(path) => ServiceMap::from_json(&read(path)?)?,
            ConfigSource::YamlFile(path) => ServiceMap::from_yaml(&read(path)?)?,
            ConfigSource::InlineJson(content) => ServiceMap::from_json(content)?,
        };

        info!(source = %self, services = map.len(), "service_config_loaded");
        Ok(map)
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::JsonFile(path) | ConfigSource::YamlFile(path) => {
                write!(f, "{}", path.display())
            }
            ConfigSource::InlineJson(_) => write!(f, "inline"),
        }
    }
}

fn read(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Deserialize the `services` map, failing on a repeated name instead of
/// letting the last entry win.
fn unique_services<'de, D>(deserializer: D) -> Result<BTreeMap<String, ServiceConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueServices;

    impl<'de> Visitor<'de> for UniqueServices {
        type Value = BTreeMap<String, ServiceConfig>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of service name to service configuration")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut services = BTreeMap::new();
            while let Some((name, config)) = access.next_entry::<String, ServiceConfig>()? {
                if services.contains_key(&name) {
                    return Err(serde::de::Error::custom(format!(
                        "service {name:?} already exists"
                    )));
                }
                services.insert(name, config);
            }
            Ok(services)
        }
    }

    deserializer.deserialize_map(UniqueServices)
}
