//! Configuration management for Pagemark

use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub access: AccessConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the PDF documents
    pub documents_dir: PathBuf,
    /// Directory holding the JSON annotation files
    pub annotations_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessConfig {
    /// Shared secret required on API requests when set
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    pub highlight_tag: String,
    pub highlight_class: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            storage: StorageConfig {
                documents_dir: PathBuf::from("files"),
                annotations_dir: PathBuf::from("JSON_FILES"),
            },
            access: AccessConfig::default(),
            render: RenderConfig {
                highlight_tag: "mark".to_string(),
                highlight_class: None,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from a key lookup, falling back to defaults for absent keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        // empty values count as unset
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("SERVER_PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "SERVER_PORT",
                value,
            })?,
            None => defaults.server.port,
        };

        let highlight_tag = match var("HIGHLIGHT_TAG") {
            Some(tag) if tag.chars().all(|c| c.is_ascii_alphanumeric()) => tag,
            Some(value) => {
                return Err(ConfigError::InvalidValue {
                    key: "HIGHLIGHT_TAG",
                    value,
                })
            }
            None => defaults.render.highlight_tag,
        };

        Ok(Config {
            server: ServerConfig {
                host: var("SERVER_HOST").unwrap_or(defaults.server.host),
                port,
            },
            storage: StorageConfig {
                documents_dir: var("DOCUMENTS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.documents_dir),
                annotations_dir: var("ANNOTATIONS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.annotations_dir),
            },
            access: AccessConfig {
                secret: var("ACCESS_SECRET"),
            },
            render: RenderConfig {
                highlight_tag,
                highlight_class: var("HIGHLIGHT_CLASS"),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.documents_dir, PathBuf::from("files"));
        assert_eq!(config.storage.annotations_dir, PathBuf::from("JSON_FILES"));
        assert!(config.access.secret.is_none());
        assert_eq!(config.render.highlight_tag, "mark");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_PORT", "8080"),
            ("ANNOTATIONS_DIR", "/var/lib/pagemark"),
            ("ACCESS_SECRET", "hunter2"),
            ("HIGHLIGHT_TAG", "span"),
        ]))
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.annotations_dir, PathBuf::from("/var/lib/pagemark"));
        assert_eq!(config.access.secret.as_deref(), Some("hunter2"));
        assert_eq!(config.render.highlight_tag, "span");
    }

    #[test]
    fn test_empty_secret_is_unset() {
        let config = Config::from_lookup(lookup(&[("ACCESS_SECRET", "")])).unwrap();
        assert!(config.access.secret.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(lookup(&[("SERVER_PORT", "http")])).is_err());
        assert!(Config::from_lookup(lookup(&[("HIGHLIGHT_TAG", "b onclick=x")])).is_err());
    }
}
