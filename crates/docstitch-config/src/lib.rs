use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Delimiter '{field}' can not be empty")]
    EmptyDelimiter { field: &'static str },

    #[error("Delimiter '{field}' can not start or end with whitespace: {value:?}")]
    PaddedDelimiter { field: &'static str, value: String },

    #[error("Container open and close markers must differ, both are {0:?}")]
    ContainerMarkersEqual(String),
}

/// The strings that mark tags in template text.
///
/// With the defaults a value tag reads `{name}`, a container opens with
/// `{#items}` and closes with `{/items}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delimiters {
    pub tag_start: String,
    pub tag_end: String,
    pub container_tag_open: String,
    pub container_tag_close: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            tag_start: "{".to_string(),
            tag_end: "}".to_string(),
            container_tag_open: "#".to_string(),
            container_tag_close: "/".to_string(),
        }
    }
}

impl Delimiters {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("tag_start", &self.tag_start),
            ("tag_end", &self.tag_end),
            ("container_tag_open", &self.container_tag_open),
            ("container_tag_close", &self.container_tag_close),
        ];
        for (field, value) in fields {
            if value.is_empty() {
                return Err(ConfigError::EmptyDelimiter { field });
            }
            if value.trim() != value {
                return Err(ConfigError::PaddedDelimiter {
                    field,
                    value: value.clone(),
                });
            }
        }
        if self.container_tag_open == self.container_tag_close {
            return Err(ConfigError::ContainerMarkersEqual(
                self.container_tag_open.clone(),
            ));
        }
        Ok(())
    }
}

/// Settings for a template run. Keys missing from a config file fall back to
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub delimiters: Delimiters,
    /// Content type for self-closed tags whose value carries no type.
    pub default_content_type: String,
    /// Content type for open/close tag pairs.
    pub container_content_type: String,
    /// Leave self-closed tags alone when their value renders as "".
    pub skip_empty_tags: bool,
    /// Deepest element nesting the delimiter search will descend into.
    pub max_depth: usize,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            delimiters: Delimiters::default(),
            default_content_type: "text".to_string(),
            container_content_type: "loop".to_string(),
            skip_empty_tags: false,
            max_depth: 20,
        }
    }
}

impl TemplateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delimiters.validate()
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: TemplateConfig =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;
        config.validate()?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/docstitch");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }
}
