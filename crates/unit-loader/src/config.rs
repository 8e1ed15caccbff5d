//! Loader configuration
//!
//! A [`LoaderConfig`] can be built in code or read from TOML:
//!
//! ```toml
//! name = "direct"
//! namespaces = ["example", "com.ikatas"]
//! force-reload = false
//! field-resolution = "lazy"
//! search-path = ["target/units"]
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use unit_format::is_valid_unit_name;

/// Default display name of a namespaced loader
pub const DEFAULT_LOADER_NAME: &str = "direct";

/// When the unit types named by declared fields are loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldResolution {
    /// Right after the owning unit is defined
    #[default]
    Eager,
    /// On first `declared_field` lookup
    Lazy,
}

/// Configuration of a namespaced unit loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderConfig {
    /// Display name used in diagnostics
    #[serde(default = "default_loader_name")]
    pub name: String,

    /// Dotted prefixes this loader defines itself
    pub namespaces: Vec<String>,

    /// Re-define on every top-level load instead of returning cached handles
    #[serde(default, rename = "force-reload")]
    pub force_reload: bool,

    /// Field type linking policy
    #[serde(default, rename = "field-resolution")]
    pub field_resolution: FieldResolution,

    /// Extra directories searched after the parent chain
    #[serde(default, rename = "search-path", skip_serializing_if = "Vec::is_empty")]
    pub search_path: Vec<PathBuf>,
}

fn default_loader_name() -> String {
    DEFAULT_LOADER_NAME.to_string()
}

impl LoaderConfig {
    /// Config owning a single namespace, with every other option defaulted
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            name: default_loader_name(),
            namespaces: vec![namespace.into()],
            force_reload: false,
            field_resolution: FieldResolution::default(),
            search_path: Vec::new(),
        }
    }

    /// Add another owned namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespaces.push(namespace.into());
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Enable or disable force-reload
    pub fn force_reload(mut self, force_reload: bool) -> Self {
        self.force_reload = force_reload;
        self
    }

    /// Set the field linking policy
    pub fn field_resolution(mut self, field_resolution: FieldResolution) -> Self {
        self.field_resolution = field_resolution;
        self
    }

    /// Append a directory to the loader's own search path
    pub fn with_search_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.search_path.push(root.into());
        self
    }

    /// Parse a config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a config from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: LoaderConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid("loader name cannot be empty".to_string()));
        }
        if self.namespaces.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one namespace is required".to_string(),
            ));
        }
        for namespace in &self.namespaces {
            let stem = namespace.strip_suffix('.').unwrap_or(namespace);
            if !is_valid_unit_name(stem) {
                return Err(ConfigError::Invalid(format!(
                    "invalid namespace prefix '{namespace}'"
                )));
            }
        }
        Ok(())
    }

    /// Whether `name` falls inside one of the configured namespaces.
    ///
    /// `example` owns `example` and `example.Sub` but not `examples.Sub`;
    /// a prefix ending in `.` matches by plain string prefix.
    pub fn owns(&self, name: &str) -> bool {
        self.namespaces.iter().any(|namespace| {
            if namespace.ends_with('.') {
                return name.starts_with(namespace.as_str());
            }
            name.strip_prefix(namespace.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
        })
    }
}
