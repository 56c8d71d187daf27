//! Configuration management for the expression editor host
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (figtree.toml)
//! - Environment variables (FIGTREE_*)
//!
//! ## Example config file (figtree.toml):
//! ```toml
//! [registry]
//! catalog = "./registry.json"
//! use_builtins = true
//!
//! [editor]
//! indent = 3
//! collapse_depth = 2
//! string_truncate = 100
//! show_array_indices = false
//!
//! [evaluation]
//! data = "./data.json"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the editor host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Registry settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Display settings
    #[serde(default)]
    pub editor: DisplayConfig,

    /// Evaluation settings
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Path to a serialized registry catalog (operators/fragments/functions)
    #[serde(default)]
    pub catalog: Option<PathBuf>,

    /// Include the builtin operator set alongside the catalog
    #[serde(default = "default_true")]
    pub use_builtins: bool,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Indentation width for rendered JSON
    #[serde(default = "default_indent")]
    pub indent: usize,

    /// Depth at which nodes start collapsed
    #[serde(default = "default_collapse_depth")]
    pub collapse_depth: usize,

    /// Truncate displayed strings beyond this length
    #[serde(default = "default_string_truncate")]
    pub string_truncate: usize,

    /// Show indices on array entries
    #[serde(default)]
    pub show_array_indices: bool,
}

/// Evaluation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Path to the external data context passed to the evaluator
    #[serde(default)]
    pub data: Option<PathBuf>,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_indent() -> usize {
    3
}

fn default_collapse_depth() -> usize {
    2
}

fn default_string_truncate() -> usize {
    100
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            use_builtins: true,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            collapse_depth: default_collapse_depth(),
            string_truncate: default_string_truncate(),
            show_array_indices: false,
        }
    }
}

impl EditorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["figtree.toml", ".figtree.toml", "config/figtree.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "figtree", "editor") {
            let xdg_config = config_dir.config_dir().join("figtree.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (FIGTREE_*)
        builder = builder.add_source(
            Environment::with_prefix("FIGTREE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get the catalog path (resolves relative paths)
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.registry.catalog.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                std::env::current_dir().unwrap_or_default().join(p)
            }
        })
    }
}
