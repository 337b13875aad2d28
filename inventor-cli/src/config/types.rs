use inventor_core::plugins::PluginConfigEntry;
use serde::Deserialize;
use std::path::PathBuf;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawInventorConfig {
    /// Plugin packages to register after the built-ins
    #[serde(default)]
    pub plugins: Vec<PluginConfigEntry>,

    #[serde(default)]
    pub paths: RawPathsConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPathsConfig {
    /// Where third-party plugin packages are installed
    pub package_root: Option<PathBuf>,

    /// Where the built-in plugins ship
    pub builtin_root: Option<PathBuf>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone)]
pub struct InventorConfig {
    pub plugins: Vec<PluginConfigEntry>,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone)]
pub struct PathsConfig {
    pub package_root: PathBuf,
    pub builtin_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            package_root: inventor_paths::package_root(),
            builtin_root: inventor_paths::builtin_root(),
        }
    }
}
