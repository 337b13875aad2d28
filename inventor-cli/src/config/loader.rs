use super::types::{InventorConfig, PathsConfig, RawInventorConfig, RawPathsConfig};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// File name of both the user and the project config
pub const CONFIG_FILE: &str = "config.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<InventorConfig> {
        Self::load_from(&Self::user_config_path(), &Self::project_config_path())
    }

    /// Load and merge the config files at the given paths. Missing files are
    /// treated as empty.
    pub fn load_from(user_path: &Path, project_path: &Path) -> Result<InventorConfig> {
        let mut raw = RawInventorConfig::default();

        // Layer 1: User config
        if let Some(user_config) = Self::read(user_path)? {
            raw = Self::merge_raw(raw, user_config);
        }

        // Layer 2: Project config
        if let Some(project_config) = Self::read(project_path)? {
            raw = Self::merge_raw(raw, project_config);
        }

        Ok(Self::finalize(raw))
    }

    /// Get user config path (`$XDG_CONFIG_HOME/inventor/config.toml`)
    pub fn user_config_path() -> PathBuf {
        inventor_paths::config_dir().join(CONFIG_FILE)
    }

    /// Get project config path
    /// Can be overridden with INVENTOR_PROJECT_CONFIG_DIR env var (useful for isolated e2e tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("INVENTOR_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join(CONFIG_FILE)
        } else {
            PathBuf::from(".inventor").join(CONFIG_FILE)
        }
    }

    fn read(path: &Path) -> Result<Option<RawInventorConfig>> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found");
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: RawInventorConfig = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        // Relative paths are relative to the file that declares them
        if let Some(base) = path.parent() {
            config.paths = Self::rebase(config.paths, base);
        }
        tracing::debug!(path = %path.display(), plugins = config.plugins.len(), "Loaded config");
        Ok(Some(config))
    }

    fn rebase(paths: RawPathsConfig, base: &Path) -> RawPathsConfig {
        let rebase = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        RawPathsConfig {
            package_root: paths.package_root.map(rebase),
            builtin_root: paths.builtin_root.map(rebase),
        }
    }

    /// Merge two raw configs: plugin lists concatenate, paths in the overlay
    /// override the base only if explicitly set
    fn merge_raw(base: RawInventorConfig, overlay: RawInventorConfig) -> RawInventorConfig {
        RawInventorConfig {
            plugins: base.plugins.into_iter().chain(overlay.plugins).collect(),
            paths: RawPathsConfig {
                package_root: overlay.paths.package_root.or(base.paths.package_root),
                builtin_root: overlay.paths.builtin_root.or(base.paths.builtin_root),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawInventorConfig) -> InventorConfig {
        let defaults = PathsConfig::default();
        InventorConfig {
            plugins: raw.plugins,
            paths: PathsConfig {
                package_root: raw.paths.package_root.unwrap_or(defaults.package_root),
                builtin_root: raw.paths.builtin_root.unwrap_or(defaults.builtin_root),
            },
        }
    }
}
