//! Plugin loading error types

use std::path::PathBuf;
use thiserror::Error;

use inventor_plugin_api::PluginError;

use crate::commands::TreeError;

/// Errors turning a package name into an entry module path
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid package name '{package}'")]
    InvalidName { package: String },

    #[error("Package '{package}' is not installed (looked in {})", dir.display())]
    NotInstalled { package: String, dir: PathBuf },

    #[error("Package '{package}' entry module not found: {}", path.display())]
    EntryMissing { package: String, path: PathBuf },

    #[error("Invalid package metadata for '{package}': {message}")]
    Metadata { package: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors loading a plugin or action module
#[derive(Error, Debug)]
pub enum LoadError {
    /// Package could not be located
    #[error("Plugin package \"{package}\" could not be resolved: {source}")]
    Resolve {
        package: String,
        #[source]
        source: ResolveError,
    },

    /// Module exists but could not be opened
    #[error("Failed to load module {}: {message}", path.display())]
    Import { path: PathBuf, message: String },

    /// Module does not export the registration function
    #[error("Module {} does not export {symbol}", path.display())]
    MissingEntryPoint { path: PathBuf, symbol: &'static str },

    /// Module was built against another plugin API
    #[error(
        "API version mismatch in {}: inventor expects {expected}, module has {found}",
        path.display()
    )]
    ApiVersionMismatch {
        path: PathBuf,
        expected: u32,
        found: u32,
    },

    /// No command name can be derived from the package name
    #[error("Plugin package \"{package}\" is not a valid plugin: no plugin name can be derived")]
    MissingPluginName { package: String },

    /// The module's constructor returned an error
    #[error("Failed to construct {}: {source}", path.display())]
    Construct {
        path: PathBuf,
        #[source]
        source: PluginError,
    },

    /// The module's constructor panicked
    #[error("Module {} panicked during construction", path.display())]
    Panicked { path: PathBuf },
}

impl LoadError {
    /// Whether the failure points at a broken package rather than a missing one.
    ///
    /// Structural failures abort the plugin's registration and are reported as
    /// rejections; the rest are skipped with a diagnostic.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MissingEntryPoint { .. }
                | Self::ApiVersionMismatch { .. }
                | Self::MissingPluginName { .. }
                | Self::Construct { .. }
                | Self::Panicked { .. }
        )
    }
}

/// Errors registering one plugin's command subtree
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl RegistrationError {
    pub fn is_structural(&self) -> bool {
        match self {
            Self::Load(e) => e.is_structural(),
            Self::Tree(_) => true,
        }
    }
}
