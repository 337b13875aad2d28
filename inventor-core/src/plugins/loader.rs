//! Module loading
//!
//! A [`ModuleLoader`] turns a module path into the registration record the
//! module exports. [`NativeModuleLoader`] opens shared libraries;
//! [`StaticModuleLoader`] serves registrations compiled into the binary.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use libloading::Library;

use inventor_plugin_api::{
    ACTION_REGISTER_SYMBOL, ActionRegistration, PLUGIN_REGISTER_SYMBOL, PluginRegistration,
};

use super::error::LoadError;

/// Extension of native modules on this platform (`so`, `dylib` or `dll`)
pub fn native_extension() -> &'static str {
    std::env::consts::DLL_EXTENSION
}

/// Loads plugin and action modules
pub trait ModuleLoader: Send + Sync {
    /// File extension of loadable modules, without the dot
    fn extension(&self) -> &str;

    /// Load a plugin entry module
    fn load_plugin(&self, path: &Path) -> Result<PluginRegistration, LoadError>;

    /// Load an action module
    fn load_action(&self, path: &Path) -> Result<ActionRegistration, LoadError>;
}

/// Loads modules as shared libraries.
///
/// Opened libraries stay mapped for the lifetime of the loader, so the loader
/// must outlive every plugin and action created from it.
#[derive(Default)]
pub struct NativeModuleLoader {
    libraries: Mutex<Vec<Library>>,
}

impl NativeModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of libraries held open
    pub fn loaded(&self) -> usize {
        self.libraries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn open<R: Copy>(&self, path: &Path, symbol: &'static str) -> Result<R, LoadError> {
        // SAFETY: the module was installed by the user as an inventor package
        // and is expected to follow the registration contract.
        let library = unsafe { Library::new(path) }.map_err(|e| LoadError::Import {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let registration = {
            // SAFETY: the symbol is generated by export_plugin!/export_action!
            // with exactly this signature.
            let register: libloading::Symbol<extern "C" fn() -> R> =
                unsafe { library.get(symbol.as_bytes()) }.map_err(|_| {
                    LoadError::MissingEntryPoint {
                        path: path.to_path_buf(),
                        symbol,
                    }
                })?;
            register()
        };

        self.libraries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(library);
        Ok(registration)
    }
}

impl ModuleLoader for NativeModuleLoader {
    fn extension(&self) -> &str {
        native_extension()
    }

    fn load_plugin(&self, path: &Path) -> Result<PluginRegistration, LoadError> {
        self.open(path, PLUGIN_REGISTER_SYMBOL)
    }

    fn load_action(&self, path: &Path) -> Result<ActionRegistration, LoadError> {
        self.open(path, ACTION_REGISTER_SYMBOL)
    }
}

impl std::fmt::Debug for NativeModuleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeModuleLoader")
            .field("loaded", &self.loaded())
            .finish()
    }
}

/// Serves registrations from an in-memory table keyed by module path.
///
/// Used for plugins compiled into the binary and for tests. The path must
/// still be produced by package resolution or action discovery, so files
/// have to exist on disk even though nothing is read from them.
#[derive(Debug, Clone)]
pub struct StaticModuleLoader {
    extension: String,
    plugins: HashMap<PathBuf, PluginRegistration>,
    actions: HashMap<PathBuf, ActionRegistration>,
}

impl StaticModuleLoader {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            plugins: HashMap::new(),
            actions: HashMap::new(),
        }
    }

    /// Builder: serve `registration` for the plugin module at `path`
    pub fn with_plugin(mut self, path: impl Into<PathBuf>, registration: PluginRegistration) -> Self {
        self.plugins.insert(path.into(), registration);
        self
    }

    /// Builder: serve `registration` for the action module at `path`
    pub fn with_action(mut self, path: impl Into<PathBuf>, registration: ActionRegistration) -> Self {
        self.actions.insert(path.into(), registration);
        self
    }

    fn is_known(&self, path: &Path) -> bool {
        self.plugins.contains_key(path) || self.actions.contains_key(path)
    }

    fn unknown(path: &Path) -> LoadError {
        LoadError::Import {
            path: path.to_path_buf(),
            message: "no module registered at this path".to_string(),
        }
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn extension(&self) -> &str {
        &self.extension
    }

    fn load_plugin(&self, path: &Path) -> Result<PluginRegistration, LoadError> {
        match self.plugins.get(path) {
            Some(registration) => Ok(*registration),
            None if self.is_known(path) => Err(LoadError::MissingEntryPoint {
                path: path.to_path_buf(),
                symbol: PLUGIN_REGISTER_SYMBOL,
            }),
            None => Err(Self::unknown(path)),
        }
    }

    fn load_action(&self, path: &Path) -> Result<ActionRegistration, LoadError> {
        match self.actions.get(path) {
            Some(registration) => Ok(*registration),
            None if self.is_known(path) => Err(LoadError::MissingEntryPoint {
                path: path.to_path_buf(),
                symbol: ACTION_REGISTER_SYMBOL,
            }),
            None => Err(Self::unknown(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventor_plugin_api::{FromPluginInit, Plugin, PluginError, PluginInit};

    struct Hello;

    impl Plugin for Hello {
        fn description(&self) -> String {
            "hello".into()
        }
    }

    impl FromPluginInit for Hello {
        fn from_init(_init: PluginInit) -> Result<Self, PluginError> {
            Ok(Hello)
        }
    }

    #[test]
    fn test_native_extension_is_platform_specific() {
        let ext = native_extension();
        assert!(["so", "dylib", "dll"].contains(&ext));
    }

    #[test]
    fn test_native_loader_reports_missing_file_as_import_error() {
        let loader = NativeModuleLoader::new();
        let result = loader.load_plugin(Path::new("/nonexistent/lib/index.so"));
        assert!(matches!(result, Err(LoadError::Import { .. })));
        assert_eq!(loader.loaded(), 0);
    }

    #[test]
    fn test_native_loader_rejects_non_library_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("index.so");
        std::fs::write(&path, b"not a shared library").unwrap();

        let loader = NativeModuleLoader::new();
        let result = loader.load_plugin(&path);
        assert!(matches!(result, Err(LoadError::Import { .. })));
    }

    #[test]
    fn test_static_loader_serves_registration() {
        let loader = StaticModuleLoader::new("so")
            .with_plugin("/pkg/lib/index.so", PluginRegistration::of::<Hello>());
        let registration = loader.load_plugin(Path::new("/pkg/lib/index.so")).unwrap();
        assert_eq!(registration.api_version, inventor_plugin_api::API_VERSION);
        assert_eq!(loader.extension(), "so");
    }

    #[test]
    fn test_static_loader_unknown_path() {
        let loader = StaticModuleLoader::new("so");
        let result = loader.load_action(Path::new("/pkg/lib/actions/x.so"));
        assert!(matches!(result, Err(LoadError::Import { .. })));
    }

    #[test]
    fn test_static_loader_wrong_kind_is_missing_entry_point() {
        let loader = StaticModuleLoader::new("so")
            .with_plugin("/pkg/lib/index.so", PluginRegistration::of::<Hello>());
        let result = loader.load_action(Path::new("/pkg/lib/index.so"));
        assert!(matches!(
            result,
            Err(LoadError::MissingEntryPoint {
                symbol: ACTION_REGISTER_SYMBOL,
                ..
            })
        ));
    }
}
