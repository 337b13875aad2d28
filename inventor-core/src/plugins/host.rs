//! PluginHost - loads plugins and their actions and attaches them to the
//! command tree

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use inventor_plugin_api::{
    API_VERSION, Action, ActionInit, Capabilities, PluginError, PluginInit, PluginInstance,
    PluginPaths,
};

use super::action::{ActionDescriptor, ActionHandler};
use super::error::{LoadError, RegistrationError};
use super::loader::ModuleLoader;
use super::package::PackageResolver;
use super::resolver::PluginDescriptor;
use crate::commands::{CommandTree, build_tree};

/// A plugin that did not make it into the command tree
#[derive(Debug)]
pub struct PluginFailure {
    pub package_name: String,
    pub error: RegistrationError,
}

/// Outcome of [`PluginHost::register_all`]
#[derive(Debug, Default)]
pub struct RegistrationReport {
    /// Plugin command names, in registration order
    pub registered: Vec<String>,
    /// Plugins left out because they could not be located or opened
    pub skipped: Vec<PluginFailure>,
    /// Plugins left out because they break the plugin contract
    pub rejected: Vec<PluginFailure>,
}

impl RegistrationReport {
    pub fn has_rejections(&self) -> bool {
        !self.rejected.is_empty()
    }
}

/// Loads plugin packages through a resolver and a module loader
pub struct PluginHost {
    resolver: Box<dyn PackageResolver>,
    loader: Arc<dyn ModuleLoader>,
    capabilities: Capabilities,
}

impl PluginHost {
    pub fn new(resolver: Box<dyn PackageResolver>, loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            resolver,
            loader,
            capabilities: Capabilities::default(),
        }
    }

    /// Builder: capabilities handed to every plugin instance
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Resolve, import and construct one plugin
    pub async fn load_plugin(
        &self,
        descriptor: &PluginDescriptor,
    ) -> Result<Arc<PluginInstance>, LoadError> {
        let package = &descriptor.package_name;
        let entry_path = self
            .resolver
            .resolve_entry(package, descriptor.builtin)
            .map_err(|source| LoadError::Resolve {
                package: package.clone(),
                source,
            })?;

        let registration = self.loader.load_plugin(&entry_path)?;
        check_api_version(&entry_path, registration.api_version)?;

        let plugin_name = descriptor
            .plugin_name
            .clone()
            .ok_or_else(|| LoadError::MissingPluginName {
                package: package.clone(),
            })?;

        let init = PluginInit {
            entry_path: entry_path.clone(),
            options: descriptor.options.clone(),
        };
        let plugin = construct(&entry_path, || (registration.create)(init))?;

        tracing::debug!(
            package = %package,
            plugin = %plugin_name,
            entry = %entry_path.display(),
            "Plugin constructed"
        );

        Ok(Arc::new(PluginInstance::new(
            package.clone(),
            plugin_name,
            PluginPaths::from_entry(entry_path),
            descriptor.options.clone(),
            self.capabilities.clone(),
            plugin,
        )))
    }

    /// Load every action module in the plugin's action directory.
    ///
    /// Files are loaded in name order; only files with the loader's
    /// extension are considered. A failing action is logged and skipped
    /// without affecting its siblings.
    pub async fn load_actions(&self, plugin: &Arc<PluginInstance>) -> Vec<ActionDescriptor> {
        let files = match self.action_files(plugin.action_path()).await {
            Ok(files) => files,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    plugin = plugin.plugin_name(),
                    dir = %plugin.action_path().display(),
                    "Plugin has no action directory"
                );
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(
                    plugin = plugin.plugin_name(),
                    dir = %plugin.action_path().display(),
                    error = %e,
                    "Failed to read action directory"
                );
                return Vec::new();
            }
        };

        let mut actions = Vec::with_capacity(files.len());
        for file in files {
            match self.load_action(plugin, &file) {
                Ok(action) => actions.push(action),
                Err(e) => {
                    tracing::error!(
                        plugin = plugin.plugin_name(),
                        file = %file.display(),
                        error = %e,
                        "Action load error, skipped"
                    );
                }
            }
        }
        actions
    }

    async fn action_files(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let extension = self.loader.extension();
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            // follows symlinks, so linked modules count as files
            if tokio::fs::metadata(&path).await?.is_file() {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    fn load_action(
        &self,
        plugin: &Arc<PluginInstance>,
        file: &Path,
    ) -> Result<ActionDescriptor, LoadError> {
        let name = file
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| LoadError::Import {
                path: file.to_path_buf(),
                message: "action file name is not valid UTF-8".to_string(),
            })?
            .to_string();

        let registration = self.loader.load_action(file)?;
        check_api_version(file, registration.api_version)?;

        let init = ActionInit {
            entry_path: plugin.entry_path().to_path_buf(),
            plugin: Arc::clone(plugin),
        };
        let (action, description, options) = construct(file, || {
            let action = (registration.create)(init)?;
            let description = action.description();
            let options = action.options();
            Ok((action, description, options))
        })?;

        let action: Arc<dyn Action> = Arc::from(action);
        Ok(ActionDescriptor {
            name,
            description,
            options,
            handler: ActionHandler::new(action),
        })
    }

    /// Load one plugin with its actions and attach it to `tree`
    pub async fn register_plugin(
        &self,
        descriptor: &PluginDescriptor,
        tree: &mut CommandTree,
    ) -> Result<String, RegistrationError> {
        let plugin = self.load_plugin(descriptor).await?;
        let actions = self.load_actions(&plugin).await;
        let action_count = actions.len();

        let node = build_tree(plugin.plugin_name(), &plugin.description(), actions);
        tree.register(plugin.package_name(), node)?;

        tracing::debug!(
            package = plugin.package_name(),
            plugin = plugin.plugin_name(),
            actions = action_count,
            "Plugin registered"
        );
        Ok(plugin.plugin_name().to_string())
    }

    /// Register every descriptor in order.
    ///
    /// Each plugin finishes loading before the next starts, so the tree's
    /// child order follows `descriptors`. Failures never stop the loop.
    pub async fn register_all(
        &self,
        descriptors: &[PluginDescriptor],
        tree: &mut CommandTree,
    ) -> RegistrationReport {
        let mut report = RegistrationReport::default();

        for descriptor in descriptors {
            let package = &descriptor.package_name;
            match self.register_plugin(descriptor, tree).await {
                Ok(name) => report.registered.push(name),
                Err(error) if error.is_structural() => {
                    tracing::error!(package = %package, error = %error, "Invalid plugin, not registered");
                    report.rejected.push(PluginFailure {
                        package_name: package.clone(),
                        error,
                    });
                }
                Err(error) => {
                    tracing::warn!(package = %package, error = %error, "Plugin package load error, skipped");
                    report.skipped.push(PluginFailure {
                        package_name: package.clone(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            registered = report.registered.len(),
            skipped = report.skipped.len(),
            rejected = report.rejected.len(),
            "Plugin registration complete"
        );
        report
    }
}

fn check_api_version(path: &Path, found: u32) -> Result<(), LoadError> {
    if found != API_VERSION {
        return Err(LoadError::ApiVersionMismatch {
            path: path.to_path_buf(),
            expected: API_VERSION,
            found,
        });
    }
    Ok(())
}

/// Run module-provided construction code, turning errors and panics into
/// [`LoadError`]s
fn construct<T>(
    path: &Path,
    create: impl FnOnce() -> Result<T, PluginError>,
) -> Result<T, LoadError> {
    match std::panic::catch_unwind(AssertUnwindSafe(create)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(LoadError::Construct {
            path: path.to_path_buf(),
            source,
        }),
        Err(_) => Err(LoadError::Panicked {
            path: path.to_path_buf(),
        }),
    }
}
