//! Capability injection surface.
//!
//! The host does not implement package management, version control, template
//! rendering or git hooks itself. It injects implementations of these traits
//! into every [`PluginInstance`](crate::PluginInstance), and plugins reach them
//! through the instance.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::PluginError;

/// Capabilities a host may inject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Dependency management (init, install, add, remove)
    PackageManager,
    /// Repository operations
    VersionControl,
    /// Template directory and file rendering
    Templates,
    /// Git hook installation
    GitHooks,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PackageManager => "package manager",
            Self::VersionControl => "version control",
            Self::Templates => "templates",
            Self::GitHooks => "git hooks",
        };
        f.write_str(name)
    }
}

/// Package-manager operations, always run inside `cwd`
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Directory third-party packages are installed under
    async fn root(&self) -> Result<PathBuf, PluginError>;

    async fn init(&self, cwd: &Path) -> Result<(), PluginError>;

    async fn install(&self, cwd: &Path) -> Result<(), PluginError>;

    async fn add_dependencies(
        &self,
        cwd: &Path,
        packages: &[String],
        dev: bool,
    ) -> Result<(), PluginError>;

    async fn remove_dependencies(
        &self,
        cwd: &Path,
        packages: &[String],
        dev: bool,
    ) -> Result<(), PluginError>;
}

#[async_trait]
pub trait VersionControl: Send + Sync {
    async fn init(&self, cwd: &Path) -> Result<(), PluginError>;

    async fn is_repo(&self, cwd: &Path) -> Result<bool, PluginError>;

    async fn commit(&self, cwd: &Path, message: &str) -> Result<(), PluginError>;
}

#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    /// Render every file of `template_dir` into `destination_dir`
    async fn render_dir(
        &self,
        template_dir: &Path,
        destination_dir: &Path,
        data: &Value,
    ) -> Result<(), PluginError>;

    async fn render_file(
        &self,
        template_file: &Path,
        destination_file: &Path,
        data: &Value,
    ) -> Result<(), PluginError>;
}

#[async_trait]
pub trait HookInstaller: Send + Sync {
    async fn install(&self, cwd: &Path) -> Result<(), PluginError>;
}

/// The set of collaborators injected into plugins.
///
/// Every capability is optional; asking for a missing one yields
/// [`PluginError::Unavailable`].
#[derive(Clone, Default)]
pub struct Capabilities {
    package_manager: Option<Arc<dyn PackageManager>>,
    version_control: Option<Arc<dyn VersionControl>>,
    templates: Option<Arc<dyn TemplateRenderer>>,
    hooks: Option<Arc<dyn HookInstaller>>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package_manager(mut self, pm: Arc<dyn PackageManager>) -> Self {
        self.package_manager = Some(pm);
        self
    }

    pub fn with_version_control(mut self, vcs: Arc<dyn VersionControl>) -> Self {
        self.version_control = Some(vcs);
        self
    }

    pub fn with_templates(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.templates = Some(renderer);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn HookInstaller>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn package_manager(&self) -> Result<&dyn PackageManager, PluginError> {
        self.package_manager
            .as_deref()
            .ok_or(PluginError::Unavailable(Capability::PackageManager))
    }

    pub fn version_control(&self) -> Result<&dyn VersionControl, PluginError> {
        self.version_control
            .as_deref()
            .ok_or(PluginError::Unavailable(Capability::VersionControl))
    }

    pub fn templates(&self) -> Result<&dyn TemplateRenderer, PluginError> {
        self.templates
            .as_deref()
            .ok_or(PluginError::Unavailable(Capability::Templates))
    }

    pub fn hooks(&self) -> Result<&dyn HookInstaller, PluginError> {
        self.hooks
            .as_deref()
            .ok_or(PluginError::Unavailable(Capability::GitHooks))
    }

    /// Capabilities currently injected
    pub fn available(&self) -> Vec<Capability> {
        let mut caps = Vec::new();
        if self.package_manager.is_some() {
            caps.push(Capability::PackageManager);
        }
        if self.version_control.is_some() {
            caps.push(Capability::VersionControl);
        }
        if self.templates.is_some() {
            caps.push(Capability::Templates);
        }
        if self.hooks.is_some() {
            caps.push(Capability::GitHooks);
        }
        caps
    }

    pub fn has(&self, cap: Capability) -> bool {
        self.available().contains(&cap)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("available", &self.available())
            .finish()
    }
}
