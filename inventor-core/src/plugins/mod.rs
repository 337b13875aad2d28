//! Plugin system for inventor
//!
//! Registration runs in four stages:
//!
//! 1. [`resolve_plugins`] merges the built-in and configured plugin lists
//! 2. a [`PackageResolver`] maps each package name to its entry module
//! 3. a [`ModuleLoader`] imports the entry module and each action module
//! 4. [`PluginHost`] constructs everything and attaches it to the
//!    [`CommandTree`](crate::commands::CommandTree)
//!
//! # Example
//!
//! ```ignore
//! use inventor_core::plugins::*;
//!
//! let loader = Arc::new(NativeModuleLoader::new());
//! let resolver = FsPackageResolver::new(builtin_root, package_root, native_extension());
//! let host = PluginHost::new(Box::new(resolver), loader);
//!
//! let descriptors = resolve_plugins(&builtin_entries(), &config.plugins);
//! let report = host.register_all(&descriptors, &mut tree).await;
//! ```

mod action;
mod error;
mod host;
mod loader;
mod package;
mod resolver;

pub use action::{ActionDescriptor, ActionHandler};
pub use error::{LoadError, RegistrationError, ResolveError};
pub use host::{PluginFailure, PluginHost, RegistrationReport};
pub use loader::{ModuleLoader, NativeModuleLoader, StaticModuleLoader, native_extension};
pub use package::{
    FsPackageResolver, PACKAGE_MANIFEST, PackageMetadata, PackageResolver, PackageSection,
};
pub use resolver::{
    BUILTIN_PLUGINS, PluginConfigEntry, PluginDescriptor, builtin_entries, filter_by_name,
    is_builtin, plugin_name_of, resolve_plugins,
};
