//! inventor-plugin-api - Plugin API for the inventor scaffolding CLI
//!
//! This crate provides the traits and types needed to write inventor plugins.
//! A plugin package is a directory installed under the package root:
//!
//! ```text
//! inventor-plugin-app/
//! ├── package.toml          # [package] name, version, main
//! ├── lib/
//! │   ├── index.so          # plugin entry: export_plugin!
//! │   └── actions/
//! │       ├── index.so      # default action: export_action!
//! │       └── dev.so        # `inventor app dev`
//! └── templates/
//! ```
//!
//! Each module exports a typed registration function; the host checks the
//! registration's API version before constructing anything.
//!
//! # Example
//!
//! ```ignore
//! use inventor_plugin_api::*;
//!
//! pub struct AppPlugin;
//!
//! impl Plugin for AppPlugin {
//!     fn description(&self) -> String {
//!         "Application scaffolding".to_string()
//!     }
//! }
//!
//! impl FromPluginInit for AppPlugin {
//!     fn from_init(_init: PluginInit) -> Result<Self, PluginError> {
//!         Ok(AppPlugin)
//!     }
//! }
//!
//! export_plugin!(AppPlugin);
//! ```

pub mod capability;
pub mod context;
pub mod error;
pub mod instance;
pub mod task;
pub mod types;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

pub use capability::{
    Capabilities, Capability, HookInstaller, PackageManager, TemplateRenderer, VersionControl,
};
pub use context::{CwdScope, ExecContext};
pub use error::PluginError;
pub use instance::{PluginInstance, PluginPaths};
pub use task::{BoxFuture, TaskFactory, series_task, task};
pub use types::*;

/// Current plugin API version. Modules must match this exactly.
pub const API_VERSION: u32 = 1;

/// Symbol every plugin entry module exports
pub const PLUGIN_REGISTER_SYMBOL: &str = "_inventor_plugin_register";

/// Symbol every action module exports
pub const ACTION_REGISTER_SYMBOL: &str = "_inventor_action_register";

/// A plugin: a named group of actions
pub trait Plugin: Send + Sync {
    /// Help text shown for `<bin> <plugin>`
    fn description(&self) -> String;
}

/// A single invocable subcommand of a plugin
#[async_trait]
pub trait Action: Send + Sync {
    /// Help text shown for `<bin> <plugin> <action>`
    fn description(&self) -> String;

    /// Options bound onto the action's command
    fn options(&self) -> Vec<ActionOption> {
        Vec::new()
    }

    /// Run the action with the parsed option values
    async fn action(&self, ctx: &mut ExecContext, options: ActionOptions)
    -> Result<(), PluginError>;
}

/// What a plugin receives when it is constructed
#[derive(Debug, Clone)]
pub struct PluginInit {
    /// Resolved location of the plugin's entry module
    pub entry_path: PathBuf,
    /// Options from the `["package", { ... }]` config form
    pub options: Option<toml::Value>,
}

/// What an action receives when it is constructed
#[derive(Debug, Clone)]
pub struct ActionInit {
    /// Entry path of the owning plugin
    pub entry_path: PathBuf,
    /// The owning plugin, for reaching its capabilities
    pub plugin: Arc<PluginInstance>,
}

/// Construct a plugin from its init data
pub trait FromPluginInit: Plugin + Sized + 'static {
    fn from_init(init: PluginInit) -> Result<Self, PluginError>;
}

/// Construct an action from its init data
pub trait FromActionInit: Action + Sized + 'static {
    fn from_init(init: ActionInit) -> Result<Self, PluginError>;
}

pub type PluginCreateFn = fn(PluginInit) -> Result<Box<dyn Plugin>, PluginError>;
pub type ActionCreateFn = fn(ActionInit) -> Result<Box<dyn Action>, PluginError>;

/// Returned by a plugin module's registration function
#[derive(Debug, Clone, Copy)]
pub struct PluginRegistration {
    /// API version the module was built against
    pub api_version: u32,
    pub create: PluginCreateFn,
}

impl PluginRegistration {
    pub fn of<T: FromPluginInit>() -> Self {
        Self {
            api_version: API_VERSION,
            create: create_plugin::<T>,
        }
    }
}

/// Returned by an action module's registration function
#[derive(Debug, Clone, Copy)]
pub struct ActionRegistration {
    /// API version the module was built against
    pub api_version: u32,
    pub create: ActionCreateFn,
}

impl ActionRegistration {
    pub fn of<T: FromActionInit>() -> Self {
        Self {
            api_version: API_VERSION,
            create: create_action::<T>,
        }
    }
}

fn create_plugin<T: FromPluginInit>(init: PluginInit) -> Result<Box<dyn Plugin>, PluginError> {
    Ok(Box::new(T::from_init(init)?))
}

fn create_action<T: FromActionInit>(init: ActionInit) -> Result<Box<dyn Action>, PluginError> {
    Ok(Box::new(T::from_init(init)?))
}

/// Export a plugin type as a loadable entry module.
///
/// Generates `_inventor_plugin_register()`, which the host looks up and
/// version-checks before constructing the plugin.
///
/// ```ignore
/// inventor_plugin_api::export_plugin!(AppPlugin);
/// ```
#[macro_export]
macro_rules! export_plugin {
    ($plugin_type:ty) => {
        #[unsafe(no_mangle)]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn _inventor_plugin_register() -> $crate::PluginRegistration {
            $crate::PluginRegistration::of::<$plugin_type>()
        }
    };
}

/// Export an action type as a loadable action module.
///
/// Generates `_inventor_action_register()`. Build one module per action and
/// install it as `lib/actions/<action-name>.<ext>`.
#[macro_export]
macro_rules! export_action {
    ($action_type:ty) => {
        #[unsafe(no_mangle)]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn _inventor_action_register() -> $crate::ActionRegistration {
            $crate::ActionRegistration::of::<$action_type>()
        }
    };
}
