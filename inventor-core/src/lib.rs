//! inventor-core: plugin loading for the inventor scaffolding CLI
//!
//! - **Plugin resolution** - [`plugins::resolve_plugins`] orders and de-duplicates
//!   the built-in and configured plugin packages
//! - **Loading** - [`plugins::PluginHost`] imports plugin and action modules
//!   through a [`plugins::ModuleLoader`], isolating failures per package and
//!   per action file
//! - **Command tree** - [`commands::CommandTree`] holds the result as pure data
//!   for the CLI layer to turn into a parser
//!
//! ```text
//! inventor
//! ├── plugin            (inventor-plugin-plugin)
//! │   └── index *
//! ├── app               (inventor-plugin-app)
//! │   ├── dev
//! │   └── index *
//! └── <name>            (configured packages)
//!
//! * default action
//! ```

pub mod commands;
pub mod plugins;

pub use commands::{CommandNode, CommandTree, DEFAULT_ACTION};
pub use plugins::{PluginDescriptor, PluginHost, RegistrationReport};
