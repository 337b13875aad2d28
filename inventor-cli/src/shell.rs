//! Runtime shell: config, plugin registration, then a single dispatch

use std::ffi::{OsStr, OsString};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use inventor_core::CommandTree;
use inventor_core::plugins::{
    FsPackageResolver, NativeModuleLoader, PluginDescriptor, PluginHost, builtin_entries,
    filter_by_name, native_extension, resolve_plugins,
};
use inventor_plugin_api::ExecContext;

use crate::commands::{self, DispatchError};
use crate::config::{ConfigLoader, InventorConfig};

pub const BIN_NAME: &str = "inventor";
pub const ABOUT: &str = "Pluggable project scaffolding";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// First argument after the binary that is not a flag
pub fn plugin_filter(args: &[OsString]) -> Option<&str> {
    args.iter()
        .skip(1)
        .map(|a| a.to_str())
        .find(|a| a.is_none_or(|a| !a.starts_with('-')))
        .flatten()
}

/// `-v`/`--verbose` given before the plugin name
pub fn wants_verbose(args: &[OsString]) -> bool {
    args.iter()
        .skip(1)
        .take_while(|a| a.to_str().is_some_and(|a| a.starts_with('-')))
        .any(|a| a == OsStr::new("-v") || a == OsStr::new("--verbose"))
}

/// Narrow the descriptors to the invoked plugin.
///
/// Only the named plugin is loaded. When nothing matches (a typo), nothing is
/// registered and the parser reports the unknown command.
pub fn select_plugins(
    descriptors: Vec<PluginDescriptor>,
    filter: Option<&str>,
) -> Vec<PluginDescriptor> {
    match filter {
        Some(name) => {
            let filtered = filter_by_name(descriptors, name);
            if filtered.is_empty() {
                tracing::debug!(plugin = name, "No plugin matches the invoked command");
            }
            filtered
        }
        None => descriptors,
    }
}

pub async fn run(args: Vec<OsString>) -> Result<ExitCode> {
    let config = ConfigLoader::load()?;
    run_with_config(config, args).await
}

pub async fn run_with_config(config: InventorConfig, args: Vec<OsString>) -> Result<ExitCode> {
    // Must outlive the tree: action handlers point into loaded libraries
    let loader = Arc::new(NativeModuleLoader::new());
    let resolver = FsPackageResolver::new(
        &config.paths.builtin_root,
        &config.paths.package_root,
        native_extension(),
    );
    let host = PluginHost::new(Box::new(resolver), loader.clone());

    let descriptors = select_plugins(
        resolve_plugins(&builtin_entries(), &config.plugins),
        plugin_filter(&args),
    );

    let mut tree = CommandTree::new(BIN_NAME, ABOUT);
    let report = host.register_all(&descriptors, &mut tree).await;

    let ctx = ExecContext::from_process().context("Failed to read the working directory")?;
    let dispatched = commands::dispatch(&tree, VERSION, ctx, args).await;

    let code = match dispatched {
        Ok(_) if report.has_rejections() => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(DispatchError::Usage(e)) => {
            e.print()?;
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(2))
        }
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    };

    Ok(code)
}
