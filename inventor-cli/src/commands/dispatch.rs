//! Command tree to clap parser, and dispatch of the parsed invocation
//!
//! `<bin> <plugin> <action> [options]` runs the action;
//! `<bin> <plugin> [options]` runs the plugin's default action, or prints the
//! plugin's help when it has none; `<bin>` alone prints the root help.

use std::ffi::OsString;

use clap::{Arg, ArgAction, ArgMatches, Command};
use inventor_core::{CommandNode, CommandTree};
use inventor_plugin_api::{ActionOption, ActionOptions, ExecContext, PluginError};
use thiserror::Error;

use super::flag::plan_options;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Usage(#[from] clap::Error),

    #[error("Command '{command}' failed: {source}")]
    Action {
        command: String,
        #[source]
        source: PluginError,
    },

    #[error("Command '{command}' panicked")]
    Panicked { command: String },

    #[error("Command '{command}' was cancelled")]
    Cancelled { command: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a successful dispatch did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// An action ran to completion
    Action { plugin: String, action: String },
    /// Help or version output was printed
    Info,
}

/// Build the clap command for the whole tree
pub fn build_command(tree: &CommandTree, version: &'static str) -> Command {
    let root = tree.root();
    let command = Command::new(root.name.clone())
        .about(root.description.clone())
        .version(version)
        // plugins and actions may be named `help`; `--help` still works
        .disable_help_subcommand(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Verbose output")
                .action(ArgAction::SetTrue),
        );

    tree.plugins()
        .iter()
        .fold(command, |command, plugin| command.subcommand(plugin_command(plugin)))
}

fn plugin_command(plugin: &CommandNode) -> Command {
    let mut command = Command::new(plugin.name.clone())
        .about(plugin.description.clone())
        .disable_help_subcommand(true);

    // `<bin> <plugin> --flag` runs the default action with its own options
    if let Some(default) = plugin.default_child() {
        command = bind_options(command, &default.options).args_conflicts_with_subcommands(true);
    }

    plugin.children.iter().fold(command, |command, action| {
        let sub = Command::new(action.name.clone()).about(action.description.clone());
        command.subcommand(bind_options(sub, &action.options))
    })
}

fn bind_options(command: Command, options: &[ActionOption]) -> Command {
    let (bound, rejected) = plan_options(options);
    for (option, error) in rejected {
        tracing::warn!(
            command = command.get_name(),
            flag = %option.flag,
            error = %error,
            "Option not bound"
        );
    }
    bound
        .iter()
        .fold(command, |command, b| command.arg(b.spec.to_arg(b.option)))
}

/// Collect the values of `options` from `matches`
pub fn collect_options(matches: &ArgMatches, options: &[ActionOption]) -> ActionOptions {
    let (bound, _) = plan_options(options);
    bound
        .iter()
        .filter_map(|b| {
            b.spec
                .value_from(matches, b.option)
                .map(|value| (b.spec.key(), value))
        })
        .collect()
}

/// Parse `args` against `tree` and run the selected action in `ctx`
pub async fn dispatch(
    tree: &CommandTree,
    version: &'static str,
    ctx: ExecContext,
    args: Vec<OsString>,
) -> Result<Dispatched, DispatchError> {
    let mut command = build_command(tree, version);
    let matches = match command.try_get_matches_from_mut(args) {
        Ok(matches) => matches,
        Err(e) if !e.use_stderr() => {
            // --help / --version
            e.print()?;
            return Ok(Dispatched::Info);
        }
        Err(e) => return Err(DispatchError::Usage(e)),
    };

    let Some((plugin_name, plugin_matches)) = matches.subcommand() else {
        command.print_help()?;
        return Ok(Dispatched::Info);
    };
    let Some(plugin) = tree.plugin(plugin_name) else {
        return Err(DispatchError::Usage(command.error(
            clap::error::ErrorKind::InvalidSubcommand,
            format!("unknown command '{plugin_name}'"),
        )));
    };

    let (action, action_matches) = match plugin_matches.subcommand() {
        Some((name, sub_matches)) => match plugin.child(name) {
            Some(action) => (action, sub_matches),
            None => {
                return Err(DispatchError::Usage(command.error(
                    clap::error::ErrorKind::InvalidSubcommand,
                    format!("unknown command '{plugin_name} {name}'"),
                )));
            }
        },
        None => match plugin.default_child() {
            Some(action) => (action, plugin_matches),
            None => {
                if let Some(sub) = command.find_subcommand_mut(plugin_name) {
                    sub.print_help()?;
                }
                return Ok(Dispatched::Info);
            }
        },
    };

    let options = collect_options(action_matches, &action.options);
    run_action(plugin, action, ctx, options).await?;
    Ok(Dispatched::Action {
        plugin: plugin.name.clone(),
        action: action.name.clone(),
    })
}

async fn run_action(
    plugin: &CommandNode,
    action: &CommandNode,
    mut ctx: ExecContext,
    options: ActionOptions,
) -> Result<(), DispatchError> {
    let command = format!("{} {}", plugin.name, action.name);
    let Some(handler) = action.handler.clone() else {
        return Err(DispatchError::Action {
            command,
            source: PluginError::command("no handler bound"),
        });
    };

    tracing::debug!(command = %command, options = options.len(), "Running action");
    let joined = tokio::spawn(async move { handler.invoke(&mut ctx, options).await }).await;

    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(DispatchError::Action { command, source }),
        Err(e) if e.is_panic() => Err(DispatchError::Panicked { command }),
        Err(_) => Err(DispatchError::Cancelled { command }),
    }
}
