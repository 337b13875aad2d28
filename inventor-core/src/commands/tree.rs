//! Command tree: the binary at the root, one node per plugin, one leaf per
//! action.

use std::collections::HashMap;

use thiserror::Error;

use inventor_plugin_api::ActionOption;

use crate::plugins::{ActionDescriptor, ActionHandler};

/// Action that runs when a plugin is invoked without an action name
pub const DEFAULT_ACTION: &str = "index";

#[derive(Error, Debug)]
pub enum TreeError {
    #[error(
        "Command '{command}' from package '{package}' conflicts with package '{existing}'"
    )]
    DuplicateCommand {
        command: String,
        package: String,
        existing: String,
    },
}

/// A command in the tree
#[derive(Debug, Clone, Default)]
pub struct CommandNode {
    pub name: String,
    pub description: String,
    /// Runs when the parent is invoked without a subcommand
    pub is_default: bool,
    pub options: Vec<ActionOption>,
    /// Present on action leaves only
    pub handler: Option<ActionHandler>,
    pub children: Vec<CommandNode>,
}

impl CommandNode {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn child(&self, name: &str) -> Option<&CommandNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// The child marked as default, if any
    pub fn default_child(&self) -> Option<&CommandNode> {
        self.children.iter().find(|c| c.is_default)
    }

    /// Follow `path` down from this node
    pub fn find(&self, path: &[&str]) -> Option<&CommandNode> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => self.child(head)?.find(rest),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl From<ActionDescriptor> for CommandNode {
    fn from(action: ActionDescriptor) -> Self {
        Self {
            is_default: action.is_default(),
            name: action.name,
            description: action.description,
            options: action.options,
            handler: Some(action.handler),
            children: Vec::new(),
        }
    }
}

/// Build a plugin's subtree: one child per action, in the given order
pub fn build_tree(
    plugin_name: &str,
    description: &str,
    actions: Vec<ActionDescriptor>,
) -> CommandNode {
    let mut node = CommandNode::new(plugin_name, description);
    node.children = actions.into_iter().map(CommandNode::from).collect();
    node
}

/// Root of the command tree, tracking which package owns each plugin command
#[derive(Debug, Clone)]
pub struct CommandTree {
    root: CommandNode,
    owners: HashMap<String, String>,
}

impl CommandTree {
    pub fn new(bin_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            root: CommandNode::new(bin_name, description),
            owners: HashMap::new(),
        }
    }

    /// Attach a plugin subtree.
    ///
    /// Fails if another package already registered a command of the same
    /// name; the tree is left unchanged.
    pub fn register(&mut self, package_name: &str, node: CommandNode) -> Result<(), TreeError> {
        if let Some(existing) = self.owners.get(&node.name) {
            return Err(TreeError::DuplicateCommand {
                command: node.name,
                package: package_name.to_string(),
                existing: existing.clone(),
            });
        }
        self.owners
            .insert(node.name.clone(), package_name.to_string());
        self.root.children.push(node);
        Ok(())
    }

    pub fn root(&self) -> &CommandNode {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.root.name
    }

    /// Plugin nodes in registration order
    pub fn plugins(&self) -> &[CommandNode] {
        &self.root.children
    }

    pub fn plugin(&self, name: &str) -> Option<&CommandNode> {
        self.root.child(name)
    }

    /// Package that registered the plugin command `name`
    pub fn owner(&self, name: &str) -> Option<&str> {
        self.owners.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}
