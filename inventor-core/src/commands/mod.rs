//! Command tree assembled from loaded plugins

mod tree;

pub use tree::{CommandNode, CommandTree, DEFAULT_ACTION, TreeError, build_tree};
