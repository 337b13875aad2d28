//! Loaded actions

use std::sync::Arc;

use inventor_plugin_api::{Action, ActionOption, ActionOptions, ExecContext, PluginError};

use crate::commands::DEFAULT_ACTION;

/// Invokes a loaded action
#[derive(Clone)]
pub struct ActionHandler {
    action: Arc<dyn Action>,
}

impl ActionHandler {
    pub fn new(action: Arc<dyn Action>) -> Self {
        Self { action }
    }

    pub async fn invoke(
        &self,
        ctx: &mut ExecContext,
        options: ActionOptions,
    ) -> Result<(), PluginError> {
        self.action.action(ctx, options).await
    }
}

impl std::fmt::Debug for ActionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHandler").finish_non_exhaustive()
    }
}

/// An action module after loading: name from the file stem, metadata from
/// the action itself.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    pub name: String,
    pub description: String,
    pub options: Vec<ActionOption>,
    pub handler: ActionHandler,
}

impl ActionDescriptor {
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_ACTION
    }
}
