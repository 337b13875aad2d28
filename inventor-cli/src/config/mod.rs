mod loader;
mod types;

pub use loader::{CONFIG_FILE, ConfigLoader};
pub use types::{InventorConfig, PathsConfig};
