pub mod dispatch;
pub mod flag;

pub use dispatch::{DispatchError, Dispatched, dispatch};
