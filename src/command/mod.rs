//! The command execution core.

pub mod completion;
pub mod executor;

pub use completion::{Completion, CompletionFn};
pub use executor::CommandExecutor;
