//! appcheck-exec - subprocess execution for appcheck
//!
//! Provides the command seam used by the deployment verifiers:
//! - `CommandSpec` describes one invocation (program, args, timeout)
//! - `CommandExecutor` runs it; `SystemExecutor` spawns a real process
//! - `ScriptedExecutor` answers from canned output for tests

pub mod command;
pub mod error;
pub mod fakes;
pub mod runner;

// Re-export key types
pub use command::CommandSpec;
pub use error::ExecError;
pub use fakes::ScriptedExecutor;
pub use runner::{CommandExecutor, CommandOutput, SystemExecutor};
