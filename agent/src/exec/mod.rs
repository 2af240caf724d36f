//! External command execution
//!
//! Every git/docker/compose invocation goes through a [`CommandRunner`] so the
//! reconciliation procedure can be driven against a scripted runner in tests.

pub mod runner;

pub use runner::{CommandRunner, CommandSpec, SystemRunner};
