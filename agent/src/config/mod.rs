//! Configuration loading and hot reload

pub mod settings;
pub mod watcher;

pub use settings::{Config, Project};
