//! easy-deploy library
//!
//! Continuous-deployment reconciler: keeps each configured project's working
//! copy in step with its remote branch and redeploys its container when new
//! commits land.

pub mod app;
pub mod config;
pub mod deploy;
pub mod errors;
pub mod exec;
pub mod filesys;
pub mod logs;
pub mod notifier;
pub mod utils;
pub mod workers;
