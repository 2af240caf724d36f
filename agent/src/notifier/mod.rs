//! Completion notifications

pub mod client;
pub mod target;

pub use client::{NotificationSink, Notifier, PUSHDEER_ENDPOINT};
pub use target::NotifyTarget;
