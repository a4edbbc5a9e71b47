//! Backend worker: owns the Tokio runtime, the preference storage and the
//! UI state controller, and talks to the UI thread over bounded queues.

pub mod commands;
pub mod runtime;
