//! Application services for view synchronization.

mod manager;

pub use manager::{EnsureReport, ViewManager, ViewManagerError, ViewManagerResult, ViewOutcome};
