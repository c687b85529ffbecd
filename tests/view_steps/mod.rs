//! Step definitions for view bootstrap scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
