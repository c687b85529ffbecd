//! Unit tests for the view module.
