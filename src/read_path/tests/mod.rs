//! Unit tests for the read path.
