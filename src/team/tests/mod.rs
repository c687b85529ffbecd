//! Unit tests for teams and member accounts.
