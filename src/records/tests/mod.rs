//! Unit tests for the records context.
