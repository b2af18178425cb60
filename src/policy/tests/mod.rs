//! Unit tests for the policy context.

mod support;
