//! Tests for the signup state machine

#[cfg(test)]
mod machine_tests;
