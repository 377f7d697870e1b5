//! Tests for domain entities

#[cfg(test)]
mod profile_tests;
