//! Tests for the verification session

#[cfg(test)]
pub(crate) mod mocks;
