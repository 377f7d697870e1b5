//! Tests for second-factor enrollment
