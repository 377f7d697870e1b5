//! Tests for the phone-auth providers

#[cfg(test)]
mod factory_tests;
#[cfg(test)]
mod mock_provider_tests;
