//! Second-factor enrollment for an already authenticated identity

mod service;

#[cfg(test)]
mod tests;

pub use service::MfaEnrollment;
