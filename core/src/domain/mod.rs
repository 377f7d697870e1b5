//! Domain layer containing the entities the onboarding flow works with.

pub mod entities;

pub use entities::*;
