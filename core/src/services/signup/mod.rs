//! Signup flow: phone entry, code verification, user details and optional
//! second-factor setup

mod machine;
mod types;

#[cfg(test)]
mod tests;

pub use machine::SignupStateMachine;
pub use types::SignupAction;
