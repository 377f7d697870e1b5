//! User actions the signup flow responds to

use serde::Serialize;

/// A user-triggered signup action
///
/// Asynchronous actions hold a per-action loading flag while they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignupAction {
    SubmitPhone,
    SubmitCode,
    Resend,
    GoBack,
    SubmitProfile,
    EnrollMfa,
    ConfirmMfa,
    ResendMfa,
    SkipMfa,
}

impl SignupAction {
    /// Phrase used in "Cannot ... during the ... step."
    pub fn describe(&self) -> &'static str {
        match self {
            Self::SubmitPhone => "submit a phone number",
            Self::SubmitCode => "submit a code",
            Self::Resend => "resend a code",
            Self::GoBack => "go back",
            Self::SubmitProfile => "submit user details",
            Self::EnrollMfa => "set up two-factor authentication",
            Self::ConfirmMfa => "confirm a two-factor code",
            Self::ResendMfa => "resend a two-factor code",
            Self::SkipMfa => "skip two-factor setup",
        }
    }
}
