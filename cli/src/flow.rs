//! Interactive walk through the signup steps

use std::path::Path;

use anyhow::{Context, Result};

use ob_core::domain::entities::{
    AadhaarDocument, AadhaarUpload, MfaStatus, PaymentMethod, ProfileForm, SignupCompletion,
    SignupState, SignupStep,
};
use ob_core::errors::{ErrorNotice, RecoveryAction, SignupError};
use ob_core::services::{AadhaarVerification, PlatformFeeCheckout, ResendOutcome, SignupStateMachine};

use crate::prompt::Prompt;

/// Profile fields in form order: key, label
const PROFILE_FIELDS: [(&str, &str); 12] = [
    ("name", "Full name"),
    ("dob", "Date of birth (DD-MM-YYYY)"),
    ("email", "Email"),
    ("aadhar", "Aadhaar number"),
    ("address", "Address"),
    ("state", "State"),
    ("nominee_name", "Nominee name"),
    ("nominee_aadhar", "Nominee Aadhaar number"),
    ("nominee_relationship", "Nominee relationship"),
    ("password", "Password"),
    ("confirm_password", "Confirm password"),
    ("terms", "Accept the terms and conditions?"),
];

/// Never shown back as a default
const SECRET_FIELDS: [&str; 2] = ["password", "confirm_password"];

/// Fields to ask again after a rejected submit; a new password needs a new confirmation
fn fields_to_reask(invalid: impl Fn(&str) -> bool) -> Vec<&'static str> {
    let password_changes = invalid("password");
    PROFILE_FIELDS
        .iter()
        .map(|(key, _)| *key)
        .filter(|key| invalid(*key) || (password_changes && *key == "confirm_password"))
        .collect()
}

fn field_mut<'a>(form: &'a mut ProfileForm, key: &str) -> Option<&'a mut String> {
    Some(match key {
        "name" => &mut form.name,
        "dob" => &mut form.dob,
        "email" => &mut form.email,
        "aadhar" => &mut form.aadhar,
        "address" => &mut form.address,
        "state" => &mut form.state,
        "nominee_name" => &mut form.nominee_name,
        "nominee_aadhar" => &mut form.nominee_aadhar,
        "nominee_relationship" => &mut form.nominee_relationship,
        "password" => &mut form.password,
        "confirm_password" => &mut form.confirm_password,
        _ => return None,
    })
}

pub struct SignupFlow {
    machine: SignupStateMachine,
    kyc: AadhaarVerification,
    checkout: Option<PlatformFeeCheckout>,
    prompt: Prompt,
}

impl SignupFlow {
    pub fn new(
        machine: SignupStateMachine,
        kyc: AadhaarVerification,
        checkout: Option<PlatformFeeCheckout>,
        prompt: Prompt,
    ) -> Self {
        Self {
            machine,
            kyc,
            checkout,
            prompt,
        }
    }

    fn completion(&self) -> Option<SignupCompletion> {
        match self.machine.state() {
            SignupState::Completed { completion } => Some(completion),
            _ => None,
        }
    }

    fn country_code(&self) -> String {
        self.machine.config().country_code.clone()
    }

    /// Run until signup completes; returns the completion record
    pub async fn run(&mut self) -> Result<SignupCompletion> {
        let mut shown = None;
        let completion = loop {
            let step = self.machine.step();
            if shown != Some(step) && step != SignupStep::Completed {
                println!("\n== {} ==", capitalize(step.as_str()));
                shown = Some(step);
            }

            match step {
                SignupStep::PhoneInput => self.phone_step().await?,
                SignupStep::OtpVerification => self.otp_step().await?,
                SignupStep::UserDetails => self.details_step().await?,
                SignupStep::MfaSetup => {
                    if let Some(completion) = self.mfa_step().await? {
                        break completion;
                    }
                }
                // Reached straight from the details step when no second factor is offered
                SignupStep::Completed => match self.completion() {
                    Some(completion) => break completion,
                    None => anyhow::bail!("signup completed without a completion record"),
                },
            }
        };

        match &completion.mfa {
            MfaStatus::Enrolled { factor } => {
                println!("Second factor enrolled: {}", factor.phone_e164)
            }
            MfaStatus::Skipped => println!("Second factor skipped"),
            MfaStatus::NotOffered => {}
        }
        println!(
            "Signup complete for {}",
            completion.verified_phone.display_with(&self.country_code())
        );

        self.payment_step(&completion).await?;
        Ok(completion)
    }

    async fn phone_step(&mut self) -> Result<()> {
        let label = format!("Mobile number ({})", self.country_code());
        let input = self.prompt.ask(&label).await?;
        match self.machine.submit_phone(&input).await {
            Ok(challenge) => println!(
                "Code sent to {}",
                challenge.phone.display_with(&self.country_code())
            ),
            Err(err) => report(&err),
        }
        Ok(())
    }

    async fn otp_step(&mut self) -> Result<()> {
        if !self.machine.can_resend() {
            println!("(resend available in {}s)", self.machine.resend_remaining());
        }
        let input = self
            .prompt
            .ask("Enter the 6-digit code ('resend' for a new code, 'back' to change number)")
            .await?;

        match input.as_str() {
            "resend" => match self.machine.resend().await {
                Ok(ResendOutcome::Resent(challenge)) => println!(
                    "A new code was sent to {}",
                    challenge.phone.display_with(&self.country_code())
                ),
                Ok(ResendOutcome::CoolingDown { remaining }) => {
                    println!("Please wait {}s before requesting another code", remaining)
                }
                Err(err) => report(&err),
            },
            "back" => {
                if let Err(err) = self.machine.go_back() {
                    report(&err);
                }
            }
            code => match self.machine.submit_code(code).await {
                Ok(phone) => println!("Verified {}", phone.display_with(&self.country_code())),
                Err(err) => report(&err),
            },
        }
        Ok(())
    }

    async fn details_step(&mut self) -> Result<()> {
        let phone = self
            .machine
            .verified_phone()
            .context("no verified phone in the user details step")?;
        let mut form = ProfileForm::for_verified_phone(&phone);
        println!("Mobile number: {} (verified)", phone.display_with(&self.country_code()));

        if self.prompt.confirm("Prefill from an e-Aadhaar PDF?").await? {
            self.prefill_from_aadhaar(&mut form).await?;
        }

        let mut pending: Vec<&str> = PROFILE_FIELDS.iter().map(|(key, _)| *key).collect();
        loop {
            for (key, label) in PROFILE_FIELDS.iter().filter(|(key, _)| pending.contains(key)) {
                if *key == "terms" {
                    form.terms_accepted = self.prompt.confirm(label).await?;
                } else if SECRET_FIELDS.contains(key) {
                    if let Some(value) = field_mut(&mut form, key) {
                        *value = self.prompt.ask_secret(label).await?;
                    }
                } else if let Some(value) = field_mut(&mut form, key) {
                    let current = value.clone();
                    *value = self.prompt.ask_with_default(label, &current).await?;
                }
            }

            match self.machine.submit_profile(form.clone()).await {
                Ok(_) => {
                    println!("Details saved");
                    return Ok(());
                }
                Err(SignupError::InvalidProfile(errors)) => {
                    println!("Please correct the highlighted fields.");
                    for error in errors.errors() {
                        println!("  - {}", error.message);
                    }
                    pending = fields_to_reask(|key| errors.contains(key));
                }
                Err(err) => {
                    report(&err);
                    if !self.prompt.confirm("Try again?").await? {
                        anyhow::bail!("signup abandoned at the user details step");
                    }
                    pending.clear();
                }
            }
        }
    }

    async fn prefill_from_aadhaar(&mut self, form: &mut ProfileForm) -> Result<()> {
        let path = self.prompt.ask("Path to the e-Aadhaar PDF").await?;
        let document = if path.is_empty() {
            None
        } else {
            let content = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path))?;
            let file_name = Path::new(&path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone());
            Some(AadhaarDocument::new(file_name, content))
        };
        let password = self.prompt.ask("PDF password").await?;

        println!("Verifying...");
        let upload = AadhaarUpload { document, password };
        match self.kyc.verify(&upload).await {
            Ok(record) => {
                form.prefill_from_aadhaar(&record);
                println!("Prefilled details for {}", record.name);
            }
            Err(err) => println!("{}", ErrorNotice::from(&err).message),
        }
        Ok(())
    }

    /// One round of the second-factor step; `Some` once signup completes
    async fn mfa_step(&mut self) -> Result<Option<SignupCompletion>> {
        let input = self
            .prompt
            .ask("Mobile number for the second factor (blank to skip)")
            .await?;
        if input.is_empty() || input == "skip" {
            return Ok(self.skip_mfa());
        }

        match self.machine.enroll_mfa(&input).await {
            Ok(challenge) => println!(
                "Code sent to {}",
                challenge.phone.display_with(&self.country_code())
            ),
            Err(err) => {
                report(&err);
                return Ok(None);
            }
        }

        loop {
            let input = self
                .prompt
                .ask("Enter the 6-digit code ('resend' for a new code, 'skip' to finish without it)")
                .await?;
            match input.as_str() {
                "skip" => return Ok(self.skip_mfa()),
                "resend" => match self.machine.resend_mfa().await {
                    Ok(ResendOutcome::Resent(_)) => println!("A new code was sent"),
                    Ok(ResendOutcome::CoolingDown { remaining }) => {
                        println!("Please wait {}s before requesting another code", remaining)
                    }
                    Err(err) => report(&err),
                },
                code => match self.machine.confirm_mfa(code).await {
                    Ok(completion) => return Ok(Some(completion)),
                    Err(err) => {
                        report(&err);
                        // A lost primary session cannot be recovered from here
                        if err.recovery() == RecoveryAction::SignInAgain {
                            return Ok(self.skip_mfa());
                        }
                    }
                },
            }
        }
    }

    fn skip_mfa(&self) -> Option<SignupCompletion> {
        match self.machine.skip_mfa() {
            Ok(completion) => Some(completion),
            Err(err) => {
                report(&err);
                None
            }
        }
    }

    async fn payment_step(&mut self, completion: &SignupCompletion) -> Result<()> {
        let Some(checkout) = &self.checkout else {
            return Ok(());
        };

        println!("\n== Platform fee ==");
        println!("Amount: {}", checkout.amount_label());
        let labels: Vec<&str> = PaymentMethod::ALL.iter().map(|m| m.label()).collect();

        loop {
            let answer = self
                .prompt
                .ask(&format!("Payment method ({}; blank to skip)", labels.join(", ")))
                .await?;
            if answer.is_empty() {
                println!("Payment skipped");
                return Ok(());
            }
            let method: PaymentMethod = match answer.parse() {
                Ok(method) => method,
                Err(msg) => {
                    println!("{}", msg);
                    continue;
                }
            };
            let agreed = self.prompt.confirm("I agree to pay the platform fees").await?;

            let contact = completion.verified_phone.to_e164(&self.country_code());
            match checkout.pay(method, agreed, &contact).await {
                Ok(receipt) => {
                    println!("Payment successful. Payment ID: {}", receipt.payment_id);
                    return Ok(());
                }
                Err(err) => println!("{}", ErrorNotice::from(&err).message),
            }
        }
    }
}

fn report(err: &SignupError) {
    let notice = ErrorNotice::from(err);
    tracing::debug!(code = %notice.code, recovery = ?notice.recovery, "Step failed");
    println!("{}", notice.message);
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ob_infra::{
        InMemoryProfileStore, MockPaymentGateway, MockPhoneAuthProvider, StaticAadhaarExtractor,
    };
    use ob_shared::{PaymentConfig, VerificationConfig};

    const PROFILE_ANSWERS: [&str; 13] = [
        "n",
        "Asha Verma",
        "15-08-1995",
        "asha@example.com",
        "1234 5678 9012",
        "12 MG Road, Pune",
        "Maharashtra",
        "Ravi Verma",
        "234567890123",
        "Brother",
        "Abc123!@",
        "Abc123!@",
        "y",
    ];

    fn no_mfa_flow(answers: &[&str], gateway: Option<Arc<MockPaymentGateway>>) -> SignupFlow {
        let provider = Arc::new(MockPhoneAuthProvider::new().with_fixed_code("123456"));
        let machine = SignupStateMachine::new(
            provider,
            Arc::new(InMemoryProfileStore::new()),
            VerificationConfig::default(),
        );
        let kyc = AadhaarVerification::new(Arc::new(StaticAadhaarExtractor::demo()));
        let checkout = gateway.map(|gateway| PlatformFeeCheckout::new(gateway, PaymentConfig::default()));
        SignupFlow::new(machine, kyc, checkout, Prompt::scripted(answers))
    }

    #[test]
    fn test_every_text_field_is_mapped() {
        let mut form = ProfileForm::default();
        for (key, _) in PROFILE_FIELDS.iter().filter(|(key, _)| *key != "terms") {
            assert!(field_mut(&mut form, key).is_some(), "{} is not mapped", key);
        }
        assert!(field_mut(&mut form, "terms").is_none());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("user details"), "User details");
        assert_eq!(capitalize("OTP verification"), "OTP verification");
    }

    #[test]
    fn test_password_change_reasks_confirmation() {
        assert_eq!(fields_to_reask(|key| key == "password"), vec!["password", "confirm_password"]);
        assert_eq!(fields_to_reask(|key| key == "email" || key == "terms"), vec!["email", "terms"]);
    }

    #[tokio::test]
    async fn test_signup_without_second_factor_completes_and_pays() {
        let mut answers = vec!["9876543210", "123456"];
        answers.extend(PROFILE_ANSWERS);
        answers.extend(["upi", "y"]);
        let gateway = Arc::new(MockPaymentGateway::approving());

        let mut flow = no_mfa_flow(&answers, Some(gateway.clone()));
        let completion = flow.run().await.unwrap();

        assert_eq!(completion.mfa, MfaStatus::NotOffered);
        assert_eq!(completion.verified_phone.as_str(), "9876543210");
        let orders = gateway.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].method, PaymentMethod::Upi);
        assert_eq!(orders[0].contact, "+919876543210");
    }

    #[tokio::test]
    async fn test_invalid_password_is_asked_again_without_echo() {
        let mut answers = vec!["9876543210", "123456"];
        let mut profile = PROFILE_ANSWERS.to_vec();
        profile[10] = "weak";
        profile[11] = "weak";
        answers.extend(profile);
        answers.extend(["Abc123!@", "Abc123!@"]);

        let mut flow = no_mfa_flow(&answers, None);
        let completion = flow.run().await.unwrap();
        assert_eq!(completion.mfa, MfaStatus::NotOffered);
        assert_eq!(flow.machine.step(), SignupStep::Completed);
    }
}
