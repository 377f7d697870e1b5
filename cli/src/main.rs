// Terminal driver for the Onboard signup flow

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use ob_core::services::{AadhaarVerification, PlatformFeeCheckout, SignupStateMachine};
use ob_infra::{
    create_phone_auth_provider, load_config_from, load_env_files, MockPaymentGateway,
    StaticAadhaarExtractor,
};
use ob_shared::{Environment, ProviderKind};

mod flow;
mod logging;
mod prompt;

use flow::SignupFlow;
use prompt::Prompt;

#[derive(Parser)]
#[command(name = "onboard")]
#[command(about = "Phone-verified account signup", long_about = None)]
struct Cli {
    /// Directory holding onboard.toml and the environment-specific files
    #[arg(short, long, default_value = ".")]
    config_dir: PathBuf,

    /// Environment to load (development, staging, production)
    #[arg(short, long)]
    environment: Option<Environment>,

    /// Do not offer the second-factor step
    #[arg(long)]
    no_mfa: bool,

    /// Collect the platform fee after signup
    #[arg(long)]
    pay: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let detected = load_env_files();
    let environment = cli.environment.unwrap_or(detected);
    let config = load_config_from(environment, &cli.config_dir)?;

    logging::init_logging(&config.logging, cli.verbose);
    tracing::info!(
        environment = %config.environment,
        country_code = %config.verification.country_code,
        "Starting onboard"
    );

    let providers = create_phone_auth_provider(&config.provider);
    let mut machine = SignupStateMachine::new(
        providers.phone_auth.clone(),
        providers.profiles.clone(),
        config.verification.clone(),
    );
    if config.offer_mfa && !cli.no_mfa {
        machine = machine.with_mfa(providers.multi_factor.clone());
    }

    tracing::debug!(
        provider = ?providers.kind,
        offer_mfa = machine.offers_mfa(),
        "Signup flow ready"
    );

    if providers.kind == ProviderKind::Mock {
        match &config.provider.mock_fixed_code {
            Some(code) => println!("Mock provider: every code is {}", code),
            None => println!("Mock provider: codes are written to the log (target sms_service)"),
        }
    }

    let kyc = AadhaarVerification::new(Arc::new(StaticAadhaarExtractor::demo()));
    let checkout = cli.pay.then(|| {
        PlatformFeeCheckout::new(Arc::new(MockPaymentGateway::approving()), config.payment.clone())
    });

    let mut flow = SignupFlow::new(machine, kyc, checkout, Prompt::stdin());
    let completion = flow.run().await?;

    tracing::info!(
        identity_uid = %completion.identity_uid,
        event = "signup_finished",
        "Signup finished"
    );
    Ok(())
}
