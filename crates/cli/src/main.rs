//! Operational CLI for the MedChain ledger gateway.
//!
//! Covers the provisioning and diagnostic flows that sit outside the API
//! server: one-time admin enrollment per organization, user registration,
//! and ad-hoc evaluate/submit/authorization calls against a channel.
//!
//! # Environment Variables
//! - `MEDCHAIN_PROFILES_DIR`: connection profile directory (default: "config/profiles")
//! - `MEDCHAIN_WALLET_DIR`: wallet root (default: "wallet")
//! - `MEDCHAIN_CA_STATE_DIR`: local CA state directory (default: "ca-state")
//! - `MEDCHAIN_BOOTSTRAP_ID`: CA bootstrap enrollment id (default: "admin")
//! - `MEDCHAIN_BOOTSTRAP_SECRET`: CA bootstrap secret (required for
//!   enrollment commands; sourced from the environment, never embedded)

use clap::{Parser, Subcommand};
use medchain_enrollment::{BootstrapCredentials, EnrollmentService, LocalCaProvider};
use medchain_gateway::{AuthorizationGuard, GatewayConfig, GatewayManager};
use medchain_network::ProfileResolver;
use medchain_wallet::Wallet;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "medchain")]
#[command(about = "MedChain ledger gateway operations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll an organization's administrator (idempotent)
    EnrollAdmin {
        /// Organization identifier, e.g. ospedale-maresca.aslnapoli3.medchain.com
        organization: String,
    },
    /// Register and enroll an application user under the admin's authority
    RegisterUser {
        /// User id
        user: String,
        /// Affiliation, e.g. ospedale-maresca.clinicians
        affiliation: String,
        /// Organization identifier
        organization: String,
    },
    /// Run a read-only chaincode query
    Evaluate {
        /// Caller id (user id, or Admin@{org-label})
        user: String,
        /// Organization identifier
        organization: String,
        /// Channel name
        channel: String,
        /// Chaincode name
        chaincode: String,
        /// Function name, e.g. ReadEncounter
        function: String,
        /// String arguments, in order
        args: Vec<String>,
    },
    /// Submit a state-changing chaincode transaction
    Submit {
        /// Caller id (user id, or Admin@{org-label})
        user: String,
        /// Organization identifier
        organization: String,
        /// Channel name
        channel: String,
        /// Chaincode name
        chaincode: String,
        /// Function name, e.g. CreateEncounter
        function: String,
        /// String arguments, in order
        args: Vec<String>,
    },
    /// Check patient-level authorization for a caller
    CheckAuthorization {
        /// Caller id
        user: String,
        /// Organization identifier
        organization: String,
        /// Patient reference, e.g. Patient/p1
        patient: String,
    },
}

fn env_path(name: &str, default: &str) -> PathBuf {
    PathBuf::from(std::env::var(name).unwrap_or_else(|_| default.to_string()))
}

fn enrollment_service() -> anyhow::Result<EnrollmentService<LocalCaProvider>> {
    let profiles_dir = env_path("MEDCHAIN_PROFILES_DIR", "config/profiles");
    let wallet_dir = env_path("MEDCHAIN_WALLET_DIR", "wallet");
    let ca_state_dir = env_path("MEDCHAIN_CA_STATE_DIR", "ca-state");

    let bootstrap = BootstrapCredentials {
        enrollment_id: std::env::var("MEDCHAIN_BOOTSTRAP_ID").unwrap_or_else(|_| "admin".into()),
        secret: std::env::var("MEDCHAIN_BOOTSTRAP_SECRET")
            .map_err(|_| anyhow::anyhow!("MEDCHAIN_BOOTSTRAP_SECRET is not set"))?,
    };

    Ok(EnrollmentService::new(
        ProfileResolver::new(profiles_dir),
        Wallet::open(&wallet_dir)?,
        LocalCaProvider::new(ca_state_dir, bootstrap.clone()),
        bootstrap,
    ))
}

fn gateway_manager() -> anyhow::Result<GatewayManager> {
    let profiles_dir = env_path("MEDCHAIN_PROFILES_DIR", "config/profiles");
    let wallet_dir = env_path("MEDCHAIN_WALLET_DIR", "wallet");
    Ok(GatewayManager::new(GatewayConfig::new(
        profiles_dir,
        wallet_dir,
    ))?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medchain=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::EnrollAdmin { organization } => {
            let service = enrollment_service()?;
            let key = service.enroll_admin(&organization)?;
            println!("Enrolled administrator: {key}");
        }
        Commands::RegisterUser {
            user,
            affiliation,
            organization,
        } => {
            let service = enrollment_service()?;
            match service.register_and_enroll(&user, &affiliation, &organization) {
                Ok(key) => println!("Enrolled user under wallet key: {key}"),
                Err(medchain_enrollment::EnrollmentError::IdentityAlreadyExists(_)) => {
                    println!("User is already enrolled; wallet entry left untouched");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Evaluate {
            user,
            organization,
            channel,
            chaincode,
            function,
            args,
        } => {
            let manager = gateway_manager()?;
            let mut session = manager
                .open(&user, &organization, &channel, &chaincode)
                .await?;
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let result = session.evaluate(&function, &args).await;
            session.close();
            println!("{}", result?);
        }
        Commands::Submit {
            user,
            organization,
            channel,
            chaincode,
            function,
            args,
        } => {
            let manager = gateway_manager()?;
            let mut session = manager
                .open(&user, &organization, &channel, &chaincode)
                .await?;
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let result = session.submit(&function, &args).await;
            session.close();
            println!("{}", result?);
        }
        Commands::CheckAuthorization {
            user,
            organization,
            patient,
        } => {
            let guard = AuthorizationGuard::new(gateway_manager()?);
            if guard.is_authorized(&user, &organization, &patient).await {
                println!("authorized");
            } else {
                println!("not authorized");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
