//! # MedChain Enrollment
//!
//! Provisioning of cryptographic identities for the MedChain ledger network.
//!
//! Each organization runs a certificate authority. Before any ledger call,
//! an organization's administrator must be enrolled once against that CA
//! with bootstrap credentials supplied by network configuration; application
//! users are then registered and enrolled under the administrator's
//! authority. Issued certificate/key pairs land in the organization's
//! [wallet](medchain_wallet) and are never rotated or revoked; an
//! identity's lifetime is the lifetime of its wallet entry.
//!
//! The certificate authority itself is a seam: [`CertificateAuthority`] is
//! the client contract, and [`LocalCa`] is the shipped implementation, an
//! rcgen-backed issuing CA whose root material persists on disk. A client
//! for a remote CA endpoint (the `ca_url` surfaced by the connection
//! profile) would implement the same trait.

pub mod ca;
pub mod service;

pub use ca::{
    BootstrapCredentials, CaProvider, CertificateAuthority, EnrolledMaterial, LocalCa,
    LocalCaProvider,
};
pub use service::EnrollmentService;

/// Errors raised by the certificate-authority client.
#[derive(Debug, thiserror::Error)]
pub enum CaError {
    #[error("certificate authority rejected credentials for '{0}'")]
    AuthenticationFailed(String),
    #[error("enrollment id '{0}' is not registered with this certificate authority")]
    UnknownEnrollmentId(String),
    #[error("enrollment id '{0}' is already registered")]
    AlreadyRegistered(String),
    #[error("registrar identity is not usable: {0}")]
    InvalidRegistrar(String),
    #[error("failed to issue certificate: {0}")]
    Issuance(String),
    #[error("certificate authority state I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type CaResult<T> = std::result::Result<T, CaError>;

/// Errors raised by the enrollment flow.
///
/// `AdminNotEnrolled` is a deployment-ordering fault: user enrollment was
/// attempted before the organization's one-time admin enrollment ran.
/// `IdentityAlreadyExists` is an expected, recoverable outcome: callers who
/// treat enrollment as ensure-present handle it as success.
#[derive(Debug, thiserror::Error)]
pub enum EnrollmentError {
    #[error("administrator for '{0}' is not enrolled; run admin enrollment first")]
    AdminNotEnrolled(String),
    #[error("an identity for user '{0}' already exists in the wallet")]
    IdentityAlreadyExists(String),
    #[error(transparent)]
    Profile(#[from] medchain_network::ProfileError),
    #[error(transparent)]
    Wallet(#[from] medchain_wallet::WalletError),
    #[error(transparent)]
    Ca(#[from] CaError),
}

pub type EnrollmentResult<T> = std::result::Result<T, EnrollmentError>;
