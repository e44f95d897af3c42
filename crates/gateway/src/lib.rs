//! # MedChain Gateway
//!
//! Identity-scoped sessions against the MedChain ledger network, transaction
//! dispatch, and the cross-chaincode authorization guard.
//!
//! The flow per inbound API request:
//!
//! 1. [`GatewayManager::open`] validates parameters, resolves the caller's
//!    organization profile, loads the enrolled identity from the wallet and
//!    returns a fresh [`GatewaySession`] bound to one channel/chaincode pair.
//! 2. Where the operation touches clinical data for a patient, the
//!    [`AuthorizationGuard`] runs first, as its own short-lived session
//!    against the authorization chaincode. It fails closed.
//! 3. The session dispatches `evaluate` (read-only) or `submit`
//!    (state-changing) calls; payloads are normalized to strings and
//!    failures classified into [`LedgerError`].
//! 4. The session is closed on every exit path. Sessions are never pooled or
//!    shared: each request gets its own identity-scoped connection,
//!    isolation over connection reuse.
//!
//! There is no retry logic anywhere in this layer; retry policy belongs to
//! callers, guided by the [`LedgerError`] classification.

pub mod authz;
pub mod config;
pub mod dispatch;
pub mod session;

pub use authz::AuthorizationGuard;
pub use config::GatewayConfig;
pub use session::{GatewayManager, GatewaySession};

/// Failures from dispatching a transaction through a session.
///
/// `ChaincodeRejected` means the remote business logic refused the operation:
/// retrying without changing input is pointless. `Transport` is a
/// network-level failure the caller may retry with backoff. The remaining
/// variants are programming faults in the calling code or corrupt wallet
/// material.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("chaincode rejected '{function}': {message}")]
    ChaincodeRejected { function: String, message: String },
    #[error("ledger transport failure during '{function}': {message}")]
    Transport { function: String, message: String },
    #[error("session is already closed")]
    SessionClosed,
    #[error("identity key material is unusable: {0}")]
    InvalidKeyMaterial(String),
}

impl LedgerError {
    /// Whether the caller may reasonably retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Transport { .. })
    }
}

/// Request-level failures of the gateway layer.
///
/// `MissingParameter` and profile errors are configuration or programming
/// faults, fatal for the request. `Wallet` surfaces `IdentityNotFound` for
/// callers that were never enrolled. `AuthorizationDenied` maps to a
/// 403-class outcome upstream and must never be conflated with transport
/// failures.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("missing required parameter '{0}'")]
    MissingParameter(&'static str),
    #[error(transparent)]
    Profile(#[from] medchain_network::ProfileError),
    #[error(transparent)]
    Wallet(#[from] medchain_wallet::WalletError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("caller '{caller}' is not authorized for patient '{patient}'")]
    AuthorizationDenied { caller: String, patient: String },
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
