//! # MedChain Network
//!
//! Static network topology for the MedChain ledger gateway.
//!
//! Each participating organization (hospital, pharmacy, lab, patient
//! organization) publishes a connection profile: a JSON descriptor naming its
//! certificate authority, its peers and orderers with their TLS trust roots,
//! and the ledger channels it can reach. This crate resolves an organization
//! domain identifier (e.g. `ospedale-maresca.aslnapoli3.medchain.com`) to the
//! parsed [`OrganizationProfile`] the gateway needs to open identity-scoped
//! sessions.
//!
//! Profiles are read-only configuration, resolved per request from a
//! directory fixed at startup. There is no caching layer: profile files are
//! small and the filesystem cache is sufficient.

pub mod profile;
pub mod resolver;

pub use profile::{CaEndpoint, ConnectionProfile, OrganizationProfile, PeerEndpoint};
pub use resolver::{derive_msp_id, derive_org_label, derive_short_name, ProfileResolver};

/// Errors raised while resolving an organization's connection profile.
///
/// `ProfileNotFound` and `MissingCertificateAuthority` are deployment faults:
/// the network configuration does not cover the requested organization. They
/// must surface to the caller as fatal for the request, never be retried.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("no connection profile configured for organization '{0}'")]
    ProfileNotFound(String),
    #[error("connection profile for '{0}' has no certificate authority entry 'ca.{0}'")]
    MissingCertificateAuthority(String),
    #[error("connection profile for '{0}' lists no peers")]
    MissingPeers(String),
    #[error("failed to read connection profile: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse connection profile: {0}")]
    Deserialization(#[from] serde_json::Error),
}

pub type ProfileResult<T> = std::result::Result<T, ProfileError>;
