//! # MedChain Wallet
//!
//! Durable, per-organization storage of enrolled ledger identities.
//!
//! An identity is an X.509 certificate and its private key, both PEM, bound
//! to a membership-service-provider id. Identities are created once by
//! enrollment and then read many times by the gateway; they are never
//! mutated (key rotation is out of scope; identity lifetime is the lifetime
//! of the wallet entry).
//!
//! # Storage Layout
//!
//! ```text
//! <wallet_root>/
//! └── <organization label>/          # e.g. ospedale-maresca
//!     ├── Admin@ospedale-maresca/    # administrator entry
//!     │   ├── certificate.pem
//!     │   ├── private-key.pem
//!     │   └── metadata.json
//!     └── 9f86d081…/                 # user entry, SHA-256 of the user id
//!         └── …
//! ```
//!
//! User entries are keyed by a one-way hash of the raw user id so that user
//! identifiers never appear in storage paths.
//!
//! # Write semantics
//!
//! `put` is idempotent and at-most-once: each call stages its entry into its
//! own temporary sibling directory and renames it into place, so a
//! concurrent `put` for the same key either wins the rename or observes the
//! winner and becomes a no-op. An existing entry is never overwritten.

pub mod wallet;

pub use wallet::Wallet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Errors raised by wallet operations.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("no enrolled identity for owner key '{0}'")]
    IdentityNotFound(String),
    #[error("wallet root is not a usable directory: {0}")]
    InvalidRootDirectory(String),
    #[error("wallet I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode identity metadata: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type WalletResult<T> = std::result::Result<T, WalletError>;

/// An enrolled ledger identity: certificate + private key + MSP binding.
///
/// Both `certificate` and `private_key` are PEM; the private key is PKCS#8.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub msp_id: String,
    pub certificate: String,
    pub private_key: String,
}

/// Stable storage key for one wallet entry.
///
/// Administrators are addressed as `Admin@{organization label}`; application
/// users as the lowercase hex SHA-256 of their raw user id. At most one
/// entry exists per key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OwnerKey(String);

impl OwnerKey {
    /// Key for an organization's administrator.
    ///
    /// `organization_label` is the first dot-segment of the organization
    /// identifier, hyphens kept (e.g. `ospedale-maresca`).
    pub fn admin(organization_label: &str) -> Self {
        Self(format!("Admin@{organization_label}"))
    }

    /// Key for an application user, hashed so the raw id never reaches disk.
    pub fn user(user_id: &str) -> Self {
        let digest = Sha256::digest(user_id.as_bytes());
        Self(hex::encode(digest))
    }

    /// Key for an inbound caller id.
    ///
    /// Administrators address themselves as `Admin@{organization label}`;
    /// any other caller id is treated as a raw user id and hashed.
    pub fn for_caller(caller_id: &str, organization_label: &str) -> Self {
        if caller_id == format!("Admin@{organization_label}") {
            Self(caller_id.to_string())
        } else {
            Self::user(caller_id)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.0.starts_with("Admin@")
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_key_embeds_organization_label() {
        let key = OwnerKey::admin("ospedale-maresca");
        assert_eq!(key.as_str(), "Admin@ospedale-maresca");
        assert!(key.is_admin());
    }

    #[test]
    fn caller_key_distinguishes_admins_from_users() {
        let admin = OwnerKey::for_caller("Admin@labdemo", "labdemo");
        assert_eq!(admin, OwnerKey::admin("labdemo"));

        let user = OwnerKey::for_caller("u1", "labdemo");
        assert_eq!(user, OwnerKey::user("u1"));

        // An admin label for a different organization is not an admin here.
        let foreign = OwnerKey::for_caller("Admin@other", "labdemo");
        assert!(!foreign.is_admin());
    }

    #[test]
    fn user_key_is_stable_hash() {
        let a = OwnerKey::user("u1");
        let b = OwnerKey::user("u1");
        let c = OwnerKey::user("u2");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 64);
        assert!(!a.as_str().contains("u1"));
        assert!(!a.is_admin());
    }
}
