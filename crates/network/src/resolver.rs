//! Resolution of organization identifiers to connection profiles.
//!
//! Naming here is deterministic and must stay in lockstep with the network
//! provisioning tooling:
//!
//! - profile file: `connection-profile-{shortName}.json`, where `shortName`
//!   is the first dot-segment of the identifier with hyphens removed
//!   (`ospedale-maresca.aslnapoli3.medchain.com` → `ospedalemaresca`);
//! - MSP id: first dot-segment, each hyphen-separated part capitalized and
//!   concatenated, suffixed `MSP` (`OspedaleMarescaMSP`);
//! - organization label (wallet namespace, admin key suffix): first
//!   dot-segment verbatim (`ospedale-maresca`).

use crate::profile::{ConnectionProfile, OrganizationProfile, PeerEndpoint};
use crate::{ProfileError, ProfileResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Derive the short profile name for an organization identifier.
pub fn derive_short_name(organization_id: &str) -> String {
    derive_org_label(organization_id).replace('-', "")
}

/// Derive the organization label: the first dot-segment, hyphens kept.
pub fn derive_org_label(organization_id: &str) -> &str {
    organization_id
        .split('.')
        .next()
        .unwrap_or(organization_id)
}

/// Derive the membership-service-provider id for an organization identifier.
pub fn derive_msp_id(organization_id: &str) -> String {
    let mut msp = String::new();
    for part in derive_org_label(organization_id).split('-') {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            msp.extend(first.to_uppercase());
            msp.push_str(chars.as_str());
        }
    }
    msp.push_str("MSP");
    msp
}

/// Resolves organization identifiers against a directory of connection
/// profile files.
///
/// The directory is fixed at construction; resolution itself is stateless and
/// safe to call from concurrent request workers.
#[derive(Clone, Debug)]
pub struct ProfileResolver {
    profiles_dir: PathBuf,
}

impl ProfileResolver {
    pub fn new(profiles_dir: impl Into<PathBuf>) -> Self {
        Self {
            profiles_dir: profiles_dir.into(),
        }
    }

    pub fn profiles_dir(&self) -> &Path {
        &self.profiles_dir
    }

    /// Resolve an organization identifier to its [`OrganizationProfile`].
    ///
    /// # Errors
    ///
    /// - [`ProfileError::ProfileNotFound`] if no profile file exists for the
    ///   derived short name (a configuration fault, not a transient failure)
    /// - [`ProfileError::MissingCertificateAuthority`] if the profile lacks
    ///   the `ca.{organizationId}` entry
    /// - [`ProfileError::MissingPeers`] if the profile lists no peers
    /// - [`ProfileError::Io`] / [`ProfileError::Deserialization`] if the file
    ///   cannot be read or parsed
    pub fn resolve(&self, organization_id: &str) -> ProfileResult<OrganizationProfile> {
        let short_name = derive_short_name(organization_id);
        let path = self
            .profiles_dir
            .join(format!("connection-profile-{short_name}.json"));

        if !path.is_file() {
            tracing::warn!(
                organization = organization_id,
                path = %path.display(),
                "connection profile not found"
            );
            return Err(ProfileError::ProfileNotFound(organization_id.to_string()));
        }

        let contents = fs::read_to_string(&path)?;
        let document: ConnectionProfile = serde_json::from_str(&contents)?;

        let ca_key = format!("ca.{organization_id}");
        let ca = document.certificate_authorities.get(&ca_key).ok_or_else(|| {
            ProfileError::MissingCertificateAuthority(organization_id.to_string())
        })?;

        if document.peers.is_empty() {
            return Err(ProfileError::MissingPeers(organization_id.to_string()));
        }

        let peers = document
            .peers
            .iter()
            .map(|(name, endpoint)| PeerEndpoint {
                name: name.clone(),
                url: endpoint.url.clone(),
                tls_ca_pem: endpoint.tls_ca_certs.as_ref().map(|t| t.pem.clone()),
            })
            .collect();

        Ok(OrganizationProfile {
            organization_id: organization_id.to_string(),
            msp_id: derive_msp_id(organization_id),
            ca_url: ca.url.clone(),
            ca_tls_pem: ca.tls_ca_certs.as_ref().map(|t| t.pem.clone()),
            peers,
            channels: document.channels,
        })
    }
}
