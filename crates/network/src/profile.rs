//! Connection profile document and its resolved form.
//!
//! The on-disk document mirrors the JSON layout consumed by ledger client
//! SDKs: certificate authorities keyed `ca.{organizationId}`, peers and
//! orderers keyed by host name, each endpoint carrying its TLS trust root
//! inline as PEM. [`OrganizationProfile`] is the resolved view the rest of
//! the gateway works with.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A certificate authority endpoint inside a connection profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaEndpoint {
    pub url: String,
    #[serde(rename = "tlsCACerts", default)]
    pub tls_ca_certs: Option<TlsCaCerts>,
}

/// A peer or orderer endpoint inside a connection profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeEndpoint {
    pub url: String,
    #[serde(rename = "tlsCACerts", default)]
    pub tls_ca_certs: Option<TlsCaCerts>,
}

/// Inline TLS trust material for an endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsCaCerts {
    pub pem: String,
}

/// The raw connection profile document, one file per organization.
///
/// Consumed read-only; unknown fields are ignored so profiles generated by
/// network tooling with extra sections still parse.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProfile {
    #[serde(default)]
    pub name: Option<String>,
    pub organization: String,
    #[serde(default)]
    pub certificate_authorities: BTreeMap<String, CaEndpoint>,
    #[serde(default)]
    pub peers: BTreeMap<String, NodeEndpoint>,
    #[serde(default)]
    pub orderers: BTreeMap<String, NodeEndpoint>,
    #[serde(default)]
    pub channels: Vec<String>,
}

/// A peer endpoint with its profile key, in resolved form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerEndpoint {
    pub name: String,
    pub url: String,
    pub tls_ca_pem: Option<String>,
}

/// The resolved view of one organization's network topology.
///
/// Immutable at runtime; one per known organization. Produced by
/// [`crate::ProfileResolver::resolve`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrganizationProfile {
    /// Dot-segmented organization identifier, e.g.
    /// `ospedale-maresca.aslnapoli3.medchain.com`.
    pub organization_id: String,
    /// Membership-service-provider id derived from the identifier,
    /// e.g. `OspedaleMarescaMSP`.
    pub msp_id: String,
    /// URL of the organization's certificate authority.
    pub ca_url: String,
    /// TLS trust root for the certificate authority, when published.
    pub ca_tls_pem: Option<String>,
    /// Peer endpoints in profile order (BTreeMap order, stable).
    pub peers: Vec<PeerEndpoint>,
    /// Channels this organization can reach.
    pub channels: Vec<String>,
}

impl OrganizationProfile {
    /// The peer the gateway dials for this organization.
    ///
    /// Resolution guarantees at least one peer, so this never panics on a
    /// resolved profile.
    pub fn gateway_peer(&self) -> &PeerEndpoint {
        &self.peers[0]
    }

    /// Whether the organization participates in the given channel.
    pub fn has_channel(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "medchain-ospedale-maresca",
        "organization": "ospedale-maresca.aslnapoli3.medchain.com",
        "certificateAuthorities": {
            "ca.ospedale-maresca.aslnapoli3.medchain.com": {
                "url": "https://ca.ospedale-maresca.aslnapoli3.medchain.com:7054",
                "tlsCACerts": { "pem": "-----BEGIN CERTIFICATE-----\nAA\n-----END CERTIFICATE-----\n" }
            }
        },
        "peers": {
            "peer0.ospedale-maresca.aslnapoli3.medchain.com": {
                "url": "grpcs://peer0.ospedale-maresca.aslnapoli3.medchain.com:7051"
            }
        },
        "orderers": {
            "orderer.medchain.com": { "url": "grpcs://orderer.medchain.com:7050" }
        },
        "channels": ["patients-channel", "identity-channel"],
        "version": "1.0"
    }"#;

    #[test]
    fn parses_sample_profile() {
        let profile: ConnectionProfile = serde_json::from_str(SAMPLE).unwrap();

        assert_eq!(profile.organization, "ospedale-maresca.aslnapoli3.medchain.com");
        assert_eq!(profile.certificate_authorities.len(), 1);
        assert_eq!(profile.peers.len(), 1);
        assert_eq!(profile.channels.len(), 2);

        let ca = profile
            .certificate_authorities
            .get("ca.ospedale-maresca.aslnapoli3.medchain.com")
            .unwrap();
        assert!(ca.url.starts_with("https://"));
        assert!(ca.tls_ca_certs.is_some());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        // "version" is not modelled; parsing must still succeed.
        assert!(serde_json::from_str::<ConnectionProfile>(SAMPLE).is_ok());
    }

    #[test]
    fn has_channel_matches_exactly() {
        let profile = OrganizationProfile {
            organization_id: "labdemo.medchain.com".into(),
            msp_id: "LabdemoMSP".into(),
            ca_url: "https://ca.labdemo.medchain.com:7054".into(),
            ca_tls_pem: None,
            peers: vec![PeerEndpoint {
                name: "peer0".into(),
                url: "grpc://127.0.0.1:7051".into(),
                tls_ca_pem: None,
            }],
            channels: vec!["patients-channel".into()],
        };

        assert!(profile.has_channel("patients-channel"));
        assert!(!profile.has_channel("patients"));
        assert_eq!(profile.gateway_peer().name, "peer0");
    }
}
