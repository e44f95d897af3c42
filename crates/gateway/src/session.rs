//! Request-scoped ledger sessions.
//!
//! A [`GatewaySession`] is the unit of isolation: one identity, one
//! channel/chaincode binding, one transport, one request. The original
//! system kept a single mutable connection per client process; here the
//! session is a value returned from [`GatewayManager::open`] and threaded
//! explicitly through dispatch, so concurrent request workers cannot share
//! connection state by construction.
//!
//! `open` performs no network I/O: the transport is created lazily and dials
//! on first dispatch, so parameter validation and identity loading genuinely
//! precede any network activity. `close` is idempotent and releases the
//! transport; dropping an unclosed session releases it too, so a session can
//! never outlive its request.

use crate::config::GatewayConfig;
use crate::{GatewayError, GatewayResult, LedgerError};
use medchain_ledger_proto::pb::ledger_client::LedgerClient;
use medchain_network::{derive_org_label, ProfileResolver};
use medchain_wallet::{Identity, OwnerKey, Wallet};
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};

/// Opens identity-scoped sessions against the ledger network.
///
/// Cheap to clone; holds only configuration, the profile resolver and the
/// wallet handle. All mutable state lives in the sessions it creates.
#[derive(Clone, Debug)]
pub struct GatewayManager {
    config: GatewayConfig,
    resolver: ProfileResolver,
    wallet: Wallet,
}

impl GatewayManager {
    /// Creates a manager from resolved configuration.
    ///
    /// # Errors
    ///
    /// Fails if the wallet root is unusable.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let resolver = ProfileResolver::new(config.profiles_dir());
        let wallet = Wallet::open(config.wallet_dir())?;
        Ok(Self {
            config,
            resolver,
            wallet,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Opens a session for `caller_id` against `channel`/`chaincode` in the
    /// caller's organization.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::MissingParameter`] if any parameter is empty,
    ///   checked before any filesystem or network work
    /// - [`GatewayError::Profile`] if the organization is not configured
    /// - [`GatewayError::Wallet`] (`IdentityNotFound`) if the caller was
    ///   never enrolled
    pub async fn open(
        &self,
        caller_id: &str,
        organization_id: &str,
        channel: &str,
        chaincode: &str,
    ) -> GatewayResult<GatewaySession> {
        require_param("userId", caller_id)?;
        require_param("organizationId", organization_id)?;
        require_param("channel", channel)?;
        require_param("chaincode", chaincode)?;

        let profile = self.resolver.resolve(organization_id)?;
        let label = derive_org_label(organization_id);
        let key = OwnerKey::for_caller(caller_id, label);
        let identity = self.wallet.get(label, &key)?;

        let peer = profile.gateway_peer();
        let mut endpoint = Endpoint::from_shared(peer.url.clone()).map_err(|e| {
            GatewayError::Ledger(LedgerError::Transport {
                function: "open".into(),
                message: format!("invalid peer url '{}': {}", peer.url, e),
            })
        })?;

        if let Some(pem) = &peer.tls_ca_pem {
            let tls = ClientTlsConfig::new()
                .ca_certificate(Certificate::from_pem(pem))
                .domain_name(peer.name.clone());
            endpoint = endpoint.tls_config(tls).map_err(|e| {
                GatewayError::Ledger(LedgerError::Transport {
                    function: "open".into(),
                    message: format!("invalid TLS material for peer '{}': {}", peer.name, e),
                })
            })?;
        }

        // Lazy transport: dials on first dispatch, never here.
        let transport = endpoint.connect_lazy();

        tracing::debug!(caller = caller_id, organization = organization_id,
            channel, chaincode, peer = %peer.url, "opened gateway session");

        Ok(GatewaySession {
            identity,
            caller_id: caller_id.to_string(),
            organization_id: organization_id.to_string(),
            channel: channel.to_string(),
            chaincode: chaincode.to_string(),
            client: Some(LedgerClient::new(transport)),
        })
    }

    /// Opens a session against the fixed authorization channel/chaincode.
    pub async fn open_authorization(
        &self,
        caller_id: &str,
        organization_id: &str,
    ) -> GatewayResult<GatewaySession> {
        self.open(
            caller_id,
            organization_id,
            self.config.authorization_channel(),
            self.config.authorization_chaincode(),
        )
        .await
    }
}

/// An open, identity-scoped binding to one channel/chaincode pair.
///
/// Never shared or reused across requests. Dispatch methods live in
/// [`crate::dispatch`].
#[derive(Debug)]
pub struct GatewaySession {
    pub(crate) identity: Identity,
    pub(crate) caller_id: String,
    pub(crate) organization_id: String,
    pub(crate) channel: String,
    pub(crate) chaincode: String,
    pub(crate) client: Option<LedgerClient<Channel>>,
}

impl GatewaySession {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn chaincode(&self) -> &str {
        &self.chaincode
    }

    pub fn caller_id(&self) -> &str {
        &self.caller_id
    }

    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_none()
    }

    /// Releases the session's transport. Safe to call more than once; the
    /// second and later calls are no-ops.
    pub fn close(&mut self) {
        if self.client.take().is_some() {
            tracing::debug!(caller = %self.caller_id, channel = %self.channel,
                chaincode = %self.chaincode, "closed gateway session");
        }
    }
}

fn require_param(name: &'static str, value: &str) -> GatewayResult<()> {
    if value.trim().is_empty() {
        return Err(GatewayError::MissingParameter(name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const ORG: &str = "labdemo.medchain.com";

    fn write_profile(dir: &Path, peer_url: &str) {
        let contents = serde_json::json!({
            "organization": ORG,
            "certificateAuthorities": {
                "ca.labdemo.medchain.com": { "url": "https://ca.labdemo.medchain.com:7054" }
            },
            "peers": {
                "peer0.labdemo.medchain.com": { "url": peer_url }
            },
            "channels": ["patients-channel", "identity-channel"]
        });
        fs::write(
            dir.join("connection-profile-labdemo.json"),
            contents.to_string(),
        )
        .unwrap();
    }

    fn manager(temp: &TempDir) -> GatewayManager {
        let profiles = temp.path().join("profiles");
        fs::create_dir_all(&profiles).unwrap();
        write_profile(&profiles, "http://127.0.0.1:1");
        GatewayManager::new(GatewayConfig::new(profiles, temp.path().join("wallet"))).unwrap()
    }

    fn enroll_user(temp: &TempDir, user_id: &str) {
        use medchain_enrollment::{BootstrapCredentials, EnrollmentService, LocalCaProvider};

        let bootstrap = BootstrapCredentials {
            enrollment_id: "admin".into(),
            secret: "adminpw".into(),
        };
        let service = EnrollmentService::new(
            ProfileResolver::new(temp.path().join("profiles")),
            Wallet::open(&temp.path().join("wallet")).unwrap(),
            LocalCaProvider::new(temp.path().join("ca"), bootstrap.clone()),
            bootstrap,
        );
        service.enroll_admin(ORG).unwrap();
        service
            .register_and_enroll(user_id, "labdemo.clients", ORG)
            .unwrap();
    }

    #[tokio::test]
    async fn open_rejects_empty_parameters_before_any_io() {
        let temp = TempDir::new().unwrap();
        // No profile is written: if validation did not fire first, these
        // calls would surface ProfileNotFound instead.
        let profiles = temp.path().join("profiles");
        fs::create_dir_all(&profiles).unwrap();
        let manager =
            GatewayManager::new(GatewayConfig::new(profiles, temp.path().join("wallet"))).unwrap();

        for (user, org, ch, cc, expected) in [
            ("", ORG, "ch", "cc", "userId"),
            ("u1", "", "ch", "cc", "organizationId"),
            ("u1", ORG, "", "cc", "channel"),
            ("u1", ORG, "ch", "", "chaincode"),
        ] {
            let err = manager.open(user, org, ch, cc).await.unwrap_err();
            match err {
                GatewayError::MissingParameter(name) => assert_eq!(name, expected),
                other => panic!("expected MissingParameter, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn open_for_unenrolled_user_is_identity_not_found() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);

        let err = manager
            .open("u1", ORG, "patients-channel", "clinical-records")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Wallet(medchain_wallet::WalletError::IdentityNotFound(_))
        ));
    }

    #[tokio::test]
    async fn open_for_unknown_organization_is_profile_not_found() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);

        let err = manager
            .open("u1", "nowhere.medchain.com", "ch", "cc")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Profile(medchain_network::ProfileError::ProfileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        enroll_user(&temp, "u1");

        let mut session = manager
            .open("u1", ORG, "patients-channel", "clinical-records")
            .await
            .unwrap();
        assert!(!session.is_closed());

        session.close();
        assert!(session.is_closed());
        // Second close is a no-op, not an error.
        session.close();
        assert!(session.is_closed());
    }

    #[tokio::test]
    async fn admin_caller_id_opens_admin_identity() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        enroll_user(&temp, "u1");

        let session = manager
            .open("Admin@labdemo", ORG, "patients-channel", "clinical-records")
            .await
            .unwrap();
        assert_eq!(session.identity.msp_id, "LabdemoMSP");
    }
}
