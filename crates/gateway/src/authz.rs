//! Cross-chaincode authorization guard.
//!
//! Clinical-record operations referencing a patient must be approved by the
//! authorization chaincode before they run. The guard is not special-cased
//! connection logic: it opens an ordinary short-lived session through the
//! same [`GatewayManager`], scoped to the fixed authorization
//! channel/chaincode pair, and evaluates the check function with
//! (patientId, callerId).
//!
//! The guard fails closed. Only the literal payload `"true"` authorizes;
//! a malformed patient reference, an unexpected payload, a missing identity
//! or a transport failure all mean "not authorized". Only a confirmed
//! `"false"` is logged as a genuine denial.

use crate::session::GatewayManager;
use crate::{GatewayError, GatewayResult};

/// Patient references look like `Patient/{id}`.
fn patient_id(reference: &str) -> Option<&str> {
    reference.split('/').nth(1).filter(|id| !id.is_empty())
}

/// Evaluates patient-level authorization for a caller.
#[derive(Clone, Debug)]
pub struct AuthorizationGuard {
    manager: GatewayManager,
}

impl AuthorizationGuard {
    pub fn new(manager: GatewayManager) -> Self {
        Self { manager }
    }

    /// Whether `caller_id` may operate on the patient named by
    /// `patient_reference` (`Patient/{id}`).
    ///
    /// Returns `false` on any outcome other than a confirmed `"true"`
    /// payload from the authorization chaincode.
    pub async fn is_authorized(
        &self,
        caller_id: &str,
        organization_id: &str,
        patient_reference: &str,
    ) -> bool {
        let Some(patient) = patient_id(patient_reference) else {
            tracing::warn!(reference = patient_reference,
                "malformed patient reference, refusing authorization");
            return false;
        };

        let mut session = match self
            .manager
            .open_authorization(caller_id, organization_id)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(caller = caller_id, error = %e,
                    "could not open authorization session, refusing");
                return false;
            }
        };

        let function = self.manager.config().authorization_function().to_string();
        let outcome = session.evaluate(&function, &[patient, caller_id]).await;
        session.close();

        match outcome {
            Ok(payload) if payload == "true" => true,
            Ok(payload) => {
                if payload == "false" {
                    tracing::info!(caller = caller_id, patient, "authorization denied");
                } else {
                    tracing::warn!(caller = caller_id, patient, %payload,
                        "unexpected authorization payload, refusing");
                }
                false
            }
            Err(e) => {
                tracing::error!(caller = caller_id, patient, error = %e,
                    "authorization check failed, refusing");
                false
            }
        }
    }

    /// Like [`is_authorized`](Self::is_authorized) but maps refusal to
    /// [`GatewayError::AuthorizationDenied`], the 403-class outcome the
    /// upstream controller layer translates for clients.
    pub async fn require(
        &self,
        caller_id: &str,
        organization_id: &str,
        patient_reference: &str,
    ) -> GatewayResult<()> {
        if self
            .is_authorized(caller_id, organization_id, patient_reference)
            .await
        {
            Ok(())
        } else {
            Err(GatewayError::AuthorizationDenied {
                caller: caller_id.to_string(),
                patient: patient_reference.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use medchain_ledger_proto::pb::ledger_server::{Ledger, LedgerServer};
    use medchain_ledger_proto::pb::{TransactionRequest, TransactionResponse};
    use std::fs;
    use std::net::SocketAddr;
    use std::path::Path;
    use tempfile::TempDir;
    use tokio_stream::wrappers::TcpListenerStream;
    use tonic::{Request, Response, Status};

    const ORG: &str = "labdemo.medchain.com";

    /// Authorization chaincode stub: patient `granted` is approved, patient
    /// `denied` is refused, patient `odd` answers nonsense, anything else
    /// errors.
    struct StubAuthorization;

    #[tonic::async_trait]
    impl Ledger for StubAuthorization {
        async fn evaluate(
            &self,
            request: Request<TransactionRequest>,
        ) -> Result<Response<TransactionResponse>, Status> {
            let req = request.into_inner();
            if req.function != "IsAuthorized" {
                return Err(Status::unknown(format!("function {} not found", req.function)));
            }
            let payload = match req.args.first().map(String::as_str) {
                Some("granted") => "true",
                Some("denied") => "false",
                Some("odd") => "approved",
                Some("empty") => "",
                _ => return Err(Status::aborted("no such patient")),
            };
            Ok(Response::new(TransactionResponse {
                payload: payload.as_bytes().to_vec(),
            }))
        }

        async fn submit(
            &self,
            _request: Request<TransactionRequest>,
        ) -> Result<Response<TransactionResponse>, Status> {
            Err(Status::unimplemented("authorization chaincode is read-only"))
        }
    }

    async fn spawn_stub() -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            tonic::transport::Server::builder()
                .add_service(LedgerServer::new(StubAuthorization))
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .unwrap();
        });
        addr
    }

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

    fn guard(temp: &TempDir, peer_url: &str) -> AuthorizationGuard {
        use medchain_enrollment::{BootstrapCredentials, EnrollmentService, LocalCaProvider};
        use medchain_network::ProfileResolver;
        use medchain_wallet::Wallet;

        let profiles = temp.path().join("profiles");
        fs::create_dir_all(&profiles).unwrap();
        write_profile(&profiles, peer_url);

        let bootstrap = BootstrapCredentials {
            enrollment_id: "admin".into(),
            secret: "adminpw".into(),
        };
        let enrollment = EnrollmentService::new(
            ProfileResolver::new(&profiles),
            Wallet::open(&temp.path().join("wallet")).unwrap(),
            LocalCaProvider::new(temp.path().join("ca"), bootstrap.clone()),
            bootstrap,
        );
        enrollment.enroll_admin(ORG).unwrap();
        enrollment
            .register_and_enroll("dr-rossi", "labdemo.clients", ORG)
            .unwrap();

        let manager =
            GatewayManager::new(GatewayConfig::new(profiles, temp.path().join("wallet")))
                .unwrap();
        AuthorizationGuard::new(manager)
    }

    #[test]
    fn patient_reference_parsing() {
        assert_eq!(patient_id("Patient/p1"), Some("p1"));
        assert_eq!(patient_id("Patient/"), None);
        assert_eq!(patient_id("p1"), None);
        assert_eq!(patient_id(""), None);
    }

    #[tokio::test]
    async fn exact_true_payload_authorizes() {
        let addr = spawn_stub().await;
        let temp = TempDir::new().unwrap();
        let guard = guard(&temp, &format!("http://{addr}"));

        assert!(guard.is_authorized("dr-rossi", ORG, "Patient/granted").await);
    }

    #[tokio::test]
    async fn any_other_payload_refuses() {
        let addr = spawn_stub().await;
        let temp = TempDir::new().unwrap();
        let guard = guard(&temp, &format!("http://{addr}"));

        assert!(!guard.is_authorized("dr-rossi", ORG, "Patient/denied").await);
        assert!(!guard.is_authorized("dr-rossi", ORG, "Patient/odd").await);
        assert!(!guard.is_authorized("dr-rossi", ORG, "Patient/empty").await);
        // Chaincode error path.
        assert!(!guard.is_authorized("dr-rossi", ORG, "Patient/missing").await);
    }

    #[tokio::test]
    async fn malformed_reference_refuses_without_network() {
        let temp = TempDir::new().unwrap();
        // Unreachable peer: if the guard tried the network it would still
        // refuse, but parsing must short-circuit first.
        let guard = guard(&temp, "http://127.0.0.1:1");

        assert!(!guard.is_authorized("dr-rossi", ORG, "granted").await);
    }

    #[tokio::test]
    async fn transport_failure_fails_closed() {
        let temp = TempDir::new().unwrap();
        let guard = guard(&temp, "http://127.0.0.1:1");

        assert!(!guard.is_authorized("dr-rossi", ORG, "Patient/granted").await);
    }

    #[tokio::test]
    async fn unenrolled_caller_fails_closed() {
        let addr = spawn_stub().await;
        let temp = TempDir::new().unwrap();
        let guard = guard(&temp, &format!("http://{addr}"));

        assert!(!guard.is_authorized("stranger", ORG, "Patient/granted").await);
    }

    #[tokio::test]
    async fn require_maps_refusal_to_authorization_denied() {
        let addr = spawn_stub().await;
        let temp = TempDir::new().unwrap();
        let guard = guard(&temp, &format!("http://{addr}"));

        guard.require("dr-rossi", ORG, "Patient/granted").await.unwrap();

        let err = guard
            .require("dr-rossi", ORG, "Patient/denied")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::AuthorizationDenied { .. }));
    }
}
