//! Certificate-authority client seam and the local issuing CA.
//!
//! [`LocalCa`] issues real CA-signed X.509 material: a self-signed root per
//! organization, persisted under a state directory, signing ECDSA P-256 leaf
//! certificates for enrolled identities. Registration secrets are one-time
//! values held in memory for the duration of a register-then-enroll flow;
//! only the root certificate and key persist.

use crate::{CaError, CaResult};
use base64::{engine::general_purpose, Engine as _};
use medchain_network::OrganizationProfile;
use medchain_wallet::Identity;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType, Ia5String, IsCa,
    KeyPair, KeyUsagePurpose, SanType, SerialNumber,
};
use rand::RngCore;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const CA_CERTIFICATE_FILE: &str = "ca-certificate.pem";
const CA_PRIVATE_KEY_FILE: &str = "ca-private-key.pem";

/// Certificate and private key issued for one enrolled identity, both PEM.
#[derive(Clone, Debug)]
pub struct EnrolledMaterial {
    pub certificate: String,
    pub private_key: String,
}

/// Bootstrap enrollment id/secret pair for an organization's administrator.
///
/// Defined by network configuration and sourced from a secret store or the
/// environment, never embedded in code.
#[derive(Clone, Debug)]
pub struct BootstrapCredentials {
    pub enrollment_id: String,
    pub secret: String,
}

/// Client contract against an organization's certificate authority.
pub trait CertificateAuthority {
    /// Exchanges an enrollment id/secret pair for issued key material.
    fn enroll(&self, enrollment_id: &str, secret: &str) -> CaResult<EnrolledMaterial>;

    /// Registers a new client-role identity under the registrar's authority,
    /// returning the one-time secret to enroll it with.
    fn register(
        &self,
        registrar: &Identity,
        enrollment_id: &str,
        affiliation: &str,
    ) -> CaResult<String>;
}

/// Hands out a [`CertificateAuthority`] client for an organization.
pub trait CaProvider {
    type Ca: CertificateAuthority;

    fn certificate_authority(&self, profile: &OrganizationProfile) -> CaResult<Self::Ca>;
}

/// An rcgen-backed issuing CA for one organization.
///
/// The root certificate and key are created on first use and persist under
/// the state directory, so certificates issued across process restarts chain
/// to the same root.
pub struct LocalCa {
    organization_id: String,
    ca_cert: Certificate,
    ca_key: KeyPair,
    bootstrap: BootstrapCredentials,
    registrations: Mutex<HashMap<String, String>>,
}

impl LocalCa {
    /// Opens (or initialises) the CA for `organization_id` under `state_dir`.
    pub fn open(
        state_dir: &Path,
        organization_id: &str,
        bootstrap: BootstrapCredentials,
    ) -> CaResult<Self> {
        let ca_dir = state_dir.join(medchain_network::derive_org_label(organization_id));
        fs::create_dir_all(&ca_dir)?;

        let cert_path = ca_dir.join(CA_CERTIFICATE_FILE);
        let key_path = ca_dir.join(CA_PRIVATE_KEY_FILE);

        let (ca_cert, ca_key) = if cert_path.is_file() && key_path.is_file() {
            load_root(organization_id, &key_path)?
        } else {
            create_root(organization_id, &cert_path, &key_path)?
        };

        Ok(Self {
            organization_id: organization_id.to_string(),
            ca_cert,
            ca_key,
            bootstrap,
            registrations: Mutex::new(HashMap::new()),
        })
    }

    /// PEM of the root certificate, for TLS trust distribution.
    pub fn root_certificate_pem(&self) -> String {
        self.ca_cert.pem()
    }

    /// A poisoned lock only means another call panicked mid-update; the
    /// secret map itself stays coherent, so the guard is recovered.
    fn registrations(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.registrations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn issue(&self, enrollment_id: &str) -> CaResult<EnrolledMaterial> {
        let mut params = CertificateParams::default();

        let mut subject = DistinguishedName::new();
        subject.push(DnType::CommonName, enrollment_id);
        params.distinguished_name = subject;
        params.is_ca = IsCa::NoCa;

        // Bind the identity to its organization in subjectAltName.
        let uri = format!("medchain://{}/{}", self.organization_id, enrollment_id);
        let uri = Ia5String::try_from(uri).map_err(|e| CaError::Issuance(e.to_string()))?;
        params.subject_alt_names.push(SanType::URI(uri));

        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::ContentCommitment,
        ];

        let now = time::OffsetDateTime::now_utc();
        params.not_before = now;
        params.not_after = now + time::Duration::days(365);

        let mut serial = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut serial);
        params.serial_number = Some(SerialNumber::from(serial.to_vec()));

        let key_pair = KeyPair::generate().map_err(|e| CaError::Issuance(e.to_string()))?;
        let certificate = params
            .signed_by(&key_pair, &self.ca_cert, &self.ca_key)
            .map_err(|e| CaError::Issuance(e.to_string()))?;

        Ok(EnrolledMaterial {
            certificate: certificate.pem(),
            private_key: key_pair.serialize_pem(),
        })
    }
}

impl CertificateAuthority for LocalCa {
    fn enroll(&self, enrollment_id: &str, secret: &str) -> CaResult<EnrolledMaterial> {
        if enrollment_id == self.bootstrap.enrollment_id {
            if secret != self.bootstrap.secret {
                return Err(CaError::AuthenticationFailed(enrollment_id.to_string()));
            }
            tracing::info!(enrollment_id, organization = %self.organization_id,
                "issuing certificate");
            return self.issue(enrollment_id);
        }

        {
            let registrations = self.registrations();
            let expected = registrations
                .get(enrollment_id)
                .ok_or_else(|| CaError::UnknownEnrollmentId(enrollment_id.to_string()))?;
            if secret != expected {
                return Err(CaError::AuthenticationFailed(enrollment_id.to_string()));
            }
        }

        tracing::info!(enrollment_id, organization = %self.organization_id,
            "issuing certificate");
        let material = self.issue(enrollment_id)?;

        // Registration secrets are one-time: the first successful
        // enrollment consumes them.
        self.registrations().remove(enrollment_id);

        Ok(material)
    }

    fn register(
        &self,
        registrar: &Identity,
        enrollment_id: &str,
        affiliation: &str,
    ) -> CaResult<String> {
        if registrar.certificate.trim().is_empty() || registrar.private_key.trim().is_empty() {
            return Err(CaError::InvalidRegistrar(
                "registrar identity has empty key material".into(),
            ));
        }

        let mut registrations = self.registrations();
        if registrations.contains_key(enrollment_id) {
            return Err(CaError::AlreadyRegistered(enrollment_id.to_string()));
        }

        let mut raw = [0u8; 24];
        rand::thread_rng().fill_bytes(&mut raw);
        let secret = general_purpose::URL_SAFE_NO_PAD.encode(raw);

        registrations.insert(enrollment_id.to_string(), secret.clone());
        tracing::debug!(enrollment_id, affiliation, organization = %self.organization_id,
            "registered identity");

        Ok(secret)
    }
}

/// [`CaProvider`] for [`LocalCa`], one CA state directory for the network.
#[derive(Clone, Debug)]
pub struct LocalCaProvider {
    state_dir: PathBuf,
    bootstrap: BootstrapCredentials,
}

impl LocalCaProvider {
    pub fn new(state_dir: impl Into<PathBuf>, bootstrap: BootstrapCredentials) -> Self {
        Self {
            state_dir: state_dir.into(),
            bootstrap,
        }
    }
}

impl CaProvider for LocalCaProvider {
    type Ca = LocalCa;

    fn certificate_authority(&self, profile: &OrganizationProfile) -> CaResult<LocalCa> {
        LocalCa::open(
            &self.state_dir,
            &profile.organization_id,
            self.bootstrap.clone(),
        )
    }
}

fn root_params(organization_id: &str) -> CertificateParams {
    let mut params = CertificateParams::default();

    let mut subject = DistinguishedName::new();
    subject.push(DnType::CommonName, format!("ca.{organization_id}"));
    params.distinguished_name = subject;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];

    let now = time::OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + time::Duration::days(3650);

    params
}

fn create_root(
    organization_id: &str,
    cert_path: &Path,
    key_path: &Path,
) -> CaResult<(Certificate, KeyPair)> {
    let key_pair = KeyPair::generate().map_err(|e| CaError::Issuance(e.to_string()))?;
    let certificate = root_params(organization_id)
        .self_signed(&key_pair)
        .map_err(|e| CaError::Issuance(e.to_string()))?;

    fs::write(cert_path, certificate.pem())?;
    fs::write(key_path, key_pair.serialize_pem())?;
    tracing::info!(organization = organization_id, "initialised local certificate authority");

    Ok((certificate, key_pair))
}

fn load_root(organization_id: &str, key_path: &Path) -> CaResult<(Certificate, KeyPair)> {
    let key_pem = fs::read_to_string(key_path)?;
    let key_pair = KeyPair::from_pem(&key_pem).map_err(|e| CaError::Issuance(e.to_string()))?;

    // The issuer is re-materialised from the persisted key and the
    // deterministic root subject; issued leaves chain to the same root DN
    // and signing key across restarts.
    let certificate = root_params(organization_id)
        .self_signed(&key_pair)
        .map_err(|e| CaError::Issuance(e.to_string()))?;

    Ok((certificate, key_pair))
}
