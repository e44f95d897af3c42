//! Enrollment orchestration: bootstrap admins, then application users.

use crate::ca::{BootstrapCredentials, CaProvider, CertificateAuthority};
use crate::{EnrollmentError, EnrollmentResult};
use medchain_network::{derive_org_label, ProfileResolver};
use medchain_wallet::{Identity, OwnerKey, Wallet};

/// Enrolls identities against organization certificate authorities and
/// persists them in the wallet.
///
/// The lifecycle per identity is `Unenrolled → Enrolling → Enrolled`; there
/// is no revocation or rotation. Both operations are safe to re-run:
/// [`enroll_admin`](Self::enroll_admin) is an idempotent no-op once the
/// admin entry exists, and [`register_and_enroll`](Self::register_and_enroll)
/// reports an existing user entry as
/// [`EnrollmentError::IdentityAlreadyExists`] without touching it.
pub struct EnrollmentService<P: CaProvider> {
    resolver: ProfileResolver,
    wallet: Wallet,
    provider: P,
    bootstrap: BootstrapCredentials,
}

impl<P: CaProvider> EnrollmentService<P> {
    pub fn new(
        resolver: ProfileResolver,
        wallet: Wallet,
        provider: P,
        bootstrap: BootstrapCredentials,
    ) -> Self {
        Self {
            resolver,
            wallet,
            provider,
            bootstrap,
        }
    }

    /// Enrolls the organization's administrator with its CA, once.
    ///
    /// Must complete before any user of the organization can be enrolled.
    /// Returns the admin's wallet owner key.
    ///
    /// # Errors
    ///
    /// Propagates profile resolution, CA and wallet failures. An existing
    /// admin entry is success, not an error.
    pub fn enroll_admin(&self, organization_id: &str) -> EnrollmentResult<OwnerKey> {
        let label = derive_org_label(organization_id).to_string();
        let admin_key = OwnerKey::admin(&label);

        if self.wallet.exists(&label, &admin_key) {
            tracing::info!(organization = organization_id,
                "administrator already enrolled, skipping");
            return Ok(admin_key);
        }

        let profile = self.resolver.resolve(organization_id)?;
        let ca = self.provider.certificate_authority(&profile)?;

        let material = ca.enroll(&self.bootstrap.enrollment_id, &self.bootstrap.secret)?;
        let identity = Identity {
            msp_id: profile.msp_id,
            certificate: material.certificate,
            private_key: material.private_key,
        };

        self.wallet.put(&label, &admin_key, &identity)?;
        tracing::info!(organization = organization_id, "administrator enrolled");

        Ok(admin_key)
    }

    /// Registers and enrolls an application user under the organization's
    /// administrator, returning the user's wallet owner key.
    ///
    /// # Errors
    ///
    /// - [`EnrollmentError::AdminNotEnrolled`] if the admin entry is missing
    ///   (nothing is written in that case)
    /// - [`EnrollmentError::IdentityAlreadyExists`] if the user already has a
    ///   wallet entry (callers treating enrollment as ensure-present handle
    ///   this as success)
    pub fn register_and_enroll(
        &self,
        user_id: &str,
        affiliation: &str,
        organization_id: &str,
    ) -> EnrollmentResult<OwnerKey> {
        let label = derive_org_label(organization_id).to_string();
        let admin_key = OwnerKey::admin(&label);

        if !self.wallet.exists(&label, &admin_key) {
            return Err(EnrollmentError::AdminNotEnrolled(
                organization_id.to_string(),
            ));
        }

        let user_key = OwnerKey::user(user_id);
        if self.wallet.exists(&label, &user_key) {
            return Err(EnrollmentError::IdentityAlreadyExists(user_id.to_string()));
        }

        let profile = self.resolver.resolve(organization_id)?;
        let registrar = self.wallet.get(&label, &admin_key)?;
        let ca = self.provider.certificate_authority(&profile)?;

        let secret = ca.register(&registrar, user_id, affiliation)?;
        let material = ca.enroll(user_id, &secret)?;
        let identity = Identity {
            msp_id: profile.msp_id,
            certificate: material.certificate,
            private_key: material.private_key,
        };

        self.wallet.put(&label, &user_key, &identity)?;
        tracing::info!(organization = organization_id, affiliation, "user enrolled");

        Ok(user_key)
    }
}
