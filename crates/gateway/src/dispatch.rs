//! Transaction dispatch through an open session.
//!
//! The chaincode RPC surface is untyped: string function names, string-only
//! positional arguments, opaque byte payloads. Richer domain types stay on
//! the caller's side of this boundary. Every dispatched request is signed
//! with the session identity's ECDSA P-256 key over a length-framed digest
//! payload, so the peer can attribute the call to the enrolled certificate.
//!
//! Failure classification:
//!
//! - gRPC `Unavailable`, `DeadlineExceeded`, `Cancelled` and connection-level
//!   errors → [`LedgerError::Transport`] (potentially retryable)
//! - any other status is a response produced by the remote chaincode →
//!   [`LedgerError::ChaincodeRejected`] (not retryable unchanged)
//!
//! No retries happen here.

use crate::session::GatewaySession;
use crate::LedgerError;
use medchain_ledger_proto::pb::TransactionRequest;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::DecodePrivateKey;
use rand::RngCore;
use tonic::{Code, Status};

impl GatewaySession {
    /// Runs a read-only query against the bound chaincode.
    ///
    /// The result is read-local and does not change ledger state.
    pub async fn evaluate(&mut self, function: &str, args: &[&str]) -> Result<String, LedgerError> {
        if self.client.is_none() {
            return Err(LedgerError::SessionClosed);
        }
        let request = self.signed_request(function, args)?;
        let client = self.client.as_mut().ok_or(LedgerError::SessionClosed)?;

        match client.evaluate(request).await {
            Ok(response) => Ok(normalize_payload(response.into_inner().payload)),
            Err(status) => Err(classify(function, status)),
        }
    }

    /// Proposes a state-changing transaction to the bound chaincode.
    ///
    /// The returned payload is the chaincode's return value, not a receipt
    /// guarantee beyond what the ledger platform itself provides.
    pub async fn submit(&mut self, function: &str, args: &[&str]) -> Result<String, LedgerError> {
        if self.client.is_none() {
            return Err(LedgerError::SessionClosed);
        }
        let request = self.signed_request(function, args)?;
        let client = self.client.as_mut().ok_or(LedgerError::SessionClosed)?;

        match client.submit(request).await {
            Ok(response) => Ok(normalize_payload(response.into_inner().payload)),
            Err(status) => Err(classify(function, status)),
        }
    }

    fn signed_request(
        &self,
        function: &str,
        args: &[&str],
    ) -> Result<TransactionRequest, LedgerError> {
        let signing_key = SigningKey::from_pkcs8_pem(&self.identity.private_key)
            .map_err(|e| LedgerError::InvalidKeyMaterial(e.to_string()))?;

        let mut nonce = [0u8; 24];
        rand::thread_rng().fill_bytes(&mut nonce);

        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let payload = digest_payload(
            &self.identity.msp_id,
            &self.channel,
            &self.chaincode,
            function,
            &args,
            &nonce,
        );

        // Raw 64-byte r||s signature, not DER.
        let signature: Signature = signing_key.sign(&payload);

        Ok(TransactionRequest {
            channel: self.channel.clone(),
            chaincode: self.chaincode.clone(),
            function: function.to_string(),
            args,
            msp_id: self.identity.msp_id.clone(),
            certificate: self.identity.certificate.clone(),
            signature: signature.to_bytes().to_vec(),
            nonce: nonce.to_vec(),
        })
    }
}

/// Length-framed signing payload: each field is prefixed with its byte
/// length so field boundaries cannot be confused.
fn digest_payload(
    msp_id: &str,
    channel: &str,
    chaincode: &str,
    function: &str,
    args: &[String],
    nonce: &[u8],
) -> Vec<u8> {
    let mut payload = Vec::new();
    for part in [msp_id, channel, chaincode, function] {
        payload.extend_from_slice(&(part.len() as u64).to_be_bytes());
        payload.extend_from_slice(part.as_bytes());
    }
    payload.extend_from_slice(&(args.len() as u64).to_be_bytes());
    for arg in args {
        payload.extend_from_slice(&(arg.len() as u64).to_be_bytes());
        payload.extend_from_slice(arg.as_bytes());
    }
    payload.extend_from_slice(nonce);
    payload
}

/// Normalizes a chaincode payload to a string regardless of whether the
/// transport returned binary or text.
fn normalize_payload(payload: Vec<u8>) -> String {
    match String::from_utf8(payload) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

fn classify(function: &str, status: Status) -> LedgerError {
    match status.code() {
        Code::Unavailable | Code::DeadlineExceeded | Code::Cancelled => {
            tracing::warn!(function, code = %status.code(), "ledger transport failure");
            LedgerError::Transport {
                function: function.to_string(),
                message: status.message().to_string(),
            }
        }
        _ => {
            tracing::debug!(function, code = %status.code(), "chaincode rejected transaction");
            LedgerError::ChaincodeRejected {
                function: function.to_string(),
                message: status.message().to_string(),
            }
        }
    }
}
