//! # MedChain Ledger Proto
//!
//! Protobuf-generated types for the ledger gateway RPC surface.
//!
//! Contains the `pb` module with the `Ledger` client used by
//! `medchain-gateway` and the server skeleton used by test stubs. The wire
//! contract is deliberately string-typed: chaincode functions are invoked by
//! name with string-only positional arguments, and payloads come back as
//! opaque bytes.

// Re-export the generated protobuf module. The generated code is placed into
// OUT_DIR at build time by the build script.
pub mod pb {
    tonic::include_proto!("medchain.gateway.v1");
}

pub use pb::*;
