//! Build script for the `medchain-ledger-proto` crate.
//!
//! Generates Rust protobuf types for the ledger gateway RPC surface from
//! `gateway.proto`. Client codegen serves the gateway itself; server codegen
//! is kept so tests can stand up in-process ledger stubs.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let proto_file = std::path::Path::new(manifest_dir).join("gateway.proto");
    let proto_include_root = std::path::Path::new(manifest_dir);

    println!("cargo:rerun-if-changed={}", proto_file.display());
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .type_attribute(".", "#[derive(serde::Serialize, serde::Deserialize)]")
        .compile_protos(std::slice::from_ref(&proto_file), &[proto_include_root])?;

    Ok(())
}
