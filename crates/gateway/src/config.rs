//! Gateway runtime configuration.
//!
//! Resolved once at process startup and passed into the manager, so request
//! handling never reads process-wide environment state.

use std::path::{Path, PathBuf};

/// Channel the authorization chaincode lives on.
pub const AUTHORIZATION_CHANNEL: &str = "identity-channel";
/// Name of the authorization chaincode.
pub const AUTHORIZATION_CHAINCODE: &str = "authorization";
/// Boolean-returning check function on the authorization chaincode.
pub const AUTHORIZATION_FUNCTION: &str = "IsAuthorized";

/// Configuration for the gateway layer.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    profiles_dir: PathBuf,
    wallet_dir: PathBuf,
    authorization_channel: String,
    authorization_chaincode: String,
    authorization_function: String,
}

impl GatewayConfig {
    /// Creates a configuration with the default authorization target.
    pub fn new(profiles_dir: impl Into<PathBuf>, wallet_dir: impl Into<PathBuf>) -> Self {
        Self {
            profiles_dir: profiles_dir.into(),
            wallet_dir: wallet_dir.into(),
            authorization_channel: AUTHORIZATION_CHANNEL.to_string(),
            authorization_chaincode: AUTHORIZATION_CHAINCODE.to_string(),
            authorization_function: AUTHORIZATION_FUNCTION.to_string(),
        }
    }

    /// Overrides the fixed authorization channel/chaincode/function triple.
    pub fn with_authorization(
        mut self,
        channel: impl Into<String>,
        chaincode: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        self.authorization_channel = channel.into();
        self.authorization_chaincode = chaincode.into();
        self.authorization_function = function.into();
        self
    }

    pub fn profiles_dir(&self) -> &Path {
        &self.profiles_dir
    }

    pub fn wallet_dir(&self) -> &Path {
        &self.wallet_dir
    }

    pub fn authorization_channel(&self) -> &str {
        &self.authorization_channel
    }

    pub fn authorization_chaincode(&self) -> &str {
        &self.authorization_chaincode
    }

    pub fn authorization_function(&self) -> &str {
        &self.authorization_function
    }
}
