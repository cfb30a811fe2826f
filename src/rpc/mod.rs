//! RPC surface of the recovery service.
//!
//! - **hex**: serde adapters for hex quantities and hex bytes
//! - **jsonrpc**: JSON-RPC 2.0 envelope and method dispatch
//! - **server**: axum router with health check, CORS and request tracing
//!
//! # Features
//!
//! - `rpc-server`: enables the axum router (requires async runtime)

pub mod hex;
pub mod jsonrpc;

#[cfg(feature = "rpc-server")]
pub mod server;

pub use jsonrpc::{ProveSignatureParams, RpcError, RpcRequest, RpcResponse};

#[cfg(feature = "rpc-server")]
pub use server::router;

use num_bigint::BigUint;
use tracing::info;

use crate::error::Result;
use crate::proving::ProvingClient;
use crate::signatures::{self, ProveSignatureResponse, SignatureType};

/// Bits dropped from `newKey` to derive the in-circuit key
pub const NEW_KEY_SHIFT: usize = 2;

/// The `recover` RPC namespace
#[derive(Clone)]
pub struct Recover {
    client: ProvingClient,
}

impl Recover {
    /// Create the service over a proving client
    pub fn new(client: ProvingClient) -> Self {
        Self { client }
    }

    /// Proving client
    pub fn client(&self) -> &ProvingClient {
        &self.client
    }

    /// `recover_proveSignature`
    pub async fn prove_signature(
        &self,
        key: &BigUint,
        new_key: &BigUint,
        signature: &[u8],
        signature_type: &str,
    ) -> Result<ProveSignatureResponse> {
        info!(
            %key,
            %new_key,
            signature = %hex::encode_bytes(signature),
            signature_type,
            "ProveSignature"
        );
        let new_key = new_key >> NEW_KEY_SHIFT;
        let signature_type: SignatureType = signature_type.parse()?;
        signatures::prove_signature(key, &new_key, signature, signature_type, &self.client).await
    }
}
