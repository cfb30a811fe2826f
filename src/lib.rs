//! # Keyspace Recovery Prover
//!
//! Turns an authentication signature over a derived key into a PLONK proof
//! that the on-chain keyspace contract accepts as authorization for a key
//! rotation.
//!
//! ## Architecture
//!
//! - **Codec**: on-chain byte layouts of verifying keys, proofs and payloads
//! - **Circuits**: circuit families, assignments and witnesses
//! - **Proving**: backend abstraction, load-once cache and proving pipeline
//! - **Signatures**: secp256k1 and WebAuthn adapters
//! - **RPC**: the `recover_proveSignature` JSON-RPC service
//! - **Storage**: blob stores for compiled circuit artifacts
//!
//! ## Example
//!
//! ```rust,ignore
//! use keyspace_recovery::prelude::*;
//!
//! let cache = CircuitCache::new(Arc::new(FileStore::new("compiled/")), registry);
//! let service = Recover::new(ProvingClient::new(Arc::new(cache), None));
//! let response = service.prove_signature(&key, &new_key, &sig, "secp256k1").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod circuits;
pub mod codec;
pub mod config;
pub mod error;
pub mod fields;
pub mod proving;
pub mod rpc;
pub mod signatures;
pub mod storage;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::circuits::{CircuitMetadata, SECP256K1_ACCOUNT, WEBAUTHN_ACCOUNT};
    pub use crate::codec::{Proof, VerifyingKey};
    pub use crate::config::ServiceConfig;
    pub use crate::error::{Error, Result};
    pub use crate::fields::ScalarField;
    pub use crate::proving::{
        BackendRegistry, CircuitCache, CircuitLoader, NativeBackend, ProvingBackend,
        ProvingClient,
    };
    pub use crate::rpc::Recover;
    pub use crate::signatures::{ProveSignatureResponse, SignatureType};
    pub use crate::storage::{BlobStore, FileStore, InMemoryStore};
}

/// Service version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name
pub const SERVICE_NAME: &str = "keyspace-recovery";
