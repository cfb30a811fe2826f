//! Circuit loading and proof generation.
//!
//! ## Components
//!
//! - **backend**: the external proving system behind a trait, keyed by field
//! - **artifacts**: reading `<name>.vk`, `<name>.pk`, `<name>.ccs` from a blob store
//! - **cache**: load-once circuit cache with per-key locking
//! - **pipeline**: prove, self-verify and serialize, with a fault boundary
//! - **client**: typed entry points used by the signature adapters
//! - **native**: deterministic development backend (NOT zero-knowledge)

pub mod artifacts;
pub mod backend;
pub mod cache;
pub mod client;
pub mod native;
pub mod pipeline;

pub use backend::{
    Artifact, BackendRegistry, CompiledArtifacts, CompiledCircuit, ProofOptions, ProvingBackend,
    RecursionOptions,
};
pub use cache::{CircuitCache, CircuitLoader};
pub use client::ProvingClient;
pub use native::NativeBackend;
pub use pipeline::{catch_fault, prove, LoadCircuitResult, ProveResult};
