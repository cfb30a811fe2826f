//! Binary codec for verifying keys, proofs and opaque payloads.
//!
//! Three representations are supported:
//! - **On-chain bytes**: fixed layouts consumed by the verifier contract
//! - **Big integers / outer-field elements**: what the recursion circuit consumes
//! - **Byte words**: element re-expression that reproduces the on-chain bytes

pub mod bigint;
pub mod data;
pub mod plonk;
pub mod words;

pub use bigint::{
    proof_from_big_ints, proof_to_big_ints, vk_from_big_ints, vk_to_big_ints, ProofElements,
    VkElements,
};
pub use data::{data_from_elements, data_to_chunks, DataChunks, RAW_DATA_SIZE};
pub use plonk::{Proof, VerifyingKey, PROOF_SIZE, VERIFYING_KEY_SIZE};
pub use words::{emulated_proof_to_bytes, emulated_vk_to_bytes};
