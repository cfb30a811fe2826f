//! Signature adapters.
//!
//! Each adapter validates a raw authentication signature over the derived new
//! key, turns the signer's public key into the 256-byte "current data" payload,
//! and proves the matching account circuit. The response carries everything
//! the on-chain recovery call needs: proof, verifying key and current data.

pub mod secp256k1;
pub mod webauthn;

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::codec::data::{data_to_chunks, CHUNK_COUNT, RAW_DATA_SIZE};
use crate::codec::{Proof, VerifyingKey};
use crate::error::{Error, Result};
use crate::fields::{be_bytes, Bls12377Fr, Element};
use crate::proving::{Artifact, CompiledCircuit, ProvingClient};
use crate::rpc::hex;

// ═══════════════════════════════════════════════════════════════════════════════
// SIGNATURE TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Supported signature schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureType {
    /// 65-byte `(r, s, v)` ECDSA signature over secp256k1
    Secp256k1,
    /// ABI-encoded WebAuthn assertion signed with a P-256 key
    Webauthn,
}

impl SignatureType {
    /// Wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Secp256k1 => "secp256k1",
            Self::Webauthn => "webauthn",
        }
    }
}

impl fmt::Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "secp256k1" => Ok(Self::Secp256k1),
            "webauthn" => Ok(Self::Webauthn),
            other => Err(Error::UnsupportedSignatureType(other.to_string())),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESPONSE
// ═══════════════════════════════════════════════════════════════════════════════

/// Proof of an authorized key rotation, in on-chain encodings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProveSignatureResponse {
    /// 1,504-byte proof
    #[serde(with = "hex::bytes")]
    pub proof: Vec<u8>,
    /// 1,664-byte verifying key of the circuit that produced the proof
    #[serde(with = "hex::bytes")]
    pub current_vk: Vec<u8>,
    /// 256-byte public key payload of the current signer
    #[serde(with = "hex::bytes")]
    pub current_data: Vec<u8>,
}

impl ProveSignatureResponse {
    /// Serialize a BLS12-377 proof and the circuit's verifying key
    pub fn from_artifacts(
        proof: &Artifact,
        compiled: &CompiledCircuit,
        current_data: Vec<u8>,
    ) -> Result<Self> {
        let proof = proof.downcast_ref::<Proof>().ok_or(Error::InvalidProof)?;
        let vk = compiled
            .vk_as::<VerifyingKey>()
            .ok_or(Error::InvalidVerifyingKey)?;
        Ok(Self {
            proof: proof.to_bytes()?,
            current_vk: vk.to_bytes()?,
            current_data,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISPATCH
// ═══════════════════════════════════════════════════════════════════════════════

/// Prove that the holder of the key behind `signature` authorized `new_key`.
///
/// `new_key` is the already-derived key (the RPC layer shifts it right by two bits).
pub async fn prove_signature(
    key: &BigUint,
    new_key: &BigUint,
    signature: &[u8],
    signature_type: SignatureType,
    client: &ProvingClient,
) -> Result<ProveSignatureResponse> {
    info!(%key, %new_key, %signature_type, "Proving signature");
    match signature_type {
        SignatureType::Secp256k1 => {
            secp256k1::prove_signature(key, new_key, signature, signature_type, client).await
        }
        SignatureType::Webauthn => {
            webauthn::prove_signature(key, new_key, signature, signature_type, client).await
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Derived key as a 32-byte big-endian digest
pub fn key_digest(new_key: &BigUint) -> Result<[u8; 32]> {
    if new_key.bits() > 256 {
        return Err(Error::InvalidParameter {
            name: "newKey".into(),
            reason: "exceeds 256 bits".into(),
        });
    }
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&be_bytes(new_key, 32));
    Ok(digest)
}

/// Derived key as a circuit value
pub fn new_key_element(new_key: &BigUint) -> Result<Element<Bls12377Fr>> {
    Element::new(new_key.clone()).ok_or_else(|| {
        Error::Witness("new key does not fit the BLS12-377 scalar field".into())
    })
}

/// Public key coordinates as the 256-byte current-data payload
pub fn public_key_to_data(x: &[u8; 32], y: &[u8; 32]) -> Vec<u8> {
    let mut data = vec![0u8; RAW_DATA_SIZE];
    data[..32].copy_from_slice(x);
    data[32..64].copy_from_slice(y);
    data
}

/// Payload plus its chunked circuit form
pub fn public_key_to_circuit_data(
    x: &[u8; 32],
    y: &[u8; 32],
) -> Result<(Vec<u8>, [Element<Bls12377Fr>; CHUNK_COUNT])> {
    let data = public_key_to_data(x, y);
    let chunks = data_to_chunks::<Bls12377Fr>(&data)?;
    Ok((data, chunks.elements))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::plonk::tests::{sample_proof, sample_vk};
    use crate::fields::ScalarField;
    use std::sync::Arc;

    #[test]
    fn test_signature_type_parse() {
        assert_eq!("secp256k1".parse::<SignatureType>().unwrap(), SignatureType::Secp256k1);
        assert_eq!("webauthn".parse::<SignatureType>().unwrap(), SignatureType::Webauthn);
        let err = "ed25519".parse::<SignatureType>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported signature type");
        assert!("Secp256k1".parse::<SignatureType>().is_err());
    }

    #[test]
    fn test_key_digest_left_pads() {
        let digest = key_digest(&BigUint::from(0x0102u16)).unwrap();
        assert_eq!(&digest[..30], &[0u8; 30]);
        assert_eq!(&digest[30..], &[1, 2]);
        assert!(key_digest(&(BigUint::from(1u8) << 256)).is_err());
    }

    #[test]
    fn test_public_key_to_data() {
        let (data, elements) = public_key_to_circuit_data(&[0xaa; 32], &[0xbb; 32]).unwrap();
        assert_eq!(data.len(), 256);
        assert_eq!(&data[..32], &[0xaa; 32]);
        assert_eq!(&data[32..64], &[0xbb; 32]);
        assert!(data[64..].iter().all(|&b| b == 0));
        assert_eq!(elements[0].value(), &BigUint::from_bytes_be(&data[..31]));
    }

    #[test]
    fn test_response_serializes_hex() {
        let proof: Artifact = Arc::new(sample_proof());
        let compiled = CompiledCircuit {
            field: ScalarField::Bls12_377,
            ccs: Arc::new(()),
            pk: Arc::new(()),
            vk: Arc::new(sample_vk()),
        };
        let response = ProveSignatureResponse::from_artifacts(&proof, &compiled, vec![1, 2]).unwrap();
        assert_eq!(response.proof.len(), 1504);
        assert_eq!(response.current_vk.len(), 1664);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["currentData"], "0x0102");
        assert!(json["proof"].as_str().unwrap().starts_with("0x"));

        let foreign: Artifact = Arc::new(());
        assert_eq!(
            ProveSignatureResponse::from_artifacts(&foreign, &compiled, vec![]),
            Err(Error::InvalidProof)
        );
    }
}
