//! WebAuthn (P-256) adapter.
//!
//! The signature payload is the ABI encoding of `(bytes32 x, bytes32 y, bytes
//! webAuthnAuth)`. The circuit re-hashes the client data JSON, so the adapter
//! hands it the part after the challenge already SHA-256 padded.

use alloy_sol_types::{sol, sol_data, SolType};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use num_bigint::BigUint;
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::{EncodedPoint, FieldBytes};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{
    key_digest, new_key_element, public_key_to_circuit_data, ProveSignatureResponse,
    SignatureType,
};
use crate::circuits::accounts::{AUTHENTICATOR_DATA_SIZE, PADDED_CLIENT_DATA_SUFFIX_SIZE};
use crate::circuits::{EmulatedSignature, WebauthnAccount, WEBAUTHN_ACCOUNT};
use crate::error::{Error, Result};
use crate::fields::{Element, P256Fr};
use crate::proving::ProvingClient;

/// Client data JSON must start with this, followed by the challenge
pub const CLIENT_DATA_JSON_PREFIX: &str = r#"{"type":"webauthn.get","challenge":""#;

/// Length of the base64url (unpadded) challenge
pub const CHALLENGE_LENGTH: usize = 43;

/// Most SHA-256 blocks the circuit hashes for the client data JSON
pub const MAX_CLIENT_DATA_BLOCKS: usize = 5;

const SHA256_BLOCK: usize = 64;
// 0x80 marker plus the 64-bit length
const SHA256_PADDING_OVERHEAD: usize = 9;

sol! {
    /// WebAuthn assertion as submitted on-chain
    struct WebAuthnAuth {
        bytes authenticatorData;
        bytes clientDataJSON;
        uint256 challengeIndex;
        uint256 typeIndex;
        uint256 r;
        uint256 s;
    }
}

type SignatureData = (sol_data::FixedBytes<32>, sol_data::FixedBytes<32>, sol_data::Bytes);

/// Decoded signature payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAuthnSignature {
    /// Public key X coordinate
    pub x: [u8; 32],
    /// Public key Y coordinate
    pub y: [u8; 32],
    /// Authenticator data
    pub authenticator_data: Vec<u8>,
    /// Client data JSON
    pub client_data_json: Vec<u8>,
    /// Offset of the challenge in the client data JSON
    pub challenge_index: BigUint,
    /// Offset of the type in the client data JSON
    pub type_index: BigUint,
    /// Signature R
    pub r: [u8; 32],
    /// Signature S
    pub s: [u8; 32],
}

impl WebAuthnSignature {
    /// Decode the ABI payload
    pub fn decode(data: &[u8]) -> Result<Self> {
        let (x, y, auth) = <SignatureData as SolType>::abi_decode_params(data, true)
            .map_err(|e| Error::Abi(e.to_string()))?;
        let auth = <WebAuthnAuth as SolType>::abi_decode(&auth, true)
            .map_err(|e| Error::Abi(e.to_string()))?;

        Ok(Self {
            x: x.0,
            y: y.0,
            authenticator_data: auth.authenticatorData.to_vec(),
            client_data_json: auth.clientDataJSON.to_vec(),
            challenge_index: BigUint::from_bytes_be(&auth.challengeIndex.to_be_bytes::<32>()),
            type_index: BigUint::from_bytes_be(&auth.typeIndex.to_be_bytes::<32>()),
            r: auth.r.to_be_bytes::<32>(),
            s: auth.s.to_be_bytes::<32>(),
        })
    }

    /// Hash the authenticator signs: `sha256(authenticatorData || sha256(clientDataJSON))`
    pub fn signed_hash(&self) -> [u8; 32] {
        let client_hash = Sha256::digest(&self.client_data_json);
        let mut h = Sha256::new();
        h.update(&self.authenticator_data);
        h.update(client_hash);
        h.finalize().into()
    }

    /// Verify the P-256 signature against the embedded public key
    pub fn verify(&self) -> Result<()> {
        let point = EncodedPoint::from_affine_coordinates(
            FieldBytes::from_slice(&self.x),
            FieldBytes::from_slice(&self.y),
            false,
        );
        let key = VerifyingKey::from_encoded_point(&point).map_err(|_| Error::InvalidSignature)?;
        let sig = Signature::from_scalars(self.r, self.s).map_err(|_| Error::InvalidSignature)?;
        key.verify_prehash(&self.signed_hash(), &sig)
            .map_err(|_| Error::InvalidSignature)
    }

    /// Client data after the expected prefix and challenge
    pub fn client_data_suffix(&self, digest: &[u8; 32]) -> Result<&[u8]> {
        // TODO: enforce challengeIndex and typeIndex once the WebAuthn circuit
        // takes them as inputs; today only the fixed prefix is checked.
        let expected = format!("{}{}", CLIENT_DATA_JSON_PREFIX, URL_SAFE_NO_PAD.encode(digest));
        self.client_data_json
            .strip_prefix(expected.as_bytes())
            .ok_or_else(|| Error::InvalidClientData("unexpected type or challenge".into()))
    }

    /// Authenticator data as the fixed-size circuit input
    pub fn authenticator_data(&self) -> Result<[u8; AUTHENTICATOR_DATA_SIZE]> {
        self.authenticator_data
            .as_slice()
            .try_into()
            .map_err(|_| Error::InvalidAuthenticatorData {
                expected: AUTHENTICATOR_DATA_SIZE,
                got: self.authenticator_data.len(),
            })
    }

    /// Signature as emulated P-256 scalars
    pub fn emulated_signature(&self) -> Result<EmulatedSignature<P256Fr>> {
        Ok(EmulatedSignature {
            r: Element::from_be_bytes(&self.r).ok_or(Error::InvalidSignature)?,
            s: Element::from_be_bytes(&self.s).ok_or(Error::InvalidSignature)?,
        })
    }
}

/// SHA-256 pad the client data suffix.
///
/// The full message is prefix (36 bytes) + challenge (43 bytes) + suffix. The
/// returned buffer holds the suffix, `0x80`, zeros, and the 64-bit message bit
/// length ending on the boundary of the last block. Also returns the total
/// block count, first block included.
pub fn padded_client_data_suffix(
    suffix: &[u8],
) -> Result<([u8; PADDED_CLIENT_DATA_SUFFIX_SIZE], usize)> {
    let head = CLIENT_DATA_JSON_PREFIX.len() + CHALLENGE_LENGTH;
    let message_len = head + suffix.len();
    let blocks = (message_len + SHA256_PADDING_OVERHEAD).div_ceil(SHA256_BLOCK);
    if blocks > MAX_CLIENT_DATA_BLOCKS {
        return Err(Error::InvalidClientData(format!(
            "client data suffix of {} bytes does not fit {} SHA-256 blocks",
            suffix.len(),
            MAX_CLIENT_DATA_BLOCKS
        )));
    }

    let mut buf = [0u8; PADDED_CLIENT_DATA_SUFFIX_SIZE];
    buf[..suffix.len()].copy_from_slice(suffix);
    buf[suffix.len()] = 0x80;
    let end = blocks * SHA256_BLOCK - head;
    buf[end - 8..end].copy_from_slice(&(8 * message_len as u64).to_be_bytes());
    Ok((buf, blocks))
}

/// Prove a key rotation authorized by a WebAuthn assertion over the derived key
pub async fn prove_signature(
    key: &BigUint,
    new_key: &BigUint,
    signature: &[u8],
    signature_type: SignatureType,
    client: &ProvingClient,
) -> Result<ProveSignatureResponse> {
    debug!(%key, %signature_type, "Verifying WebAuthn assertion");
    let auth = WebAuthnSignature::decode(signature)?;
    auth.verify()?;

    let (current_data, current_data_input) = public_key_to_circuit_data(&auth.x, &auth.y)?;
    let digest = key_digest(new_key)?;
    let (padded_suffix, block_count) = padded_client_data_suffix(auth.client_data_suffix(&digest)?)?;

    let assignment = WebauthnAccount {
        current_data: current_data_input,
        new_key: new_key_element(new_key)?,
        sig: auth.emulated_signature()?,
        client_data_suffix_block_count: block_count,
        padded_client_data_suffix: padded_suffix,
        authenticator_data: auth.authenticator_data()?,
    };

    let compiled = client.load(&WEBAUTHN_ACCOUNT, 0).await?;
    let proof = client
        .prove_assignment(&WEBAUTHN_ACCOUNT, &compiled, &assignment)
        .await?;
    info!(id = WEBAUTHN_ACCOUNT.id, "Signature proof ready");

    ProveSignatureResponse::from_artifacts(&proof, &compiled, current_data)
}

/// Encode a signature payload (for tools and tests)
pub fn encode_signature(sig: &WebAuthnSignature) -> Vec<u8> {
    use alloy_primitives::{Bytes, FixedBytes, U256};
    use alloy_sol_types::SolValue;

    let auth = WebAuthnAuth {
        authenticatorData: Bytes::copy_from_slice(&sig.authenticator_data),
        clientDataJSON: Bytes::copy_from_slice(&sig.client_data_json),
        challengeIndex: U256::from_be_slice(&sig.challenge_index.to_bytes_be()),
        typeIndex: U256::from_be_slice(&sig.type_index.to_bytes_be()),
        r: U256::from_be_bytes(sig.r),
        s: U256::from_be_bytes(sig.s),
    };
    (
        FixedBytes::<32>::from(sig.x),
        FixedBytes::<32>::from(sig.y),
        Bytes::from(auth.abi_encode()),
    )
        .abi_encode_params()
}
