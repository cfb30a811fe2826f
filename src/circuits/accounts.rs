//! Account circuit assignments.
//!
//! Both account circuits expose the same public interface: the nine chunks of
//! the current key payload followed by the new key. Emulated scalars (signature
//! components over a foreign curve) are witnessed as 64-bit limbs.

use num_bigint::BigUint;

use super::witness::Assignment;
use crate::codec::data::CHUNK_COUNT;
use crate::fields::{Bls12377Fr, Element, FieldParams, P256Fr};

/// Padded WebAuthn client data suffix length
pub const PADDED_CLIENT_DATA_SUFFIX_SIZE: usize = 241;
/// WebAuthn authenticator data length
pub const AUTHENTICATOR_DATA_SIZE: usize = 37;

/// Public values shared by every account circuit
pub const NB_PUBLIC: usize = CHUNK_COUNT + 1;
/// Secret values of the ECDSA account circuit
pub const ECDSA_NB_SECRET: usize = 2 * 4;
/// Secret values of the WebAuthn account circuit
pub const WEBAUTHN_NB_SECRET: usize =
    2 * 4 + 1 + PADDED_CLIENT_DATA_SUFFIX_SIZE + AUTHENTICATOR_DATA_SIZE;

/// ECDSA signature over the scalar field `S`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatedSignature<S: FieldParams> {
    /// R component
    pub r: Element<S>,
    /// S component
    pub s: Element<S>,
}

impl<S: FieldParams> EmulatedSignature<S> {
    fn push_limbs(&self, out: &mut Vec<BigUint>) {
        for limb in self.r.limbs().into_iter().chain(self.s.limbs()) {
            out.push(BigUint::from(limb));
        }
    }
}

/// Key-rotation assignment authorized by an ECDSA signature over `S`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcdsaAccount<S: FieldParams> {
    /// Current key payload, chunked
    pub current_data: [Element<Bls12377Fr>; CHUNK_COUNT],
    /// New key
    pub new_key: Element<Bls12377Fr>,
    /// Signature over the new key
    pub sig: EmulatedSignature<S>,
}

impl<S: FieldParams> Assignment for EcdsaAccount<S> {
    fn public_values(&self) -> Vec<BigUint> {
        public_values(&self.current_data, &self.new_key)
    }

    fn secret_values(&self) -> Vec<BigUint> {
        let mut out = Vec::with_capacity(ECDSA_NB_SECRET);
        self.sig.push_limbs(&mut out);
        out
    }
}

/// Key-rotation assignment authorized by a WebAuthn assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebauthnAccount {
    /// Current key payload, chunked
    pub current_data: [Element<Bls12377Fr>; CHUNK_COUNT],
    /// New key
    pub new_key: Element<Bls12377Fr>,
    /// P-256 signature
    pub sig: EmulatedSignature<P256Fr>,
    /// SHA-256 block count of the client data JSON
    pub client_data_suffix_block_count: usize,
    /// Client data after the challenge, SHA-256 padded
    pub padded_client_data_suffix: [u8; PADDED_CLIENT_DATA_SUFFIX_SIZE],
    /// Raw authenticator data
    pub authenticator_data: [u8; AUTHENTICATOR_DATA_SIZE],
}

impl Assignment for WebauthnAccount {
    fn public_values(&self) -> Vec<BigUint> {
        public_values(&self.current_data, &self.new_key)
    }

    fn secret_values(&self) -> Vec<BigUint> {
        let mut out = Vec::with_capacity(WEBAUTHN_NB_SECRET);
        self.sig.push_limbs(&mut out);
        out.push(BigUint::from(self.client_data_suffix_block_count));
        out.extend(self.padded_client_data_suffix.iter().map(|&b| BigUint::from(b)));
        out.extend(self.authenticator_data.iter().map(|&b| BigUint::from(b)));
        out
    }
}

fn public_values(
    current_data: &[Element<Bls12377Fr>; CHUNK_COUNT],
    new_key: &Element<Bls12377Fr>,
) -> Vec<BigUint> {
    current_data
        .iter()
        .chain(std::iter::once(new_key))
        .map(|e| e.value().clone())
        .collect()
}
