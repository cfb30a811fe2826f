//! secp256k1 ECDSA adapter.

use num_bigint::BigUint;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1};
use tracing::{debug, info};

use super::{
    key_digest, new_key_element, public_key_to_circuit_data, ProveSignatureResponse,
    SignatureType,
};
use crate::circuits::{EcdsaAccount, EmulatedSignature, SECP256K1_ACCOUNT};
use crate::error::{Error, Result};
use crate::fields::{Element, Secp256k1Fr};
use crate::proving::ProvingClient;

/// Length of an `(r, s, v)` signature
pub const SIGNATURE_LENGTH: usize = 65;

/// Offset added to the recovery id by Ethereum signing tools
const RECOVERY_ID_OFFSET: u8 = 27;

thread_local! {
    static SECP: Secp256k1<secp256k1::VerifyOnly> = Secp256k1::verification_only();
}

/// Execute a function with the secp256k1 context
fn with_secp<F, R>(f: F) -> R
where
    F: FnOnce(&Secp256k1<secp256k1::VerifyOnly>) -> R,
{
    SECP.with(|secp| f(secp))
}

/// Recover the public key that signed `digest`.
///
/// `signature` is `r || s || v` with `v` in `{27, 28}`.
pub fn recover_public_key(digest: &[u8; 32], signature: &[u8]) -> Result<PublicKey> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(Error::InvalidSignatureLength {
            expected: SIGNATURE_LENGTH,
            got: signature.len(),
        });
    }
    let v = signature[64];
    if v != RECOVERY_ID_OFFSET && v != RECOVERY_ID_OFFSET + 1 {
        return Err(Error::InvalidRecoveryId(v));
    }

    let recovery_id = RecoveryId::from_i32(i32::from(v - RECOVERY_ID_OFFSET))
        .map_err(|_| Error::InvalidRecoveryId(v))?;
    let sig = RecoverableSignature::from_compact(&signature[..64], recovery_id)
        .map_err(|_| Error::InvalidSignature)?;
    let msg = Message::from_digest(*digest);
    with_secp(|secp| secp.recover_ecdsa(&msg, &sig)).map_err(|_| Error::InvalidSignature)
}

/// Split `(r, s)` into emulated scalars
pub fn split_signature(signature: &[u8]) -> Result<EmulatedSignature<Secp256k1Fr>> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(Error::InvalidSignatureLength {
            expected: SIGNATURE_LENGTH,
            got: signature.len(),
        });
    }
    let r = Element::from_be_bytes(&signature[..32]).ok_or(Error::InvalidSignature)?;
    let s = Element::from_be_bytes(&signature[32..64]).ok_or(Error::InvalidSignature)?;
    Ok(EmulatedSignature { r, s })
}

/// Uncompressed public key coordinates
pub fn public_key_coordinates(public_key: &PublicKey) -> ([u8; 32], [u8; 32]) {
    let uncompressed = public_key.serialize_uncompressed();
    let mut x = [0u8; 32];
    let mut y = [0u8; 32];
    x.copy_from_slice(&uncompressed[1..33]);
    y.copy_from_slice(&uncompressed[33..65]);
    (x, y)
}

/// Prove a key rotation authorized by a secp256k1 signature over the derived key
pub async fn prove_signature(
    key: &BigUint,
    new_key: &BigUint,
    signature: &[u8],
    signature_type: SignatureType,
    client: &ProvingClient,
) -> Result<ProveSignatureResponse> {
    debug!(%key, %signature_type, "Recovering secp256k1 signer");
    let digest = key_digest(new_key)?;
    let public_key = recover_public_key(&digest, signature)?;
    let (x, y) = public_key_coordinates(&public_key);
    let (current_data, current_data_input) = public_key_to_circuit_data(&x, &y)?;

    let assignment = EcdsaAccount::<Secp256k1Fr> {
        current_data: current_data_input,
        new_key: new_key_element(new_key)?,
        sig: split_signature(signature)?,
    };

    let compiled = client.load(&SECP256K1_ACCOUNT, 0).await?;
    let proof = client
        .prove_assignment(&SECP256K1_ACCOUNT, &compiled, &assignment)
        .await?;
    info!(id = SECP256K1_ACCOUNT.id, "Signature proof ready");

    ProveSignatureResponse::from_artifacts(&proof, &compiled, current_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::SecretKey;

    fn sign(digest: &[u8; 32], v_offset: u8) -> (Vec<u8>, PublicKey) {
        let secp = Secp256k1::new();
        let sk = SecretKey::from_slice(&[0x42; 32]).unwrap();
        let sig = secp.sign_ecdsa_recoverable(&Message::from_digest(*digest), &sk);
        let (rec_id, compact) = sig.serialize_compact();
        let mut out = compact.to_vec();
        out.push(rec_id.to_i32() as u8 + v_offset);
        (out, PublicKey::from_secret_key(&secp, &sk))
    }

    #[test]
    fn test_recover_public_key() {
        let digest = key_digest(&BigUint::from(123_456u32)).unwrap();
        let (sig, expected) = sign(&digest, 27);
        assert_eq!(recover_public_key(&digest, &sig).unwrap(), expected);

        let other = key_digest(&BigUint::from(654_321u32)).unwrap();
        assert_ne!(recover_public_key(&other, &sig).ok(), Some(expected));
    }

    #[test]
    fn test_recover_random_signers() {
        let secp = Secp256k1::new();
        let mut rng = rand::thread_rng();
        for _ in 0..8 {
            let sk = SecretKey::new(&mut rng);
            let digest: [u8; 32] = rand::Rng::gen(&mut rng);
            let (rec_id, compact) = secp
                .sign_ecdsa_recoverable(&Message::from_digest(digest), &sk)
                .serialize_compact();
            let mut sig = compact.to_vec();
            sig.push(rec_id.to_i32() as u8 + 27);
            assert_eq!(
                recover_public_key(&digest, &sig).unwrap(),
                PublicKey::from_secret_key(&secp, &sk)
            );
        }
    }

    #[test]
    fn test_rejects_bad_length() {
        let digest = [1u8; 32];
        for len in [64usize, 66] {
            assert_eq!(
                recover_public_key(&digest, &vec![27u8; len]),
                Err(Error::InvalidSignatureLength { expected: 65, got: len })
            );
        }
    }

    #[test]
    fn test_rejects_bad_recovery_id() {
        let digest = [1u8; 32];
        let (mut sig, _) = sign(&digest, 27);
        for v in [0u8, 1, 29] {
            sig[64] = v;
            assert_eq!(recover_public_key(&digest, &sig), Err(Error::InvalidRecoveryId(v)));
        }
    }

    #[test]
    fn test_coordinates_and_split() {
        let digest = [9u8; 32];
        let (sig, pk) = sign(&digest, 27);
        let (x, y) = public_key_coordinates(&pk);
        assert_eq!(pk.serialize_uncompressed()[1..33], x);
        assert_eq!(pk.serialize_uncompressed()[33..], y);

        let split = split_signature(&sig).unwrap();
        assert_eq!(split.r.value(), &BigUint::from_bytes_be(&sig[..32]));
        assert_eq!(split.s.value(), &BigUint::from_bytes_be(&sig[32..64]));
    }
}
