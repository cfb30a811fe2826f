//! Integration tests for the recovery prover.
//!
//! These run the full signature-to-proof path against the native backend and
//! an in-memory artifact store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use num_bigint::BigUint;
use p256::ecdsa::signature::hazmat::PrehashSigner;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

use keyspace_recovery::circuits::metadata::REGISTERED;
use keyspace_recovery::circuits::{Witness, SECP256K1_ACCOUNT, WEBAUTHN_ACCOUNT};
use keyspace_recovery::codec::{Proof, VerifyingKey};
use keyspace_recovery::error::Error;
use keyspace_recovery::fields::ScalarField;
use keyspace_recovery::proving::artifacts::store_compiled;
use keyspace_recovery::proving::{
    Artifact, BackendRegistry, CircuitCache, CircuitLoader, NativeBackend, ProofOptions,
    ProvingBackend, ProvingClient,
};
use keyspace_recovery::rpc::Recover;
use keyspace_recovery::signatures::secp256k1::public_key_coordinates;
use keyspace_recovery::signatures::webauthn::{
    encode_signature, WebAuthnSignature, CLIENT_DATA_JSON_PREFIX,
};
use keyspace_recovery::signatures::{key_digest, public_key_to_circuit_data, ProveSignatureResponse};
use keyspace_recovery::storage::InMemoryStore;

// ═══════════════════════════════════════════════════════════════════════════════
// TEST HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    let backend = NativeBackend::new();
    for metadata in REGISTERED {
        let artifacts = backend.compile_metadata(metadata).unwrap();
        for filename in metadata.filenames {
            store_compiled(&*store, filename, &artifacts).unwrap();
        }
    }
    store
}

fn service_with(store: Arc<InMemoryStore>, backend: Arc<dyn ProvingBackend>) -> Recover {
    let cache = CircuitCache::new(store, BackendRegistry::new().with(backend));
    Recover::new(ProvingClient::new(Arc::new(cache), None))
}

fn service(store: Arc<InMemoryStore>) -> Recover {
    service_with(store, Arc::new(NativeBackend::new()))
}

/// Raw `newKey` as sent over RPC; the service derives `raw >> 2`
fn raw_new_key() -> BigUint {
    BigUint::from_bytes_be(&[0x2a; 31])
}

fn derived_new_key() -> BigUint {
    raw_new_key() >> 2usize
}

fn secp_sign(digest: &[u8; 32]) -> (Vec<u8>, PublicKey) {
    let secp = Secp256k1::new();
    let sk = SecretKey::from_slice(&[0x42; 32]).unwrap();
    let sig = secp.sign_ecdsa_recoverable(&Message::from_digest(*digest), &sk);
    let (rec_id, compact) = sig.serialize_compact();
    let mut out = compact.to_vec();
    out.push(rec_id.to_i32() as u8 + 27);
    (out, PublicKey::from_secret_key(&secp, &sk))
}

fn webauthn_sign(digest: &[u8; 32], suffix: &str) -> Vec<u8> {
    let signing_key = p256::ecdsa::SigningKey::from_bytes(&p256::FieldBytes::from([0x33; 32])).unwrap();
    let point = signing_key.verifying_key().to_encoded_point(false);
    let mut sig = WebAuthnSignature {
        x: point.x().unwrap().as_slice().try_into().unwrap(),
        y: point.y().unwrap().as_slice().try_into().unwrap(),
        authenticator_data: vec![0x49; 37],
        client_data_json: format!(
            "{}{}{}",
            CLIENT_DATA_JSON_PREFIX,
            URL_SAFE_NO_PAD.encode(digest),
            suffix
        )
        .into_bytes(),
        challenge_index: BigUint::from(23u8),
        type_index: BigUint::from(1u8),
        r: [0; 32],
        s: [0; 32],
    };
    let signature: p256::ecdsa::Signature = signing_key.sign_prehash(&sig.signed_hash()).unwrap();
    let (r, s) = signature.split_bytes();
    sig.r.copy_from_slice(&r);
    sig.s.copy_from_slice(&s);
    encode_signature(&sig)
}

/// Verify a response the way the on-chain verifier would see it
fn verify_response(response: &ProveSignatureResponse, new_key: &BigUint) -> keyspace_recovery::error::Result<()> {
    let x: [u8; 32] = response.current_data[..32].try_into().unwrap();
    let y: [u8; 32] = response.current_data[32..64].try_into().unwrap();
    let (_, chunks) = public_key_to_circuit_data(&x, &y)?;
    let public = chunks
        .iter()
        .map(|e| e.value().clone())
        .chain(std::iter::once(new_key.clone()))
        .collect();
    let public = Witness::new(ScalarField::Bls12_377, public, Vec::new())?;

    let proof: Artifact = Arc::new(Proof::from_bytes(&response.proof)?);
    let vk: Artifact = Arc::new(VerifyingKey::from_bytes(&response.current_vk)?);
    NativeBackend::new().verify(
        &proof,
        &vk,
        &public,
        &ProofOptions::new(ScalarField::Bls12_377, ScalarField::Bw6_761),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// END TO END
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_secp256k1_end_to_end() {
    let service = service(seeded_store());
    let digest = key_digest(&derived_new_key()).unwrap();
    let (sig, signer) = secp_sign(&digest);

    let response = service
        .prove_signature(&BigUint::from(1u8), &raw_new_key(), &sig, "secp256k1")
        .await
        .unwrap();

    assert_eq!(response.proof.len(), 1504);
    assert_eq!(response.current_vk.len(), 1664);

    let (x, y) = public_key_coordinates(&signer);
    let mut expected = vec![0u8; 256];
    expected[..32].copy_from_slice(&x);
    expected[32..64].copy_from_slice(&y);
    assert_eq!(response.current_data, expected);

    verify_response(&response, &derived_new_key()).unwrap();
    assert!(matches!(
        verify_response(&response, &raw_new_key()),
        Err(Error::Verification(_))
    ));
}

#[tokio::test]
async fn test_secp256k1_wrong_key_yields_other_signer() {
    let service = service(seeded_store());
    let digest = key_digest(&derived_new_key()).unwrap();
    let (sig, signer) = secp_sign(&digest);

    // Signing the raw key instead of the derived one recovers someone else
    let response = service
        .prove_signature(&BigUint::from(1u8), &(raw_new_key() << 2usize), &sig, "secp256k1")
        .await;
    let (x, _) = public_key_coordinates(&signer);
    match response {
        Ok(response) => assert_ne!(&response.current_data[..32], &x[..]),
        Err(e) => assert_eq!(e, Error::InvalidSignature),
    }
}

#[tokio::test]
async fn test_webauthn_end_to_end() {
    let service = service(seeded_store());
    let digest = key_digest(&derived_new_key()).unwrap();
    let sig = webauthn_sign(&digest, r#"","origin":"https://keyspace.example","crossOrigin":false}"#);

    let response = service
        .prove_signature(&BigUint::from(7u8), &raw_new_key(), &sig, "webauthn")
        .await
        .unwrap();
    verify_response(&response, &derived_new_key()).unwrap();

    let decoded = WebAuthnSignature::decode(&sig).unwrap();
    assert_eq!(&response.current_data[..32], &decoded.x);
    assert_eq!(&response.current_data[32..64], &decoded.y);
}

#[tokio::test]
async fn test_webauthn_rejects_challenge_for_other_key() {
    let service = service(seeded_store());
    let digest = key_digest(&BigUint::from(99u8)).unwrap();
    let sig = webauthn_sign(&digest, "\"}");

    let err = service
        .prove_signature(&BigUint::from(7u8), &raw_new_key(), &sig, "webauthn")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidClientData(_)));
}

#[tokio::test]
async fn test_unknown_signature_type() {
    let service = service(seeded_store());
    let err = service
        .prove_signature(&BigUint::from(1u8), &raw_new_key(), &[0u8; 65], "ed25519")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "unsupported signature type");
}

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_loads_read_once() {
    let store = seeded_store();
    let cache = CircuitCache::new(
        store.clone(),
        BackendRegistry::new().with(Arc::new(NativeBackend::new())),
    );
    let client = ProvingClient::new(Arc::new(cache), None);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client.load(&SECP256K1_ACCOUNT, 0).await
        }));
    }
    let mut loaded = Vec::new();
    for handle in handles {
        loaded.push(handle.await.unwrap().unwrap());
    }

    assert!(loaded.iter().all(|c| c.ptr_eq(&loaded[0])));
    for suffix in ["vk", "pk", "ccs"] {
        assert_eq!(store.read_count(&format!("Secp256k1Account.{}", suffix)), 1);
    }
    assert_eq!(store.read_count("WebauthnAccount.pk"), 0);
}

#[tokio::test]
async fn test_failed_load_is_retried() {
    let store = Arc::new(InMemoryStore::new());
    let cache = CircuitCache::new(
        store.clone(),
        BackendRegistry::new().with(Arc::new(NativeBackend::new())),
    );
    let client = ProvingClient::new(Arc::new(cache.clone()), None);

    let err = client.load(&SECP256K1_ACCOUNT, 0).await.unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
    assert!(!cache.is_cached("Secp256k1Account", ScalarField::Bls12_377));

    let artifacts = NativeBackend::new().compile_metadata(&SECP256K1_ACCOUNT).unwrap();
    store_compiled(&*store, "Secp256k1Account", &artifacts).unwrap();
    client.load(&SECP256K1_ACCOUNT, 0).await.unwrap();
    assert!(cache.is_cached("Secp256k1Account", ScalarField::Bls12_377));
}

#[tokio::test]
async fn test_unsupported_field_skips_store() {
    let store = seeded_store();
    let cache = CircuitCache::new(store.clone(), BackendRegistry::new());
    let rx = cache.load("Secp256k1Account", ScalarField::Bls12_377);
    assert!(matches!(rx.await.unwrap(), Err(Error::UnsupportedField(_))));
    assert_eq!(store.read_count("Secp256k1Account.vk"), 0);
    assert_eq!(WEBAUTHN_ACCOUNT.field, ScalarField::Bls12_377);
}

// ═══════════════════════════════════════════════════════════════════════════════
// FAULTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Native backend whose first `panics` proofs and first `decode_panics` proof decodes blow up
struct FlakyBackend {
    inner: NativeBackend,
    panics: AtomicUsize,
    decode_panics: AtomicUsize,
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl ProvingBackend for FlakyBackend {
    fn field(&self) -> ScalarField {
        self.inner.field()
    }

    fn read_constraint_system(&self, bytes: &[u8]) -> keyspace_recovery::error::Result<Artifact> {
        self.inner.read_constraint_system(bytes)
    }

    fn read_proving_key(&self, reader: &mut dyn std::io::Read) -> keyspace_recovery::error::Result<Artifact> {
        self.inner.read_proving_key(reader)
    }

    fn read_verifying_key(&self, reader: &mut dyn std::io::Read) -> keyspace_recovery::error::Result<Artifact> {
        self.inner.read_verifying_key(reader)
    }

    fn prove(
        &self,
        ccs: &Artifact,
        pk: &Artifact,
        witness: &Witness,
        opts: &ProofOptions,
    ) -> keyspace_recovery::error::Result<Artifact> {
        if take_one(&self.panics) {
            panic!("constraint solver exploded");
        }
        self.inner.prove(ccs, pk, witness, opts)
    }

    fn verify(
        &self,
        proof: &Artifact,
        vk: &Artifact,
        public: &Witness,
        opts: &ProofOptions,
    ) -> keyspace_recovery::error::Result<()> {
        self.inner.verify(proof, vk, public, opts)
    }

    fn write_proof(&self, proof: &Artifact) -> keyspace_recovery::error::Result<Vec<u8>> {
        self.inner.write_proof(proof)
    }

    fn read_proof(&self, bytes: &[u8]) -> keyspace_recovery::error::Result<Artifact> {
        if take_one(&self.decode_panics) {
            panic!("proof decoder exploded");
        }
        self.inner.read_proof(bytes)
    }
}

#[tokio::test]
async fn test_backend_panic_becomes_fault() {
    let backend = Arc::new(FlakyBackend {
        inner: NativeBackend::new(),
        panics: AtomicUsize::new(1),
        decode_panics: AtomicUsize::new(0),
    });
    let service = service_with(seeded_store(), backend);
    let digest = key_digest(&derived_new_key()).unwrap();
    let (sig, _) = secp_sign(&digest);

    let err = service
        .prove_signature(&BigUint::from(1u8), &raw_new_key(), &sig, "secp256k1")
        .await
        .unwrap_err();
    match &err {
        Error::Fault { message, .. } => assert_eq!(message, "constraint solver exploded"),
        other => panic!("expected fault, got {:?}", other),
    }
    assert!(err.to_string().starts_with("panic: constraint solver exploded, stack: "));

    // The same service keeps serving
    let response = service
        .prove_signature(&BigUint::from(1u8), &raw_new_key(), &sig, "secp256k1")
        .await
        .unwrap();
    verify_response(&response, &derived_new_key()).unwrap();
}

#[tokio::test]
async fn test_proof_decode_panic_becomes_fault() {
    let backend = Arc::new(FlakyBackend {
        inner: NativeBackend::new(),
        panics: AtomicUsize::new(0),
        decode_panics: AtomicUsize::new(1),
    });
    let service = service_with(seeded_store(), backend);
    let digest = key_digest(&derived_new_key()).unwrap();
    let (sig, _) = secp_sign(&digest);

    let err = service
        .prove_signature(&BigUint::from(1u8), &raw_new_key(), &sig, "secp256k1")
        .await
        .unwrap_err();
    match &err {
        Error::Fault { message, .. } => assert_eq!(message, "proof decoder exploded"),
        other => panic!("expected fault, got {:?}", other),
    }

    let response = service
        .prove_signature(&BigUint::from(1u8), &raw_new_key(), &sig, "secp256k1")
        .await
        .unwrap();
    verify_response(&response, &derived_new_key()).unwrap();
}
