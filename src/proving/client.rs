//! Typed client over a [`CircuitLoader`].

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::artifacts::load_verifying_key;
use super::backend::{Artifact, CompiledCircuit};
use super::cache::CircuitLoader;
use super::pipeline::{await_result, catch_fault, prove_assignment, spawn_blocking_result};
use crate::circuits::{Assignment, CircuitMetadata, Witness};
use crate::error::Result;

/// Resolves circuit families to variants and awaits loader results
#[derive(Clone)]
pub struct ProvingClient {
    loader: Arc<dyn CircuitLoader>,
    timeout: Option<Duration>,
}

impl ProvingClient {
    /// Create a client; `timeout` bounds every wait on the loader
    pub fn new(loader: Arc<dyn CircuitLoader>, timeout: Option<Duration>) -> Self {
        Self { loader, timeout }
    }

    /// Underlying loader
    pub fn loader(&self) -> &Arc<dyn CircuitLoader> {
        &self.loader
    }

    /// Wait timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Load the variant of `metadata` selected by `tx_count`
    pub async fn load(&self, metadata: &CircuitMetadata, tx_count: usize) -> Result<CompiledCircuit> {
        let filename = metadata.filename(tx_count)?;
        let rx = self.loader.load(filename, metadata.field);
        await_result(rx, self.timeout, "circuit load").await
    }

    /// Load the verifying key of a variant without populating the cache
    pub async fn load_verifying_key(
        &self,
        metadata: &CircuitMetadata,
        tx_count: usize,
    ) -> Result<Artifact> {
        let filename = metadata.filename(tx_count)?;
        let backend = self.loader.backends().get(metadata.field)?;
        let store = self.loader.store();
        let rx = spawn_blocking_result("verifying key load", move || {
            load_verifying_key(&*store, &*backend, filename)
        });
        await_result(rx, self.timeout, "verifying key load").await
    }

    /// Prove `assignment` against an already loaded circuit
    pub async fn prove_assignment<A: Assignment>(
        &self,
        metadata: &CircuitMetadata,
        compiled: &CompiledCircuit,
        assignment: &A,
    ) -> Result<Artifact> {
        let backend = self.loader.backends().get(metadata.field)?;
        prove_assignment(backend, metadata, compiled, assignment, self.timeout).await
    }

    /// Load the variant selected by `tx_count`, then prove `assignment` with it
    pub async fn load_and_prove<A: Assignment>(
        &self,
        metadata: &CircuitMetadata,
        tx_count: usize,
        assignment: &A,
    ) -> Result<Artifact> {
        let filename = metadata.filename(tx_count)?;
        let backend = self.loader.backends().get(metadata.field)?;
        let witness = catch_fault(|| Witness::from_assignment(metadata.field, assignment))?;

        info!(filename, "Proving");
        let rx = self
            .loader
            .load_and_prove(filename, metadata.field, metadata.outer, witness);
        info!(filename, "Awaiting result");
        let result = await_result(rx, self.timeout, "load and prove").await;
        info!(filename, error = ?result.as_ref().err(), "Proof generation complete");

        let proof = result?;
        catch_fault(|| backend.read_proof(&proof))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::SECP256K1_ACCOUNT;
    use crate::codec::{Proof, VerifyingKey};
    use crate::error::Error;
    use crate::fields::ScalarField;
    use crate::proving::artifacts::store_compiled;
    use crate::proving::backend::{BackendRegistry, ProofOptions, ProvingBackend};
    use crate::proving::cache::CircuitCache;
    use crate::proving::native::NativeBackend;
    use crate::storage::InMemoryStore;
    use num_bigint::BigUint;

    struct Shape(usize, usize);

    impl Assignment for Shape {
        fn public_values(&self) -> Vec<BigUint> {
            (0..self.0).map(BigUint::from).collect()
        }

        fn secret_values(&self) -> Vec<BigUint> {
            (0..self.1).map(BigUint::from).collect()
        }
    }

    fn client() -> (Arc<InMemoryStore>, ProvingClient) {
        let store = Arc::new(InMemoryStore::new());
        let backend = NativeBackend::new();
        store_compiled(
            &*store,
            SECP256K1_ACCOUNT.id,
            &backend.compile_metadata(&SECP256K1_ACCOUNT).unwrap(),
        )
        .unwrap();
        let cache = CircuitCache::new(store.clone(), BackendRegistry::new().with(Arc::new(backend)));
        (store, ProvingClient::new(Arc::new(cache), None))
    }

    #[tokio::test]
    async fn test_load_and_prove() {
        let (_, client) = client();
        let proof = client
            .load_and_prove(&SECP256K1_ACCOUNT, 0, &Shape(10, 8))
            .await
            .unwrap();
        assert!(proof.downcast_ref::<Proof>().is_some());
    }

    /// Native backend whose proof decoder panics
    struct PanickingDecoder(NativeBackend);

    impl ProvingBackend for PanickingDecoder {
        fn field(&self) -> ScalarField {
            self.0.field()
        }

        fn read_constraint_system(&self, bytes: &[u8]) -> Result<Artifact> {
            self.0.read_constraint_system(bytes)
        }

        fn read_proving_key(&self, reader: &mut dyn std::io::Read) -> Result<Artifact> {
            self.0.read_proving_key(reader)
        }

        fn read_verifying_key(&self, reader: &mut dyn std::io::Read) -> Result<Artifact> {
            self.0.read_verifying_key(reader)
        }

        fn prove(
            &self,
            ccs: &Artifact,
            pk: &Artifact,
            witness: &Witness,
            opts: &ProofOptions,
        ) -> Result<Artifact> {
            self.0.prove(ccs, pk, witness, opts)
        }

        fn verify(
            &self,
            proof: &Artifact,
            vk: &Artifact,
            public: &Witness,
            opts: &ProofOptions,
        ) -> Result<()> {
            self.0.verify(proof, vk, public, opts)
        }

        fn write_proof(&self, proof: &Artifact) -> Result<Vec<u8>> {
            self.0.write_proof(proof)
        }

        fn read_proof(&self, _bytes: &[u8]) -> Result<Artifact> {
            panic!("truncated proof");
        }
    }

    #[tokio::test]
    async fn test_proof_decode_panic_is_fault() {
        let (store, _) = client();
        let backend = Arc::new(PanickingDecoder(NativeBackend::new()));
        let cache = CircuitCache::new(store, BackendRegistry::new().with(backend));
        let client = ProvingClient::new(Arc::new(cache), None);

        let err = client
            .load_and_prove(&SECP256K1_ACCOUNT, 0, &Shape(10, 8))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fault { ref message, .. } if message == "truncated proof"));

        let compiled = client.load(&SECP256K1_ACCOUNT, 0).await.unwrap();
        let err = client
            .prove_assignment(&SECP256K1_ACCOUNT, &compiled, &Shape(10, 8))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fault { .. }));
    }

    #[tokio::test]
    async fn test_prove_assignment_reuses_loaded_circuit() {
        let (store, client) = client();
        let compiled = client.load(&SECP256K1_ACCOUNT, 1).await.unwrap();
        client
            .prove_assignment(&SECP256K1_ACCOUNT, &compiled, &Shape(10, 8))
            .await
            .unwrap();
        let err = client
            .prove_assignment(&SECP256K1_ACCOUNT, &compiled, &Shape(9, 8))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unsatisfied(_)));
        assert_eq!(store.read_count("Secp256k1Account.pk"), 1);
    }

    #[tokio::test]
    async fn test_load_verifying_key() {
        let (store, client) = client();
        let vk = client.load_verifying_key(&SECP256K1_ACCOUNT, 1).await.unwrap();
        assert!(vk.downcast_ref::<VerifyingKey>().is_some());
        assert_eq!(store.read_count("Secp256k1Account.pk"), 0);
        assert!(!client
            .loader()
            .backends()
            .supports(ScalarField::Bw6_761));
    }
}
