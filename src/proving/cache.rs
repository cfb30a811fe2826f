//! Circuit cache.
//!
//! Each `(filename, field)` pair is read from the blob store at most once for
//! the lifetime of the process. Concurrent callers for the same pair queue on a
//! per-key lock and share the first successful load; distinct pairs load in
//! parallel. A failed load leaves nothing behind, so the next caller retries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, info};

use super::artifacts::load_compiled;
use super::backend::{BackendRegistry, CompiledCircuit};
use super::pipeline::{deliver, prove, spawn_blocking_result, LoadCircuitResult, ProveResult};
use crate::circuits::Witness;
use crate::error::{Error, Result};
use crate::fields::ScalarField;
use crate::storage::BlobStore;

// ═══════════════════════════════════════════════════════════════════════════════
// LOADER TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Asynchronous circuit loading and proving.
///
/// Outcomes arrive exactly once on the returned receiver. Work keeps running if
/// the receiver is dropped.
pub trait CircuitLoader: Send + Sync {
    /// Load the compiled circuit stored under `filename`
    fn load(&self, filename: &str, field: ScalarField) -> oneshot::Receiver<LoadCircuitResult>;

    /// Load the circuit stored under `filename` and prove `witness` with it
    fn load_and_prove(
        &self,
        filename: &str,
        field: ScalarField,
        outer: ScalarField,
        witness: Witness,
    ) -> oneshot::Receiver<ProveResult>;

    /// Backing blob store
    fn store(&self) -> Arc<dyn BlobStore>;

    /// Backends used to decode and prove
    fn backends(&self) -> &BackendRegistry;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════════

type CircuitKey = (String, ScalarField);
type Slot = Arc<Mutex<Option<CompiledCircuit>>>;

struct CacheInner {
    store: Arc<dyn BlobStore>,
    backends: BackendRegistry,
    slots: Mutex<HashMap<CircuitKey, Slot>>,
}

/// Load-once cache of compiled circuits; clones share the same cache
#[derive(Clone)]
pub struct CircuitCache {
    inner: Arc<CacheInner>,
}

impl CircuitCache {
    /// Create a cache over `store`, decoding with `backends`
    pub fn new(store: Arc<dyn BlobStore>, backends: BackendRegistry) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                store,
                backends,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Load synchronously, reading the store only on the first successful call per key
    pub fn load_blocking(&self, filename: &str, field: ScalarField) -> Result<CompiledCircuit> {
        let backend = self.inner.backends.get(field)?;

        // The table lock is only held to find or create the slot.
        let slot = {
            let mut slots = self.inner.slots.lock().map_err(|_| Error::Lock)?;
            Arc::clone(slots.entry((filename.to_string(), field)).or_default())
        };

        // A slot is only filled after a successful load, so a poisoned slot
        // still holds either nothing or a complete circuit.
        let mut cached = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(compiled) = cached.as_ref() {
            debug!(filename, %field, "Circuit cache hit");
            return Ok(compiled.clone());
        }

        info!(filename, %field, "Loading circuit");
        let compiled = load_compiled(&*self.inner.store, &*backend, filename)?;
        *cached = Some(compiled.clone());
        info!(filename, %field, "Circuit loaded");
        Ok(compiled)
    }

    /// Whether `(filename, field)` has been loaded
    pub fn is_cached(&self, filename: &str, field: ScalarField) -> bool {
        let slot = match self.inner.slots.lock() {
            Ok(slots) => slots.get(&(filename.to_string(), field)).cloned(),
            Err(_) => None,
        };
        slot.map_or(false, |slot| {
            slot.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_some()
        })
    }

    fn unsupported<T>(&self, field: ScalarField) -> Option<oneshot::Receiver<Result<T>>> {
        if self.inner.backends.supports(field) {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        deliver(tx, Err(Error::UnsupportedField(field.to_string())), "load");
        Some(rx)
    }
}

impl CircuitLoader for CircuitCache {
    fn load(&self, filename: &str, field: ScalarField) -> oneshot::Receiver<LoadCircuitResult> {
        if let Some(rx) = self.unsupported(field) {
            return rx;
        }
        let cache = self.clone();
        let filename = filename.to_string();
        spawn_blocking_result("load", move || cache.load_blocking(&filename, field))
    }

    fn load_and_prove(
        &self,
        filename: &str,
        field: ScalarField,
        outer: ScalarField,
        witness: Witness,
    ) -> oneshot::Receiver<ProveResult> {
        if let Some(rx) = self.unsupported(field) {
            return rx;
        }
        let cache = self.clone();
        let filename = filename.to_string();
        spawn_blocking_result("load and prove", move || {
            let backend = cache.inner.backends.get(field)?;
            let compiled = cache.load_blocking(&filename, field)?;

            info!(filename = %filename, "Generating proof");
            let proof = prove(&*backend, &compiled, &witness, field, outer)?;
            backend.write_proof(&proof)
        })
    }

    fn store(&self) -> Arc<dyn BlobStore> {
        Arc::clone(&self.inner.store)
    }

    fn backends(&self) -> &BackendRegistry {
        &self.inner.backends
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proving::artifacts::store_compiled;
    use crate::proving::native::NativeBackend;
    use crate::proving::pipeline::await_result;
    use crate::storage::InMemoryStore;

    fn setup() -> (Arc<InMemoryStore>, CircuitCache) {
        let store = Arc::new(InMemoryStore::new());
        let backend = NativeBackend::new();
        store_compiled(&*store, "circuitA", &backend.compile("circuitA", 10, 0).unwrap()).unwrap();
        let cache = CircuitCache::new(
            store.clone(),
            BackendRegistry::new().with(Arc::new(backend)),
        );
        (store, cache)
    }

    #[test]
    fn test_load_blocking_caches() {
        let (store, cache) = setup();
        assert!(!cache.is_cached("circuitA", ScalarField::Bls12_377));

        let a = cache.load_blocking("circuitA", ScalarField::Bls12_377).unwrap();
        let b = cache.load_blocking("circuitA", ScalarField::Bls12_377).unwrap();
        assert!(a.ptr_eq(&b));
        assert!(cache.is_cached("circuitA", ScalarField::Bls12_377));
        assert_eq!(store.read_count("circuitA.vk"), 1);
        assert_eq!(store.read_count("circuitA.ccs"), 1);
    }

    #[test]
    fn test_failed_load_is_retried() {
        let store = Arc::new(InMemoryStore::new());
        let backend = NativeBackend::new();
        let cache = CircuitCache::new(
            store.clone(),
            BackendRegistry::new().with(Arc::new(backend.clone())),
        );

        assert!(cache.load_blocking("circuitA", ScalarField::Bls12_377).is_err());
        assert!(!cache.is_cached("circuitA", ScalarField::Bls12_377));

        store_compiled(&*store, "circuitA", &backend.compile("circuitA", 10, 0).unwrap()).unwrap();
        assert!(cache.load_blocking("circuitA", ScalarField::Bls12_377).is_ok());
        assert_eq!(store.read_count("circuitA.vk"), 2);
    }

    #[tokio::test]
    async fn test_unsupported_field_skips_store() {
        let (store, cache) = setup();
        let err = await_result(cache.load("circuitA", ScalarField::Bn254), None, "load")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedField(_)));
        assert_eq!(store.read_count("circuitA.vk"), 0);
    }

    #[tokio::test]
    async fn test_load_and_prove() {
        let (_, cache) = setup();
        let witness = Witness::new(
            ScalarField::Bls12_377,
            (0..10u8).map(num_bigint::BigUint::from).collect(),
            vec![],
        )
        .unwrap();
        let rx = cache.load_and_prove(
            "circuitA",
            ScalarField::Bls12_377,
            ScalarField::Bw6_761,
            witness,
        );
        let bytes = await_result(rx, None, "prove").await.unwrap();
        assert_eq!(bytes.len(), 1504);
        assert!(cache.is_cached("circuitA", ScalarField::Bls12_377));
    }
}
