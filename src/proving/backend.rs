//! Proving backend abstraction.
//!
//! The proving system itself is external. A backend owns the concrete types of
//! its constraint systems, keys and proofs; the rest of the crate handles them
//! as opaque shared [`Artifact`]s and downcasts only where a concrete curve
//! type is required (serializing BLS12-377 proofs and keys for the chain).

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

use crate::circuits::Witness;
use crate::error::{Error, Result};
use crate::fields::ScalarField;

/// Backend-owned opaque value, shared between clones
pub type Artifact = Arc<dyn Any + Send + Sync>;

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Fields of a recursive composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecursionOptions {
    /// Field of the circuit that verifies the proof
    pub outer: ScalarField,
    /// Field the proof is produced over
    pub inner: ScalarField,
}

/// Options shared by `prove` and `verify`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProofOptions {
    /// Make the proof natively verifiable by an outer-field circuit
    pub recursion: Option<RecursionOptions>,
}

impl ProofOptions {
    /// Options for a proof over `inner` consumed by a circuit over `outer`
    pub fn new(inner: ScalarField, outer: ScalarField) -> Self {
        let recursion = (outer != inner).then_some(RecursionOptions { outer, inner });
        Self { recursion }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BACKEND TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// A PLONK proving system over one scalar field
pub trait ProvingBackend: Send + Sync {
    /// Field this backend proves over
    fn field(&self) -> ScalarField;

    /// Decode a constraint system from a fully buffered blob
    fn read_constraint_system(&self, bytes: &[u8]) -> Result<Artifact>;

    /// Decode a proving key from a stream
    fn read_proving_key(&self, reader: &mut dyn Read) -> Result<Artifact>;

    /// Decode a verifying key from a stream
    fn read_verifying_key(&self, reader: &mut dyn Read) -> Result<Artifact>;

    /// Prove `witness` against a constraint system
    fn prove(
        &self,
        ccs: &Artifact,
        pk: &Artifact,
        witness: &Witness,
        opts: &ProofOptions,
    ) -> Result<Artifact>;

    /// Verify a proof against a verifying key and the public witness
    fn verify(
        &self,
        proof: &Artifact,
        vk: &Artifact,
        public: &Witness,
        opts: &ProofOptions,
    ) -> Result<()>;

    /// Serialize a proof
    fn write_proof(&self, proof: &Artifact) -> Result<Vec<u8>>;

    /// Deserialize a proof produced by [`ProvingBackend::write_proof`]
    fn read_proof(&self, bytes: &[u8]) -> Result<Artifact>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Backends keyed by the field they prove over
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<ScalarField, Arc<dyn ProvingBackend>>,
}

impl BackendRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend, replacing any previous one for its field
    pub fn register(&mut self, backend: Arc<dyn ProvingBackend>) -> &mut Self {
        self.backends.insert(backend.field(), backend);
        self
    }

    /// Builder-style [`BackendRegistry::register`]
    pub fn with(mut self, backend: Arc<dyn ProvingBackend>) -> Self {
        self.register(backend);
        self
    }

    /// Backend for `field`
    pub fn get(&self, field: ScalarField) -> Result<Arc<dyn ProvingBackend>> {
        self.backends
            .get(&field)
            .cloned()
            .ok_or_else(|| Error::UnsupportedField(field.to_string()))
    }

    /// Whether a backend is registered for `field`
    pub fn supports(&self, field: ScalarField) -> bool {
        self.backends.contains_key(&field)
    }

    /// Registered fields
    pub fn fields(&self) -> Vec<ScalarField> {
        let mut fields: Vec<_> = self.backends.keys().copied().collect();
        fields.sort();
        fields
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("fields", &self.fields())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILED CIRCUIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Constraint system and keys of one circuit variant.
///
/// Immutable once loaded; clones share the underlying artifacts.
#[derive(Clone)]
pub struct CompiledCircuit {
    /// Field the artifacts were decoded for
    pub field: ScalarField,
    /// Constraint system
    pub ccs: Artifact,
    /// Proving key
    pub pk: Artifact,
    /// Verifying key
    pub vk: Artifact,
}

impl CompiledCircuit {
    /// Whether both handles point at the same loaded artifacts
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.ccs, &other.ccs)
            && Arc::ptr_eq(&self.pk, &other.pk)
            && Arc::ptr_eq(&self.vk, &other.vk)
    }

    /// Downcast the verifying key to a backend type
    pub fn vk_as<T: Any>(&self) -> Option<&T> {
        self.vk.downcast_ref::<T>()
    }
}

impl fmt::Debug for CompiledCircuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledCircuit")
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}

/// Serialized artifacts of one compiled circuit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifacts {
    /// Constraint system blob (`.ccs`)
    pub ccs: Vec<u8>,
    /// Proving key blob (`.pk`)
    pub pk: Vec<u8>,
    /// Verifying key blob (`.vk`)
    pub vk: Vec<u8>,
}
