//! Native development backend.
//!
//! Produces BLS12-377 PLONK keys and proofs in their canonical shapes without
//! running the proving system. Proofs are a deterministic function of the
//! verifying key, the public witness and the recursion options, so `verify`
//! catches any tampering with those, but nothing is zero-knowledge and the
//! constraints themselves are never evaluated. This is NOT secure for
//! production use.

use std::io::Read;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::backend::{Artifact, CompiledArtifacts, ProofOptions, ProvingBackend};
use crate::circuits::{CircuitMetadata, Witness};
use crate::codec::plonk::{
    BatchOpeningProof, Fp, Fp2, Fr, G1Affine, G2Affine, KzgVerifyingKey, OpeningProof, Proof,
    VerifyingKey, FP_SIZE, FR_SIZE, NB_CLAIMED_VALUES, NB_COMMITMENTS, NB_PUBLIC_VARIABLES,
};
use crate::error::{Error, Result};
use crate::fields::{be_bytes, ScalarField};

/// Backend version recorded in compiled constraint systems
pub const NATIVE_BACKEND_VERSION: &str = "native-v1";

const DOMAIN_SIZE: u64 = 1 << 20;

// ═══════════════════════════════════════════════════════════════════════════════
// ARTIFACTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Constraint system stand-in: only the witness shape is checked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeConstraintSystem {
    /// Circuit identifier
    pub id: String,
    /// Number of public variables
    pub nb_public: usize,
    /// Number of secret variables
    pub nb_secret: usize,
    /// Backend version
    pub version: String,
}

/// Proving key stand-in: binds proofs to one verifying key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeProvingKey {
    /// SHA-256 of the on-chain verifying key encoding
    pub vk_digest: [u8; 32],
}

// ═══════════════════════════════════════════════════════════════════════════════
// BACKEND
// ═══════════════════════════════════════════════════════════════════════════════

/// Deterministic BLS12-377 backend for development and tests
#[derive(Debug, Clone, Default)]
pub struct NativeBackend;

impl NativeBackend {
    /// Create a new native backend
    pub fn new() -> Self {
        Self
    }

    /// Compile artifacts for a circuit with the given witness shape
    pub fn compile(&self, id: &str, nb_public: usize, nb_secret: usize) -> Result<CompiledArtifacts> {
        let ccs = NativeConstraintSystem {
            id: id.to_string(),
            nb_public,
            nb_secret,
            version: NATIVE_BACKEND_VERSION.to_string(),
        };
        let vk = derive_verifying_key(id).to_bytes()?;
        let pk = NativeProvingKey {
            vk_digest: Sha256::digest(&vk).into(),
        };

        Ok(CompiledArtifacts {
            ccs: serde_json::to_vec(&ccs).map_err(|e| Error::Serialization(e.to_string()))?,
            pk: bincode::serialize(&pk).map_err(|e| Error::Serialization(e.to_string()))?,
            vk,
        })
    }

    /// Compile artifacts for a registered circuit family
    pub fn compile_metadata(&self, metadata: &CircuitMetadata) -> Result<CompiledArtifacts> {
        self.compile(metadata.id, metadata.nb_public, metadata.nb_secret)
    }
}

impl ProvingBackend for NativeBackend {
    fn field(&self) -> ScalarField {
        ScalarField::Bls12_377
    }

    fn read_constraint_system(&self, bytes: &[u8]) -> Result<Artifact> {
        let ccs: NativeConstraintSystem = serde_json::from_slice(bytes)
            .map_err(|e| Error::Deserialization(format!("constraint system: {}", e)))?;
        Ok(Arc::new(ccs))
    }

    fn read_proving_key(&self, reader: &mut dyn Read) -> Result<Artifact> {
        let pk: NativeProvingKey = bincode::deserialize_from(reader)
            .map_err(|e| Error::Deserialization(format!("proving key: {}", e)))?;
        Ok(Arc::new(pk))
    }

    fn read_verifying_key(&self, reader: &mut dyn Read) -> Result<Artifact> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Arc::new(VerifyingKey::from_bytes(&bytes)?))
    }

    fn prove(
        &self,
        ccs: &Artifact,
        pk: &Artifact,
        witness: &Witness,
        opts: &ProofOptions,
    ) -> Result<Artifact> {
        let ccs = ccs
            .downcast_ref::<NativeConstraintSystem>()
            .ok_or_else(|| Error::Internal("foreign constraint system".into()))?;
        let pk = pk
            .downcast_ref::<NativeProvingKey>()
            .ok_or_else(|| Error::Internal("foreign proving key".into()))?;

        if witness.field() != self.field() {
            return Err(Error::Witness(format!(
                "witness over {} given to a {} backend",
                witness.field(),
                self.field()
            )));
        }
        if witness.public().len() != ccs.nb_public || witness.secret().len() != ccs.nb_secret {
            return Err(Error::Unsatisfied(format!(
                "{} expects {} public and {} secret values, got {} and {}",
                ccs.id,
                ccs.nb_public,
                ccs.nb_secret,
                witness.public().len(),
                witness.secret().len()
            )));
        }

        debug!(circuit = %ccs.id, "Deriving native proof");
        Ok(Arc::new(derive_proof(&pk.vk_digest, witness, opts)))
    }

    fn verify(
        &self,
        proof: &Artifact,
        vk: &Artifact,
        public: &Witness,
        opts: &ProofOptions,
    ) -> Result<()> {
        let proof = proof
            .downcast_ref::<Proof>()
            .ok_or_else(|| Error::Verification("foreign proof type".into()))?;
        let vk = vk
            .downcast_ref::<VerifyingKey>()
            .ok_or_else(|| Error::Verification("foreign verifying key type".into()))?;

        if public.public().len() as u64 != vk.nb_public_variables {
            return Err(Error::Verification(format!(
                "expected {} public values, got {}",
                vk.nb_public_variables,
                public.public().len()
            )));
        }
        let vk_digest: [u8; 32] = Sha256::digest(vk.to_bytes()?).into();
        if derive_proof(&vk_digest, public, opts) != *proof {
            return Err(Error::Verification("proof does not match public inputs".into()));
        }
        Ok(())
    }

    fn write_proof(&self, proof: &Artifact) -> Result<Vec<u8>> {
        proof
            .downcast_ref::<Proof>()
            .ok_or(Error::InvalidProof)?
            .to_bytes()
    }

    fn read_proof(&self, bytes: &[u8]) -> Result<Artifact> {
        Ok(Arc::new(Proof::from_bytes(bytes)?))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DERIVATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Deterministic stream of field-shaped values
struct Expander {
    seed: [u8; 32],
    counter: u32,
}

impl Expander {
    fn new(domain: &str, data: &[u8]) -> Self {
        let mut h = Sha256::new();
        h.update(domain.as_bytes());
        h.update((data.len() as u64).to_be_bytes());
        h.update(data);
        Self {
            seed: h.finalize().into(),
            counter: 0,
        }
    }

    fn block(&mut self) -> [u8; 32] {
        let mut h = Sha256::new();
        h.update(self.seed);
        h.update(self.counter.to_be_bytes());
        self.counter += 1;
        h.finalize().into()
    }

    // Top nibble cleared so the value stays below the BLS12-377 scalar modulus.
    fn fr(&mut self) -> Fr {
        let mut b = self.block();
        b[0] &= 0x0f;
        Fr(b)
    }

    fn fp(&mut self) -> Fp {
        let mut b = [0u8; FP_SIZE];
        b[FP_SIZE - FR_SIZE..].copy_from_slice(&self.block());
        Fp(b)
    }

    fn g1(&mut self) -> G1Affine {
        G1Affine {
            x: self.fp(),
            y: self.fp(),
        }
    }

    fn g2(&mut self) -> G2Affine {
        G2Affine {
            x: Fp2 {
                a0: self.fp(),
                a1: self.fp(),
            },
            y: Fp2 {
                a0: self.fp(),
                a1: self.fp(),
            },
        }
    }

    fn u64_below(&mut self, bound: u64) -> u64 {
        let b = self.block();
        let mut word = [0u8; 8];
        word.copy_from_slice(&b[..8]);
        u64::from_be_bytes(word) % bound
    }
}

fn derive_verifying_key(id: &str) -> VerifyingKey {
    let mut x = Expander::new("keyspace-recovery/native/vk", id.as_bytes());
    let mut commitment_constraint_indexes: Vec<u64> =
        (0..NB_COMMITMENTS).map(|_| x.u64_below(DOMAIN_SIZE)).collect();
    commitment_constraint_indexes.sort_unstable();

    VerifyingKey {
        size: DOMAIN_SIZE,
        size_inv: x.fr(),
        generator: x.fr(),
        nb_public_variables: NB_PUBLIC_VARIABLES as u64,
        coset_shift: x.fr(),
        commitment_constraint_indexes,
        kzg: KzgVerifyingKey {
            g2: [x.g2(), x.g2()],
            g1: x.g1(),
        },
        s: [x.g1(), x.g1(), x.g1()],
        ql: x.g1(),
        qr: x.g1(),
        qm: x.g1(),
        qo: x.g1(),
        qk: x.g1(),
        qcp: (0..NB_COMMITMENTS).map(|_| x.g1()).collect(),
    }
}

fn derive_proof(vk_digest: &[u8; 32], witness: &Witness, opts: &ProofOptions) -> Proof {
    let mut data = Vec::with_capacity(32 + witness.public().len() * 48 + 2);
    data.extend_from_slice(vk_digest);
    for v in witness.public() {
        data.extend_from_slice(&be_bytes(v, FP_SIZE));
    }
    match opts.recursion {
        Some(r) => {
            data.push(1);
            data.extend_from_slice(r.outer.name().as_bytes());
            data.extend_from_slice(r.inner.name().as_bytes());
        }
        None => data.push(0),
    }

    let mut x = Expander::new("keyspace-recovery/native/proof", &data);
    Proof {
        lro: [x.g1(), x.g1(), x.g1()],
        z: x.g1(),
        h: [x.g1(), x.g1(), x.g1()],
        bsb22_commitments: (0..NB_COMMITMENTS).map(|_| x.g1()).collect(),
        batched_proof: BatchOpeningProof {
            h: x.g1(),
            claimed_values: (0..NB_CLAIMED_VALUES).map(|_| x.fr()).collect(),
        },
        z_shifted_opening: OpeningProof {
            h: x.g1(),
            claimed_value: x.fr(),
        },
    }
}
