//! BLS12-377 PLONK verifying keys and proofs in their on-chain byte layout.
//!
//! Coordinates and scalars are kept as canonical big-endian bytes; the codec
//! never does curve arithmetic, it only moves values between representations.

use crate::error::{Error, Result};

/// Size of a BLS12-377 scalar field element in bytes
pub const FR_SIZE: usize = 32;
/// Size of a BLS12-377 base field element in bytes
pub const FP_SIZE: usize = 48;
/// Size of an affine G1 point in bytes
pub const G1_SIZE: usize = 2 * FP_SIZE;
/// Size of an affine G2 point in bytes
pub const G2_SIZE: usize = 4 * FP_SIZE;

/// Number of public variables accepted by the on-chain verifier
pub const NB_PUBLIC_VARIABLES: usize = 10;
/// Number of BSB22 commitments accepted by the on-chain verifier
pub const NB_COMMITMENTS: usize = 3;
/// Number of batched claimed values in a proof
pub const NB_CLAIMED_VALUES: usize = 10;

/// Encoded verifying key length
pub const VERIFYING_KEY_SIZE: usize = 1664;
/// Encoded proof length
pub const PROOF_SIZE: usize = 1504;

// ═══════════════════════════════════════════════════════════════════════════════
// PRIMITIVES
// ═══════════════════════════════════════════════════════════════════════════════

/// Scalar field element, big-endian
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Fr(pub [u8; FR_SIZE]);

/// Base field element, big-endian
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fp(pub [u8; FP_SIZE]);

impl Default for Fp {
    fn default() -> Self {
        Self([0u8; FP_SIZE])
    }
}

/// Quadratic extension element `a0 + a1 * u`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Fp2 {
    /// Real part
    pub a0: Fp,
    /// Imaginary part
    pub a1: Fp,
}

/// Affine G1 point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct G1Affine {
    /// X coordinate
    pub x: Fp,
    /// Y coordinate
    pub y: Fp,
}

/// Affine G2 point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct G2Affine {
    /// X coordinate
    pub x: Fp2,
    /// Y coordinate
    pub y: Fp2,
}

/// KZG verification material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KzgVerifyingKey {
    /// `[G2, [alpha]G2]`
    pub g2: [G2Affine; 2],
    /// G1 generator
    pub g1: G1Affine,
}

// ═══════════════════════════════════════════════════════════════════════════════
// VERIFYING KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// PLONK verifying key
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerifyingKey {
    /// Evaluation domain size
    pub size: u64,
    /// Inverse of the domain size
    pub size_inv: Fr,
    /// Domain generator
    pub generator: Fr,
    /// Number of public variables
    pub nb_public_variables: u64,
    /// Coset shift
    pub coset_shift: Fr,
    /// Constraint indexes of the BSB22 commitments
    pub commitment_constraint_indexes: Vec<u64>,
    /// KZG material
    pub kzg: KzgVerifyingKey,
    /// Permutation commitments
    pub s: [G1Affine; 3],
    /// Left selector commitment
    pub ql: G1Affine,
    /// Right selector commitment
    pub qr: G1Affine,
    /// Multiplication selector commitment
    pub qm: G1Affine,
    /// Output selector commitment
    pub qo: G1Affine,
    /// Constant selector commitment
    pub qk: G1Affine,
    /// Commitment selector commitments
    pub qcp: Vec<G1Affine>,
}

impl VerifyingKey {
    /// Check the shape accepted by the on-chain verifier
    pub fn check_shape(&self) -> Result<()> {
        if self.nb_public_variables != NB_PUBLIC_VARIABLES as u64
            || self.commitment_constraint_indexes.len() != NB_COMMITMENTS
            || self.qcp.len() != NB_COMMITMENTS
        {
            return Err(Error::InvalidVerifyingKey);
        }
        Ok(())
    }

    /// Encode into the 1,664-byte on-chain layout
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.check_shape()?;

        let mut out = Vec::with_capacity(VERIFYING_KEY_SIZE);
        out.extend_from_slice(&self.size.to_be_bytes());
        put_fr(&mut out, &self.size_inv);
        put_fr(&mut out, &self.generator);
        put_fr(&mut out, &self.coset_shift);
        for index in &self.commitment_constraint_indexes {
            out.extend_from_slice(&index.to_be_bytes());
        }
        for g2 in &self.kzg.g2 {
            put_g2(&mut out, g2);
        }
        put_g1(&mut out, &self.kzg.g1);
        for s in &self.s {
            put_g1(&mut out, s);
        }
        for q in [&self.ql, &self.qr, &self.qm, &self.qo, &self.qk] {
            put_g1(&mut out, q);
        }
        for q in &self.qcp {
            put_g1(&mut out, q);
        }

        debug_assert_eq!(out.len(), VERIFYING_KEY_SIZE);
        Ok(out)
    }

    /// Decode from the 1,664-byte on-chain layout
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != VERIFYING_KEY_SIZE {
            return Err(Error::InvalidVerifyingKey);
        }

        let mut r = Cursor::new(bytes);
        let size = r.u64();
        let size_inv = r.fr();
        let generator = r.fr();
        let coset_shift = r.fr();
        let commitment_constraint_indexes = (0..NB_COMMITMENTS).map(|_| r.u64()).collect();
        let kzg = KzgVerifyingKey {
            g2: [r.g2(), r.g2()],
            g1: r.g1(),
        };
        let s = [r.g1(), r.g1(), r.g1()];
        let (ql, qr, qm, qo, qk) = (r.g1(), r.g1(), r.g1(), r.g1(), r.g1());
        let qcp = (0..NB_COMMITMENTS).map(|_| r.g1()).collect();

        Ok(Self {
            size,
            size_inv,
            generator,
            nb_public_variables: NB_PUBLIC_VARIABLES as u64,
            coset_shift,
            commitment_constraint_indexes,
            kzg,
            s,
            ql,
            qr,
            qm,
            qo,
            qk,
            qcp,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROOF
// ═══════════════════════════════════════════════════════════════════════════════

/// Batched KZG opening
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchOpeningProof {
    /// Quotient commitment
    pub h: G1Affine,
    /// Claimed evaluations
    pub claimed_values: Vec<Fr>,
}

/// Single KZG opening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpeningProof {
    /// Quotient commitment
    pub h: G1Affine,
    /// Claimed evaluation
    pub claimed_value: Fr,
}

/// PLONK proof
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Proof {
    /// Wire commitments L, R, O
    pub lro: [G1Affine; 3],
    /// Permutation accumulator commitment
    pub z: G1Affine,
    /// Quotient commitments
    pub h: [G1Affine; 3],
    /// BSB22 commitments
    pub bsb22_commitments: Vec<G1Affine>,
    /// Batched opening at zeta
    pub batched_proof: BatchOpeningProof,
    /// Opening of Z at the shifted point
    pub z_shifted_opening: OpeningProof,
}

impl Proof {
    /// Check the shape accepted by the on-chain verifier
    pub fn check_shape(&self) -> Result<()> {
        if self.bsb22_commitments.len() != NB_COMMITMENTS
            || self.batched_proof.claimed_values.len() != NB_CLAIMED_VALUES
        {
            return Err(Error::InvalidProof);
        }
        Ok(())
    }

    /// Encode into the 1,504-byte on-chain layout
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.check_shape()?;

        let mut out = Vec::with_capacity(PROOF_SIZE);
        for p in &self.lro {
            put_g1(&mut out, p);
        }
        put_g1(&mut out, &self.z);
        for p in &self.h {
            put_g1(&mut out, p);
        }
        for p in &self.bsb22_commitments {
            put_g1(&mut out, p);
        }
        put_g1(&mut out, &self.batched_proof.h);
        put_g1(&mut out, &self.z_shifted_opening.h);
        for v in &self.batched_proof.claimed_values {
            put_fr(&mut out, v);
        }
        put_fr(&mut out, &self.z_shifted_opening.claimed_value);

        debug_assert_eq!(out.len(), PROOF_SIZE);
        Ok(out)
    }

    /// Decode from the 1,504-byte on-chain layout
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PROOF_SIZE {
            return Err(Error::InvalidProof);
        }

        let mut r = Cursor::new(bytes);
        let lro = [r.g1(), r.g1(), r.g1()];
        let z = r.g1();
        let h = [r.g1(), r.g1(), r.g1()];
        let bsb22_commitments = (0..NB_COMMITMENTS).map(|_| r.g1()).collect();
        let batched_h = r.g1();
        let shifted_h = r.g1();
        let claimed_values = (0..NB_CLAIMED_VALUES).map(|_| r.fr()).collect();
        let claimed_value = r.fr();

        Ok(Self {
            lro,
            z,
            h,
            bsb22_commitments,
            batched_proof: BatchOpeningProof {
                h: batched_h,
                claimed_values,
            },
            z_shifted_opening: OpeningProof {
                h: shifted_h,
                claimed_value,
            },
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn put_fr(out: &mut Vec<u8>, v: &Fr) {
    out.extend_from_slice(&v.0);
}

fn put_g1(out: &mut Vec<u8>, p: &G1Affine) {
    out.extend_from_slice(&p.x.0);
    out.extend_from_slice(&p.y.0);
}

fn put_g2(out: &mut Vec<u8>, p: &G2Affine) {
    out.extend_from_slice(&p.x.a0.0);
    out.extend_from_slice(&p.x.a1.0);
    out.extend_from_slice(&p.y.a0.0);
    out.extend_from_slice(&p.y.a1.0);
}

/// Forward-only reader over a buffer whose length was checked up front
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u64(&mut self) -> u64 {
        u64::from_be_bytes(self.take())
    }

    fn fr(&mut self) -> Fr {
        Fr(self.take())
    }

    fn fp(&mut self) -> Fp {
        Fp(self.take())
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
}
