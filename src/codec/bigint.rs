//! Verifying keys and proofs as big-integer sequences and outer-field elements.
//!
//! One integer per logical sub-field, G1 points expanded to `(X, Y)` and G2
//! points to `(X.A0, X.A1, Y.A0, Y.A1)`. The same integers, wrapped as BW6-761
//! scalar field elements, are what the recursion circuit consumes.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use super::plonk::{
    BatchOpeningProof, Fp, Fp2, Fr, G1Affine, G2Affine, KzgVerifyingKey, OpeningProof, Proof,
    VerifyingKey, FP_SIZE, FR_SIZE, NB_CLAIMED_VALUES, NB_COMMITMENTS, NB_PUBLIC_VARIABLES,
};
use crate::error::{Error, Result};
use crate::fields::{Bw6761Fr, Element, FieldParams};

/// Integers in a verifying key
pub const VK_ELEMENT_COUNT: usize = 39;
/// Integers in a proof
pub const PROOF_ELEMENT_COUNT: usize = 35;
/// Integers in a proof that come from curve points
pub const PROOF_POINT_ELEMENT_COUNT: usize = 24;

/// Verifying key as outer-field elements
pub type VkElements = [Element<Bw6761Fr>; VK_ELEMENT_COUNT];
/// Proof as outer-field elements
pub type ProofElements = [Element<Bw6761Fr>; PROOF_ELEMENT_COUNT];

// ═══════════════════════════════════════════════════════════════════════════════
// VERIFYING KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// Flatten a verifying key into its integer sequence and outer-field elements
pub fn vk_to_big_ints(vk: &VerifyingKey) -> Result<(Vec<BigUint>, VkElements)> {
    vk.check_shape()?;

    let mut ints = Vec::with_capacity(VK_ELEMENT_COUNT);
    ints.push(BigUint::from(vk.size));
    push_fr(&mut ints, &vk.size_inv);
    push_fr(&mut ints, &vk.generator);
    push_fr(&mut ints, &vk.coset_shift);
    ints.extend(vk.commitment_constraint_indexes.iter().map(|&c| BigUint::from(c)));
    for g2 in &vk.kzg.g2 {
        push_g2(&mut ints, g2);
    }
    push_g1(&mut ints, &vk.kzg.g1);
    for s in &vk.s {
        push_g1(&mut ints, s);
    }
    for q in [&vk.ql, &vk.qr, &vk.qm, &vk.qo, &vk.qk] {
        push_g1(&mut ints, q);
    }
    for q in &vk.qcp {
        push_g1(&mut ints, q);
    }

    let elements = to_elements(&ints, Error::InvalidVerifyingKey)?;
    Ok((ints, elements))
}

/// Rebuild a verifying key from its integer sequence
pub fn vk_from_big_ints(ints: &[BigUint]) -> Result<VerifyingKey> {
    if ints.len() != VK_ELEMENT_COUNT {
        return Err(Error::InvalidVerifyingKey);
    }

    let mut r = IntReader::new(ints, Error::InvalidVerifyingKey);
    let size = r.u64()?;
    let size_inv = r.fr()?;
    let generator = r.fr()?;
    let coset_shift = r.fr()?;
    let commitment_constraint_indexes = (0..NB_COMMITMENTS)
        .map(|_| r.u64())
        .collect::<Result<Vec<_>>>()?;
    let kzg = KzgVerifyingKey {
        g2: [r.g2()?, r.g2()?],
        g1: r.g1()?,
    };
    let s = [r.g1()?, r.g1()?, r.g1()?];
    let (ql, qr, qm, qo, qk) = (r.g1()?, r.g1()?, r.g1()?, r.g1()?, r.g1()?);
    let qcp = (0..NB_COMMITMENTS)
        .map(|_| r.g1())
        .collect::<Result<Vec<_>>>()?;

    Ok(VerifyingKey {
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

// ═══════════════════════════════════════════════════════════════════════════════
// PROOF
// ═══════════════════════════════════════════════════════════════════════════════

/// Flatten a proof into its integer sequence and outer-field elements
pub fn proof_to_big_ints(proof: &Proof) -> Result<(Vec<BigUint>, ProofElements)> {
    proof.check_shape()?;

    let mut ints = Vec::with_capacity(PROOF_ELEMENT_COUNT);
    for p in &proof.lro {
        push_g1(&mut ints, p);
    }
    push_g1(&mut ints, &proof.z);
    for p in &proof.h {
        push_g1(&mut ints, p);
    }
    for p in &proof.bsb22_commitments {
        push_g1(&mut ints, p);
    }
    push_g1(&mut ints, &proof.batched_proof.h);
    push_g1(&mut ints, &proof.z_shifted_opening.h);
    for v in &proof.batched_proof.claimed_values {
        push_fr(&mut ints, v);
    }
    push_fr(&mut ints, &proof.z_shifted_opening.claimed_value);

    let elements = to_elements(&ints, Error::InvalidProof)?;
    Ok((ints, elements))
}

/// Rebuild a proof from its integer sequence
pub fn proof_from_big_ints(ints: &[BigUint]) -> Result<Proof> {
    if ints.len() != PROOF_ELEMENT_COUNT {
        return Err(Error::InvalidProof);
    }

    let mut r = IntReader::new(ints, Error::InvalidProof);
    let lro = [r.g1()?, r.g1()?, r.g1()?];
    let z = r.g1()?;
    let h = [r.g1()?, r.g1()?, r.g1()?];
    let bsb22_commitments = (0..NB_COMMITMENTS)
        .map(|_| r.g1())
        .collect::<Result<Vec<_>>>()?;
    let batched_h = r.g1()?;
    let shifted_h = r.g1()?;
    let claimed_values = (0..NB_CLAIMED_VALUES)
        .map(|_| r.fr())
        .collect::<Result<Vec<_>>>()?;
    let claimed_value = r.fr()?;

    Ok(Proof {
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

/// Rebuild integers from outer-field elements
pub fn elements_to_big_ints<F: FieldParams>(elements: &[Element<F>]) -> Vec<BigUint> {
    elements.iter().map(|e| e.value().clone()).collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Wrap integers as field elements in a fixed-size array.
///
/// Fails with `err` on a count mismatch or a value outside the field.
pub fn to_elements<F: FieldParams, const N: usize>(
    ints: &[BigUint],
    err: Error,
) -> Result<[Element<F>; N]> {
    let elements = ints
        .iter()
        .map(|i| Element::<F>::new(i.clone()).ok_or_else(|| err.clone()))
        .collect::<Result<Vec<_>>>()?;
    elements.try_into().map_err(|_| err)
}

fn push_fr(ints: &mut Vec<BigUint>, v: &Fr) {
    ints.push(BigUint::from_bytes_be(&v.0));
}

fn push_fp(ints: &mut Vec<BigUint>, v: &Fp) {
    ints.push(BigUint::from_bytes_be(&v.0));
}

fn push_g1(ints: &mut Vec<BigUint>, p: &G1Affine) {
    push_fp(ints, &p.x);
    push_fp(ints, &p.y);
}

fn push_g2(ints: &mut Vec<BigUint>, p: &G2Affine) {
    push_fp(ints, &p.x.a0);
    push_fp(ints, &p.x.a1);
    push_fp(ints, &p.y.a0);
    push_fp(ints, &p.y.a1);
}

fn fixed_bytes<const N: usize>(v: &BigUint) -> Option<[u8; N]> {
    if v.bits() > (N * 8) as u64 {
        return None;
    }
    let raw = v.to_bytes_be();
    let mut out = [0u8; N];
    out[N - raw.len()..].copy_from_slice(&raw);
    Some(out)
}

struct IntReader<'a> {
    ints: std::slice::Iter<'a, BigUint>,
    err: Error,
}

impl<'a> IntReader<'a> {
    fn new(ints: &'a [BigUint], err: Error) -> Self {
        Self {
            ints: ints.iter(),
            err,
        }
    }

    fn next(&mut self) -> Result<&'a BigUint> {
        self.ints.next().ok_or_else(|| self.err.clone())
    }

    fn u64(&mut self) -> Result<u64> {
        let v = self.next()?;
        v.to_u64().ok_or_else(|| self.err.clone())
    }

    fn fr(&mut self) -> Result<Fr> {
        let v = self.next()?;
        fixed_bytes::<FR_SIZE>(v).map(Fr).ok_or_else(|| self.err.clone())
    }

    fn fp(&mut self) -> Result<Fp> {
        let v = self.next()?;
        fixed_bytes::<FP_SIZE>(v).map(Fp).ok_or_else(|| self.err.clone())
    }

    fn g1(&mut self) -> Result<G1Affine> {
        Ok(G1Affine {
            x: self.fp()?,
            y: self.fp()?,
        })
    }

    fn g2(&mut self) -> Result<G2Affine> {
        Ok(G2Affine {
            x: Fp2 {
                a0: self.fp()?,
                a1: self.fp()?,
            },
            y: Fp2 {
                a0: self.fp()?,
                a1: self.fp()?,
            },
        })
    }
}
