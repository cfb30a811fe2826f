//! Outer-field elements re-expressed as big-endian byte words.
//!
//! This mirrors what the recursion circuit hashes: each element contributes its
//! low-order bytes at a fixed width, and the concatenation equals the on-chain
//! encoding of the key or proof the elements came from.

use super::bigint::{ProofElements, VkElements, PROOF_POINT_ELEMENT_COUNT};
use super::plonk::{FP_SIZE, FR_SIZE};
use crate::fields::{Element, FieldParams};

/// Width of a `u64` word in bytes
pub const U64_WIDTH: usize = 8;

/// Byte widths of the verifying-key elements, in order
pub fn vk_element_widths() -> impl Iterator<Item = usize> {
    [U64_WIDTH, FR_SIZE, FR_SIZE, FR_SIZE]
        .into_iter()
        .chain(std::iter::repeat(U64_WIDTH).take(3))
        .chain(std::iter::repeat(FP_SIZE).take(32))
}

/// Byte widths of the proof elements, in order
pub fn proof_element_widths() -> impl Iterator<Item = usize> {
    std::iter::repeat(FP_SIZE)
        .take(PROOF_POINT_ELEMENT_COUNT)
        .chain(std::iter::repeat(FR_SIZE).take(11))
}

/// Append the low `width` bytes of `element`, big-endian
pub fn append_element_bytes<F: FieldParams>(out: &mut Vec<u8>, element: &Element<F>, width: usize) {
    out.extend_from_slice(&element.to_be_bytes(width));
}

/// Serialize verifying-key elements the way the on-chain verifier lays them out
pub fn emulated_vk_to_bytes(elements: &VkElements) -> Vec<u8> {
    let mut out = Vec::new();
    for (element, width) in elements.iter().zip(vk_element_widths()) {
        append_element_bytes(&mut out, element, width);
    }
    out
}

/// Serialize proof elements the way the on-chain verifier lays them out
pub fn emulated_proof_to_bytes(elements: &ProofElements) -> Vec<u8> {
    let mut out = Vec::new();
    for (element, width) in elements.iter().zip(proof_element_widths()) {
        append_element_bytes(&mut out, element, width);
    }
    out
}
