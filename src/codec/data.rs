//! Opaque 256-byte payload chunking.
//!
//! The payload is split into 31-byte chunks so every chunk is strictly below
//! any supported field modulus; the ninth chunk holds the 8-byte remainder.

use num_bigint::BigUint;

use super::bigint::to_elements;
use crate::error::{Error, Result};
use crate::fields::{be_bytes, Element, FieldParams};

/// Raw payload length
pub const RAW_DATA_SIZE: usize = 256;
/// Padded payload length (one leading zero byte per 32-byte slot)
pub const DATA_SIZE: usize = 288;
/// Number of chunks
pub const CHUNK_COUNT: usize = DATA_SIZE / 32;
/// Bytes carried by each full chunk
pub const CHUNK_SIZE: usize = 31;

const LAST_CHUNK_SIZE: usize = (RAW_DATA_SIZE - 1) % CHUNK_SIZE + 1;

/// A payload split into field-safe chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChunks<F: FieldParams> {
    /// Padded 288-byte form
    pub padded: Vec<u8>,
    /// Chunk values as integers
    pub values: Vec<BigUint>,
    /// Chunk values as field elements
    pub elements: [Element<F>; CHUNK_COUNT],
}

/// Split a 256-byte payload into nine field-safe chunks
pub fn data_to_chunks<F: FieldParams>(data: &[u8]) -> Result<DataChunks<F>> {
    if data.len() != RAW_DATA_SIZE {
        return Err(Error::InvalidData);
    }

    let mut padded = vec![0u8; DATA_SIZE];
    let mut values = Vec::with_capacity(CHUNK_COUNT);
    for (j, chunk) in data.chunks(CHUNK_SIZE).enumerate() {
        padded[j * 32 + 1..j * 32 + 1 + chunk.len()].copy_from_slice(chunk);
        values.push(BigUint::from_bytes_be(chunk));
    }

    let elements = to_elements(&values, Error::InvalidData)?;
    Ok(DataChunks {
        padded,
        values,
        elements,
    })
}

/// Reassemble the 256-byte payload from its chunk elements
pub fn data_from_elements<F: FieldParams>(elements: &[Element<F>; CHUNK_COUNT]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(RAW_DATA_SIZE);
    for (j, element) in elements.iter().enumerate() {
        let width = if j + 1 == CHUNK_COUNT {
            LAST_CHUNK_SIZE
        } else {
            CHUNK_SIZE
        };
        if element.value().bits() > (width * 8) as u64 {
            return Err(Error::InvalidData);
        }
        out.extend_from_slice(&be_bytes(element.value(), width));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Bls12377Fr, Bn254Fr, Bw6761Fr};
    use proptest::prelude::*;

    fn payload() -> Vec<u8> {
        (0..RAW_DATA_SIZE).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn test_chunk_layout() {
        let data = payload();
        let chunks = data_to_chunks::<Bw6761Fr>(&data).unwrap();
        assert_eq!(chunks.padded.len(), DATA_SIZE);
        assert_eq!(chunks.values.len(), CHUNK_COUNT);
        assert_eq!(chunks.padded[0], 0);
        assert_eq!(&chunks.padded[1..32], &data[0..31]);
        assert_eq!(chunks.padded[32], 0);
        assert_eq!(&chunks.padded[257..265], &data[248..256]);
        assert!(chunks.padded[265..].iter().all(|&b| b == 0));
        assert_eq!(chunks.values[8], BigUint::from_bytes_be(&data[248..]));
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert_eq!(
            data_to_chunks::<Bw6761Fr>(&[0u8; 255]).unwrap_err(),
            Error::InvalidData
        );
        assert_eq!(
            data_to_chunks::<Bw6761Fr>(&[0u8; 257]).unwrap_err(),
            Error::InvalidData
        );
    }

    #[test]
    fn test_oversized_element_rejected() {
        let mut elements = data_to_chunks::<Bw6761Fr>(&payload()).unwrap().elements;
        elements[8] = Element::new(BigUint::from(1u8) << 64).unwrap();
        assert_eq!(data_from_elements(&elements), Err(Error::InvalidData));
    }

    proptest! {
        #[test]
        fn prop_payload_roundtrip(data in proptest::collection::vec(any::<u8>(), RAW_DATA_SIZE)) {
            let chunks = data_to_chunks::<Bls12377Fr>(&data).unwrap();
            prop_assert_eq!(data_from_elements(&chunks.elements).unwrap(), data.clone());

            let chunks = data_to_chunks::<Bn254Fr>(&data).unwrap();
            prop_assert_eq!(data_from_elements(&chunks.elements).unwrap(), data);
        }
    }
}
