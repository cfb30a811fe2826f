//! Scalar field descriptors.
//!
//! Compile-time field parameters (`FieldParams` marker types) drive the codec's
//! generic conversions; the runtime [`ScalarField`] identifier selects proving
//! backends and witness fields at dispatch time.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// MODULI
// ═══════════════════════════════════════════════════════════════════════════════

const BN254_FR_MODULUS: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x28, 0x33, 0xe8, 0x48, 0x79, 0xb9, 0x70, 0x91, 0x43, 0xe1, 0xf5, 0x93, 0xf0, 0x00, 0x00, 0x01,
];

const BLS12_377_FR_MODULUS: [u8; 32] = [
    0x12, 0xab, 0x65, 0x5e, 0x9a, 0x2c, 0xa5, 0x56, 0x60, 0xb4, 0x4d, 0x1e, 0x5c, 0x37, 0xb0, 0x01,
    0x59, 0xaa, 0x76, 0xfe, 0xd0, 0x00, 0x00, 0x01, 0x0a, 0x11, 0x80, 0x00, 0x00, 0x00, 0x00, 0x01,
];

// Also the BLS12-377 base field.
const BW6_761_FR_MODULUS: [u8; 48] = [
    0x01, 0xae, 0x3a, 0x46, 0x17, 0xc5, 0x10, 0xea, 0xc6, 0x3b, 0x05, 0xc0, 0x6c, 0xa1, 0x49, 0x3b,
    0x1a, 0x22, 0xd9, 0xf3, 0x00, 0xf5, 0x13, 0x8f, 0x1e, 0xf3, 0x62, 0x2f, 0xba, 0x09, 0x48, 0x00,
    0x17, 0x0b, 0x5d, 0x44, 0x30, 0x00, 0x00, 0x00, 0x85, 0x08, 0xc0, 0x00, 0x00, 0x00, 0x00, 0x01,
];

const SECP256K1_FR_MODULUS: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

const P256_FR_MODULUS: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xbc, 0xe6, 0xfa, 0xad, 0xa7, 0x17, 0x9e, 0x84, 0xf3, 0xb9, 0xca, 0xc2, 0xfc, 0x63, 0x25, 0x51,
];

// ═══════════════════════════════════════════════════════════════════════════════
// FIELD PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Compile-time description of a prime field
pub trait FieldParams:
    fmt::Debug + Clone + Copy + PartialEq + Eq + Default + Send + Sync + 'static
{
    /// Human readable name
    const NAME: &'static str;

    /// Modulus, big-endian
    const MODULUS: &'static [u8];

    /// Modulus as a big integer
    fn modulus() -> BigUint {
        BigUint::from_bytes_be(Self::MODULUS)
    }

    /// Byte length of a canonical element
    fn byte_len() -> usize {
        Self::MODULUS.len()
    }

    /// Number of 64-bit limbs used when the field is emulated in-circuit
    fn limb_count() -> usize {
        Self::byte_len().div_ceil(8)
    }
}

macro_rules! field_marker {
    ($(#[$doc:meta])* $name:ident, $label:expr, $modulus:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
        pub struct $name;

        impl FieldParams for $name {
            const NAME: &'static str = $label;
            const MODULUS: &'static [u8] = &$modulus;
        }
    };
}

field_marker!(
    /// BN254 scalar field
    Bn254Fr, "bn254", BN254_FR_MODULUS
);
field_marker!(
    /// BLS12-377 scalar field (inner proof field)
    Bls12377Fr, "bls12_377", BLS12_377_FR_MODULUS
);
field_marker!(
    /// BW6-761 scalar field (outer recursion field)
    Bw6761Fr, "bw6_761", BW6_761_FR_MODULUS
);
field_marker!(
    /// secp256k1 group order
    Secp256k1Fr, "secp256k1", SECP256K1_FR_MODULUS
);
field_marker!(
    /// NIST P-256 group order
    P256Fr, "p256", P256_FR_MODULUS
);

/// BLS12-377 base field; coincides with the BW6-761 scalar field
pub type Bls12377Fp = Bw6761Fr;

// ═══════════════════════════════════════════════════════════════════════════════
// ELEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// An integer known to be strictly below the modulus of `F`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element<F: FieldParams> {
    value: BigUint,
    _field: PhantomData<F>,
}

impl<F: FieldParams> Element<F> {
    /// Wrap `value`, returning `None` when it does not fit the field
    pub fn new(value: BigUint) -> Option<Self> {
        if value < F::modulus() {
            Some(Self {
                value,
                _field: PhantomData,
            })
        } else {
            None
        }
    }

    /// Interpret big-endian bytes as an element
    pub fn from_be_bytes(bytes: &[u8]) -> Option<Self> {
        Self::new(BigUint::from_bytes_be(bytes))
    }

    /// The zero element
    pub fn zero() -> Self {
        Self {
            value: BigUint::zero(),
            _field: PhantomData,
        }
    }

    /// Underlying integer
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    /// Consume into the underlying integer
    pub fn into_value(self) -> BigUint {
        self.value
    }

    /// Big-endian encoding of exactly `width` bytes, keeping the low-order bytes
    pub fn to_be_bytes(&self, width: usize) -> Vec<u8> {
        be_bytes(&self.value, width)
    }

    /// Little-endian 64-bit limbs, padded to the field's limb count
    pub fn limbs(&self) -> Vec<u64> {
        let mut limbs = self.value.to_u64_digits();
        limbs.resize(F::limb_count(), 0);
        limbs
    }
}

impl<F: FieldParams> fmt::Display for Element<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Big-endian encoding of `value` in exactly `width` bytes, keeping the low-order bytes
pub fn be_bytes(value: &BigUint, width: usize) -> Vec<u8> {
    let raw = value.to_bytes_be();
    let mut out = vec![0u8; width];
    if raw.len() >= width {
        out.copy_from_slice(&raw[raw.len() - width..]);
    } else {
        out[width - raw.len()..].copy_from_slice(&raw);
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// RUNTIME IDENTIFIER
// ═══════════════════════════════════════════════════════════════════════════════

/// Runtime scalar field identifier used for backend dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarField {
    /// BN254
    Bn254,
    /// BLS12-377
    #[serde(rename = "bls12_377")]
    Bls12_377,
    /// BW6-761
    #[serde(rename = "bw6_761")]
    Bw6_761,
}

impl ScalarField {
    /// All known fields
    pub const ALL: [ScalarField; 3] = [Self::Bn254, Self::Bls12_377, Self::Bw6_761];

    /// Field name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bn254 => Bn254Fr::NAME,
            Self::Bls12_377 => Bls12377Fr::NAME,
            Self::Bw6_761 => Bw6761Fr::NAME,
        }
    }

    /// Field modulus
    pub fn modulus(&self) -> BigUint {
        match self {
            Self::Bn254 => Bn254Fr::modulus(),
            Self::Bls12_377 => Bls12377Fr::modulus(),
            Self::Bw6_761 => Bw6761Fr::modulus(),
        }
    }

    /// Check that `value` is a canonical element of this field
    pub fn contains(&self, value: &BigUint) -> bool {
        value < &self.modulus()
    }
}

impl fmt::Display for ScalarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScalarField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnsupportedField(s.to_string()))
    }
}
