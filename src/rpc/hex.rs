//! Ethereum-style hex encodings for serde.
//!
//! - [`bytes`]: `0x`-prefixed, even length
//! - [`quantity`]: `0x`-prefixed big integer, no leading zeros, at most 256 bits

/// Maximum hex digits of a quantity
pub const MAX_QUANTITY_DIGITS: usize = 64;

/// Parse `0x`-prefixed hex bytes
pub fn decode_bytes(s: &str) -> Result<Vec<u8>, String> {
    let digits = s.strip_prefix("0x").ok_or("hex string without 0x prefix")?;
    if digits.len() % 2 != 0 {
        return Err("hex string of odd length".into());
    }
    hex::decode(digits).map_err(|e| format!("invalid hex string: {}", e))
}

/// Encode bytes as `0x`-prefixed hex
pub fn encode_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Serde adapter for `Vec<u8>`
pub mod bytes {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    /// Serialize as `0x`-prefixed hex
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_bytes(bytes))
    }

    /// Deserialize from `0x`-prefixed hex
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::decode_bytes(&s).map_err(D::Error::custom)
    }
}

/// Serde adapter for `BigUint` quantities
pub mod quantity {
    use num_bigint::BigUint;
    use num_traits::Zero;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use super::MAX_QUANTITY_DIGITS;

    /// Parse a quantity
    pub fn decode(s: &str) -> Result<BigUint, String> {
        let digits = s.strip_prefix("0x").ok_or("hex string without 0x prefix")?;
        if digits.is_empty() {
            return Err("hex string \"0x\"".into());
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return Err("hex number with leading zero digits".into());
        }
        if digits.len() > MAX_QUANTITY_DIGITS {
            return Err("hex number > 256 bits".into());
        }
        BigUint::parse_bytes(digits.as_bytes(), 16).ok_or_else(|| "invalid hex string".into())
    }

    /// Encode a quantity
    pub fn encode(value: &BigUint) -> String {
        if value.is_zero() {
            return "0x0".into();
        }
        format!("0x{}", value.to_str_radix(16))
    }

    /// Serialize as a quantity
    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(value))
    }

    /// Deserialize from a quantity
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode(&s).map_err(D::Error::custom)
    }
}
