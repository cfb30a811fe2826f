//! Circuit family descriptions.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::fields::ScalarField;

/// Description of a family of compiled circuits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CircuitMetadata {
    /// Family identifier
    pub id: &'static str,
    /// Scalar field the circuit is compiled over
    pub field: ScalarField,
    /// Scalar field of the circuit that verifies this one recursively
    pub outer: ScalarField,
    /// Number of BSB22 commitments
    pub commitments: usize,
    /// Whether the family has one variant per transaction count
    pub multi_tx: bool,
    /// Artifact filenames, one per variant
    pub filenames: &'static [&'static str],
    /// Number of public witness values
    pub nb_public: usize,
    /// Number of secret witness values
    pub nb_secret: usize,
}

impl CircuitMetadata {
    /// Artifact filename for a transaction count.
    ///
    /// Single-variant families ignore `tx_count`.
    pub fn filename(&self, tx_count: usize) -> Result<&'static str> {
        let tx_count = if self.multi_tx { tx_count } else { 1 };
        tx_count
            .checked_sub(1)
            .and_then(|i| self.filenames.get(i))
            .copied()
            .ok_or_else(|| Error::InvalidTxCount {
                circuit: self.id.to_string(),
                count: tx_count,
            })
    }

    /// Whether proofs need recursion-aware options
    pub fn is_recursive(&self) -> bool {
        self.outer != self.field
    }
}

/// ECDSA secp256k1 account circuit
pub const SECP256K1_ACCOUNT: CircuitMetadata = CircuitMetadata {
    id: "Secp256k1Account",
    field: ScalarField::Bls12_377,
    outer: ScalarField::Bw6_761,
    commitments: 3,
    multi_tx: false,
    filenames: &["Secp256k1Account"],
    nb_public: super::accounts::NB_PUBLIC,
    nb_secret: super::accounts::ECDSA_NB_SECRET,
};

/// WebAuthn P-256 account circuit
pub const WEBAUTHN_ACCOUNT: CircuitMetadata = CircuitMetadata {
    id: "WebauthnAccount",
    field: ScalarField::Bls12_377,
    outer: ScalarField::Bw6_761,
    commitments: 3,
    multi_tx: false,
    filenames: &["WebauthnAccount"],
    nb_public: super::accounts::NB_PUBLIC,
    nb_secret: super::accounts::WEBAUTHN_NB_SECRET,
};

/// All registered circuit families
pub const REGISTERED: [&CircuitMetadata; 2] = [&SECP256K1_ACCOUNT, &WEBAUTHN_ACCOUNT];

/// Look up a registered family by identifier
pub fn find(id: &str) -> Option<&'static CircuitMetadata> {
    REGISTERED.into_iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTI: CircuitMetadata = CircuitMetadata {
        id: "Batch",
        field: ScalarField::Bn254,
        outer: ScalarField::Bn254,
        commitments: 1,
        multi_tx: true,
        filenames: &["Batch1", "Batch2", "Batch3"],
        nb_public: 1,
        nb_secret: 1,
    };

    #[test]
    fn test_single_variant_ignores_tx_count() {
        assert_eq!(SECP256K1_ACCOUNT.filename(0).unwrap(), "Secp256k1Account");
        assert_eq!(SECP256K1_ACCOUNT.filename(7).unwrap(), "Secp256k1Account");
        assert_eq!(WEBAUTHN_ACCOUNT.filename(1).unwrap(), "WebauthnAccount");
    }

    #[test]
    fn test_multi_variant_indexing() {
        assert_eq!(MULTI.filename(1).unwrap(), "Batch1");
        assert_eq!(MULTI.filename(3).unwrap(), "Batch3");
        assert!(matches!(
            MULTI.filename(0),
            Err(Error::InvalidTxCount { count: 0, .. })
        ));
        assert!(matches!(
            MULTI.filename(4),
            Err(Error::InvalidTxCount { count: 4, .. })
        ));
        assert!(!MULTI.is_recursive());
    }

    #[test]
    fn test_registered_families() {
        assert_eq!(find("WebauthnAccount"), Some(&WEBAUTHN_ACCOUNT));
        assert!(find("Unknown").is_none());
        for m in REGISTERED {
            assert!(m.is_recursive());
            assert_eq!(m.commitments, 3);
            assert_eq!(m.nb_public, 10);
        }
    }
}
