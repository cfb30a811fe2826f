//! Error types for the keyspace recovery prover.
//!
//! Every failure a caller can observe is one of these variants. They are grouped
//! so the RPC layer (and tests) can tell malformed on-chain submissions apart
//! from bad signatures, backend failures and infrastructure problems.

use thiserror::Error;

/// Result type alias for recovery prover operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the recovery prover
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Format Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Verifying key has the wrong length or shape
    #[error("invalid verification key")]
    InvalidVerifyingKey,

    /// Proof has the wrong length or shape
    #[error("invalid proof")]
    InvalidProof,

    /// Opaque data payload has the wrong length or does not fit its field
    #[error("invalid data")]
    InvalidData,

    // ═══════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Raw signature has the wrong length
    #[error("invalid signature length: expected {expected}, got {got}")]
    InvalidSignatureLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        got: usize,
    },

    /// Recovery byte is not 27 or 28
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// Signature does not verify or public key recovery failed
    #[error("invalid signature")]
    InvalidSignature,

    /// WebAuthn client data JSON is malformed or carries the wrong challenge
    #[error("invalid client data JSON: {0}")]
    InvalidClientData(String),

    /// WebAuthn authenticator data has the wrong length
    #[error("invalid authenticator data: expected {expected} bytes, got {got}")]
    InvalidAuthenticatorData {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        got: usize,
    },

    /// ABI payload could not be decoded
    #[error("ABI decoding failed: {0}")]
    Abi(String),

    /// Invalid input parameter
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Backend Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Assignment could not be marshalled into a witness
    #[error("witness error: {0}")]
    Witness(String),

    /// Witness does not satisfy the constraint system
    #[error("constraints not satisfied: {0}")]
    Unsatisfied(String),

    /// Proof failed verification
    #[error("proof verification failed: {0}")]
    Verification(String),

    /// A panic inside the proving backend, caught at the pipeline boundary
    #[error("panic: {message}, stack: {trace}")]
    Fault {
        /// Panic payload
        message: String,
        /// Backtrace captured where the panic was raised
        trace: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Infrastructure Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Blob store read or write failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// No proving backend is registered for the scalar field
    #[error("unsupported field: {0}")]
    UnsupportedField(String),

    /// Unknown signature type tag
    #[error("unsupported signature type")]
    UnsupportedSignatureType(String),

    /// Transaction count does not select a circuit variant
    #[error("invalid transaction count {count} for circuit {circuit}")]
    InvalidTxCount {
        /// Circuit family identifier
        circuit: String,
        /// Requested transaction count
        count: usize,
    },

    /// Background load or proof did not complete in time
    #[error("{operation} timed out after {secs}s")]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Timeout in seconds
        secs: u64,
    },

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Lock acquisition failed
    #[error("Failed to acquire lock")]
    Lock,
}

impl Error {
    /// Returns true for malformed keys, proofs or data payloads
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Error::InvalidVerifyingKey | Error::InvalidProof | Error::InvalidData
        )
    }

    /// Returns true when the caller supplied a bad signature or parameter
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidSignatureLength { .. }
                | Error::InvalidRecoveryId(_)
                | Error::InvalidSignature
                | Error::InvalidClientData(_)
                | Error::InvalidAuthenticatorData { .. }
                | Error::Abi(_)
                | Error::InvalidParameter { .. }
        )
    }

    /// Returns true for failures raised by (or around) the proving backend
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Error::Witness(_)
                | Error::Unsatisfied(_)
                | Error::Verification(_)
                | Error::Fault { .. }
        )
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Format errors: 1xxx
            Error::InvalidVerifyingKey => 1001,
            Error::InvalidProof => 1002,
            Error::InvalidData => 1003,

            // Validation errors: 2xxx
            Error::InvalidSignatureLength { .. } => 2001,
            Error::InvalidRecoveryId(_) => 2002,
            Error::InvalidSignature => 2003,
            Error::InvalidClientData(_) => 2004,
            Error::InvalidAuthenticatorData { .. } => 2005,
            Error::Abi(_) => 2006,
            Error::InvalidParameter { .. } => 2007,

            // Backend errors: 3xxx
            Error::Witness(_) => 3001,
            Error::Unsatisfied(_) => 3002,
            Error::Verification(_) => 3003,
            Error::Fault { .. } => 3004,

            // Infrastructure errors: 9xxx
            Error::Storage(_) => 9001,
            Error::UnsupportedField(_) => 9002,
            Error::UnsupportedSignatureType(_) => 9003,
            Error::InvalidTxCount { .. } => 9004,
            Error::Timeout { .. } => 9005,
            Error::Serialization(_) => 9006,
            Error::Deserialization(_) => 9007,
            Error::Internal(_) => 9008,
            Error::Lock => 9009,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Storage(e.to_string())
    }
}
