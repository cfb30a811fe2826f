//! Circuit families, assignments and witnesses.
//!
//! The circuits themselves are precompiled artifacts; this module only knows
//! how to name them and how to lay out the values they are proved over.

pub mod accounts;
pub mod metadata;
pub mod witness;

pub use accounts::{EcdsaAccount, EmulatedSignature, WebauthnAccount};
pub use metadata::{CircuitMetadata, SECP256K1_ACCOUNT, WEBAUTHN_ACCOUNT};
pub use witness::{Assignment, Witness};
