//! Witnesses: assignments marshalled into ordered field values.

use num_bigint::BigUint;

use crate::error::{Error, Result};
use crate::fields::ScalarField;

/// A typed circuit assignment
pub trait Assignment: Send + 'static {
    /// Public values, in declaration order
    fn public_values(&self) -> Vec<BigUint>;

    /// Secret values, in declaration order
    fn secret_values(&self) -> Vec<BigUint>;
}

/// Ordered public and secret values over a scalar field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    field: ScalarField,
    public: Vec<BigUint>,
    secret: Vec<BigUint>,
}

impl Witness {
    /// Build a witness, rejecting values outside the field
    pub fn new(field: ScalarField, public: Vec<BigUint>, secret: Vec<BigUint>) -> Result<Self> {
        let modulus = field.modulus();
        if let Some(pos) = public.iter().chain(secret.iter()).position(|v| v >= &modulus) {
            return Err(Error::Witness(format!(
                "value {} does not fit the {} scalar field",
                pos, field
            )));
        }
        Ok(Self {
            field,
            public,
            secret,
        })
    }

    /// Marshal an assignment over `field`
    pub fn from_assignment<A: Assignment + ?Sized>(field: ScalarField, assignment: &A) -> Result<Self> {
        Self::new(field, assignment.public_values(), assignment.secret_values())
    }

    /// The public subset
    pub fn public_part(&self) -> Self {
        Self {
            field: self.field,
            public: self.public.clone(),
            secret: Vec::new(),
        }
    }

    /// Scalar field
    pub fn field(&self) -> ScalarField {
        self.field
    }

    /// Public values
    pub fn public(&self) -> &[BigUint] {
        &self.public
    }

    /// Secret values
    pub fn secret(&self) -> &[BigUint] {
        &self.secret
    }

    /// Whether this witness only carries public values
    pub fn is_public(&self) -> bool {
        self.secret.is_empty()
    }
}
