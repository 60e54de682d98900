//! Public output projection.
//!
//! Each projected value becomes the next public input of the constraint system.
//! The order of `project` calls is the circuit's public ABI: a verifier decodes
//! the instance vector with the same `OutputSpec` list, in the same order.

use crate::config::OutputSpec;
use crate::error::CircuitError;
use crate::gadgets::predicates::enforce_bit_width;
use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::ns;
use ark_relations::r1cs::ConstraintSystemRef;

pub struct OutputProjector {
    cs: ConstraintSystemRef<Fr>,
    outputs: Vec<(OutputSpec, FpVar<Fr>)>,
}

impl OutputProjector {
    pub fn new(cs: ConstraintSystemRef<Fr>) -> Self {
        Self {
            cs,
            outputs: Vec::new(),
        }
    }

    /// Range-check `value` to `spec.width` bits and expose it as the next public input.
    pub fn project(&mut self, value: &FpVar<Fr>, spec: OutputSpec) -> Result<(), CircuitError> {
        spec.validate_width()?;
        enforce_bit_width(value, spec.width as usize)?;

        let public = FpVar::new_input(ns!(self.cs, "public_output"), || value.value())?;
        public.enforce_equal(value)?;

        tracing::debug!(
            position = self.outputs.len(),
            kind = spec.kind.name(),
            width = spec.width,
            "projected public output"
        );
        self.outputs.push((spec, public));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}
