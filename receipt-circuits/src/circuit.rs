//! R1CS circuit proving that witnessed chain records satisfy a declared relation.
//!
//! What this circuit proves (for one configured variant):
//! 1) The prover knows an anchor transaction and a bounded set of event logs.
//! 2) A public commitment `C` equals Poseidon(salt, records) (binding the proof to the data).
//! 3) Every real log was emitted in the anchor's block, by the anchor's sender, and
//!    matches the variant's event schema; exactly `expected_log_count` logs are real.
//! 4) The anchor satisfies the variant's anchor rule (e.g. it is the sender's first transaction).
//! 5) The public outputs equal the configured projections of the witnessed records.
//!
//! Privacy: the records are witnesses (never public). Only the commitment and the
//! projected outputs are public.

use crate::commitment::commit_inputs_var;
use crate::config::{CircuitConfig, OutputSource};
use crate::error::CircuitError;
use crate::gadgets::correlator::correlate;
use crate::gadgets::projector::OutputProjector;
use crate::gadgets::records::{LogVar, StorageVar, TransactionVar};
use crate::gadgets::stream::StreamVar;
use crate::types::Witness;
use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::ns;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

/// Circuit for one proof instance of a configured variant.
///
/// The constraint system's shape depends on `config` only; `witness` supplies values.
#[derive(Clone, Debug)]
pub struct ReceiptCircuit {
    config: CircuitConfig,
    witness: Witness,
}

impl ReceiptCircuit {
    /// Validate configuration and witness shape. Content is left to the constraints.
    pub fn new(config: CircuitConfig, witness: Witness) -> Result<Self, CircuitError> {
        config.validate()?;
        witness.validate_shape(&config)?;
        Ok(Self { config, witness })
    }

    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    pub fn witness(&self) -> &Witness {
        &self.witness
    }

    /// Emit all constraints into `cs`.
    pub fn synthesize(&self, cs: ConstraintSystemRef<Fr>) -> Result<(), CircuitError> {
        let config = &self.config;
        let alloc = config.allocation;
        let span = tracing::debug_span!("receipt_circuit", variant = %config.name);
        let _guard = span.enter();

        // --- Witness binding ---
        let salt = FpVar::new_witness(ns!(cs, "salt"), || Ok(self.witness.salt.to_fr()))?;
        let transactions =
            StreamVar::<TransactionVar>::bind(cs.clone(), &self.witness.transactions, alloc.max_transactions)?;
        let logs = StreamVar::<LogVar>::bind(cs.clone(), &self.witness.logs, alloc.max_logs)?;
        let slots = StreamVar::<StorageVar>::bind(cs.clone(), &self.witness.slots, alloc.max_slots)?;
        tracing::debug!(constraints = cs.num_constraints(), "bound witness streams");

        // --- Public inputs ---
        // IMPORTANT: Public input ordering MUST match `statement::PublicStatement::to_field_elems`.
        // We use: commitment, outputs[0..n).
        let commitment = commit_inputs_var(cs.clone(), &salt, &transactions, &logs, &slots)?;
        let public_commitment = FpVar::new_input(ns!(cs, "input_commitment"), || commitment.value())?;
        public_commitment.enforce_equal(&commitment)?;

        // --- Relation ---
        let anchor = transactions.underlying(0)?;
        let correlation = correlate(anchor, &logs, &config.schema)?;
        correlation.enforce(&logs, config.expected_log_count)?;

        if let Some(nonce) = config.anchor.expected_nonce {
            anchor.nonce.enforce_equal(&FpVar::constant(Fr::from(nonce)))?;
        }

        // --- Outputs ---
        let mut projector = OutputProjector::new(cs.clone());
        for spec in &config.outputs {
            let value = match spec.source {
                OutputSource::AnchorSender => anchor.from.clone(),
                OutputSource::AnchorBlockNumber => anchor.block_num.clone(),
                OutputSource::AnchorNonce => anchor.nonce.clone(),
                OutputSource::AnchorValue => anchor.value.clone(),
                OutputSource::LogField { slot, position } => {
                    let log = logs.underlying(slot)?;
                    let field = log.fields.get(position).ok_or(CircuitError::FieldCountMismatch {
                        slot,
                        expected: config.log_fields,
                        got: log.fields.len(),
                    })?;
                    field.value.clone()
                }
            };
            projector.project(&value, *spec)?;
        }

        tracing::debug!(
            constraints = cs.num_constraints(),
            witnesses = cs.num_witness_variables(),
            public_inputs = cs.num_instance_variables(),
            "emitted constraint system"
        );
        Ok(())
    }
}

impl ConstraintSynthesizer<Fr> for ReceiptCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        self.synthesize(cs).map_err(SynthesisError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CircuitVariant;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn new_rejects_wrong_capacity() {
        let config = CircuitVariant::UniswapSwap.config();
        let mut witness = Witness::padding(&config);
        witness.transactions.records.push(Default::default());
        assert!(matches!(
            ReceiptCircuit::new(config, witness),
            Err(CircuitError::CapacityMismatch { stream: "transaction", expected: 1, got: 2 })
        ));
    }

    #[test]
    fn new_rejects_wrong_field_count() {
        let config = CircuitVariant::UniswapSwap.config();
        let mut witness = Witness::padding(&config);
        witness.logs.records[1].fields.pop();
        assert!(matches!(
            ReceiptCircuit::new(config, witness),
            Err(CircuitError::FieldCountMismatch { slot: 1, expected: 3, got: 2 })
        ));
    }

    #[test]
    fn padding_witness_synthesizes_but_is_unsatisfiable() {
        let config = CircuitVariant::UniswapSwap.config();
        let circuit = ReceiptCircuit::new(config.clone(), Witness::padding(&config)).unwrap();
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        // commitment + two outputs, plus the constant one.
        assert_eq!(cs.num_instance_variables(), 1 + 1 + config.outputs.len());
        assert!(!cs.is_satisfied().unwrap());
    }
}
