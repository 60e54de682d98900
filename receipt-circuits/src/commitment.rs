//! Poseidon commitment binding a proof to its exact witness.
//!
//! Absorption order: salt, then for each stream (transactions, logs, slots) its
//! actual length followed by every slot's field elements, padding included.
//! The native and in-circuit versions MUST absorb identical sequences.

use crate::constants::poseidon_config;
use crate::gadgets::records::{LogVar, RecordVar, StorageVar, TransactionVar};
use crate::gadgets::stream::StreamVar;
use crate::types::{BoundedStream, StreamRecord, Witness};
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_crypto_primitives::sponge::poseidon::PoseidonSponge;
use ark_crypto_primitives::sponge::CryptographicSponge;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

fn stream_elements<T: StreamRecord>(stream: &BoundedStream<T>) -> Vec<Fr> {
    let mut out = vec![Fr::from(stream.actual_length)];
    for record in &stream.records {
        out.extend(record.to_field_elements());
    }
    out
}

fn stream_vars<V: RecordVar>(stream: &StreamVar<V>) -> Vec<FpVar<Fr>> {
    let mut out = vec![stream.length().clone()];
    for element in stream.elements() {
        out.extend(element.to_field_vars());
    }
    out
}

/// Native commitment over a witness.
pub fn commit_inputs(witness: &Witness) -> Fr {
    let cfg = poseidon_config();
    let mut sponge = PoseidonSponge::<Fr>::new(&cfg);

    sponge.absorb(&witness.salt.to_fr());
    sponge.absorb(&stream_elements(&witness.transactions));
    sponge.absorb(&stream_elements(&witness.logs));
    sponge.absorb(&stream_elements(&witness.slots));

    sponge.squeeze_field_elements::<Fr>(1)[0]
}

/// In-circuit commitment over bound streams.
pub fn commit_inputs_var(
    cs: ConstraintSystemRef<Fr>,
    salt: &FpVar<Fr>,
    transactions: &StreamVar<TransactionVar>,
    logs: &StreamVar<LogVar>,
    slots: &StreamVar<StorageVar>,
) -> Result<FpVar<Fr>, SynthesisError> {
    let cfg = poseidon_config();
    let mut sponge = PoseidonSpongeVar::<Fr>::new(cs, &cfg);

    sponge.absorb(salt)?;
    sponge.absorb(&stream_vars(transactions))?;
    sponge.absorb(&stream_vars(logs))?;
    sponge.absorb(&stream_vars(slots))?;

    let mut out = sponge.squeeze_field_elements(1)?;
    Ok(out.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CircuitVariant;
    use crate::types::Uint248;
    use ark_r1cs_std::prelude::*;
    use ark_relations::r1cs::ConstraintSystem;

    fn commit_in_circuit(witness: &Witness) -> Fr {
        let config = CircuitVariant::UniswapSwap.config();
        let alloc = config.allocation;
        let cs = ConstraintSystem::<Fr>::new_ref();
        let salt = FpVar::new_witness(cs.clone(), || Ok(witness.salt.to_fr())).unwrap();
        let txs = StreamVar::bind(cs.clone(), &witness.transactions, alloc.max_transactions).unwrap();
        let logs = StreamVar::bind(cs.clone(), &witness.logs, alloc.max_logs).unwrap();
        let slots = StreamVar::bind(cs.clone(), &witness.slots, alloc.max_slots).unwrap();
        let c = commit_inputs_var(cs.clone(), &salt, &txs, &logs, &slots).unwrap();
        assert!(cs.is_satisfied().unwrap());
        c.value().unwrap()
    }

    #[test]
    fn native_and_circuit_agree() {
        let config = CircuitVariant::UniswapSwap.config();
        let mut witness = Witness::padding(&config);
        witness.salt = Uint248::from(42u64);
        witness.transactions.records[0].nonce = 9;
        witness.logs.actual_length = 2;
        assert_eq!(commit_inputs(&witness), commit_in_circuit(&witness));
    }

    #[test]
    fn salt_and_length_change_commitment() {
        let config = CircuitVariant::UniswapSwap.config();
        let base = Witness::padding(&config);

        let mut salted = base.clone();
        salted.salt = Uint248::from(1u64);
        assert_ne!(commit_inputs(&base), commit_inputs(&salted));

        let mut longer = base.clone();
        longer.logs.actual_length = 1;
        assert_ne!(commit_inputs(&base), commit_inputs(&longer));
    }
}
