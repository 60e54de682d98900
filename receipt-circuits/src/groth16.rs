//! Groth16 prover/verifier orchestration for the receipt circuit.
//!
//! SECURITY NOTE: Groth16 requires a trusted setup that produces a proving key (PK)
//! and verifying key (VK). `setup_keys` generates them locally; deployments should
//! take keys from an MPC ceremony instead.

use crate::circuit::ReceiptCircuit;
use crate::config::CircuitConfig;
use crate::error::CircuitError;
use crate::statement::{compute_statement, PublicStatement};
use crate::types::Witness;
use ark_bn254::{Bn254, Fr};
use ark_groth16::{prepare_verifying_key, Groth16, Proof, ProvingKey, VerifyingKey};
use ark_relations::r1cs::{ConstraintSystem, SynthesisError};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ZkError {
    #[error(transparent)]
    Circuit(#[from] CircuitError),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("witness does not satisfy the circuit (first failing constraint: {0})")]
    Unsatisfiable(String),

    #[error("proof verification failed")]
    VerificationFailed,

    #[error("arkworks error: {0}")]
    Ark(String),
}

/// Generate a Groth16 keypair for a circuit variant.
///
/// For a fixed config, this must be run once: the keys depend on the
/// constraint system's shape, which depends on the config only.
pub fn setup_keys(
    config: &CircuitConfig,
    rng: &mut impl RngCore,
) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>), ZkError> {
    let circuit = ReceiptCircuit::new(config.clone(), Witness::padding(config))?;

    let pk = Groth16::<Bn254>::generate_random_parameters_with_reduction(circuit, rng)
        .map_err(|e| ZkError::Ark(format!("{e}")))?;

    info!(variant = %config.name, "generated groth16 keys");
    let vk = pk.vk.clone();
    Ok((pk, vk))
}

/// Synthesize `circuit` natively and reject it if any constraint fails.
///
/// The Groth16 prover does not report unsatisfiable witnesses: it asserts in
/// debug builds and emits a proof that never verifies in release builds.
fn check_satisfied(circuit: &ReceiptCircuit) -> Result<(), ZkError> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit.synthesize(cs.clone())?;
    let ark = |e: SynthesisError| ZkError::Ark(format!("{e}"));
    if !cs.is_satisfied().map_err(ark)? {
        let failing = cs.which_is_unsatisfied().map_err(ark)?.unwrap_or_default();
        warn!(variant = %circuit.config().name, constraint = %failing, "witness does not satisfy circuit");
        return Err(ZkError::Unsatisfiable(failing));
    }
    Ok(())
}

/// Prove that `witness` satisfies `config`'s relation.
///
/// A well-shaped witness that violates the relation is rejected with
/// `ZkError::Unsatisfiable` before any proving work.
pub fn prove(
    rng: &mut impl RngCore,
    pk: &ProvingKey<Bn254>,
    config: &CircuitConfig,
    witness: Witness,
) -> Result<(Proof<Bn254>, PublicStatement), ZkError> {
    let statement = compute_statement(config, &witness)?;
    let real_logs = witness.logs.real().len();
    let circuit = ReceiptCircuit::new(config.clone(), witness)?;
    check_satisfied(&circuit)?;

    let proof = Groth16::<Bn254>::create_random_proof_with_reduction(circuit, pk, rng)
        .map_err(|e| ZkError::Ark(format!("{e}")))?;

    info!(variant = %config.name, real_logs, outputs = statement.outputs.len(), "created proof");
    Ok((proof, statement))
}

/// Verify a proof against a public statement.
pub fn verify(
    vk: &VerifyingKey<Bn254>,
    proof: &Proof<Bn254>,
    statement: &PublicStatement,
) -> Result<(), ZkError> {
    let pvk = prepare_verifying_key(vk);
    let public_inputs = statement.to_field_elems();
    let ok = Groth16::<Bn254>::verify_proof(&pvk, proof, &public_inputs)
        .map_err(|e| ZkError::Ark(format!("{e}")))?;
    if !ok {
        return Err(ZkError::VerificationFailed);
    }
    Ok(())
}

fn serialize<T: CanonicalSerialize>(value: &T) -> Result<Vec<u8>, ZkError> {
    let mut out = Vec::new();
    value
        .serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn serialize_pk(pk: &ProvingKey<Bn254>) -> Result<Vec<u8>, ZkError> {
    serialize(pk)
}

pub fn deserialize_pk(bytes: &[u8]) -> Result<ProvingKey<Bn254>, ZkError> {
    ProvingKey::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))
}

pub fn serialize_vk(vk: &VerifyingKey<Bn254>) -> Result<Vec<u8>, ZkError> {
    serialize(vk)
}

pub fn deserialize_vk(bytes: &[u8]) -> Result<VerifyingKey<Bn254>, ZkError> {
    VerifyingKey::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))
}

pub fn serialize_proof(proof: &Proof<Bn254>) -> Result<Vec<u8>, ZkError> {
    serialize(proof)
}

pub fn deserialize_proof(bytes: &[u8]) -> Result<Proof<Bn254>, ZkError> {
    Proof::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))
}

/// JSON-friendly proof plus the statement it proves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofBundle {
    pub variant: String,
    pub proof_b64: String,
    pub statement: PublicStatement,
}

impl ProofBundle {
    pub fn new(config: &CircuitConfig, proof: &Proof<Bn254>, statement: PublicStatement) -> Result<Self, ZkError> {
        let b64 = base64::engine::general_purpose::STANDARD;
        Ok(Self {
            variant: config.name.clone(),
            proof_b64: b64.encode(serialize_proof(proof)?),
            statement,
        })
    }

    pub fn proof(&self) -> Result<Proof<Bn254>, ZkError> {
        let b64 = base64::engine::general_purpose::STANDARD;
        let bytes = b64
            .decode(&self.proof_b64)
            .map_err(|e| ZkError::Serialization(format!("invalid base64: {e}")))?;
        deserialize_proof(&bytes)
    }

    /// Verify the bundled proof against its bundled statement.
    pub fn verify(&self, vk: &VerifyingKey<Bn254>) -> Result<(), ZkError> {
        verify(vk, &self.proof()?, &self.statement)
    }
}
