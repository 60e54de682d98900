//! Host-side view of the circuit's public statement.
//!
//! `compute_statement` mirrors what the circuit exposes; ORDERING MUST MATCH the
//! circuit's `new_input` allocation order: commitment first, then each
//! `OutputSpec` in configuration order.

use crate::commitment::commit_inputs;
use crate::config::{CircuitConfig, OutputKind, OutputSource, OutputSpec};
use crate::error::CircuitError;
use crate::types::{fr_hex, Address, Uint248, Witness};
use ark_bn254::Fr;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PublicOutput {
    Address { value: Address },
    Uint { width: u16, value: Uint248 },
}

impl PublicOutput {
    pub fn to_fr(&self) -> Fr {
        match self {
            PublicOutput::Address { value } => value.to_fr(),
            PublicOutput::Uint { value, .. } => value.to_fr(),
        }
    }

    /// Decode one public input according to `spec`, rejecting out-of-width values.
    pub fn from_fr(x: &Fr, spec: &OutputSpec) -> Result<Self, CircuitError> {
        spec.validate_width()?;
        match spec.kind {
            OutputKind::Address => Ok(PublicOutput::Address {
                value: Address::from_fr(x)?,
            }),
            OutputKind::Uint => {
                let value = Uint248::from_fr(x)?;
                if !value.fits(spec.width) {
                    return Err(CircuitError::ValueOverflow { width: spec.width });
                }
                Ok(PublicOutput::Uint {
                    width: spec.width,
                    value,
                })
            }
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            PublicOutput::Address { value } => out.extend_from_slice(&value.0),
            PublicOutput::Uint { width, value } => {
                let bytes = value.to_be_bytes();
                out.extend_from_slice(&bytes[32 - *width as usize / 8..]);
            }
        }
    }
}

/// Everything a verifier sees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicStatement {
    #[serde(with = "fr_hex")]
    pub input_commitment: Fr,
    pub outputs: Vec<PublicOutput>,
}

impl PublicStatement {
    /// Public-input vector in circuit allocation order.
    pub fn to_field_elems(&self) -> Vec<Fr> {
        let mut v = Vec::with_capacity(1 + self.outputs.len());
        v.push(self.input_commitment);
        v.extend(self.outputs.iter().map(PublicOutput::to_fr));
        v
    }

    /// Decode a public-input vector with the known output layout.
    pub fn from_field_elems(elems: &[Fr], specs: &[OutputSpec]) -> Result<Self, CircuitError> {
        if elems.len() != 1 + specs.len() {
            return Err(CircuitError::StatementLength {
                expected: 1 + specs.len(),
                got: elems.len(),
            });
        }
        let outputs = elems[1..]
            .iter()
            .zip(specs)
            .map(|(x, spec)| PublicOutput::from_fr(x, spec))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            input_commitment: elems[0],
            outputs,
        })
    }

    /// Packed big-endian encoding of the outputs: 20 bytes per address,
    /// `width / 8` bytes per uint, no padding between entries.
    pub fn encode_outputs(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for output in &self.outputs {
            output.encode_into(&mut out);
        }
        out
    }
}

/// Inverse of `PublicStatement::encode_outputs`.
pub fn decode_outputs(bytes: &[u8], specs: &[OutputSpec]) -> Result<Vec<PublicOutput>, CircuitError> {
    let expected: usize = specs.iter().map(OutputSpec::byte_len).sum();
    if bytes.len() != expected {
        return Err(CircuitError::StatementLength {
            expected,
            got: bytes.len(),
        });
    }

    let mut offset = 0;
    let mut outputs = Vec::with_capacity(specs.len());
    for spec in specs {
        spec.validate_width()?;
        let chunk = &bytes[offset..offset + spec.byte_len()];
        offset += spec.byte_len();

        let mut word = [0u8; 32];
        word[32 - chunk.len()..].copy_from_slice(chunk);
        let value = Uint248::from_be_bytes(word)?;
        outputs.push(match spec.kind {
            OutputKind::Address => {
                let mut addr = [0u8; 20];
                addr.copy_from_slice(chunk);
                PublicOutput::Address { value: Address(addr) }
            }
            OutputKind::Uint => PublicOutput::Uint {
                width: spec.width,
                value,
            },
        });
    }
    Ok(outputs)
}

fn project_native(config: &CircuitConfig, witness: &Witness, spec: &OutputSpec) -> Result<PublicOutput, CircuitError> {
    let anchor = witness
        .transactions
        .records
        .first()
        .ok_or(CircuitError::MissingAnchor)?;

    let value = match spec.source {
        OutputSource::AnchorSender => Uint248::from(anchor.from),
        OutputSource::AnchorBlockNumber => Uint248::from(anchor.block_num),
        OutputSource::AnchorNonce => Uint248::from(anchor.nonce),
        OutputSource::AnchorValue => anchor.value,
        OutputSource::LogField { slot, position } => {
            let log = witness.logs.records.get(slot).ok_or(CircuitError::SlotOutOfRange {
                stream: "log",
                index: slot,
                capacity: config.allocation.max_logs,
            })?;
            let field = log.fields.get(position).ok_or(CircuitError::FieldCountMismatch {
                slot,
                expected: config.log_fields,
                got: log.fields.len(),
            })?;
            field.value
        }
    };

    PublicOutput::from_fr(&value.to_fr(), spec)
}

/// Native mirror of the public statement the circuit exposes for `witness`.
///
/// This MUST match the circuit's logic.
pub fn compute_statement(config: &CircuitConfig, witness: &Witness) -> Result<PublicStatement, CircuitError> {
    config.validate()?;
    witness.validate_shape(config)?;

    let outputs = config
        .outputs
        .iter()
        .map(|spec| project_native(config, witness, spec))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PublicStatement {
        input_commitment: commit_inputs(witness),
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CircuitVariant;

    fn swap_statement() -> (CircuitConfig, PublicStatement) {
        let config = CircuitVariant::UniswapSwap.config();
        let mut witness = Witness::padding(&config);
        witness.transactions.actual_length = 1;
        witness.transactions.records[0].from = Address([0xc0; 20]);
        witness.transactions.records[0].block_num = 19_437_112;
        let statement = compute_statement(&config, &witness).unwrap();
        (config, statement)
    }

    #[test]
    fn outputs_follow_config_order() {
        let (_, statement) = swap_statement();
        assert_eq!(
            statement.outputs,
            vec![
                PublicOutput::Address { value: Address([0xc0; 20]) },
                PublicOutput::Uint { width: 64, value: Uint248::from(19_437_112u64) },
            ]
        );
    }

    #[test]
    fn field_elements_decode_back() {
        let (config, statement) = swap_statement();
        let elems = statement.to_field_elems();
        assert_eq!(elems.len(), 3);
        let back = PublicStatement::from_field_elems(&elems, &config.outputs).unwrap();
        assert_eq!(back, statement);
    }

    #[test]
    fn field_elements_reject_bad_layout() {
        let (config, statement) = swap_statement();
        let elems = statement.to_field_elems();
        assert!(matches!(
            PublicStatement::from_field_elems(&elems[..2], &config.outputs),
            Err(CircuitError::StatementLength { expected: 3, got: 2 })
        ));

        let mut wide = elems.clone();
        wide[2] = Fr::from(u64::MAX) + Fr::from(1u64);
        assert!(matches!(
            PublicStatement::from_field_elems(&wide, &config.outputs),
            Err(CircuitError::ValueOverflow { width: 64 })
        ));
    }

    #[test]
    fn packed_encoding_layout() {
        let (config, statement) = swap_statement();
        let bytes = statement.encode_outputs();
        assert_eq!(bytes.len(), 20 + 8);
        assert_eq!(&bytes[..20], &[0xc0; 20]);
        assert_eq!(&bytes[20..], &19_437_112u64.to_be_bytes());
        assert_eq!(decode_outputs(&bytes, &config.outputs).unwrap(), statement.outputs);
        assert!(decode_outputs(&bytes[1..], &config.outputs).is_err());
    }

    #[test]
    fn statement_json_round_trip() {
        let (_, statement) = swap_statement();
        let json = serde_json::to_string(&statement).unwrap();
        let back: PublicStatement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, statement);
    }

    #[test]
    fn rejects_misshapen_witness() {
        let config = CircuitVariant::UniswapSwap.config();
        let mut witness = Witness::padding(&config);
        witness.logs.records.pop();
        assert!(matches!(
            compute_statement(&config, &witness),
            Err(CircuitError::CapacityMismatch { stream: "log", expected: 3, got: 2 })
        ));
    }
}
