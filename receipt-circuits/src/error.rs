//! Build-time errors raised while validating configuration and witness shape.
//!
//! These indicate a programming or configuration defect. A witness that is
//! well-shaped but wrong never produces one of these: it yields an
//! unsatisfiable constraint system instead.

use ark_relations::r1cs::SynthesisError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CircuitError {
    #[error("{stream} stream holds {got} records but its capacity is {expected}")]
    CapacityMismatch {
        stream: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{stream} stream: length {length} exceeds capacity {capacity}")]
    LengthExceedsCapacity {
        stream: &'static str,
        length: u64,
        capacity: usize,
    },

    #[error("{stream} stream: slot {index} is outside capacity {capacity}")]
    SlotOutOfRange {
        stream: &'static str,
        index: usize,
        capacity: usize,
    },

    #[error("log slot {slot} has {got} fields, circuit expects {expected}")]
    FieldCountMismatch {
        slot: usize,
        expected: usize,
        got: usize,
    },

    #[error("schema `{schema}` references field {position}, record has {field_count} fields")]
    SchemaFieldOutOfRange {
        schema: String,
        position: usize,
        field_count: usize,
    },

    #[error("schema `{schema}` declares field {position} more than once")]
    DuplicateSchemaField { schema: String, position: usize },

    #[error("schema `{0}` declares no fields")]
    EmptySchema(String),

    #[error("circuit allocates no transaction slot for the anchor transaction")]
    MissingAnchor,

    #[error("invalid output width {width} for {kind} output")]
    InvalidOutputWidth { width: u16, kind: &'static str },

    #[error("value does not fit in {width} bits")]
    ValueOverflow { width: u16 },

    #[error("public statement has {got} elements, layout expects {expected}")]
    StatementLength { expected: usize, got: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("constraint synthesis failed: {0}")]
    Synthesis(SynthesisError),
}

impl From<SynthesisError> for CircuitError {
    fn from(e: SynthesisError) -> Self {
        CircuitError::Synthesis(e)
    }
}

impl From<CircuitError> for SynthesisError {
    fn from(e: CircuitError) -> Self {
        match e {
            CircuitError::Synthesis(inner) => inner,
            other => {
                tracing::error!(error = %other, "rejecting circuit at build time");
                SynthesisError::Unsatisfiable
            }
        }
    }
}
