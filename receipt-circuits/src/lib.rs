//! ZK layer proving that chain records satisfy a declared relational schema.
//!
//! This crate contains:
//! - Typed witness records (transactions, event logs, storage slots) and capacity-padded streams.
//! - Constraint gadgets: validity-gated stream combinators, event schema matching,
//!   anchor/log correlation and public output projection.
//! - A SNARK circuit assembling them for a configured circuit variant.
//! - Groth16 prover + verifier orchestration and serialization helpers.

pub mod circuit;
pub mod commitment;
pub mod config;
pub mod constants;
pub mod error;
pub mod gadgets;
pub mod groth16;
pub mod statement;
pub mod types;

pub use circuit::ReceiptCircuit;
pub use config::{CircuitAllocation, CircuitConfig, CircuitVariant};
pub use error::CircuitError;
pub use statement::{compute_statement, PublicOutput, PublicStatement};
pub use types::{Address, BoundedStream, LogField, LogRecord, StorageRecord, TransactionRecord, Uint248, Witness};
