//! Constraint gadgets: record variables, bounded streams, predicate combinators,
//! schema matching, correlation and output projection.

pub mod correlator;
pub mod matcher;
pub mod predicates;
pub mod projector;
pub mod records;
pub mod stream;
