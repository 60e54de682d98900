//! Joins the anchor transaction against every slot of the log stream.
//!
//! There is no indexed lookup: every slot is compared against the anchor and the
//! schema, and the number of qualifying real slots is proven instead.

use crate::config::EventSchema;
use crate::error::CircuitError;
use crate::gadgets::matcher::match_record;
use crate::gadgets::predicates::{all, enforce_true, is_equal};
use crate::gadgets::records::{LogVar, TransactionVar};
use crate::gadgets::stream::StreamVar;
use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;

pub struct Correlation {
    /// Every real slot correlates.
    pub all_match: Boolean<Fr>,
    /// Number of real slots that correlate.
    pub qualifying: FpVar<Fr>,
}

impl Correlation {
    /// Enforce that every real log correlates and that exactly `expected` logs
    /// are real and qualifying.
    pub fn enforce(&self, logs: &StreamVar<LogVar>, expected: u64) -> Result<(), CircuitError> {
        enforce_true(&self.all_match)?;
        logs.assert_length(expected)?;
        self.qualifying.enforce_equal(&FpVar::constant(Fr::from(expected)))?;
        Ok(())
    }
}

/// Evaluate `sameBlock AND sameSender AND schemaOk` once per slot, padding
/// included, then gate the results by slot validity.
pub fn correlate(
    anchor: &TransactionVar,
    logs: &StreamVar<LogVar>,
    schema: &EventSchema,
) -> Result<Correlation, CircuitError> {
    let correlates = |log: &LogVar| -> Result<Boolean<Fr>, CircuitError> {
        let same_block = is_equal(&anchor.block_num, &log.block_num)?;
        let same_sender = is_equal(&anchor.from, &log.from)?;
        let schema_ok = match_record(log, schema)?;
        Ok(all(&[same_block, same_sender, schema_ok])?)
    };

    let per_slot = logs.evaluate(correlates)?;
    let all_match = logs.all_real(&per_slot)?;
    let qualifying = logs.count_real(&per_slot)?;

    Ok(Correlation { all_match, qualifying })
}
