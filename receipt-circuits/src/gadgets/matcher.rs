//! Schema matching for extracted event-log fields.

use crate::config::{EventSchema, FieldRule};
use crate::error::CircuitError;
use crate::gadgets::predicates::{all, flag_is, is_equal_const};
use crate::gadgets::records::{LogFieldVar, LogVar};
use ark_bn254::Fr;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

fn match_field(
    field: &LogFieldVar,
    rule: &FieldRule,
    event_id: Option<u64>,
) -> Result<Boolean<Fr>, SynthesisError> {
    let mut checks = vec![
        flag_is(&field.is_topic, rule.is_topic),
        is_equal_const(&field.index, Fr::from(rule.index as u64))?,
        is_equal_const(&field.contract, rule.contract.to_fr())?,
    ];
    if let Some(value) = &rule.value {
        checks.push(is_equal_const(&field.value, value.to_fr())?);
    }
    if let Some(id) = event_id {
        checks.push(is_equal_const(&field.event_id, Fr::from(id))?);
    }
    all(&checks)
}

/// One boolean per schema rule, in rule order.
pub fn match_fields(log: &LogVar, schema: &EventSchema) -> Result<Vec<Boolean<Fr>>, CircuitError> {
    schema
        .fields
        .iter()
        .map(|rule| -> Result<Boolean<Fr>, CircuitError> {
            let field = log
                .fields
                .get(rule.position)
                .ok_or_else(|| CircuitError::SchemaFieldOutOfRange {
                    schema: schema.name.clone(),
                    position: rule.position,
                    field_count: log.fields.len(),
                })?;
            Ok(match_field(field, rule, schema.event_id)?)
        })
        .collect()
}

/// True iff every rule of `schema` holds on `log`.
pub fn match_record(log: &LogVar, schema: &EventSchema) -> Result<Boolean<Fr>, CircuitError> {
    Ok(all(&match_fields(log, schema)?)?)
}
