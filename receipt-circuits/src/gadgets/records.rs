//! In-circuit counterparts of the witness records.
//!
//! Each scalar is allocated as one field element; `is_topic` is a `Boolean`, so
//! its booleanity is enforced by allocation. Bit widths are only enforced where a
//! value leaves the circuit (see `projector`); equality predicates compare exact
//! field elements and need no range check.

use crate::types::{LogField, LogRecord, StorageRecord, TransactionRecord};
use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::ns;
use ark_relations::r1cs::{Namespace, SynthesisError};
use std::borrow::Borrow;

/// Record variables in commitment order.
pub trait RecordVar {
    /// Must match `StreamRecord::to_field_elements` element for element.
    fn to_field_vars(&self) -> Vec<FpVar<Fr>>;
}

fn alloc_fp(
    cs: impl Into<Namespace<Fr>>,
    value: Fr,
    mode: AllocationMode,
) -> Result<FpVar<Fr>, SynthesisError> {
    FpVar::new_variable(cs, || Ok(value), mode)
}

#[derive(Clone)]
pub struct TransactionVar {
    pub chain_id: FpVar<Fr>,
    pub block_num: FpVar<Fr>,
    pub nonce: FpVar<Fr>,
    pub gas_tip_cap_or_gas_price: FpVar<Fr>,
    pub gas_fee_cap: FpVar<Fr>,
    pub gas_limit: FpVar<Fr>,
    pub from: FpVar<Fr>,
    pub to: FpVar<Fr>,
    pub value: FpVar<Fr>,
}

impl AllocVar<TransactionRecord, Fr> for TransactionVar {
    fn new_variable<T: Borrow<TransactionRecord>>(
        cs: impl Into<Namespace<Fr>>,
        f: impl FnOnce() -> Result<T, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let tx = f()?;
        let tx = tx.borrow();

        Ok(Self {
            chain_id: alloc_fp(ns!(cs, "chain_id"), Fr::from(tx.chain_id), mode)?,
            block_num: alloc_fp(ns!(cs, "block_num"), Fr::from(tx.block_num), mode)?,
            nonce: alloc_fp(ns!(cs, "nonce"), Fr::from(tx.nonce), mode)?,
            gas_tip_cap_or_gas_price: alloc_fp(
                ns!(cs, "gas_tip_cap_or_gas_price"),
                tx.gas_tip_cap_or_gas_price.to_fr(),
                mode,
            )?,
            gas_fee_cap: alloc_fp(ns!(cs, "gas_fee_cap"), tx.gas_fee_cap.to_fr(), mode)?,
            gas_limit: alloc_fp(ns!(cs, "gas_limit"), Fr::from(tx.gas_limit), mode)?,
            from: alloc_fp(ns!(cs, "from"), tx.from.to_fr(), mode)?,
            to: alloc_fp(ns!(cs, "to"), tx.to.to_fr(), mode)?,
            value: alloc_fp(ns!(cs, "value"), tx.value.to_fr(), mode)?,
        })
    }
}

impl RecordVar for TransactionVar {
    fn to_field_vars(&self) -> Vec<FpVar<Fr>> {
        vec![
            self.chain_id.clone(),
            self.block_num.clone(),
            self.nonce.clone(),
            self.gas_tip_cap_or_gas_price.clone(),
            self.gas_fee_cap.clone(),
            self.gas_limit.clone(),
            self.from.clone(),
            self.to.clone(),
            self.value.clone(),
        ]
    }
}

#[derive(Clone)]
pub struct LogFieldVar {
    pub contract: FpVar<Fr>,
    pub event_id: FpVar<Fr>,
    pub is_topic: Boolean<Fr>,
    pub index: FpVar<Fr>,
    pub value: FpVar<Fr>,
}

impl AllocVar<LogField, Fr> for LogFieldVar {
    fn new_variable<T: Borrow<LogField>>(
        cs: impl Into<Namespace<Fr>>,
        f: impl FnOnce() -> Result<T, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let field = f()?;
        let field = field.borrow();

        Ok(Self {
            contract: alloc_fp(ns!(cs, "contract"), field.contract.to_fr(), mode)?,
            event_id: alloc_fp(ns!(cs, "event_id"), Fr::from(field.event_id), mode)?,
            is_topic: Boolean::new_variable(ns!(cs, "is_topic"), || Ok(field.is_topic), mode)?,
            index: alloc_fp(ns!(cs, "index"), Fr::from(field.index as u64), mode)?,
            value: alloc_fp(ns!(cs, "value"), field.value.to_fr(), mode)?,
        })
    }
}

impl RecordVar for LogFieldVar {
    fn to_field_vars(&self) -> Vec<FpVar<Fr>> {
        vec![
            self.contract.clone(),
            self.event_id.clone(),
            FpVar::from(self.is_topic.clone()),
            self.index.clone(),
            self.value.clone(),
        ]
    }
}

#[derive(Clone)]
pub struct LogVar {
    pub block_num: FpVar<Fr>,
    pub from: FpVar<Fr>,
    pub fields: Vec<LogFieldVar>,
}

impl AllocVar<LogRecord, Fr> for LogVar {
    fn new_variable<T: Borrow<LogRecord>>(
        cs: impl Into<Namespace<Fr>>,
        f: impl FnOnce() -> Result<T, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let log = f()?;
        let log = log.borrow();

        let block_num = alloc_fp(ns!(cs, "block_num"), Fr::from(log.block_num), mode)?;
        let from = alloc_fp(ns!(cs, "from"), log.from.to_fr(), mode)?;
        let fields = log
            .fields
            .iter()
            .map(|field| LogFieldVar::new_variable(ns!(cs, "field"), || Ok(field), mode))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { block_num, from, fields })
    }
}

impl RecordVar for LogVar {
    fn to_field_vars(&self) -> Vec<FpVar<Fr>> {
        let mut out = Vec::with_capacity(2 + 5 * self.fields.len());
        out.push(self.block_num.clone());
        out.push(self.from.clone());
        for field in &self.fields {
            out.extend(field.to_field_vars());
        }
        out
    }
}

#[derive(Clone)]
pub struct StorageVar {
    pub block_num: FpVar<Fr>,
    pub contract: FpVar<Fr>,
    pub slot: FpVar<Fr>,
    pub value: FpVar<Fr>,
}

impl AllocVar<StorageRecord, Fr> for StorageVar {
    fn new_variable<T: Borrow<StorageRecord>>(
        cs: impl Into<Namespace<Fr>>,
        f: impl FnOnce() -> Result<T, SynthesisError>,
        mode: AllocationMode,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let record = f()?;
        let record = record.borrow();

        Ok(Self {
            block_num: alloc_fp(ns!(cs, "block_num"), Fr::from(record.block_num), mode)?,
            contract: alloc_fp(ns!(cs, "contract"), record.contract.to_fr(), mode)?,
            slot: alloc_fp(ns!(cs, "slot"), record.slot.to_fr(), mode)?,
            value: alloc_fp(ns!(cs, "value"), record.value.to_fr(), mode)?,
        })
    }
}

impl RecordVar for StorageVar {
    fn to_field_vars(&self) -> Vec<FpVar<Fr>> {
        vec![
            self.block_num.clone(),
            self.contract.clone(),
            self.slot.clone(),
            self.value.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, StreamRecord, Uint248};
    use ark_relations::r1cs::ConstraintSystem;

    fn sample_log() -> LogRecord {
        LogRecord {
            block_num: 19_000_000,
            from: Address([0x11; 20]),
            fields: vec![
                LogField {
                    contract: Address([0x22; 20]),
                    event_id: 0xabcdef,
                    is_topic: true,
                    index: 2,
                    value: Uint248::from(99u64),
                },
                LogField::default(),
            ],
        }
    }

    #[test]
    fn log_vars_follow_native_layout() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let log = sample_log();
        let var = LogVar::new_witness(cs.clone(), || Ok(&log)).unwrap();

        let values = var
            .to_field_vars()
            .iter()
            .map(|v| v.value().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(values, log.to_field_elements());
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn transaction_vars_follow_native_layout() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let tx = TransactionRecord {
            chain_id: 1,
            block_num: 7,
            nonce: 3,
            gas_limit: 21_000,
            from: Address([0x33; 20]),
            value: Uint248::from(5u64),
            ..TransactionRecord::default()
        };
        let var = TransactionVar::new_witness(cs.clone(), || Ok(tx.clone())).unwrap();
        let values = var
            .to_field_vars()
            .iter()
            .map(|v| v.value().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(values, tx.to_field_elements());
    }

    #[test]
    fn storage_vars_follow_native_layout() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let record = StorageRecord {
            block_num: 1,
            contract: Address([0x44; 20]),
            slot: Uint248::from(2u64),
            value: Uint248::from(3u64),
        };
        let var = StorageVar::new_witness(cs.clone(), || Ok(record.clone())).unwrap();
        let values = var
            .to_field_vars()
            .iter()
            .map(|v| v.value().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(values, record.to_field_elements());
    }
}
