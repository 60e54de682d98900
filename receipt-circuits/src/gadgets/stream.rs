//! Fixed-capacity record streams with a constrained actual length.
//!
//! A stream always holds exactly `capacity` slots. Which of them are real is
//! decided in-circuit from the witnessed length: `valid[i] <=> length > i`.
//! Every operation evaluates every slot and weights the result by that flag.

use crate::error::CircuitError;
use crate::gadgets::predicates::{any, enforce_true, is_equal_const, weighted_all, weighted_count};
use crate::types::{BoundedStream, StreamRecord};
use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::ns;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

pub struct StreamVar<V> {
    name: &'static str,
    elements: Vec<V>,
    length: FpVar<Fr>,
    validity: Vec<Boolean<Fr>>,
}

impl<V> StreamVar<V> {
    /// Allocate every slot of `stream` and constrain its length to `0..=capacity`.
    ///
    /// Fails before allocating anything if the stream does not hold exactly
    /// `capacity` records.
    pub fn bind<T>(
        cs: ConstraintSystemRef<Fr>,
        stream: &BoundedStream<T>,
        capacity: usize,
    ) -> Result<Self, CircuitError>
    where
        T: StreamRecord,
        V: AllocVar<T, Fr>,
    {
        stream.check_capacity(capacity)?;

        let elements = stream
            .records
            .iter()
            .map(|record| V::new_witness(ns!(cs, "slot"), || Ok(record)))
            .collect::<Result<Vec<_>, _>>()?;

        let length = FpVar::new_witness(ns!(cs, "actual_length"), || Ok(Fr::from(stream.actual_length)))?;

        // One-hot selector over 0..=capacity. `seen` after slot i is `length <= i`.
        let mut validity = Vec::with_capacity(capacity);
        let mut seen = Boolean::constant(false);
        for i in 0..capacity {
            let at_i = is_equal_const(&length, Fr::from(i as u64))?;
            seen = any(&[seen, at_i])?;
            validity.push(!seen.clone());
        }
        let at_capacity = is_equal_const(&length, Fr::from(capacity as u64))?;
        enforce_true(&any(&[seen, at_capacity])?)?;

        tracing::trace!(stream = T::STREAM, capacity, "bound stream");

        Ok(Self {
            name: T::STREAM,
            elements,
            length,
            validity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &[V] {
        &self.elements
    }

    pub fn length(&self) -> &FpVar<Fr> {
        &self.length
    }

    /// `valid[i]` is true iff slot `i` holds a real record.
    pub fn validity(&self) -> &[Boolean<Fr>] {
        &self.validity
    }

    /// Evaluate `pred` on every slot, padding included. No early exit.
    pub fn evaluate<P, E>(&self, mut pred: P) -> Result<Vec<Boolean<Fr>>, E>
    where
        P: FnMut(&V) -> Result<Boolean<Fr>, E>,
    {
        self.elements.iter().map(|e| pred(e)).collect()
    }

    /// `AND_i (valid_i => results[i])` over per-slot results from `evaluate`.
    pub fn all_real(&self, results: &[Boolean<Fr>]) -> Result<Boolean<Fr>, SynthesisError> {
        weighted_all(&self.validity, results)
    }

    /// `sum_i (valid_i AND results[i])` over per-slot results from `evaluate`.
    pub fn count_real(&self, results: &[Boolean<Fr>]) -> Result<FpVar<Fr>, SynthesisError> {
        weighted_count(&self.validity, results)
    }

    /// `AND_i (mask(i) => pred(slot_i))`.
    pub fn for_each_weighted<M, P, E>(&self, mask: M, pred: P) -> Result<Boolean<Fr>, E>
    where
        M: Fn(usize) -> Boolean<Fr>,
        P: FnMut(&V) -> Result<Boolean<Fr>, E>,
        E: From<SynthesisError>,
    {
        let results = self.evaluate(pred)?;
        let mask = (0..self.capacity()).map(mask).collect::<Vec<_>>();
        Ok(weighted_all(&mask, &results)?)
    }

    /// `pred` holds on every real slot.
    pub fn for_each<P, E>(&self, pred: P) -> Result<Boolean<Fr>, E>
    where
        P: FnMut(&V) -> Result<Boolean<Fr>, E>,
        E: From<SynthesisError>,
    {
        let results = self.evaluate(pred)?;
        Ok(self.all_real(&results)?)
    }

    /// Number of real slots on which `pred` holds.
    pub fn count<P, E>(&self, pred: P) -> Result<FpVar<Fr>, E>
    where
        P: FnMut(&V) -> Result<Boolean<Fr>, E>,
        E: From<SynthesisError>,
    {
        let results = self.evaluate(pred)?;
        Ok(self.count_real(&results)?)
    }

    /// Constrain the actual length to `expected`.
    pub fn assert_length(&self, expected: u64) -> Result<(), CircuitError> {
        if expected > self.capacity() as u64 {
            return Err(CircuitError::LengthExceedsCapacity {
                stream: self.name,
                length: expected,
                capacity: self.capacity(),
            });
        }
        self.length.enforce_equal(&FpVar::constant(Fr::from(expected)))?;
        Ok(())
    }

    /// Slot `index`, constrained to be a real record.
    pub fn underlying(&self, index: usize) -> Result<&V, CircuitError> {
        let element = self.elements.get(index).ok_or(CircuitError::SlotOutOfRange {
            stream: self.name,
            index,
            capacity: self.capacity(),
        })?;
        enforce_true(&self.validity[index])?;
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gadgets::records::StorageVar;
    use crate::types::{StorageRecord, Uint248};
    use ark_relations::r1cs::ConstraintSystem;

    fn records(values: &[u64]) -> Vec<StorageRecord> {
        values
            .iter()
            .map(|v| StorageRecord {
                value: Uint248::from(*v),
                ..StorageRecord::default()
            })
            .collect()
    }

    fn bind(cs: &ConstraintSystemRef<Fr>, values: &[u64], length: u64) -> StreamVar<StorageVar> {
        let stream = BoundedStream::new(records(values), length);
        StreamVar::bind(cs.clone(), &stream, values.len()).unwrap()
    }

    fn value_is(target: u64) -> impl FnMut(&StorageVar) -> Result<Boolean<Fr>, SynthesisError> {
        move |s: &StorageVar| is_equal_const(&s.value, Fr::from(target))
    }

    #[test]
    fn bind_rejects_wrong_capacity() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let stream = BoundedStream::new(records(&[1, 2]), 1);
        let res = StreamVar::<StorageVar>::bind(cs, &stream, 3);
        assert!(matches!(
            res,
            Err(CircuitError::CapacityMismatch { stream: "storage", expected: 3, got: 2 })
        ));
    }

    #[test]
    fn every_length_up_to_capacity_is_satisfiable() {
        for length in 0..=4 {
            let cs = ConstraintSystem::<Fr>::new_ref();
            let s = bind(&cs, &[1, 2, 3, 4], length);
            let flags = s.validity().iter().map(|b| b.value().unwrap()).collect::<Vec<_>>();
            let expected = (0..4).map(|i| (i as u64) < length).collect::<Vec<_>>();
            assert_eq!(flags, expected);
            assert!(cs.is_satisfied().unwrap(), "length {length}");
        }
    }

    #[test]
    fn length_beyond_capacity_is_unsatisfiable() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        bind(&cs, &[1, 2], 3);
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn zero_capacity_stream() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let s = bind(&cs, &[], 0);
        assert_eq!(s.capacity(), 0);
        assert!(s.for_each(value_is(1)).unwrap().value().unwrap());
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn for_each_skips_padding() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let s = bind(&cs, &[5, 5, 9], 2);
        assert!(s.for_each(value_is(5)).unwrap().value().unwrap());

        let s = bind(&cs, &[5, 9, 9], 2);
        assert!(!s.for_each(value_is(5)).unwrap().value().unwrap());
    }

    #[test]
    fn for_each_weighted_uses_custom_mask() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let s = bind(&cs, &[5, 9, 5], 3);
        let even_slots = s
            .for_each_weighted(|i| Boolean::constant(i % 2 == 0), value_is(5))
            .unwrap();
        assert!(even_slots.value().unwrap());
        assert!(!s.for_each(value_is(5)).unwrap().value().unwrap());
    }

    #[test]
    fn count_ignores_padding_matches() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let s = bind(&cs, &[7, 1, 7, 7], 2);
        assert_eq!(s.count(value_is(7)).unwrap().value().unwrap(), Fr::from(1u64));
        assert_eq!(s.evaluate(value_is(7)).unwrap().len(), 4);
    }

    #[test]
    fn gating_reuses_one_evaluation() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let s = bind(&cs, &[7, 7, 7], 2);
        let results = s.evaluate(value_is(7)).unwrap();
        let before = cs.num_constraints();
        assert!(s.all_real(&results).unwrap().value().unwrap());
        assert_eq!(s.count_real(&results).unwrap().value().unwrap(), Fr::from(2u64));
        assert!(s.all_real(&results[..2]).is_err());

        let separate = ConstraintSystem::<Fr>::new_ref();
        let t = bind(&separate, &[7, 7, 7], 2);
        let base = separate.num_constraints();
        t.for_each(value_is(7)).unwrap();
        t.count(value_is(7)).unwrap();
        assert!(cs.num_constraints() - before < separate.num_constraints() - base);
    }

    #[test]
    fn assert_length_constrains_witness() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let s = bind(&cs, &[1, 2, 3], 2);
        s.assert_length(2).unwrap();
        assert!(cs.is_satisfied().unwrap());
        s.assert_length(1).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn assert_length_beyond_capacity_is_build_error() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let s = bind(&cs, &[1], 1);
        assert!(matches!(s.assert_length(2), Err(CircuitError::LengthExceedsCapacity { .. })));
    }

    #[test]
    fn underlying_requires_real_slot() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let s = bind(&cs, &[1, 2], 1);
        assert!(s.underlying(0).is_ok());
        assert!(cs.is_satisfied().unwrap());
        s.underlying(1).unwrap();
        assert!(!cs.is_satisfied().unwrap());
        assert!(matches!(s.underlying(2), Err(CircuitError::SlotOutOfRange { index: 2, .. })));
    }
}
