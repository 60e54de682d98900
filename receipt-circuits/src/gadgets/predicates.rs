//! Boolean combinators over constraint variables.
//!
//! Nothing here branches on witnessed values. The only branches are on
//! constants (configuration), which keeps the constraint system's shape a
//! function of the configuration alone.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField, Zero};
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

/// k-ary AND. The empty conjunction is true.
pub fn all(preds: &[Boolean<Fr>]) -> Result<Boolean<Fr>, SynthesisError> {
    match preds {
        [] => Ok(Boolean::constant(true)),
        [single] => Ok(single.clone()),
        _ => Boolean::kary_and(preds),
    }
}

/// k-ary OR. The empty disjunction is false.
pub fn any(preds: &[Boolean<Fr>]) -> Result<Boolean<Fr>, SynthesisError> {
    match preds {
        [] => Ok(Boolean::constant(false)),
        [single] => Ok(single.clone()),
        _ => Boolean::kary_or(preds),
    }
}

pub fn is_equal(a: &FpVar<Fr>, b: &FpVar<Fr>) -> Result<Boolean<Fr>, SynthesisError> {
    a.is_eq(b)
}

pub fn is_equal_const(a: &FpVar<Fr>, c: Fr) -> Result<Boolean<Fr>, SynthesisError> {
    if c.is_zero() {
        return is_zero(a);
    }
    a.is_eq(&FpVar::constant(c))
}

pub fn is_zero(a: &FpVar<Fr>) -> Result<Boolean<Fr>, SynthesisError> {
    a.is_zero()
}

/// `flag == expected` for a constant `expected`.
pub fn flag_is(flag: &Boolean<Fr>, expected: bool) -> Boolean<Fr> {
    if expected { flag.clone() } else { !flag.clone() }
}

fn check_same_slots(mask: &[Boolean<Fr>], preds: &[Boolean<Fr>]) -> Result<(), SynthesisError> {
    if mask.len() != preds.len() {
        tracing::error!(mask = mask.len(), preds = preds.len(), "mask and predicates cover different slots");
        return Err(SynthesisError::Unsatisfiable);
    }
    Ok(())
}

/// `mask => pred` for each slot, ANDed together.
///
/// A slot whose mask is false contributes `true` whatever its predicate says,
/// so padding can never make the conjunction fail or pass on its own.
pub fn weighted_all(mask: &[Boolean<Fr>], preds: &[Boolean<Fr>]) -> Result<Boolean<Fr>, SynthesisError> {
    check_same_slots(mask, preds)?;
    let implied = mask
        .iter()
        .zip(preds)
        .map(|(m, p)| any(&[!m.clone(), p.clone()]))
        .collect::<Result<Vec<_>, _>>()?;
    all(&implied)
}

/// Number of slots where both the mask and the predicate hold.
pub fn weighted_count(mask: &[Boolean<Fr>], preds: &[Boolean<Fr>]) -> Result<FpVar<Fr>, SynthesisError> {
    check_same_slots(mask, preds)?;
    let mut count = FpVar::<Fr>::constant(Fr::from(0u64));
    for (m, p) in mask.iter().zip(preds) {
        let hit = all(&[m.clone(), p.clone()])?;
        count += FpVar::from(hit);
    }
    Ok(count)
}

pub fn enforce_true(b: &Boolean<Fr>) -> Result<(), SynthesisError> {
    b.enforce_equal(&Boolean::constant(true))
}

/// Pack little-endian bits into a field element. Linear, no constraints.
pub fn bits_le_to_fp(bits_le: &[Boolean<Fr>]) -> FpVar<Fr> {
    let mut acc = FpVar::<Fr>::constant(Fr::from(0u64));
    let mut coeff = Fr::from(1u64);

    for b in bits_le {
        acc += FpVar::from(b.clone()) * coeff;
        coeff += coeff;
    }

    acc
}

/// Enforce `v < 2^width` and return its `width` little-endian bits.
///
/// `width` must stay below the field's capacity (at most 248 here), otherwise
/// the decomposition is not unique.
pub fn enforce_bit_width(v: &FpVar<Fr>, width: usize) -> Result<Vec<Boolean<Fr>>, SynthesisError> {
    debug_assert!(width < Fr::MODULUS_BIT_SIZE as usize);

    let cs = v.cs();
    if cs.is_none() {
        // Constant: check natively.
        let bits = v.value()?.into_bigint().to_bits_le();
        if bits[width..].iter().any(|b| *b) {
            return Err(SynthesisError::Unsatisfiable);
        }
        return Ok(bits[..width].iter().map(|b| Boolean::constant(*b)).collect());
    }

    let native = v.value().map(|x| x.into_bigint().to_bits_le());
    let mut bits = Vec::with_capacity(width);
    for i in 0..width {
        let bit = Boolean::new_witness(cs.clone(), || {
            native
                .as_ref()
                .map(|b| b[i])
                .map_err(|_| SynthesisError::AssignmentMissing)
        })?;
        bits.push(bit);
    }

    bits_le_to_fp(&bits).enforce_equal(v)?;
    Ok(bits)
}
