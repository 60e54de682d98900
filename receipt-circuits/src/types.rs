//! Types shared between the circuit and the host-side prover/verifier.
//!
//! Records here are the witness as handed over by the external data source:
//! already decoded, already padded to each stream's capacity. The circuit trusts
//! their shape (after `Witness::validate_shape`) but not their content.

use crate::config::CircuitConfig;
use crate::error::CircuitError;
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

fn decode_hex(s: &str) -> Result<Vec<u8>, CircuitError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| CircuitError::InvalidHex(format!("{s}: {e}")))
}

/// Big-endian 32-byte image of a field element.
fn fr_to_be_bytes(x: &Fr) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&x.into_bigint().to_bytes_be());
    out
}

/// 20-byte EVM address. In-circuit it is a single 160-bit field element.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn to_fr(&self) -> Fr {
        Fr::from_be_bytes_mod_order(&self.0)
    }

    /// Recover an address from a public field element, rejecting values wider than 160 bits.
    pub fn from_fr(x: &Fr) -> Result<Self, CircuitError> {
        let bytes = fr_to_be_bytes(x);
        if bytes[..12].iter().any(|b| *b != 0) {
            return Err(CircuitError::ValueOverflow { width: 160 });
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes[12..]);
        Ok(Address(out))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for Address {
    type Err = CircuitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(s)?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| CircuitError::InvalidHex(format!("{s}: address must be 20 bytes")))?;
        Ok(Address(arr))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Unsigned integer of at most 248 bits, the circuit's native scalar width.
///
/// Stored as 32 big-endian bytes; the most significant byte is always zero.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uint248([u8; 32]);

impl Uint248 {
    pub const ZERO: Uint248 = Uint248([0u8; 32]);

    pub fn from_be_bytes(bytes: [u8; 32]) -> Result<Self, CircuitError> {
        if bytes[0] != 0 {
            return Err(CircuitError::ValueOverflow { width: 248 });
        }
        Ok(Uint248(bytes))
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Number of significant bits.
    pub fn bit_len(&self) -> u16 {
        for (i, byte) in self.0.iter().enumerate() {
            if *byte != 0 {
                return ((32 - i) * 8) as u16 - byte.leading_zeros() as u16;
            }
        }
        0
    }

    pub fn fits(&self, width: u16) -> bool {
        self.bit_len() <= width
    }

    pub fn to_fr(&self) -> Fr {
        Fr::from_be_bytes_mod_order(&self.0)
    }

    pub fn from_fr(x: &Fr) -> Result<Self, CircuitError> {
        Uint248::from_be_bytes(fr_to_be_bytes(x))
    }
}

impl From<u64> for Uint248 {
    fn from(v: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&v.to_be_bytes());
        Uint248(bytes)
    }
}

impl From<Address> for Uint248 {
    fn from(a: Address) -> Self {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(&a.0);
        Uint248(bytes)
    }
}

impl fmt::Debug for Uint248 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = hex::encode(self.0);
        let trimmed = digits.trim_start_matches('0');
        write!(f, "0x{}", if trimmed.is_empty() { "0" } else { trimmed })
    }
}

impl fmt::Display for Uint248 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for Uint248 {
    type Err = CircuitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        // Accept odd-length hex such as "0x0".
        let padded = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_string()
        };
        let bytes = decode_hex(&padded)?;
        if bytes.len() > 32 {
            return Err(CircuitError::ValueOverflow { width: 248 });
        }
        let mut out = [0u8; 32];
        out[32 - bytes.len()..].copy_from_slice(&bytes);
        Uint248::from_be_bytes(out)
    }
}

impl Serialize for Uint248 {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Uint248 {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Serde helper exposing an Fr as hex of its canonical compressed encoding.
pub mod fr_hex {
    use ark_bn254::Fr;
    use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(x: &Fr, s: S) -> Result<S::Ok, S::Error> {
        let mut bytes = Vec::new();
        x.serialize_compressed(&mut bytes)
            .map_err(serde::ser::Error::custom)?;
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Fr, D::Error> {
        let s = String::deserialize(d)?;
        let bytes = hex::decode(&s).map_err(|e| serde::de::Error::custom(format!("invalid hex: {e}")))?;
        Fr::deserialize_compressed(&bytes[..])
            .map_err(|e| serde::de::Error::custom(format!("invalid field bytes: {e}")))
    }
}

/// A record type that can live in a bounded stream.
pub trait StreamRecord: Clone {
    /// Stream name used in diagnostics.
    const STREAM: &'static str;

    /// Field elements in commitment order. Must match the in-circuit `to_field_vars`.
    fn to_field_elements(&self) -> Vec<Fr>;
}

/// One witnessed chain transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub chain_id: u64,
    pub block_num: u64,
    pub nonce: u64,
    pub gas_tip_cap_or_gas_price: Uint248,
    pub gas_fee_cap: Uint248,
    pub gas_limit: u64,
    pub from: Address,
    pub to: Address,
    pub value: Uint248,
}

impl TransactionRecord {
    pub fn padding() -> Self {
        Self::default()
    }
}

impl StreamRecord for TransactionRecord {
    const STREAM: &'static str = "transaction";

    fn to_field_elements(&self) -> Vec<Fr> {
        vec![
            Fr::from(self.chain_id),
            Fr::from(self.block_num),
            Fr::from(self.nonce),
            self.gas_tip_cap_or_gas_price.to_fr(),
            self.gas_fee_cap.to_fr(),
            Fr::from(self.gas_limit),
            self.from.to_fr(),
            self.to.to_fr(),
            self.value.to_fr(),
        ]
    }
}

/// One field extracted from an event log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogField {
    /// Contract that emitted the log.
    pub contract: Address,
    /// First six bytes of topic0, big-endian.
    pub event_id: u64,
    /// Indexed (topic) field, as opposed to the data section.
    pub is_topic: bool,
    /// Position within the topic list or the data section.
    pub index: u8,
    pub value: Uint248,
}

impl LogField {
    fn field_elements(&self) -> [Fr; 5] {
        [
            self.contract.to_fr(),
            Fr::from(self.event_id),
            Fr::from(self.is_topic),
            Fr::from(self.index as u64),
            self.value.to_fr(),
        ]
    }
}

/// One witnessed event log with a fixed number of extracted fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub block_num: u64,
    /// Sender of the transaction that emitted this log.
    pub from: Address,
    pub fields: Vec<LogField>,
}

impl LogRecord {
    pub fn padding(field_count: usize) -> Self {
        Self {
            block_num: 0,
            from: Address::ZERO,
            fields: vec![LogField::default(); field_count],
        }
    }
}

impl StreamRecord for LogRecord {
    const STREAM: &'static str = "log";

    fn to_field_elements(&self) -> Vec<Fr> {
        let mut out = Vec::with_capacity(2 + 5 * self.fields.len());
        out.push(Fr::from(self.block_num));
        out.push(self.from.to_fr());
        for field in &self.fields {
            out.extend(field.field_elements());
        }
        out
    }
}

/// One witnessed storage slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRecord {
    pub block_num: u64,
    pub contract: Address,
    pub slot: Uint248,
    pub value: Uint248,
}

impl StorageRecord {
    pub fn padding() -> Self {
        Self::default()
    }
}

impl StreamRecord for StorageRecord {
    const STREAM: &'static str = "storage";

    fn to_field_elements(&self) -> Vec<Fr> {
        vec![
            Fr::from(self.block_num),
            self.contract.to_fr(),
            self.slot.to_fr(),
            self.value.to_fr(),
        ]
    }
}

/// Capacity-padded record sequence with a witnessed actual length.
///
/// `actual_length` is not trusted: the circuit constrains it and derives each
/// slot's validity from it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedStream<T> {
    pub records: Vec<T>,
    pub actual_length: u64,
}

impl<T: StreamRecord> BoundedStream<T> {
    pub fn new(records: Vec<T>, actual_length: u64) -> Self {
        Self { records, actual_length }
    }

    /// Pad `real` up to `capacity` with copies of `pad`.
    pub fn padded(real: Vec<T>, capacity: usize, pad: T) -> Result<Self, CircuitError> {
        if real.len() > capacity {
            return Err(CircuitError::LengthExceedsCapacity {
                stream: T::STREAM,
                length: real.len() as u64,
                capacity,
            });
        }
        let actual_length = real.len() as u64;
        let mut records = real;
        records.resize(capacity, pad);
        Ok(Self { records, actual_length })
    }

    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Records below `actual_length`.
    pub fn real(&self) -> &[T] {
        let end = usize::try_from(self.actual_length)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[..end]
    }

    pub(crate) fn check_capacity(&self, capacity: usize) -> Result<(), CircuitError> {
        if self.records.len() != capacity {
            return Err(CircuitError::CapacityMismatch {
                stream: T::STREAM,
                expected: capacity,
                got: self.records.len(),
            });
        }
        Ok(())
    }
}

/// Private input of one proof instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    /// Blinding value absorbed first into the input commitment.
    pub salt: Uint248,
    pub transactions: BoundedStream<TransactionRecord>,
    pub logs: BoundedStream<LogRecord>,
    pub slots: BoundedStream<StorageRecord>,
}

impl Witness {
    /// An all-padding witness with the shape `config` demands.
    ///
    /// Used for key generation, where only the shape matters.
    pub fn padding(config: &CircuitConfig) -> Self {
        let alloc = config.allocation;
        Self {
            salt: Uint248::ZERO,
            transactions: BoundedStream::new(
                vec![TransactionRecord::padding(); alloc.max_transactions],
                0,
            ),
            logs: BoundedStream::new(vec![LogRecord::padding(config.log_fields); alloc.max_logs], 0),
            slots: BoundedStream::new(vec![StorageRecord::padding(); alloc.max_slots], 0),
        }
    }

    /// Check every stream against the allocation and every log against the field count.
    pub fn validate_shape(&self, config: &CircuitConfig) -> Result<(), CircuitError> {
        let alloc = config.allocation;
        self.transactions.check_capacity(alloc.max_transactions)?;
        self.logs.check_capacity(alloc.max_logs)?;
        self.slots.check_capacity(alloc.max_slots)?;

        for (slot, log) in self.logs.records.iter().enumerate() {
            if log.fields.len() != config.log_fields {
                return Err(CircuitError::FieldCountMismatch {
                    slot,
                    expected: config.log_fields,
                    got: log.fields.len(),
                });
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, CircuitError> {
        serde_json::from_str(json).map_err(|e| CircuitError::Config(format!("witness: {e}")))
    }
}
