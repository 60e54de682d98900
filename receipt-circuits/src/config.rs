//! Circuit variant configuration.
//!
//! Everything here is static, build-time data: it fixes the physical shape of the
//! constraint system. Two proof instances of the same variant must see an
//! identical `CircuitConfig`, or their proofs are structurally incompatible.

use crate::constants::{
    ADDRESS_BITS, EVENT_ID_BITS, SWAP_EVENT_ID, SWAP_LOG_FIELDS, TRANSFER_EVENT_ID, TRANSFER_LOG_FIELDS,
    U64_BITS, UINT248_BITS, USDC_POOL_ADDRESS, USDC_TOKEN_ADDRESS,
};
use crate::error::CircuitError;
use crate::types::{Address, Uint248};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Maximum number of records each stream of a circuit variant can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitAllocation {
    pub max_logs: usize,
    pub max_slots: usize,
    pub max_transactions: usize,
}

/// Built-in circuit variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitVariant {
    /// A sender's first transaction swapped through the USDC/WETH pool.
    UniswapSwap,
    /// A sender's first transaction moved USDC.
    Erc20Transfer,
}

impl CircuitVariant {
    pub const fn allocation(&self) -> CircuitAllocation {
        match self {
            CircuitVariant::UniswapSwap => CircuitAllocation {
                max_logs: 3,
                max_slots: 0,
                max_transactions: 1,
            },
            CircuitVariant::Erc20Transfer => CircuitAllocation {
                max_logs: 4,
                max_slots: 0,
                max_transactions: 1,
            },
        }
    }

    pub fn config(&self) -> CircuitConfig {
        match self {
            CircuitVariant::UniswapSwap => uniswap_swap(),
            CircuitVariant::Erc20Transfer => erc20_transfer(),
        }
    }
}

/// Expected shape of one extracted log field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Position of the field within `LogRecord::fields`.
    pub position: usize,
    pub is_topic: bool,
    pub index: u8,
    pub contract: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Uint248>,
}

/// Declarative ABI-level shape of one event type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSchema {
    pub name: String,
    /// When set, every matched field must carry this event id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<u64>,
    pub fields: Vec<FieldRule>,
}

impl EventSchema {
    pub fn validate(&self, field_count: usize) -> Result<(), CircuitError> {
        if self.fields.is_empty() {
            return Err(CircuitError::EmptySchema(self.name.clone()));
        }
        if let Some(id) = self.event_id {
            if id >> EVENT_ID_BITS != 0 {
                return Err(CircuitError::Config(format!(
                    "schema {}: event id {id:#x} exceeds {EVENT_ID_BITS} bits",
                    self.name
                )));
            }
        }
        let mut seen = BTreeSet::new();
        for rule in &self.fields {
            if rule.position >= field_count {
                return Err(CircuitError::SchemaFieldOutOfRange {
                    schema: self.name.clone(),
                    position: rule.position,
                    field_count,
                });
            }
            if !seen.insert(rule.position) {
                return Err(CircuitError::DuplicateSchemaField {
                    schema: self.name.clone(),
                    position: rule.position,
                });
            }
        }
        Ok(())
    }
}

/// Constraints on the anchor transaction itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_nonce: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Address,
    Uint,
}

impl OutputKind {
    pub fn name(&self) -> &'static str {
        match self {
            OutputKind::Address => "address",
            OutputKind::Uint => "uint",
        }
    }
}

/// Witnessed value an output is projected from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSource {
    AnchorSender,
    AnchorBlockNumber,
    AnchorNonce,
    AnchorValue,
    LogField { slot: usize, position: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub source: OutputSource,
    pub kind: OutputKind,
    pub width: u16,
}

impl OutputSpec {
    pub const fn address(source: OutputSource) -> Self {
        Self {
            source,
            kind: OutputKind::Address,
            width: ADDRESS_BITS,
        }
    }

    pub const fn uint(source: OutputSource, width: u16) -> Self {
        Self {
            source,
            kind: OutputKind::Uint,
            width,
        }
    }

    /// Addresses are exactly 160 bits; uints are whole bytes up to 248 bits.
    pub fn validate_width(&self) -> Result<(), CircuitError> {
        let ok = match self.kind {
            OutputKind::Address => self.width == ADDRESS_BITS,
            OutputKind::Uint => self.width > 0 && self.width <= UINT248_BITS && self.width % 8 == 0,
        };
        if !ok {
            return Err(CircuitError::InvalidOutputWidth {
                width: self.width,
                kind: self.kind.name(),
            });
        }
        Ok(())
    }

    /// Bytes this output occupies in the packed encoding.
    pub fn byte_len(&self) -> usize {
        self.width as usize / 8
    }
}

/// Full static description of one circuit variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitConfig {
    pub name: String,
    pub allocation: CircuitAllocation,
    /// Fixed number of fields per log record.
    pub log_fields: usize,
    pub schema: EventSchema,
    /// Exact number of log records the relation expects.
    pub expected_log_count: u64,
    #[serde(default)]
    pub anchor: AnchorRule,
    pub outputs: Vec<OutputSpec>,
}

impl CircuitConfig {
    pub fn validate(&self) -> Result<(), CircuitError> {
        if self.allocation.max_transactions == 0 {
            return Err(CircuitError::MissingAnchor);
        }
        if self.log_fields == 0 {
            return Err(CircuitError::Config(format!("{}: log records need at least one field", self.name)));
        }
        self.schema.validate(self.log_fields)?;

        if self.expected_log_count > self.allocation.max_logs as u64 {
            return Err(CircuitError::LengthExceedsCapacity {
                stream: "log",
                length: self.expected_log_count,
                capacity: self.allocation.max_logs,
            });
        }

        for output in &self.outputs {
            output.validate_width()?;
            if let OutputSource::LogField { slot, position } = output.source {
                if slot >= self.allocation.max_logs {
                    return Err(CircuitError::SlotOutOfRange {
                        stream: "log",
                        index: slot,
                        capacity: self.allocation.max_logs,
                    });
                }
                if position >= self.log_fields {
                    return Err(CircuitError::SchemaFieldOutOfRange {
                        schema: self.schema.name.clone(),
                        position,
                        field_count: self.log_fields,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, CircuitError> {
        let config: CircuitConfig =
            serde_json::from_str(json).map_err(|e| CircuitError::Config(format!("{e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, CircuitError> {
        serde_json::to_string_pretty(self).map_err(|e| CircuitError::Config(format!("{e}")))
    }
}

/// `Swap` on the USDC/WETH pool: `amount0` is data field 0, `recipient` is
/// topic 2 and `sender` is topic 1. Exactly one such log, emitted in the anchor
/// transaction's block by the anchor's sender, and the anchor must be the
/// sender's first transaction.
fn uniswap_swap() -> CircuitConfig {
    let pool = Address(USDC_POOL_ADDRESS);
    let rule = |position, is_topic, index| FieldRule {
        position,
        is_topic,
        index,
        contract: pool,
        value: None,
    };
    CircuitConfig {
        name: "uniswap_swap".to_string(),
        allocation: CircuitVariant::UniswapSwap.allocation(),
        log_fields: SWAP_LOG_FIELDS,
        schema: EventSchema {
            name: "Swap".to_string(),
            event_id: Some(SWAP_EVENT_ID),
            fields: vec![rule(0, false, 0), rule(1, true, 2), rule(2, true, 1)],
        },
        expected_log_count: 1,
        anchor: AnchorRule {
            expected_nonce: Some(0),
        },
        outputs: vec![
            OutputSpec::address(OutputSource::AnchorSender),
            OutputSpec::uint(OutputSource::AnchorBlockNumber, U64_BITS),
        ],
    }
}

/// USDC `Transfer`: `from` is topic 1, `to` is topic 2, `value` is data field 0.
/// The transferred amount is projected alongside the sender and block.
fn erc20_transfer() -> CircuitConfig {
    let token = Address(USDC_TOKEN_ADDRESS);
    let rule = |position, is_topic, index| FieldRule {
        position,
        is_topic,
        index,
        contract: token,
        value: None,
    };
    CircuitConfig {
        name: "erc20_transfer".to_string(),
        allocation: CircuitVariant::Erc20Transfer.allocation(),
        log_fields: TRANSFER_LOG_FIELDS,
        schema: EventSchema {
            name: "Transfer".to_string(),
            event_id: Some(TRANSFER_EVENT_ID),
            fields: vec![rule(0, true, 1), rule(1, true, 2), rule(2, false, 0)],
        },
        expected_log_count: 1,
        anchor: AnchorRule {
            expected_nonce: Some(0),
        },
        outputs: vec![
            OutputSpec::address(OutputSource::AnchorSender),
            OutputSpec::uint(OutputSource::AnchorBlockNumber, U64_BITS),
            OutputSpec::uint(OutputSource::LogField { slot: 0, position: 2 }, UINT248_BITS),
        ],
    }
}
