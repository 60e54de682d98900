#![allow(dead_code)]

use ark_bn254::Fr;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef};
use receipt_circuits::constants::{SWAP_EVENT_ID, TRANSFER_EVENT_ID, USDC_POOL_ADDRESS, USDC_TOKEN_ADDRESS};
use receipt_circuits::{
    Address, BoundedStream, CircuitConfig, CircuitVariant, LogField, LogRecord, ReceiptCircuit,
    TransactionRecord, Uint248, Witness,
};
use tracing_subscriber::EnvFilter;

pub const SENDER: Address = Address([0x5a; 20]);
pub const RECIPIENT: Address = Address([0x7e; 20]);
pub const BLOCK: u64 = 19_437_112;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn anchor_tx() -> TransactionRecord {
    TransactionRecord {
        chain_id: 1,
        block_num: BLOCK,
        nonce: 0,
        gas_tip_cap_or_gas_price: Uint248::from(1_000_000_000u64),
        gas_fee_cap: Uint248::from(30_000_000_000u64),
        gas_limit: 250_000,
        from: SENDER,
        to: Address([0xe5; 20]),
        value: Uint248::ZERO,
    }
}

/// A `Swap` log on the USDC pool: amount0 (data 0), recipient (topic 2), sender (topic 1).
pub fn swap_log() -> LogRecord {
    let field = |is_topic, index, value: Uint248| LogField {
        contract: Address(USDC_POOL_ADDRESS),
        event_id: SWAP_EVENT_ID,
        is_topic,
        index,
        value,
    };
    LogRecord {
        block_num: BLOCK,
        from: SENDER,
        fields: vec![
            field(false, 0, Uint248::from(2_500_000_000u64)),
            field(true, 2, Uint248::from(RECIPIENT)),
            field(true, 1, Uint248::from(SENDER)),
        ],
    }
}

/// A USDC `Transfer` log: from (topic 1), to (topic 2), value (data 0).
pub fn transfer_log(amount: u64) -> LogRecord {
    let field = |is_topic, index, value: Uint248| LogField {
        contract: Address(USDC_TOKEN_ADDRESS),
        event_id: TRANSFER_EVENT_ID,
        is_topic,
        index,
        value,
    };
    LogRecord {
        block_num: BLOCK,
        from: SENDER,
        fields: vec![
            field(true, 1, Uint248::from(SENDER)),
            field(true, 2, Uint248::from(RECIPIENT)),
            field(false, 0, Uint248::from(amount)),
        ],
    }
}

/// Witness with the anchor transaction and `logs` as the real log records.
pub fn witness_with_logs(config: &CircuitConfig, logs: Vec<LogRecord>) -> Witness {
    let alloc = config.allocation;
    Witness {
        salt: Uint248::from(0x5eed_u64),
        transactions: BoundedStream::padded(vec![anchor_tx()], alloc.max_transactions, TransactionRecord::padding())
            .unwrap(),
        logs: BoundedStream::padded(logs, alloc.max_logs, LogRecord::padding(config.log_fields)).unwrap(),
        slots: BoundedStream::new(vec![], 0),
    }
}

pub fn swap_config() -> CircuitConfig {
    CircuitVariant::UniswapSwap.config()
}

pub fn valid_swap_witness() -> Witness {
    witness_with_logs(&swap_config(), vec![swap_log()])
}

pub fn synthesize(config: &CircuitConfig, witness: Witness) -> ConstraintSystemRef<Fr> {
    init_tracing();
    let circuit = ReceiptCircuit::new(config.clone(), witness).unwrap();
    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit.generate_constraints(cs.clone()).unwrap();
    cs
}

pub fn is_satisfied(config: &CircuitConfig, witness: Witness) -> bool {
    synthesize(config, witness).is_satisfied().unwrap()
}
