//! Crate-wide constants used by the circuit variants and host-side orchestration.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::{find_poseidon_ark_and_mds, PoseidonConfig};
use ark_ff::PrimeField;

/// Bit width of the circuit's native unsigned scalar.
pub const UINT248_BITS: u16 = 248;

/// Bit width of an EVM address.
pub const ADDRESS_BITS: u16 = 160;

/// Bit width used for block numbers, nonces and other 64-bit counters.
pub const U64_BITS: u16 = 64;

/// Bit width of a log field's event id (first six bytes of topic0).
pub const EVENT_ID_BITS: u16 = 48;

/// Uniswap V3 USDC/WETH 0.05% pool on Ethereum mainnet.
pub const USDC_POOL_ADDRESS: [u8; 20] = [
    0x88, 0xe6, 0xa0, 0xc2, 0xdd, 0xd2, 0x6f, 0xee, 0xb6, 0x4f, 0x03, 0x9a, 0x2c, 0x41, 0x29, 0x6f,
    0xcb, 0x3f, 0x56, 0x40,
];

/// USDC token contract on Ethereum mainnet.
pub const USDC_TOKEN_ADDRESS: [u8; 20] = [
    0xa0, 0xb8, 0x69, 0x91, 0xc6, 0x21, 0x8b, 0x36, 0xc1, 0xd1, 0x9d, 0x4a, 0x2e, 0x9e, 0xb0, 0xce,
    0x36, 0x06, 0xeb, 0x48,
];

/// `Swap(address,address,int256,int256,uint160,uint128,int24)`, first six bytes of topic0.
pub const SWAP_EVENT_ID: u64 = 0xc420_79f9_4a63;

/// `Transfer(address,address,uint256)`, first six bytes of topic0.
pub const TRANSFER_EVENT_ID: u64 = 0xddf2_52ad_1be2;

/// Fields extracted per log record in the swap variant: `amount0`, `recipient`, `sender`.
pub const SWAP_LOG_FIELDS: usize = 3;

/// Fields extracted per log record in the transfer variant: `from`, `to`, `value`.
pub const TRANSFER_LOG_FIELDS: usize = 3;

// Poseidon sponge configuration for the input commitment.
//
// Width-3 sponge (rate=2, capacity=1), the same instantiation the native
// hasher and the in-circuit gadget both derive.
pub const POSEIDON_RATE: usize = 2;
pub const POSEIDON_CAPACITY: usize = 1;

pub const POSEIDON_FULL_ROUNDS: usize = 8;
pub const POSEIDON_PARTIAL_ROUNDS: usize = 57;

/// Poseidon S-box exponent (alpha).
pub const POSEIDON_ALPHA: u64 = 5;

/// Deterministically derive Poseidon parameters for BN254::Fr.
///
/// Both `commitment::commit_inputs` and `commitment::commit_inputs_var` call this,
/// so the native and in-circuit hashes agree on the same constants.
pub fn poseidon_config() -> PoseidonConfig<Fr> {
    let prime_bits = Fr::MODULUS_BIT_SIZE as u64;

    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
        prime_bits,
        POSEIDON_RATE,
        POSEIDON_FULL_ROUNDS as u64,
        POSEIDON_PARTIAL_ROUNDS as u64,
        0,
    );

    PoseidonConfig::new(
        POSEIDON_FULL_ROUNDS,
        POSEIDON_PARTIAL_ROUNDS,
        POSEIDON_ALPHA,
        mds,
        ark,
        POSEIDON_RATE,
        POSEIDON_CAPACITY,
    )
}
