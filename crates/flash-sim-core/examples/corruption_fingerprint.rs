//! Seeded fault-injection soak fingerprint used to compare runs across hosts.

use embedded_storage as _;
use flash_sim_core::{FailureRates, FaultConfig, FlashConfig, FlashSimulator, NoDelay};
use proptest as _;
use rand as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

const ROUNDS: u32 = 64;

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn fingerprint() -> String {
    let rates = FailureRates::new(250, 500);
    let config = FlashConfig {
        faults: Some(FaultConfig {
            read: rates,
            write: rates,
            erase: rates,
            api_seed: 0x0123_4567_89AB_CDEF,
            hardware_seed: 0xFEDC_BA98_7654_3210,
        }),
        ..FlashConfig::default()
    };
    let mut sim = FlashSimulator::with_delay(config, NoDelay).expect("fingerprint config is valid");
    let unit = sim.erase_unit_size();
    let units = sim.size() / unit;

    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    let mut block = [0u8; 16];
    for round in 0..ROUNDS {
        let offset = (round % units) * unit;
        let erased = sim.erase(offset, unit as usize);
        hash_bytes(&mut hash, &[u8::from(erased.is_ok())]);

        block.fill(round.to_le_bytes()[0]);
        let written = sim.write(offset + round, &block);
        hash_bytes(&mut hash, &[u8::from(written.is_ok())]);

        let read = sim.read(offset, &mut block);
        hash_bytes(&mut hash, &[u8::from(read.is_ok())]);
        hash_bytes(&mut hash, &block);
    }

    for (_, value) in sim.stats().entries() {
        hash_bytes(&mut hash, &value.to_le_bytes());
    }
    hash_bytes(&mut hash, sim.raw_contents());

    format!("{hash:016x}")
}

fn main() {
    println!("{}", fingerprint());
}
