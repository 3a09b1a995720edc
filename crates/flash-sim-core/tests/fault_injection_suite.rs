//! Fault injection boundaries: API rejection versus silent hardware corruption.

use embedded_storage as _;
use flash_sim_core::{
    FailureRates, FaultConfig, FlashConfig, FlashError, FlashSimulator, IoCause, NoDelay,
    OperationKind, RecordingDelay, TimingConfig, ERASED_BYTE, RATE_SCALE,
};
use proptest as _;
use rand as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

const UNIT: usize = 4096;

fn faulty(faults: FaultConfig) -> FlashSimulator<NoDelay> {
    let config = FlashConfig {
        faults: Some(faults),
        ..FlashConfig::default().erased_at_start()
    };
    FlashSimulator::with_delay(config, NoDelay).expect("fault config is valid")
}

fn only(kind: OperationKind, rates: FailureRates) -> FaultConfig {
    let mut faults = FaultConfig {
        api_seed: 0xDEAD_BEEF,
        hardware_seed: 0x5EED,
        ..FaultConfig::default()
    };
    match kind {
        OperationKind::Read => faults.read = rates,
        OperationKind::Write => faults.write = rates,
        OperationKind::Erase => faults.erase = rates,
    }
    faults
}

fn attempt(sim: &mut FlashSimulator<NoDelay>, kind: OperationKind) -> Result<(), FlashError> {
    match kind {
        OperationKind::Read => sim.read(0, &mut [0u8; 16]),
        OperationKind::Write => sim.write(0, &[0x00; 16]),
        OperationKind::Erase => sim.erase(0, UNIT),
    }
}

#[rstest]
#[case(OperationKind::Read)]
#[case(OperationKind::Write)]
#[case(OperationKind::Erase)]
fn full_api_rate_fails_every_call_and_leaves_store_unchanged(#[case] kind: OperationKind) {
    let mut sim = faulty(only(kind, FailureRates::new(RATE_SCALE, 0)));
    let before = sim.raw_contents().to_vec();

    for _ in 0..200 {
        let error = attempt(&mut sim, kind).expect_err("every call must fail");
        assert_eq!(error, FlashError::Io(IoCause::InjectedFailure));
        assert!(error.is_injected());
        assert_eq!(error.errno(), -5);
    }

    assert_eq!(sim.raw_contents(), before.as_slice());
    assert_eq!(sim.stats().api_faults, 200);
    assert_eq!(sim.stats().operation(kind).calls, 200);
    assert_eq!(sim.stats().operation(kind).bytes, 0);
}

#[rstest]
#[case(OperationKind::Read)]
#[case(OperationKind::Write)]
#[case(OperationKind::Erase)]
fn zero_api_rate_never_fails(#[case] kind: OperationKind) {
    let mut sim = faulty(only(kind, FailureRates::NEVER));
    for _ in 0..1_000 {
        attempt(&mut sim, kind).expect("no injected failures at rate 0");
    }
    assert_eq!(sim.stats().api_faults, 0);
}

#[test]
fn other_families_are_unaffected_by_a_family_rate() {
    let mut sim = faulty(only(OperationKind::Write, FailureRates::new(RATE_SCALE, RATE_SCALE)));
    for _ in 0..100 {
        attempt(&mut sim, OperationKind::Erase).expect("erase has no faults");
        attempt(&mut sim, OperationKind::Read).expect("read has no faults");
    }
    assert_eq!(sim.stats().hardware_faults, 0);
}

#[test]
fn protection_and_alignment_take_precedence_over_fault_injection() {
    let mut sim = faulty(FaultConfig {
        write: FailureRates::new(RATE_SCALE, 0),
        erase: FailureRates::new(RATE_SCALE, 0),
        ..FaultConfig::default()
    });

    assert!(matches!(
        sim.erase(100, 100),
        Err(FlashError::InvalidArgument(_))
    ));
    sim.set_write_protection(true);
    assert_eq!(sim.write(0, &[0]), Err(FlashError::PermissionDenied));
    assert_eq!(sim.erase(0, UNIT), Err(FlashError::PermissionDenied));
    assert_eq!(sim.stats().api_faults, 0);
    assert_eq!(sim.stats().rejected, 3);
}

#[test]
fn read_corruption_flips_one_bit_in_the_output_only() {
    let mut sim = faulty(only(OperationKind::Read, FailureRates::new(0, RATE_SCALE)));
    sim.write(0, &[0x00; 64]).expect("program zeros");

    let mut out = [0u8; 64];
    sim.read(0, &mut out).expect("corrupted reads still succeed");

    let flipped: Vec<u8> = out.iter().copied().filter(|byte| *byte != 0x00).collect();
    assert_eq!(flipped, vec![0x01]);
    assert!(sim.raw_contents()[..64].iter().all(|byte| *byte == 0x00));
    assert_eq!(sim.stats().hardware_faults, 1);
}

#[test]
fn write_corruption_flips_one_bit_in_the_store() {
    let mut sim = faulty(only(OperationKind::Write, FailureRates::new(0, RATE_SCALE)));
    sim.write(0, &[0x00; 32]).expect("corrupted writes still succeed");

    let written = &sim.raw_contents()[..32];
    assert_eq!(written.iter().filter(|byte| **byte == 0x01).count(), 1);
    assert_eq!(written.iter().filter(|byte| **byte == 0x00).count(), 31);
    assert!(sim.raw_contents()[32..].iter().all(|byte| *byte == ERASED_BYTE));
}

#[test]
fn erase_corruption_leaves_one_stuck_byte() {
    let mut sim = faulty(only(OperationKind::Erase, FailureRates::new(0, RATE_SCALE)));
    sim.erase(UNIT as u32, UNIT).expect("corrupted erases still succeed");

    let unit = &sim.raw_contents()[UNIT..2 * UNIT];
    assert_eq!(unit.iter().filter(|byte| **byte == 0x00).count(), 1);
    assert_eq!(
        unit.iter().filter(|byte| **byte == ERASED_BYTE).count(),
        UNIT - 1
    );
}

#[test]
fn hardware_seed_reproduces_corruption_regardless_of_api_seed() {
    let corrupted_offset = |api_seed: u64| {
        let mut sim = faulty(FaultConfig {
            read: FailureRates::new(0, RATE_SCALE),
            api_seed,
            hardware_seed: 42,
            ..FaultConfig::default()
        });
        let mut out = [0xFFu8; 1024];
        sim.write(0, &[0x00; 1024]).expect("program zeros");
        sim.read(0, &mut out).expect("read");
        out.iter().position(|byte| *byte != 0x00)
    };

    let reference = corrupted_offset(1);
    assert!(reference.is_some());
    assert_eq!(corrupted_offset(2), reference);
    assert_eq!(corrupted_offset(u64::MAX), reference);
}

#[test]
fn partial_rates_produce_both_outcomes() {
    let mut sim = faulty(only(OperationKind::Read, FailureRates::new(RATE_SCALE / 2, 0)));
    let failures = (0..2_000)
        .filter(|_| attempt(&mut sim, OperationKind::Read).is_err())
        .count();
    assert!(failures > 500 && failures < 1_500, "failures = {failures}");
}

#[test]
fn latency_is_spent_on_injected_failures() {
    let config = FlashConfig {
        faults: Some(only(OperationKind::Erase, FailureRates::new(RATE_SCALE, 0))),
        timing: Some(TimingConfig {
            read_us: 5,
            write_us: 50,
            erase_us: 500,
        }),
        ..FlashConfig::default()
    };
    let mut sim = FlashSimulator::with_delay(config, RecordingDelay::default())
        .expect("valid config");

    assert!(sim.erase(0, UNIT).is_err());
    assert!(sim.erase(0, UNIT).is_err());
    assert_eq!(sim.delay().requests, vec![500, 500]);
    assert_eq!(sim.stats().erase.time_us, 1_000);
}
