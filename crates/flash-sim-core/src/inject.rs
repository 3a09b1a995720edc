//! Two-layer probabilistic fault injection.
//!
//! The API layer decides whether a call is rejected before it touches any
//! data. The hardware layer, evaluated only for calls that went through,
//! decides whether one byte of the result is silently corrupted. Each layer
//! draws from its own seeded generator so a corruption scenario can be
//! replayed without also pinning the rejection sequence.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::OperationKind;

/// Denominator of every failure rate (rates are failures per 10000 trials).
pub const RATE_SCALE: u16 = 10_000;

/// API and hardware failure rates for one operation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FailureRates {
    /// Rate at which calls are rejected with an I/O error.
    pub api: u16,
    /// Rate at which successful calls corrupt one byte.
    pub hardware: u16,
}

impl FailureRates {
    /// Rates that never fire.
    pub const NEVER: Self = Self {
        api: 0,
        hardware: 0,
    };

    /// Creates a rate pair.
    #[must_use]
    pub const fn new(api: u16, hardware: u16) -> Self {
        Self { api, hardware }
    }
}

/// Fault simulation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FaultConfig {
    /// Rates applied to reads.
    pub read: FailureRates,
    /// Rates applied to writes.
    pub write: FailureRates,
    /// Rates applied to erases.
    pub erase: FailureRates,
    /// Seed for the API-rejection generator.
    pub api_seed: u64,
    /// Seed for the hardware-corruption generator.
    pub hardware_seed: u64,
}

impl FaultConfig {
    /// Returns the rates configured for an operation family.
    #[must_use]
    pub const fn rates(&self, kind: OperationKind) -> FailureRates {
        match kind {
            OperationKind::Read => self.read,
            OperationKind::Write => self.write,
            OperationKind::Erase => self.erase,
        }
    }

    /// Returns the first rate above [`RATE_SCALE`], if any.
    #[must_use]
    pub fn first_invalid_rate(&self) -> Option<(OperationKind, u16)> {
        OperationKind::ALL.into_iter().find_map(|kind| {
            let rates = self.rates(kind);
            [rates.api, rates.hardware]
                .into_iter()
                .find(|rate| *rate > RATE_SCALE)
                .map(|rate| (kind, rate))
        })
    }
}

/// Hardware-level corruption applied to a successful operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareFault {
    /// Least-significant bit of the byte at `offset` was flipped.
    BitFlip {
        /// Offset within the transferred region.
        offset: usize,
    },
    /// Byte at `offset` was forced to zero.
    StuckAtZero {
        /// Offset within the erased region.
        offset: usize,
    },
}

impl HardwareFault {
    /// Offset of the corrupted byte within the operation's region.
    #[must_use]
    pub const fn offset(self) -> usize {
        match self {
            Self::BitFlip { offset } | Self::StuckAtZero { offset } => offset,
        }
    }
}

/// Fault injection engine with independent API and hardware generators.
#[derive(Debug, Clone)]
pub struct FaultInjector {
    config: FaultConfig,
    api_rng: SmallRng,
    hardware_rng: SmallRng,
}

impl FaultInjector {
    /// Creates an engine seeded from `config`.
    #[must_use]
    pub fn new(config: FaultConfig) -> Self {
        Self {
            config,
            api_rng: SmallRng::seed_from_u64(config.api_seed),
            hardware_rng: SmallRng::seed_from_u64(config.hardware_seed),
        }
    }

    /// Returns the engine's parameters.
    #[must_use]
    pub const fn config(&self) -> &FaultConfig {
        &self.config
    }

    /// Decides whether the call is rejected at the API level.
    pub fn api_failure(&mut self, kind: OperationKind) -> bool {
        toss(&mut self.api_rng, self.config.rates(kind).api)
    }

    /// Decides whether, and where, a successful call corrupts its region.
    ///
    /// Returns `None` for an empty region.
    pub fn hardware_fault(&mut self, kind: OperationKind, len: usize) -> Option<HardwareFault> {
        if len == 0 || !toss(&mut self.hardware_rng, self.config.rates(kind).hardware) {
            return None;
        }
        let offset = self.hardware_rng.gen_range(0..len);
        Some(match kind {
            OperationKind::Read | OperationKind::Write => HardwareFault::BitFlip { offset },
            OperationKind::Erase => HardwareFault::StuckAtZero { offset },
        })
    }
}

fn toss(rng: &mut SmallRng, rate: u16) -> bool {
    rng.gen_range(0..RATE_SCALE) < rate
}

/// Applies a hardware fault to the region it was drawn for.
pub fn corrupt(region: &mut [u8], fault: HardwareFault) {
    match fault {
        HardwareFault::BitFlip { offset } => region[offset] ^= 1,
        HardwareFault::StuckAtZero { offset } => region[offset] = 0,
    }
}

#[cfg(test)]
mod tests {
    use super::{corrupt, FailureRates, FaultConfig, FaultInjector, HardwareFault, RATE_SCALE};
    use crate::OperationKind;

    fn config_with(rates: FailureRates) -> FaultConfig {
        FaultConfig {
            read: rates,
            write: rates,
            erase: rates,
            api_seed: 1,
            hardware_seed: 2,
        }
    }

    #[test]
    fn zero_rate_never_fires() {
        let mut engine = FaultInjector::new(config_with(FailureRates::NEVER));
        for _ in 0..10_000 {
            for kind in OperationKind::ALL {
                assert!(!engine.api_failure(kind));
                assert!(engine.hardware_fault(kind, 16).is_none());
            }
        }
    }

    #[test]
    fn full_rate_always_fires() {
        let mut engine = FaultInjector::new(config_with(FailureRates::new(RATE_SCALE, RATE_SCALE)));
        for _ in 0..10_000 {
            assert!(engine.api_failure(OperationKind::Write));
            let fault = engine
                .hardware_fault(OperationKind::Write, 16)
                .expect("full hardware rate must fire");
            assert!(fault.offset() < 16);
        }
    }

    #[test]
    fn fault_shape_follows_operation_family() {
        let mut engine = FaultInjector::new(config_with(FailureRates::new(0, RATE_SCALE)));
        assert!(matches!(
            engine.hardware_fault(OperationKind::Read, 4),
            Some(HardwareFault::BitFlip { .. })
        ));
        assert!(matches!(
            engine.hardware_fault(OperationKind::Write, 4),
            Some(HardwareFault::BitFlip { .. })
        ));
        assert!(matches!(
            engine.hardware_fault(OperationKind::Erase, 4),
            Some(HardwareFault::StuckAtZero { .. })
        ));
    }

    #[test]
    fn empty_region_is_never_corrupted() {
        let mut engine = FaultInjector::new(config_with(FailureRates::new(0, RATE_SCALE)));
        assert!(engine.hardware_fault(OperationKind::Read, 0).is_none());
    }

    #[test]
    fn hardware_sequence_is_independent_of_api_draws() {
        let config = config_with(FailureRates::new(5_000, 5_000));
        let mut quiet = FaultInjector::new(config);
        let mut noisy = FaultInjector::new(config);

        for _ in 0..64 {
            noisy.api_failure(OperationKind::Read);
        }

        let quiet_faults: Vec<_> = (0..64)
            .map(|_| quiet.hardware_fault(OperationKind::Read, 256))
            .collect();
        let noisy_faults: Vec<_> = (0..64)
            .map(|_| noisy.hardware_fault(OperationKind::Read, 256))
            .collect();
        assert_eq!(quiet_faults, noisy_faults);
    }

    #[test]
    fn rates_are_looked_up_per_family() {
        let config = FaultConfig {
            read: FailureRates::new(1, 2),
            write: FailureRates::new(3, 4),
            erase: FailureRates::new(5, 6),
            ..FaultConfig::default()
        };
        assert_eq!(config.rates(OperationKind::Read), FailureRates::new(1, 2));
        assert_eq!(config.rates(OperationKind::Write), FailureRates::new(3, 4));
        assert_eq!(config.rates(OperationKind::Erase), FailureRates::new(5, 6));
        assert_eq!(config.first_invalid_rate(), None);

        let invalid = FaultConfig {
            erase: FailureRates::new(0, RATE_SCALE + 1),
            ..config
        };
        assert_eq!(
            invalid.first_invalid_rate(),
            Some((OperationKind::Erase, RATE_SCALE + 1))
        );
    }

    #[test]
    fn corrupt_applies_fault_shape() {
        let mut region = [0xFF, 0xFF, 0xFF];
        corrupt(&mut region, HardwareFault::BitFlip { offset: 1 });
        assert_eq!(region, [0xFF, 0xFE, 0xFF]);
        corrupt(&mut region, HardwareFault::StuckAtZero { offset: 2 });
        assert_eq!(region, [0xFF, 0xFE, 0x00]);
    }
}
