//! Software emulation of block-erasable, bit-restricted flash memory.
//!
//! The simulator exposes the read/write/erase/write-protect/page-layout
//! contract of a flash driver over an in-memory cell array, with optional
//! two-layer fault injection and latency simulation, so storage stacks can be
//! exercised without flash hardware.

/// Backing store, address map and programming rules.
pub mod memory;
pub use memory::{is_erased, validate_erase_alignment, AddressMap, BackingStore, ERASED_BYTE};

/// Error taxonomy and errno mapping.
pub mod fault;
pub use fault::{ErrorKind, FlashError, InvalidArgument, IoCause, EACCES, EINVAL, EIO};

/// Write-protection guard.
pub mod protect;
pub use protect::WriteProtect;

/// Operation families, latency table and busy-wait primitives.
pub mod timing;
pub use timing::{
    Delay, NoDelay, OperationKind, RecordingDelay, SpinDelay, TimingConfig, TimingSimulator,
};

/// Two-layer probabilistic fault injection.
pub mod inject;
pub use inject::{FailureRates, FaultConfig, FaultInjector, HardwareFault, RATE_SCALE};

/// Page layout record.
pub mod layout;
pub use layout::PageLayout;

/// Usage and fault counters.
pub mod stats;
pub use stats::{FlashStats, OperationStats};

/// Device configuration and driver trait.
pub mod api;
pub use api::{
    ConfigError, FlashConfig, FlashDriver, DEFAULT_ERASE_UNIT_SIZE, DEFAULT_UNIT_COUNT,
    DEFAULT_WRITE_BLOCK_SIZE,
};

/// Simulated flash device.
pub mod device;
pub use device::FlashSimulator;

/// `embedded-storage` NOR flash adapter.
pub mod nor;
pub use nor::NorFlashAdapter;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
