//! Public host-facing configuration and driver contract.

use thiserror::Error;

use crate::{
    FaultConfig, FlashError, OperationKind, PageLayout, TimingConfig, ERASED_BYTE, RATE_SCALE,
};

/// Default number of erase units.
pub const DEFAULT_UNIT_COUNT: u32 = 4;
/// Default erase-unit size in bytes.
pub const DEFAULT_ERASE_UNIT_SIZE: u32 = 4096;
/// Default advertised write-block size in bytes.
pub const DEFAULT_WRITE_BLOCK_SIZE: u32 = 4;

/// Immutable configuration for one simulated device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FlashConfig {
    /// First valid device address.
    pub base_address: u32,
    /// Number of erase units.
    pub unit_count: u32,
    /// Erase granularity in bytes.
    pub erase_unit_size: u32,
    /// Program granularity advertised to callers; not enforced.
    pub write_block_size: u32,
    /// Value every cell holds when the device is created.
    pub initial_fill: u8,
    /// Allows programming cells that are not in the erased state.
    pub allow_double_writes: bool,
    /// Makes write protection block erase as well as write.
    pub erase_protect: bool,
    /// Per-unit erase endurance; `None` means unlimited.
    pub max_erase_cycles: Option<u32>,
    /// Enables the page layout reporter.
    pub page_layout_enabled: bool,
    /// Fault simulation parameters; `None` disables fault injection.
    pub faults: Option<FaultConfig>,
    /// Timing simulation parameters; `None` disables latency simulation.
    pub timing: Option<TimingConfig>,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            base_address: 0,
            unit_count: DEFAULT_UNIT_COUNT,
            erase_unit_size: DEFAULT_ERASE_UNIT_SIZE,
            write_block_size: DEFAULT_WRITE_BLOCK_SIZE,
            initial_fill: 0x00,
            allow_double_writes: true,
            erase_protect: true,
            max_erase_cycles: None,
            page_layout_enabled: true,
            faults: None,
            timing: None,
        }
    }
}

impl FlashConfig {
    /// Creates a fault-free, untimed configuration with the given geometry.
    #[must_use]
    pub fn with_geometry(base_address: u32, unit_count: u32, erase_unit_size: u32) -> Self {
        Self {
            base_address,
            unit_count,
            erase_unit_size,
            ..Self::default()
        }
    }

    /// Starts the device in the erased state instead of zero-filled.
    #[must_use]
    pub const fn erased_at_start(mut self) -> Self {
        self.initial_fill = ERASED_BYTE;
        self
    }

    /// Total device size in bytes, if it fits in 32 bits.
    #[must_use]
    pub const fn total_size(&self) -> Option<u32> {
        self.unit_count.checked_mul(self.erase_unit_size)
    }

    /// The single layout record describing the device.
    #[must_use]
    pub const fn page_layout(&self) -> PageLayout {
        PageLayout::new(self.unit_count, self.erase_unit_size)
    }

    /// Checks geometry and fault parameters.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<u32, ConfigError> {
        if self.erase_unit_size == 0 {
            return Err(ConfigError::ZeroEraseUnit);
        }
        if self.unit_count == 0 {
            return Err(ConfigError::ZeroUnitCount);
        }
        if self.write_block_size == 0 {
            return Err(ConfigError::ZeroWriteBlock);
        }
        if self.erase_unit_size % self.write_block_size != 0 {
            return Err(ConfigError::WriteBlockNotDivisor {
                write_block_size: self.write_block_size,
                erase_unit_size: self.erase_unit_size,
            });
        }
        if self.base_address % self.erase_unit_size != 0 {
            return Err(ConfigError::UnalignedBase {
                base_address: self.base_address,
                erase_unit_size: self.erase_unit_size,
            });
        }
        let size = self
            .total_size()
            .filter(|size| self.base_address.checked_add(*size).is_some())
            .ok_or(ConfigError::AddressOverflow {
                base_address: self.base_address,
                unit_count: self.unit_count,
                erase_unit_size: self.erase_unit_size,
            })?;
        if let Some((kind, rate)) = self.faults.as_ref().and_then(FaultConfig::first_invalid_rate) {
            return Err(ConfigError::RateOutOfRange { kind, rate });
        }
        Ok(size)
    }
}

/// Rejected device configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ConfigError {
    /// Erase-unit size is zero.
    #[error("erase unit size must be non-zero")]
    ZeroEraseUnit,
    /// Unit count is zero.
    #[error("unit count must be non-zero")]
    ZeroUnitCount,
    /// Write-block size is zero.
    #[error("write block size must be non-zero")]
    ZeroWriteBlock,
    /// Write-block size does not divide the erase-unit size.
    #[error("write block size {write_block_size} does not divide erase unit size {erase_unit_size}")]
    WriteBlockNotDivisor {
        /// Configured write-block size.
        write_block_size: u32,
        /// Configured erase-unit size.
        erase_unit_size: u32,
    },
    /// Base address is not a multiple of the erase-unit size.
    #[error("base address {base_address:#x} is not aligned to the {erase_unit_size}-byte erase unit")]
    UnalignedBase {
        /// Configured base address.
        base_address: u32,
        /// Configured erase-unit size.
        erase_unit_size: u32,
    },
    /// Device would extend past the 32-bit address space.
    #[error("{unit_count} units of {erase_unit_size} bytes at {base_address:#x} overflow the address space")]
    AddressOverflow {
        /// Configured base address.
        base_address: u32,
        /// Configured unit count.
        unit_count: u32,
        /// Configured erase-unit size.
        erase_unit_size: u32,
    },
    /// A failure rate exceeds the rate scale.
    #[error("{} failure rate {rate} exceeds {}", .kind.name(), RATE_SCALE)]
    RateOutOfRange {
        /// Operation family carrying the rate.
        kind: OperationKind,
        /// Offending rate.
        rate: u16,
    },
    /// Adapter geometry does not match the device.
    #[error("adapter expects write size {expected_write}/erase size {expected_erase}, device has {actual_write}/{actual_erase}")]
    GeometryMismatch {
        /// Write size the adapter was instantiated with.
        expected_write: usize,
        /// Erase size the adapter was instantiated with.
        expected_erase: usize,
        /// Device write-block size.
        actual_write: u32,
        /// Device erase-unit size.
        actual_erase: u32,
    },
}

/// Function table a storage stack drives, implemented by real or simulated flash.
///
/// Offsets are absolute device addresses. Implementations hold no lock; the
/// caller serializes access and must not call in from interrupt context.
pub trait FlashDriver {
    /// Reads `buf.len()` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`FlashError::InvalidArgument`] for out-of-range requests and
    /// [`FlashError::Io`] when the device fails the read.
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), FlashError>;

    /// Programs `data` at `offset`; bits can only be cleared.
    ///
    /// # Errors
    ///
    /// Returns [`FlashError::InvalidArgument`] for out-of-range requests,
    /// [`FlashError::PermissionDenied`] while write protected and
    /// [`FlashError::Io`] when the device fails the write.
    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), FlashError>;

    /// Erases `len` bytes at `offset`; both must be erase-unit aligned.
    ///
    /// # Errors
    ///
    /// Returns [`FlashError::InvalidArgument`] for out-of-range or misaligned
    /// requests, [`FlashError::PermissionDenied`] while write protected and
    /// [`FlashError::Io`] when the device fails the erase.
    fn erase(&mut self, offset: u32, len: usize) -> Result<(), FlashError>;

    /// Engages or releases write protection.
    fn set_write_protection(&mut self, enabled: bool);

    /// Page layout records, when layout reporting is enabled.
    fn page_layout(&self) -> Option<&[PageLayout]>;

    /// Advertised program granularity.
    fn write_block_size(&self) -> u32;

    /// Device size in bytes.
    fn size(&self) -> u32;
}
