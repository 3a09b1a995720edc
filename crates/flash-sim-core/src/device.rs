//! Simulated flash device composing validation, protection, fault injection
//! and timing into the driver surface.

use core::ops::Range;

use tracing::{debug, trace, warn};

use crate::inject::corrupt;
use crate::{
    is_erased, validate_erase_alignment, AddressMap, BackingStore, ConfigError, Delay,
    FaultInjector, FlashConfig, FlashDriver, FlashError, FlashStats, HardwareFault, IoCause,
    OperationKind, PageLayout, SpinDelay, TimingSimulator, WriteProtect,
};

/// In-memory flash device.
///
/// Every entry point runs the same pipeline: range check, write protection
/// (write/erase), alignment and endurance (erase), API fault, the cell
/// operation itself, hardware fault, then the latency delay. Deterministic
/// rejections return before the fault or timing stages and leave the device
/// untouched.
#[derive(Debug, Clone)]
pub struct FlashSimulator<D = SpinDelay> {
    config: FlashConfig,
    map: AddressMap,
    store: BackingStore,
    protect: WriteProtect,
    injector: Option<FaultInjector>,
    timing: TimingSimulator<D>,
    layout: [PageLayout; 1],
    erase_cycles: Vec<u32>,
    stats: FlashStats,
}

impl FlashSimulator<SpinDelay> {
    /// Creates a device that busy-waits for simulated latency.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when `config` fails validation.
    pub fn new(config: FlashConfig) -> Result<Self, ConfigError> {
        Self::with_delay(config, SpinDelay)
    }
}

impl<D: Delay> FlashSimulator<D> {
    /// Creates a device using `delay` as the busy-wait primitive.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when `config` fails validation.
    pub fn with_delay(config: FlashConfig, delay: D) -> Result<Self, ConfigError> {
        let size = config.validate()?;
        let map = AddressMap::new(config.base_address, size).ok_or(ConfigError::AddressOverflow {
            base_address: config.base_address,
            unit_count: config.unit_count,
            erase_unit_size: config.erase_unit_size,
        })?;

        debug!(
            base = config.base_address,
            size,
            unit = config.erase_unit_size,
            faults = config.faults.is_some(),
            timing = config.timing.is_some(),
            "flash simulator initialized"
        );

        Ok(Self {
            map,
            store: BackingStore::new(size as usize, config.initial_fill),
            protect: WriteProtect::default(),
            injector: config.faults.map(FaultInjector::new),
            timing: TimingSimulator::new(config.timing, delay),
            layout: [config.page_layout()],
            erase_cycles: vec![0; config.unit_count as usize],
            stats: FlashStats::default(),
            config,
        })
    }

    /// Reads `buf.len()` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`FlashError::InvalidArgument`] for out-of-range requests and
    /// [`FlashError::Io`] when an API fault is injected.
    pub fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        let kind = OperationKind::Read;
        let range = self.admit(kind, offset, buf.len())?;

        let outcome = self.api_stage(kind, offset, buf.len());
        if outcome.is_ok() {
            self.store.read_into(range, buf);
            if let Some(fault) = self.hardware_stage(kind, offset, buf.len()) {
                corrupt(buf, fault);
            }
        }
        self.finish(kind, offset, buf.len(), outcome)
    }

    /// Programs `data` at `offset` with write-AND semantics.
    ///
    /// # Errors
    ///
    /// Returns [`FlashError::InvalidArgument`] for out-of-range requests,
    /// [`FlashError::PermissionDenied`] while write protected, and
    /// [`FlashError::Io`] for rejected double writes or injected API faults.
    pub fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), FlashError> {
        let kind = OperationKind::Write;
        let range = self.admit(kind, offset, data.len())?;

        let dirty = self.dirty_blocks(&range);
        if dirty > 0 {
            self.stats.record_double_writes(dirty);
            if !self.config.allow_double_writes {
                return Err(self.reject(kind, offset, data.len(), IoCause::DoubleWrite.into()));
            }
        }

        let outcome = self.api_stage(kind, offset, data.len());
        if outcome.is_ok() {
            self.store.program(range.clone(), data);
            if let Some(fault) = self.hardware_stage(kind, offset, data.len()) {
                corrupt(self.store.cells_mut(range), fault);
            }
        }
        self.finish(kind, offset, data.len(), outcome)
    }

    /// Erases `len` bytes at `offset` to the erased state.
    ///
    /// # Errors
    ///
    /// Returns [`FlashError::InvalidArgument`] for out-of-range or misaligned
    /// requests, [`FlashError::PermissionDenied`] while write protected, and
    /// [`FlashError::Io`] for worn-out units or injected API faults.
    pub fn erase(&mut self, offset: u32, len: usize) -> Result<(), FlashError> {
        let kind = OperationKind::Erase;
        let range = self.admit(kind, offset, len)?;

        let outcome = self.api_stage(kind, offset, len);
        if outcome.is_ok() {
            for unit in self.units(&range) {
                self.erase_cycles[unit] = self.erase_cycles[unit].saturating_add(1);
            }
            self.store.erase(range.clone());
            if let Some(fault) = self.hardware_stage(kind, offset, len) {
                corrupt(self.store.cells_mut(range), fault);
            }
        }
        self.finish(kind, offset, len, outcome)
    }

    /// Engages or releases write protection. Always succeeds.
    pub fn set_write_protection(&mut self, enabled: bool) {
        trace!(enabled, "write protection set");
        self.protect.set(enabled);
    }

    /// Returns `true` while write protection is engaged.
    #[must_use]
    pub const fn write_protection(&self) -> bool {
        self.protect.is_set()
    }

    /// Single layout record covering the device, when reporting is enabled.
    #[must_use]
    pub fn page_layout(&self) -> Option<&[PageLayout]> {
        self.config
            .page_layout_enabled
            .then_some(self.layout.as_slice())
    }

    /// Advertised program granularity.
    #[must_use]
    pub const fn write_block_size(&self) -> u32 {
        self.config.write_block_size
    }

    /// Erase-unit size in bytes.
    #[must_use]
    pub const fn erase_unit_size(&self) -> u32 {
        self.config.erase_unit_size
    }

    /// First valid device address.
    #[must_use]
    pub const fn base_address(&self) -> u32 {
        self.map.base()
    }

    /// Device size in bytes.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.map.size()
    }

    /// Configuration the device was built from.
    #[must_use]
    pub const fn config(&self) -> &FlashConfig {
        &self.config
    }

    /// Usage and fault counters.
    #[must_use]
    pub const fn stats(&self) -> &FlashStats {
        &self.stats
    }

    /// Clears usage and fault counters; erase cycle counts are kept.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Number of successful erases of `unit`, or `None` past the last unit.
    #[must_use]
    pub fn erase_cycles(&self, unit: usize) -> Option<u32> {
        self.erase_cycles.get(unit).copied()
    }

    /// Busy-wait primitive in use.
    #[must_use]
    pub const fn delay(&self) -> &D {
        self.timing.delay()
    }

    /// Raw cell contents, bypassing range checks, faults and timing.
    ///
    /// Meant for host-side assertions; storage code goes through the driver
    /// surface.
    #[must_use]
    pub const fn raw_contents(&self) -> &[u8] {
        self.store.as_slice()
    }

    fn admit(&mut self, kind: OperationKind, offset: u32, len: usize) -> Result<Range<usize>, FlashError> {
        self.validate(kind, offset, len)
            .map_err(|error| self.reject(kind, offset, len, error))
    }

    fn validate(&self, kind: OperationKind, offset: u32, len: usize) -> Result<Range<usize>, FlashError> {
        let range = self.map.translate(offset, len)?;
        match kind {
            OperationKind::Read => {}
            OperationKind::Write => self.protect.check()?,
            OperationKind::Erase => {
                if self.config.erase_protect {
                    self.protect.check()?;
                }
                validate_erase_alignment(offset, len, self.config.erase_unit_size)?;
                self.check_endurance(&range)?;
            }
        }
        Ok(range)
    }

    fn check_endurance(&self, range: &Range<usize>) -> Result<(), FlashError> {
        let Some(limit) = self.config.max_erase_cycles else {
            return Ok(());
        };
        match self.units(range).find(|unit| self.erase_cycles[*unit] >= limit) {
            Some(unit) => Err(IoCause::EraseCycleLimit {
                unit: u32::try_from(unit).unwrap_or(u32::MAX),
            }
            .into()),
            None => Ok(()),
        }
    }

    /// Write blocks overlapping `range` whose covered cells are not all erased.
    fn dirty_blocks(&self, range: &Range<usize>) -> u64 {
        let block = self.config.write_block_size as usize;
        let dirty = (range.start / block..range.end.div_ceil(block))
            .filter(|index| {
                let start = (index * block).max(range.start);
                let end = ((index + 1) * block).min(range.end);
                !is_erased(self.store.cells(start..end))
            })
            .count();
        dirty as u64
    }

    fn units(&self, range: &Range<usize>) -> Range<usize> {
        let unit = self.config.erase_unit_size as usize;
        range.start / unit..range.end.div_ceil(unit)
    }

    fn reject(&mut self, kind: OperationKind, offset: u32, len: usize, error: FlashError) -> FlashError {
        self.stats.record_rejection();
        debug!(op = kind.name(), offset, len, %error, "request rejected");
        error
    }

    fn api_stage(&mut self, kind: OperationKind, offset: u32, len: usize) -> Result<(), FlashError> {
        self.stats.record_call(kind);
        let failed = self
            .injector
            .as_mut()
            .is_some_and(|injector| injector.api_failure(kind));
        if failed {
            self.stats.record_api_fault();
            warn!(op = kind.name(), offset, len, "injected api failure");
            return Err(IoCause::InjectedFailure.into());
        }
        Ok(())
    }

    fn hardware_stage(&mut self, kind: OperationKind, offset: u32, len: usize) -> Option<HardwareFault> {
        let fault = self.injector.as_mut()?.hardware_fault(kind, len)?;
        self.stats.record_hardware_fault();
        warn!(
            op = kind.name(),
            address = u64::from(offset) + fault.offset() as u64,
            ?fault,
            "injected hardware fault"
        );
        Some(fault)
    }

    fn finish(
        &mut self,
        kind: OperationKind,
        offset: u32,
        len: usize,
        outcome: Result<(), FlashError>,
    ) -> Result<(), FlashError> {
        if outcome.is_ok() {
            self.stats.record_bytes(kind, len);
        }
        let micros = self.timing.apply(kind);
        self.stats.record_time(kind, micros);
        trace!(op = kind.name(), offset, len, ok = outcome.is_ok(), micros, "operation complete");
        outcome
    }
}

impl<D: Delay> FlashDriver for FlashSimulator<D> {
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        Self::read(self, offset, buf)
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<(), FlashError> {
        Self::write(self, offset, data)
    }

    fn erase(&mut self, offset: u32, len: usize) -> Result<(), FlashError> {
        Self::erase(self, offset, len)
    }

    fn set_write_protection(&mut self, enabled: bool) {
        Self::set_write_protection(self, enabled);
    }

    fn page_layout(&self) -> Option<&[PageLayout]> {
        Self::page_layout(self)
    }

    fn write_block_size(&self) -> u32 {
        Self::write_block_size(self)
    }

    fn size(&self) -> u32 {
        Self::size(self)
    }
}
