use std::time::{Duration, Instant};

/// Operation families that carry independent fault rates and latencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OperationKind {
    /// Read from the device.
    Read,
    /// Program (write) into the device.
    Write,
    /// Erase whole erase units.
    Erase,
}

impl OperationKind {
    /// All operation families in canonical order.
    pub const ALL: [Self; 3] = [Self::Read, Self::Write, Self::Erase];

    /// Lowercase name used in logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Erase => "erase",
        }
    }
}

/// Minimum simulated latency per operation family, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimingConfig {
    /// Minimum read time.
    pub read_us: u32,
    /// Minimum write time.
    pub write_us: u32,
    /// Minimum erase time.
    pub erase_us: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            read_us: 2,
            write_us: 4,
            erase_us: 10,
        }
    }
}

impl TimingConfig {
    /// Looks up the minimum latency for an operation family.
    #[must_use]
    pub const fn latency_us(&self, kind: OperationKind) -> u32 {
        match kind {
            OperationKind::Read => self.read_us,
            OperationKind::Write => self.write_us,
            OperationKind::Erase => self.erase_us,
        }
    }
}

/// Blocking delay primitive used to simulate operation latency.
///
/// Implementations must not return before `micros` have elapsed (or, for
/// test doubles, must at least account for the request).
pub trait Delay {
    /// Blocks the calling context for at least `micros` microseconds.
    fn busy_wait(&mut self, micros: u32);
}

/// CPU-bound spin that never yields, like a bus transaction occupying the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinDelay;

impl Delay for SpinDelay {
    fn busy_wait(&mut self, micros: u32) {
        let deadline = Instant::now() + Duration::from_micros(u64::from(micros));
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
    }
}

/// Delay that returns immediately; latency is still accounted in statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Delay for NoDelay {
    fn busy_wait(&mut self, _micros: u32) {}
}

/// Delay that records every request instead of blocking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingDelay {
    /// Requested delays in call order.
    pub requests: Vec<u32>,
}

impl Delay for RecordingDelay {
    fn busy_wait(&mut self, micros: u32) {
        self.requests.push(micros);
    }
}

/// Applies per-family latency through a [`Delay`] primitive.
#[derive(Debug, Clone)]
pub struct TimingSimulator<D> {
    config: Option<TimingConfig>,
    delay: D,
}

impl<D: Delay> TimingSimulator<D> {
    /// Creates a simulator; `None` disables timing simulation.
    pub const fn new(config: Option<TimingConfig>, delay: D) -> Self {
        Self { config, delay }
    }

    /// Returns the active timing configuration, if any.
    #[must_use]
    pub const fn config(&self) -> Option<&TimingConfig> {
        self.config.as_ref()
    }

    /// Returns the delay primitive.
    #[must_use]
    pub const fn delay(&self) -> &D {
        &self.delay
    }

    /// Blocks for the family's minimum latency and returns the microseconds spent.
    ///
    /// Returns 0 without calling the primitive when timing is disabled.
    pub fn apply(&mut self, kind: OperationKind) -> u32 {
        let Some(config) = self.config else {
            return 0;
        };
        let micros = config.latency_us(kind);
        self.delay.busy_wait(micros);
        micros
    }
}
