//! Saturating usage and fault counters.

use crate::OperationKind;

/// Counters for one operation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct OperationStats {
    /// Calls that passed range, protection and alignment checks.
    pub calls: u64,
    /// Bytes transferred or erased by calls that were not rejected.
    pub bytes: u64,
    /// Simulated latency accumulated, in microseconds.
    pub time_us: u64,
}

/// Device-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct FlashStats {
    /// Read counters.
    pub read: OperationStats,
    /// Write counters.
    pub write: OperationStats,
    /// Erase counters.
    pub erase: OperationStats,
    /// Write blocks programmed while already holding non-erased cells,
    /// counted once per block touched by each write.
    pub double_writes: u64,
    /// Calls rejected by the API fault layer.
    pub api_faults: u64,
    /// Hardware-level corruptions applied.
    pub hardware_faults: u64,
    /// Calls rejected by deterministic checks.
    pub rejected: u64,
}

impl FlashStats {
    /// Returns the counters of an operation family.
    #[must_use]
    pub const fn operation(&self, kind: OperationKind) -> &OperationStats {
        match kind {
            OperationKind::Read => &self.read,
            OperationKind::Write => &self.write,
            OperationKind::Erase => &self.erase,
        }
    }

    #[allow(clippy::missing_const_for_fn)]
    fn operation_mut(&mut self, kind: OperationKind) -> &mut OperationStats {
        match kind {
            OperationKind::Read => &mut self.read,
            OperationKind::Write => &mut self.write,
            OperationKind::Erase => &mut self.erase,
        }
    }

    /// Records a call that reached the device.
    pub fn record_call(&mut self, kind: OperationKind) {
        let stats = self.operation_mut(kind);
        stats.calls = stats.calls.saturating_add(1);
    }

    /// Records bytes moved by a call that went through.
    pub fn record_bytes(&mut self, kind: OperationKind, bytes: usize) {
        let stats = self.operation_mut(kind);
        stats.bytes = stats.bytes.saturating_add(bytes as u64);
    }

    /// Records simulated latency.
    pub fn record_time(&mut self, kind: OperationKind, micros: u32) {
        let stats = self.operation_mut(kind);
        stats.time_us = stats.time_us.saturating_add(u64::from(micros));
    }

    /// Records `blocks` write blocks programmed over non-erased cells.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_double_writes(&mut self, blocks: u64) {
        self.double_writes = self.double_writes.saturating_add(blocks);
    }

    /// Records an API-level injected failure.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_api_fault(&mut self) {
        self.api_faults = self.api_faults.saturating_add(1);
    }

    /// Records a hardware-level corruption.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_hardware_fault(&mut self) {
        self.hardware_faults = self.hardware_faults.saturating_add(1);
    }

    /// Records a deterministic rejection.
    #[allow(clippy::missing_const_for_fn)]
    pub fn record_rejection(&mut self) {
        self.rejected = self.rejected.saturating_add(1);
    }

    /// Resets every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Named counters in report order.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, u64)> {
        let mut entries = Vec::with_capacity(13);
        for kind in OperationKind::ALL {
            let stats = self.operation(kind);
            entries.push((format!("{}_calls", kind.name()), stats.calls));
            entries.push((format!("{}_bytes", kind.name()), stats.bytes));
            entries.push((format!("{}_time_us", kind.name()), stats.time_us));
        }
        entries.push(("double_writes".to_string(), self.double_writes));
        entries.push(("api_faults".to_string(), self.api_faults));
        entries.push(("hardware_faults".to_string(), self.hardware_faults));
        entries.push(("rejected".to_string(), self.rejected));
        entries
    }
}
