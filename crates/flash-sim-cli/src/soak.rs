//! Device banner and soak workload driven by the `flash-sim` binary.

use std::fmt::Write as _;

use flash_sim_core::{
    ConfigError, Delay, FlashConfig, FlashSimulator, OperationKind, PageLayout,
};
use tracing::{debug, info};

/// Renders the geometry, fault and timing settings of `config`.
///
/// # Errors
///
/// Returns the validation error when `config` describes no usable device.
pub fn describe(config: &FlashConfig) -> Result<String, ConfigError> {
    let size = config.validate()?;
    let PageLayout {
        pages_count,
        pages_size,
    } = config.page_layout();

    let mut out = String::new();
    let _ = writeln!(out, "flash simulator");
    let _ = writeln!(
        out,
        "  range        {:#010x}..{:#010x} ({size} bytes)",
        config.base_address,
        u64::from(config.base_address) + u64::from(size)
    );
    let _ = writeln!(out, "  erase units  {pages_count} x {pages_size} bytes");
    let _ = writeln!(out, "  write block  {} bytes", config.write_block_size);
    let _ = writeln!(out, "  initial fill {:#04x}", config.initial_fill);
    let _ = writeln!(
        out,
        "  double write {}",
        if config.allow_double_writes { "allowed" } else { "rejected" }
    );
    let _ = writeln!(
        out,
        "  endurance    {}",
        config
            .max_erase_cycles
            .map_or_else(|| "unlimited".to_string(), |limit| format!("{limit} cycles"))
    );

    match &config.faults {
        Some(faults) => {
            for kind in OperationKind::ALL {
                let rates = faults.rates(kind);
                let _ = writeln!(
                    out,
                    "  {:<5} faults api {}/10000 hardware {}/10000",
                    kind.name(),
                    rates.api,
                    rates.hardware
                );
            }
        }
        None => {
            let _ = writeln!(out, "  faults       disabled");
        }
    }

    match &config.timing {
        Some(timing) => {
            for kind in OperationKind::ALL {
                let _ = writeln!(out, "  {:<5} delay  {} us", kind.name(), timing.latency_us(kind));
            }
        }
        None => {
            let _ = writeln!(out, "  timing       disabled");
        }
    }

    Ok(out)
}

/// Erase/program/verify cycles over every unit in turn.
///
/// Individual failures are expected under fault injection and only feed the
/// statistics.
pub fn run<D: Delay>(sim: &mut FlashSimulator<D>, iterations: u32) {
    let unit = sim.erase_unit_size();
    let units = sim.size() / unit;
    let block = sim.write_block_size() as usize;
    let zeros = vec![0u8; block];
    let mut readback = vec![0u8; block];

    info!(iterations, units, "soak started");
    for iteration in 0..iterations {
        let start = sim.base_address() + (iteration % units) * unit;
        if let Err(error) = sim.erase(start, unit as usize) {
            debug!(iteration, start, %error, "erase failed");
        }

        for offset in (start..start + unit).step_by(block) {
            let _ = sim.write(offset, &zeros);
            let _ = sim.read(offset, &mut readback);
        }
    }
    info!(iterations, "soak finished");
}

/// Formats the statistics counters as an aligned table.
pub fn stats_table<D: Delay>(sim: &FlashSimulator<D>) -> String {
    let mut out = String::new();
    for (name, value) in sim.stats().entries() {
        let _ = writeln!(out, "{name:<16} {value}");
    }
    out
}
