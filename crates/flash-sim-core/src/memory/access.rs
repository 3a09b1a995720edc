//! Flash programming and erase rules applied to the backing store.

use crate::{FlashError, InvalidArgument};

/// Byte value of a cell in the erased state (all bits set).
pub const ERASED_BYTE: u8 = 0xFF;

/// Validates that an erase request starts and ends on erase-unit boundaries.
///
/// Alignment is measured on the absolute device address. Device configuration
/// keeps the base on a unit boundary, so absolute and device-relative
/// alignment agree.
///
/// # Errors
///
/// Returns [`InvalidArgument::Misaligned`] when `offset` or `len` is not a
/// multiple of `unit`, or when `unit` is zero.
pub const fn validate_erase_alignment(offset: u32, len: usize, unit: u32) -> Result<(), FlashError> {
    if unit != 0 && offset % unit == 0 && len % unit as usize == 0 {
        Ok(())
    } else {
        Err(FlashError::InvalidArgument(InvalidArgument::Misaligned {
            offset,
            len,
            unit,
        }))
    }
}

/// Programs `data` into `cells`, clearing bits only.
///
/// Every stored byte becomes `old & new`; no bit ever goes from 0 to 1.
pub fn program(cells: &mut [u8], data: &[u8]) {
    for (cell, byte) in cells.iter_mut().zip(data) {
        *cell &= *byte;
    }
}

/// Resets every cell to [`ERASED_BYTE`].
pub fn erase(cells: &mut [u8]) {
    cells.fill(ERASED_BYTE);
}

/// Returns `true` when every cell is in the erased state.
#[must_use]
pub fn is_erased(cells: &[u8]) -> bool {
    cells.iter().all(|cell| *cell == ERASED_BYTE)
}
