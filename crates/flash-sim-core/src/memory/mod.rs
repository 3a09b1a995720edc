//! Backing store for the simulated cell array and the rules that mutate it.

/// Programming, erase and alignment rules.
pub mod access;
/// Device address window and range validation.
pub mod map;

pub use access::{is_erased, validate_erase_alignment, ERASED_BYTE};
pub use map::AddressMap;

use core::ops::Range;

/// Fixed-length byte array standing in for the flash cell array.
///
/// Indexed by `device_address - base_address`; callers go through
/// [`AddressMap::translate`] before touching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackingStore {
    cells: Box<[u8]>,
}

impl BackingStore {
    /// Allocates `len` cells, all set to `fill`.
    #[must_use]
    pub fn new(len: usize, fill: u8) -> Self {
        Self {
            cells: vec![fill; len].into_boxed_slice(),
        }
    }

    /// Number of cells.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` for a zero-sized store.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Entire cell array.
    #[must_use]
    pub const fn as_slice(&self) -> &[u8] {
        &self.cells
    }

    /// Cells in an already translated index range.
    #[must_use]
    pub fn cells(&self, range: Range<usize>) -> &[u8] {
        &self.cells[range]
    }

    /// Mutable cells in an already translated index range.
    pub fn cells_mut(&mut self, range: Range<usize>) -> &mut [u8] {
        &mut self.cells[range]
    }

    /// Copies the translated range into `out`.
    pub fn read_into(&self, range: Range<usize>, out: &mut [u8]) {
        out.copy_from_slice(&self.cells[range]);
    }

    /// Programs `data` into the translated range with write-AND semantics.
    pub fn program(&mut self, range: Range<usize>, data: &[u8]) {
        access::program(&mut self.cells[range], data);
    }

    /// Erases the translated range to [`ERASED_BYTE`].
    pub fn erase(&mut self, range: Range<usize>) {
        access::erase(&mut self.cells[range]);
    }
}
