//! Device address map and range validation.

use crate::{FlashError, InvalidArgument};

/// Half-open device address window `[base, base + size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressMap {
    base: u32,
    size: u32,
}

impl AddressMap {
    /// Creates an address map for `size` bytes starting at `base`.
    ///
    /// Returns `None` when the window would extend past the 32-bit address
    /// space.
    #[must_use]
    pub const fn new(base: u32, size: u32) -> Option<Self> {
        match base.checked_add(size) {
            Some(_) => Some(Self { base, size }),
            None => None,
        }
    }

    /// First valid device address.
    #[must_use]
    pub const fn base(self) -> u32 {
        self.base
    }

    /// Number of bytes in the window.
    #[must_use]
    pub const fn size(self) -> u32 {
        self.size
    }

    /// One past the last valid device address.
    #[must_use]
    pub const fn end(self) -> u32 {
        self.base + self.size
    }

    /// Returns `true` when `[offset, offset + len)` lies inside the window.
    ///
    /// Overflowing requests are never in range.
    #[must_use]
    pub const fn contains_range(self, offset: u32, len: usize) -> bool {
        if offset < self.base {
            return false;
        }
        if len > u32::MAX as usize {
            return false;
        }
        #[allow(clippy::cast_possible_truncation)]
        let len = len as u32;
        match offset.checked_add(len) {
            Some(end) => end <= self.end(),
            None => false,
        }
    }

    /// Validates a request and translates it to a backing-store index range.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument::OutOfRange`] when any byte of the request
    /// falls outside the window.
    pub fn translate(self, offset: u32, len: usize) -> Result<core::ops::Range<usize>, FlashError> {
        if !self.contains_range(offset, len) {
            return Err(FlashError::InvalidArgument(InvalidArgument::OutOfRange {
                offset,
                len,
            }));
        }
        let start = (offset - self.base) as usize;
        Ok(start..start + len)
    }
}
