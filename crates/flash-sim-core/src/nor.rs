//! Adapter exposing a simulator through the `embedded-storage` NOR flash traits.

use embedded_storage::nor_flash::{
    ErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};

use crate::{ConfigError, Delay, FlashError, FlashSimulator, InvalidArgument};

impl NorFlashError for FlashError {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            Self::InvalidArgument(InvalidArgument::OutOfRange { .. }) => {
                NorFlashErrorKind::OutOfBounds
            }
            Self::InvalidArgument(InvalidArgument::Misaligned { .. }) => {
                NorFlashErrorKind::NotAligned
            }
            Self::PermissionDenied | Self::Io(_) => NorFlashErrorKind::Other,
        }
    }
}

/// NOR flash view of a simulator with compile-time write and erase sizes.
///
/// Offsets are relative to the device base address, which should itself be
/// erase-unit aligned.
#[derive(Debug, Clone)]
pub struct NorFlashAdapter<D, const WRITE: usize, const ERASE: usize> {
    sim: FlashSimulator<D>,
}

impl<D: Delay, const WRITE: usize, const ERASE: usize>
    NorFlashAdapter<D, WRITE, ERASE>
{
    /// Wraps `sim`, checking that its geometry matches the const parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::GeometryMismatch`] when the device's write-block
    /// or erase-unit size differs from `WRITE`/`ERASE`.
    pub fn new(sim: FlashSimulator<D>) -> Result<Self, ConfigError> {
        if sim.write_block_size() as usize != WRITE || sim.erase_unit_size() as usize != ERASE
        {
            return Err(ConfigError::GeometryMismatch {
                expected_write: WRITE,
                expected_erase: ERASE,
                actual_write: sim.write_block_size(),
                actual_erase: sim.erase_unit_size(),
            });
        }
        Ok(Self { sim })
    }

    /// Borrows the wrapped simulator.
    #[must_use]
    pub const fn inner(&self) -> &FlashSimulator<D> {
        &self.sim
    }

    /// Mutably borrows the wrapped simulator.
    #[allow(clippy::missing_const_for_fn)]
    pub fn inner_mut(&mut self) -> &mut FlashSimulator<D> {
        &mut self.sim
    }

    /// Unwraps the simulator.
    #[must_use]
    pub fn into_inner(self) -> FlashSimulator<D> {
        self.sim
    }

    fn absolute(&self, offset: u32, len: usize) -> Result<u32, FlashError> {
        self.sim
            .base_address()
            .checked_add(offset)
            .ok_or(FlashError::InvalidArgument(InvalidArgument::OutOfRange {
                offset,
                len,
            }))
    }
}

impl<D: Delay, const WRITE: usize, const ERASE: usize> ErrorType
    for NorFlashAdapter<D, WRITE, ERASE>
{
    type Error = FlashError;
}

impl<D: Delay, const WRITE: usize, const ERASE: usize> ReadNorFlash
    for NorFlashAdapter<D, WRITE, ERASE>
{
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let address = self.absolute(offset, bytes.len())?;
        self.sim.read(address, bytes)
    }

    fn capacity(&self) -> usize {
        self.sim.size() as usize
    }
}

impl<D: Delay, const WRITE: usize, const ERASE: usize> NorFlash
    for NorFlashAdapter<D, WRITE, ERASE>
{
    const WRITE_SIZE: usize = WRITE;
    const ERASE_SIZE: usize = ERASE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        let Some(len) = to.checked_sub(from) else {
            return Err(FlashError::InvalidArgument(InvalidArgument::OutOfRange {
                offset: from,
                len: 0,
            }));
        };
        let address = self.absolute(from, len as usize)?;
        self.sim.erase(address, len as usize)
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let address = self.absolute(offset, bytes.len())?;
        self.sim.write(address, bytes)
    }
}
