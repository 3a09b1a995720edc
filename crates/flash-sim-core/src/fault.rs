use thiserror::Error;

/// `EIO` errno value reported by the driver contract.
pub const EIO: i32 = 5;
/// `EACCES` errno value reported by the driver contract.
pub const EACCES: i32 = 13;
/// `EINVAL` errno value reported by the driver contract.
pub const EINVAL: i32 = 22;

/// Coarse classification of [`FlashError`] for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorKind {
    /// Request shape was invalid (range or alignment).
    InvalidArgument,
    /// Device is write protected.
    PermissionDenied,
    /// Device reported an I/O failure.
    Io,
}

/// Reason a request was rejected as an invalid argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum InvalidArgument {
    /// Some byte of the request falls outside the device window.
    #[error("range {offset:#x}+{len} is outside the device")]
    OutOfRange {
        /// Absolute start address of the request.
        offset: u32,
        /// Requested length in bytes.
        len: usize,
    },
    /// Erase request does not start and end on an erase-unit boundary.
    #[error("erase {offset:#x}+{len} is not aligned to the {unit}-byte erase unit")]
    Misaligned {
        /// Absolute start address of the request.
        offset: u32,
        /// Requested length in bytes.
        len: usize,
        /// Erase-unit size in bytes.
        unit: u32,
    },
}

/// Cause of an I/O failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum IoCause {
    /// API-level fault injected by the fault simulator.
    #[error("injected api failure")]
    InjectedFailure,
    /// Programming over cells that are not erased while double writes are disabled.
    #[error("double write to programmed cells")]
    DoubleWrite,
    /// Erase unit reached its configured endurance.
    #[error("erase unit {unit} exceeded its erase cycle limit")]
    EraseCycleLimit {
        /// Index of the worn erase unit.
        unit: u32,
    },
}

/// Error returned by every driver entry point.
///
/// Exactly one of these, or success, is returned per call; a rejected call
/// never leaves a partial effect on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum FlashError {
    /// Request shape was invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),
    /// Device is write protected.
    #[error("permission denied: device is write protected")]
    PermissionDenied,
    /// I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] IoCause),
}

impl FlashError {
    /// Returns the coarse error kind.
    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::PermissionDenied => ErrorKind::PermissionDenied,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Returns the negative errno value of the driver contract.
    #[must_use]
    pub const fn errno(self) -> i32 {
        match self.kind() {
            ErrorKind::InvalidArgument => -EINVAL,
            ErrorKind::PermissionDenied => -EACCES,
            ErrorKind::Io => -EIO,
        }
    }

    /// Returns `true` for failures injected by the fault simulator.
    #[must_use]
    pub const fn is_injected(self) -> bool {
        matches!(self, Self::Io(IoCause::InjectedFailure))
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, FlashError, InvalidArgument, IoCause, EACCES, EINVAL, EIO};

    #[test]
    fn errno_mapping_matches_driver_contract() {
        let range = FlashError::from(InvalidArgument::OutOfRange { offset: 0, len: 1 });
        assert_eq!(range.errno(), -EINVAL);
        assert_eq!(FlashError::PermissionDenied.errno(), -EACCES);
        assert_eq!(FlashError::from(IoCause::InjectedFailure).errno(), -EIO);
        assert_eq!(FlashError::from(IoCause::DoubleWrite).errno(), -EIO);
    }

    #[test]
    fn kinds_cover_each_variant() {
        let misaligned = FlashError::from(InvalidArgument::Misaligned {
            offset: 100,
            len: 100,
            unit: 4096,
        });
        assert_eq!(misaligned.kind(), ErrorKind::InvalidArgument);
        assert_eq!(FlashError::PermissionDenied.kind(), ErrorKind::PermissionDenied);
        assert_eq!(
            FlashError::from(IoCause::EraseCycleLimit { unit: 2 }).kind(),
            ErrorKind::Io
        );
    }

    #[test]
    fn only_api_faults_count_as_injected() {
        assert!(FlashError::Io(IoCause::InjectedFailure).is_injected());
        assert!(!FlashError::Io(IoCause::DoubleWrite).is_injected());
        assert!(!FlashError::PermissionDenied.is_injected());
    }

    #[test]
    fn messages_name_the_failing_request() {
        let error = FlashError::from(InvalidArgument::Misaligned {
            offset: 0x64,
            len: 100,
            unit: 4096,
        });
        assert_eq!(
            error.to_string(),
            "invalid argument: erase 0x64+100 is not aligned to the 4096-byte erase unit"
        );
    }
}
