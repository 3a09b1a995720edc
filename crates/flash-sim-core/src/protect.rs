//! Write-protection guard for mutating operations.

use crate::FlashError;

/// Write-protection flag consulted by write and erase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WriteProtect {
    enabled: bool,
}

impl WriteProtect {
    /// Sets or clears protection. Always succeeds.
    #[allow(clippy::missing_const_for_fn)]
    pub fn set(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns `true` while protection is engaged.
    #[must_use]
    pub const fn is_set(self) -> bool {
        self.enabled
    }

    /// Fails with [`FlashError::PermissionDenied`] while protection is engaged.
    ///
    /// # Errors
    ///
    /// Returns [`FlashError::PermissionDenied`] when the flag is set.
    pub const fn check(self) -> Result<(), FlashError> {
        if self.enabled {
            Err(FlashError::PermissionDenied)
        } else {
            Ok(())
        }
    }
}
