//! Page layout reporting.

/// One run of equally sized erase units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct PageLayout {
    /// Number of pages in the run.
    pub pages_count: u32,
    /// Size of each page in bytes.
    pub pages_size: u32,
}

impl PageLayout {
    /// Creates a layout record.
    #[must_use]
    pub const fn new(pages_count: u32, pages_size: u32) -> Self {
        Self {
            pages_count,
            pages_size,
        }
    }

    /// Total bytes covered by the run.
    #[must_use]
    pub const fn total_size(self) -> u64 {
        self.pages_count as u64 * self.pages_size as u64
    }
}
