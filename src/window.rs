//! Request window describing the years and months of interest.
//!
//! One immutable, validated value instead of four loose integers threaded
//! through every call. The resolution engine borrows it; nothing mutates
//! it, not even while boundary rechecks are in flight.

use thiserror::Error;

/// Errors raised when constructing a [`RequestWindow`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    /// A month component was outside 1..=12.
    #[error("Invalid month {0} (must be between 1 and 12)")]
    InvalidMonth(u8),

    /// The start of the window lies after its end.
    #[error("Window start {start_year}-{start_month:02} lies after end {end_year}-{end_month:02}")]
    Inverted {
        start_year: i32,
        start_month: u8,
        end_year: i32,
        end_month: u8,
    },
}

/// Inclusive year/month window of a tile resolution request.
///
/// Immutable once built; the resolution engine never widens or narrows it,
/// even while a boundary recheck is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestWindow {
    start_year: i32,
    start_month: u8,
    end_year: i32,
    end_month: u8,
}

impl RequestWindow {
    /// Creates a window covering whole years (January through December).
    pub fn years(start_year: i32, end_year: i32) -> Result<Self, WindowError> {
        Self::new(start_year, 1, end_year, 12)
    }

    /// Creates a window with explicit month bounds.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidMonth`] for months outside 1..=12 and
    /// [`WindowError::Inverted`] when the start lies after the end.
    pub fn new(
        start_year: i32,
        start_month: u8,
        end_year: i32,
        end_month: u8,
    ) -> Result<Self, WindowError> {
        for month in [start_month, end_month] {
            if !(1..=12).contains(&month) {
                return Err(WindowError::InvalidMonth(month));
            }
        }
        if (start_year, start_month) > (end_year, end_month) {
            return Err(WindowError::Inverted {
                start_year,
                start_month,
                end_year,
                end_month,
            });
        }
        Ok(Self {
            start_year,
            start_month,
            end_year,
            end_month,
        })
    }

    /// First year of the window.
    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    /// First month of interest within the first year.
    pub fn start_month(&self) -> u8 {
        self.start_month
    }

    /// Last year of the window.
    pub fn end_year(&self) -> i32 {
        self.end_year
    }

    /// Last month of interest within the last year.
    pub fn end_month(&self) -> u8 {
        self.end_month
    }

    /// Month range (inclusive) that applies to `year`.
    ///
    /// Interior years always span January through December; the first and
    /// last year of the window are clipped to the requested months.
    pub fn months_for(&self, year: i32) -> (u8, u8) {
        let first = if year == self.start_year {
            self.start_month
        } else {
            1
        };
        let last = if year == self.end_year {
            self.end_month
        } else {
            12
        };
        (first, last)
    }

    /// Whether `year`'s month range is narrower than the full calendar year.
    pub fn is_clipped(&self, year: i32) -> bool {
        self.months_for(year) != (1, 12)
    }
}
