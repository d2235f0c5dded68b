//! Career date ranges and overlap semantics.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{StoreError, StoreResult};

/// Sentinel standing in for "ongoing" when comparing open-ended ranges.
pub static FAR_FUTURE: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(9999, 12, 31).expect("valid sentinel date"));

/// Closed-start interval; a missing end means the range is still ongoing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> StoreResult<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn ongoing(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    pub fn validate(&self) -> StoreResult<()> {
        if let Some(end) = self.end {
            if end < self.start {
                return Err(StoreError::invalid(format!(
                    "date range ends ({end}) before it starts ({})",
                    self.start
                )));
            }
        }
        Ok(())
    }

    /// Interval intersection against a query window. Open ends extend to the
    /// far-future sentinel; an open window start extends to the distant past.
    pub fn overlaps(&self, window: &DateWindow) -> bool {
        let self_end = self.end.unwrap_or(*FAR_FUTURE);
        let win_start = window.start.unwrap_or(NaiveDate::MIN);
        let win_end = window.end.unwrap_or(*FAR_FUTURE);
        self.start <= win_end && self_end >= win_start
    }
}

/// Query-side date filter; both bounds optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn since(start: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_end_before_start_rejected() {
        assert!(DateRange::new(d(2021, 1, 1), Some(d(2020, 1, 1))).is_err());
        assert!(DateRange::new(d(2020, 1, 1), Some(d(2020, 1, 1))).is_ok());
    }

    #[test]
    fn test_open_ended_overlaps_future_window() {
        // startDate = 2020-01-01, endDate = null must match a window opening 2023-01-01
        let range = DateRange::ongoing(d(2020, 1, 1));
        assert!(range.overlaps(&DateWindow::since(d(2023, 1, 1))));
    }

    #[test]
    fn test_closed_range_outside_window() {
        let range = DateRange::new(d(2018, 1, 1), Some(d(2019, 6, 1))).unwrap();
        assert!(!range.overlaps(&DateWindow::since(d(2020, 1, 1))));
        assert!(range.overlaps(&DateWindow::between(d(2019, 1, 1), d(2019, 2, 1))));
    }

    #[test]
    fn test_open_window_start() {
        let range = DateRange::new(d(2018, 1, 1), Some(d(2019, 6, 1))).unwrap();
        let window = DateWindow {
            start: None,
            end: Some(d(2018, 6, 1)),
        };
        assert!(range.overlaps(&window));
    }
}
