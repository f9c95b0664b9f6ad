//! Cutoff and holiday models.
//!
//! This module contains the [`Cutoff`] and [`Holiday`] types that define the
//! date range a single payroll run covers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The kind of holiday, which determines its pay premium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayKind {
    /// A regular holiday.
    Regular,
    /// A special non-working day.
    SpecialNonWorking,
}

/// A holiday falling inside a cutoff.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{Holiday, HolidayKind};
/// use chrono::NaiveDate;
///
/// let holiday = Holiday {
///     date: NaiveDate::from_ymd_opt(2026, 6, 12).unwrap(),
///     name: "Independence Day".to_string(),
///     kind: HolidayKind::Regular,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// The date of the holiday.
    pub date: NaiveDate,
    /// The name of the holiday.
    pub name: String,
    /// Regular or special non-working.
    pub kind: HolidayKind,
}

/// The inclusive date range covered by a payroll run.
///
/// # Example
///
/// ```
/// use payroll_engine::models::Cutoff;
/// use chrono::NaiveDate;
///
/// let cutoff = Cutoff::new(
///     NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
/// )
/// .unwrap();
///
/// assert!(cutoff.contains_date(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()));
/// assert_eq!(cutoff.dates().count(), 15);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cutoff {
    /// The first date of the cutoff (inclusive).
    pub start: NaiveDate,
    /// The last date of the cutoff (inclusive).
    pub end: NaiveDate,
    /// Holidays that fall within this cutoff.
    #[serde(default)]
    pub holidays: Vec<Holiday>,
}

impl Cutoff {
    /// Creates a cutoff without holidays, rejecting an inverted range.
    pub fn new(start: NaiveDate, end: NaiveDate) -> EngineResult<Self> {
        Self::with_holidays(start, end, Vec::new())
    }

    /// Creates a cutoff with holidays, rejecting an inverted range.
    ///
    /// Holidays outside the range are dropped.
    pub fn with_holidays(
        start: NaiveDate,
        end: NaiveDate,
        holidays: Vec<Holiday>,
    ) -> EngineResult<Self> {
        if end < start {
            return Err(EngineError::validation(
                "cutoff_end",
                format!("cutoff end {} is before cutoff start {}", end, start),
            ));
        }

        let holidays = holidays
            .into_iter()
            .filter(|h| h.date >= start && h.date <= end)
            .collect();

        Ok(Self {
            start,
            end,
            holidays,
        })
    }

    /// Checks if a given date falls within this cutoff (inclusive).
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Returns the holiday on a date, if any.
    pub fn holiday_on(&self, date: NaiveDate) -> Option<&Holiday> {
        self.holidays.iter().find(|h| h.date == date)
    }

    /// Iterates over every date of the cutoff in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_cutoff_with_holiday() -> Cutoff {
        Cutoff::with_holidays(
            date(2026, 6, 1),
            date(2026, 6, 15),
            vec![Holiday {
                date: date(2026, 6, 12),
                name: "Independence Day".to_string(),
                kind: HolidayKind::Regular,
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let result = Cutoff::new(date(2026, 1, 15), date(2026, 1, 1));
        match result {
            Err(EngineError::Validation { field, .. }) => assert_eq!(field, "cutoff_end"),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_single_day_cutoff_is_allowed() {
        let cutoff = Cutoff::new(date(2026, 1, 1), date(2026, 1, 1)).unwrap();
        assert_eq!(cutoff.dates().collect::<Vec<_>>(), vec![date(2026, 1, 1)]);
    }

    #[test]
    fn test_contains_date_is_inclusive() {
        let cutoff = create_cutoff_with_holiday();
        assert!(cutoff.contains_date(cutoff.start));
        assert!(cutoff.contains_date(cutoff.end));
        assert!(!cutoff.contains_date(date(2026, 5, 31)));
        assert!(!cutoff.contains_date(date(2026, 6, 16)));
    }

    #[test]
    fn test_holiday_on() {
        let cutoff = create_cutoff_with_holiday();
        assert_eq!(
            cutoff.holiday_on(date(2026, 6, 12)).map(|h| h.kind),
            Some(HolidayKind::Regular)
        );
        assert!(cutoff.holiday_on(date(2026, 6, 11)).is_none());
    }

    #[test]
    fn test_holidays_outside_range_are_dropped() {
        let cutoff = Cutoff::with_holidays(
            date(2026, 12, 16),
            date(2026, 12, 31),
            vec![
                Holiday {
                    date: date(2026, 12, 25),
                    name: "Christmas Day".to_string(),
                    kind: HolidayKind::Regular,
                },
                Holiday {
                    date: date(2027, 1, 1),
                    name: "New Year's Day".to_string(),
                    kind: HolidayKind::Regular,
                },
            ],
        )
        .unwrap();
        assert_eq!(cutoff.holidays.len(), 1);
    }

    #[test]
    fn test_dates_cross_month_boundary() {
        let cutoff = Cutoff::new(date(2026, 1, 26), date(2026, 2, 10)).unwrap();
        let dates: Vec<_> = cutoff.dates().collect();
        assert_eq!(dates.len(), 16);
        assert_eq!(dates[0], date(2026, 1, 26));
        assert_eq!(dates[15], date(2026, 2, 10));
    }

    #[test]
    fn test_deserialize_cutoff() {
        let json = r#"{
            "start": "2026-06-01",
            "end": "2026-06-15",
            "holidays": [
                {"date": "2026-06-12", "name": "Independence Day", "kind": "regular"}
            ]
        }"#;
        let cutoff: Cutoff = serde_json::from_str(json).unwrap();
        assert_eq!(cutoff.holidays[0].name, "Independence Day");
    }
}
