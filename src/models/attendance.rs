//! Attendance record model.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub(crate) const MINUTES_PER_DAY: i64 = 24 * 60;

/// The status of an attendance record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// The employee reported for work.
    #[default]
    Present,
    /// The employee was absent.
    Absent,
    /// The employee was on approved leave.
    Leave,
}

/// One employee's attendance for one date, as held by the attendance store.
///
/// Stored `late`, `undertime` and `overtime` values are user-entered and take
/// precedence over anything derived from the punches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// The date of the record.
    pub date: NaiveDate,
    /// Present unless stated otherwise.
    #[serde(default)]
    pub status: AttendanceStatus,
    /// Actual time in.
    #[serde(default)]
    pub actual_in: Option<NaiveTime>,
    /// Actual time out.
    #[serde(default)]
    pub actual_out: Option<NaiveTime>,
    /// Stored late minutes.
    #[serde(default)]
    pub late: Option<u32>,
    /// Stored undertime hours.
    #[serde(default)]
    pub undertime: Option<Decimal>,
    /// Stored regular overtime hours.
    #[serde(default)]
    pub overtime: Option<Decimal>,
    /// Stored special (rest day / holiday) overtime hours.
    #[serde(default)]
    pub special_overtime: Option<Decimal>,
    /// Stored night differential hours.
    #[serde(default)]
    pub night_differential: Option<Decimal>,
}

impl AttendanceRecord {
    /// Creates a present record with punches and nothing stored.
    pub fn present(date: NaiveDate, actual_in: NaiveTime, actual_out: NaiveTime) -> Self {
        Self {
            date,
            status: AttendanceStatus::Present,
            actual_in: Some(actual_in),
            actual_out: Some(actual_out),
            late: None,
            undertime: None,
            overtime: None,
            special_overtime: None,
            night_differential: None,
        }
    }

    /// Creates a record with the given non-present status.
    pub fn with_status(date: NaiveDate, status: AttendanceStatus) -> Self {
        Self {
            date,
            status,
            actual_in: None,
            actual_out: None,
            late: None,
            undertime: None,
            overtime: None,
            special_overtime: None,
            night_differential: None,
        }
    }

    /// Returns true if late/undertime/overtime apply to this record.
    pub fn is_present(&self) -> bool {
        self.status == AttendanceStatus::Present
    }

    /// Minutes between the punches, or zero when a punch is missing.
    ///
    /// A punch-out earlier than the punch-in is taken to be on the next day,
    /// so an overnight shift from 22:00 to 06:00 counts 480 minutes.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::AttendanceRecord;
    /// use chrono::{NaiveDate, NaiveTime};
    ///
    /// let record = AttendanceRecord::present(
    ///     NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
    ///     NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
    ///     NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
    /// );
    /// assert_eq!(record.worked_minutes(), 570);
    /// ```
    pub fn worked_minutes(&self) -> i64 {
        match (self.actual_in, self.actual_out) {
            (Some(time_in), Some(time_out)) => {
                (time_out - time_in).num_minutes().rem_euclid(MINUTES_PER_DAY)
            }
            _ => 0,
        }
    }
}
