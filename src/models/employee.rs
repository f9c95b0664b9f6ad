//! Employee model and related types.
//!
//! This module defines the compensation and schedule profiles the payroll
//! core reads from the employee directory. The directory owns these records;
//! the engine never mutates them.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How an employee's `basic_salary` is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryType {
    /// `basic_salary` is a monthly amount.
    Monthly,
    /// `basic_salary` is paid per working day.
    Daily,
    /// `basic_salary` is paid per hour.
    Hourly,
}

impl std::fmt::Display for SalaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SalaryType::Monthly => write!(f, "monthly"),
            SalaryType::Daily => write!(f, "daily"),
            SalaryType::Hourly => write!(f, "hourly"),
        }
    }
}

/// An employee's compensation profile.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{CompensationProfile, SalaryType};
/// use rust_decimal::Decimal;
///
/// let profile = CompensationProfile {
///     salary_type: SalaryType::Monthly,
///     basic_salary: Decimal::new(20000, 0),
///     allowance: None,
/// };
/// assert_eq!(profile.allowance_or_zero(), Decimal::ZERO);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationProfile {
    /// How `basic_salary` is expressed.
    pub salary_type: SalaryType,
    /// The basic salary; its period depends on `salary_type`.
    pub basic_salary: Decimal,
    /// Monthly non-taxable allowance.
    #[serde(default)]
    pub allowance: Option<Decimal>,
}

impl CompensationProfile {
    /// Returns the monthly allowance, treating a missing value as zero.
    pub fn allowance_or_zero(&self) -> Decimal {
        self.allowance.unwrap_or(Decimal::ZERO)
    }
}

/// Scheduled hours for one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    /// Scheduled time in.
    #[serde(rename = "in")]
    pub time_in: NaiveTime,
    /// Scheduled time out.
    #[serde(rename = "out")]
    pub time_out: NaiveTime,
    /// Whether the weekday is a workday by default.
    pub is_workday: bool,
}

/// The default schedule for each day of the week.
///
/// One named field per weekday, so a schedule can never have a missing or a
/// duplicated day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    /// Monday.
    pub monday: DaySchedule,
    /// Tuesday.
    pub tuesday: DaySchedule,
    /// Wednesday.
    pub wednesday: DaySchedule,
    /// Thursday.
    pub thursday: DaySchedule,
    /// Friday.
    pub friday: DaySchedule,
    /// Saturday.
    pub saturday: DaySchedule,
    /// Sunday.
    pub sunday: DaySchedule,
}

impl WeeklySchedule {
    /// Returns the schedule entry for a weekday.
    pub fn for_weekday(&self, weekday: Weekday) -> &DaySchedule {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }
}

/// A date-specific schedule that turns the date into a workday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOverride {
    /// The date the override applies to.
    pub date: NaiveDate,
    /// Scheduled time in for that date.
    #[serde(rename = "in")]
    pub time_in: NaiveTime,
    /// Scheduled time out for that date.
    #[serde(rename = "out")]
    pub time_out: NaiveTime,
}

/// Scheduled in/out times that apply to a specific workday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledShift {
    /// Scheduled time in.
    pub time_in: NaiveTime,
    /// Scheduled time out.
    pub time_out: NaiveTime,
}

/// An employee's schedule: weekly defaults plus per-date overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleProfile {
    /// The default weekly schedule.
    pub weekly: WeeklySchedule,
    /// Date-specific overrides, in the order they were entered.
    #[serde(default)]
    pub overrides: Vec<ScheduleOverride>,
}

impl ScheduleProfile {
    /// Returns the override for a date, if any.
    pub fn override_for(&self, date: NaiveDate) -> Option<&ScheduleOverride> {
        self.overrides.iter().find(|o| o.date == date)
    }

    /// Returns true if the date is a rest day.
    ///
    /// A date is a workday when it has an override or when its weekday is
    /// flagged as a workday; every other date is a rest day.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::{DaySchedule, ScheduleProfile, WeeklySchedule};
    /// use chrono::{NaiveDate, NaiveTime};
    ///
    /// let work = DaySchedule {
    ///     time_in: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
    ///     time_out: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
    ///     is_workday: true,
    /// };
    /// let rest = DaySchedule { is_workday: false, ..work };
    /// let schedule = ScheduleProfile {
    ///     weekly: WeeklySchedule {
    ///         monday: work, tuesday: work, wednesday: work, thursday: work,
    ///         friday: work, saturday: rest, sunday: rest,
    ///     },
    ///     overrides: vec![],
    /// };
    ///
    /// // 2026-01-17 is a Saturday
    /// assert!(schedule.is_rest_day(NaiveDate::from_ymd_opt(2026, 1, 17).unwrap()));
    /// assert!(!schedule.is_rest_day(NaiveDate::from_ymd_opt(2026, 1, 16).unwrap()));
    /// ```
    pub fn is_rest_day(&self, date: NaiveDate) -> bool {
        self.override_for(date).is_none() && !self.weekly.for_weekday(date.weekday()).is_workday
    }

    /// Returns the scheduled in/out times for a date, or `None` on a rest day.
    pub fn shift_for(&self, date: NaiveDate) -> Option<ScheduledShift> {
        if let Some(o) = self.override_for(date) {
            return Some(ScheduledShift {
                time_in: o.time_in,
                time_out: o.time_out,
            });
        }

        let day = self.weekly.for_weekday(date.weekday());
        day.is_workday.then_some(ScheduledShift {
            time_in: day.time_in,
            time_out: day.time_out,
        })
    }
}

/// Employment status as reported by the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    /// Currently employed.
    Active,
    /// On extended leave or suspension.
    Inactive,
    /// No longer employed.
    Separated,
}

/// An employee record as returned by the employee directory.
///
/// Compensation and schedule are optional because the directory may hold
/// incomplete records; the compositor rejects those with a computation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name used in exports.
    pub name: String,
    /// Department name.
    #[serde(default)]
    pub department: Option<String>,
    /// Employment status.
    pub status: EmploymentStatus,
    /// Compensation profile.
    #[serde(default)]
    pub compensation: Option<CompensationProfile>,
    /// Schedule profile.
    #[serde(default)]
    pub schedule: Option<ScheduleProfile>,
}
