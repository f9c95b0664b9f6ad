//! Attendance aggregation over a cutoff.
//!
//! This module reduces a cutoff's attendance records, the weekly schedule and
//! per-date overrides into workday counts, late/undertime/overtime totals and
//! holiday and rest-day premium pay.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PayPremiums;
use crate::models::{
    AttendanceRecord, AuditStep, Cutoff, HolidayKind, MINUTES_PER_DAY, ScheduleProfile,
    ScheduledShift,
};

use super::round_money;

const MINUTES_PER_HOUR: Decimal = Decimal::from_parts(60, 0, 0, false, 0);

/// Attendance totals for one employee over one cutoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    /// Non-rest days in the cutoff.
    pub working_days: u32,
    /// Dates with a present record.
    pub days_worked: u32,
    /// Absence days as reported by the attendance source.
    pub absences: Decimal,
    /// Total late minutes.
    pub late_minutes: u32,
    /// Total undertime minutes.
    pub undertime_minutes: Decimal,
    /// Total late hours.
    pub late_hours: Decimal,
    /// Total undertime hours.
    pub undertime_hours: Decimal,
    /// Total stored overtime hours.
    pub overtime_hours: Decimal,
    /// Premium pay for holiday work.
    pub holiday_pay: Decimal,
    /// Premium pay for rest-day work.
    pub rest_day_pay: Decimal,
}

/// The result of aggregating attendance, including the audit step.
#[derive(Debug, Clone)]
pub struct AttendanceAggregation {
    /// The totals.
    pub summary: AttendanceSummary,
    /// The audit step recording this aggregation.
    pub audit_step: AuditStep,
}

/// Counts the non-rest days in a cutoff.
pub fn count_working_days(cutoff: &Cutoff, schedule: &ScheduleProfile) -> u32 {
    cutoff
        .dates()
        .filter(|date| !schedule.is_rest_day(*date))
        .count() as u32
}

/// Scheduled shift length in minutes; a shift ending at or before its start
/// ends on the next day.
fn shift_length(shift: &ScheduledShift) -> i64 {
    (shift.time_out - shift.time_in)
        .num_minutes()
        .rem_euclid(MINUTES_PER_DAY)
}

/// Minutes from the scheduled start to `time`, negative before the start.
///
/// Times in the first half of the off-shift gap count as after the shift
/// end, times in the second half as before the next start. For an overnight
/// 22:00 to 06:00 shift, 00:30 is 150 minutes in and 21:45 is 15 minutes
/// early.
fn shift_offset(shift: &ScheduledShift, time: NaiveTime) -> i64 {
    let length = shift_length(shift);
    let offset = (time - shift.time_in).num_minutes().rem_euclid(MINUTES_PER_DAY);
    if offset >= length + (MINUTES_PER_DAY - length) / 2 {
        offset - MINUTES_PER_DAY
    } else {
        offset
    }
}

/// Late minutes for one present record.
///
/// The stored value wins; otherwise it is derived from the scheduled start
/// on a workday. Non-present records are never late. Overnight shifts are
/// measured across midnight.
pub fn late_minutes(record: &AttendanceRecord, schedule: &ScheduleProfile) -> u32 {
    if !record.is_present() {
        return 0;
    }
    match (record.late, schedule.shift_for(record.date), record.actual_in) {
        (Some(stored), _, _) => stored,
        (None, Some(shift), Some(actual_in)) => shift_offset(&shift, actual_in).max(0) as u32,
        _ => 0,
    }
}

/// Undertime minutes for one present record, stored hours winning over
/// the value derived from the scheduled end.
pub fn undertime_minutes(record: &AttendanceRecord, schedule: &ScheduleProfile) -> Decimal {
    if !record.is_present() {
        return Decimal::ZERO;
    }
    match (record.undertime, schedule.shift_for(record.date), record.actual_out) {
        (Some(stored_hours), _, _) => stored_hours * MINUTES_PER_HOUR,
        (None, Some(shift), Some(actual_out)) => {
            Decimal::from((shift_length(&shift) - shift_offset(&shift, actual_out)).max(0))
        }
        _ => Decimal::ZERO,
    }
}

/// Aggregates a cutoff's attendance for one employee.
///
/// Rules per present record inside the cutoff:
/// - late: stored minutes if present, otherwise `actual in - scheduled in` on
///   a scheduled workday, floored at zero
/// - undertime: stored hours if present, otherwise `scheduled out - actual out`
///   on a scheduled workday, floored at zero
/// - shifts and punches that cross midnight are measured into the next day
/// - overtime: stored hours only, never derived
/// - holiday work earns `worked hours x hourly rate x holiday premium`
/// - rest-day work that is not a holiday earns `worked hours x hourly rate x
///   rest-day premium`
///
/// Absent and leave records contribute nothing. `reported_absences` comes
/// from the attendance source, which already nets out rest days, holidays
/// and approved leave, and is passed through untouched. When a date has more
/// than one record the first one wins.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::aggregate_attendance;
/// use payroll_engine::config::PayPremiums;
/// use payroll_engine::models::{
///     AttendanceRecord, Cutoff, DaySchedule, ScheduleProfile, WeeklySchedule,
/// };
/// use chrono::{NaiveDate, NaiveTime};
/// use rust_decimal::Decimal;
///
/// let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
/// let work = DaySchedule { time_in: t(8, 0), time_out: t(17, 0), is_workday: true };
/// let rest = DaySchedule { is_workday: false, ..work };
/// let schedule = ScheduleProfile {
///     weekly: WeeklySchedule {
///         monday: work, tuesday: work, wednesday: work, thursday: work,
///         friday: work, saturday: rest, sunday: rest,
///     },
///     overrides: vec![],
/// };
/// // Monday 2026-01-12 to Sunday 2026-01-18
/// let cutoff = Cutoff::new(
///     NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 1, 18).unwrap(),
/// ).unwrap();
/// let records = vec![AttendanceRecord::present(
///     NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
///     t(8, 15),
///     t(17, 0),
/// )];
///
/// let result = aggregate_attendance(
///     &cutoff, &schedule, &records, Decimal::ZERO, Decimal::new(100, 0),
///     &PayPremiums::default(), 1,
/// );
/// assert_eq!(result.summary.working_days, 5);
/// assert_eq!(result.summary.late_minutes, 15);
/// assert_eq!(result.summary.late_hours, Decimal::new(25, 2));
/// ```
pub fn aggregate_attendance(
    cutoff: &Cutoff,
    schedule: &ScheduleProfile,
    records: &[AttendanceRecord],
    reported_absences: Decimal,
    hourly_rate: Decimal,
    premiums: &PayPremiums,
    step_number: u32,
) -> AttendanceAggregation {
    let working_days = count_working_days(cutoff, schedule);

    let mut by_date: BTreeMap<NaiveDate, &AttendanceRecord> = BTreeMap::new();
    for record in records.iter().filter(|r| cutoff.contains_date(r.date)) {
        by_date.entry(record.date).or_insert(record);
    }

    let mut days_worked = 0u32;
    let mut total_late = 0u32;
    let mut total_undertime = Decimal::ZERO;
    let mut overtime_hours = Decimal::ZERO;
    let mut holiday_pay = Decimal::ZERO;
    let mut rest_day_pay = Decimal::ZERO;
    let mut holiday_dates = Vec::new();
    let mut rest_day_dates = Vec::new();

    for (date, record) in by_date.iter().filter(|(_, r)| r.is_present()) {
        days_worked += 1;
        total_late += late_minutes(record, schedule);
        total_undertime += undertime_minutes(record, schedule);

        overtime_hours += record.overtime.unwrap_or(Decimal::ZERO);

        let worked_hours = Decimal::from(record.worked_minutes()) / MINUTES_PER_HOUR;
        if let Some(holiday) = cutoff.holiday_on(*date) {
            let premium = match holiday.kind {
                HolidayKind::Regular => premiums.regular_holiday,
                HolidayKind::SpecialNonWorking => premiums.special_holiday,
            };
            holiday_pay += worked_hours * hourly_rate * premium;
            holiday_dates.push(date.to_string());
        } else if schedule.is_rest_day(*date) {
            rest_day_pay += worked_hours * hourly_rate * premiums.rest_day;
            rest_day_dates.push(date.to_string());
        }
    }

    let summary = AttendanceSummary {
        working_days,
        days_worked,
        absences: reported_absences,
        late_minutes: total_late,
        undertime_minutes: total_undertime,
        late_hours: Decimal::from(total_late) / MINUTES_PER_HOUR,
        undertime_hours: total_undertime / MINUTES_PER_HOUR,
        overtime_hours,
        holiday_pay: round_money(holiday_pay),
        rest_day_pay: round_money(rest_day_pay),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "attendance_aggregation".to_string(),
        rule_name: "Attendance Aggregation".to_string(),
        input: serde_json::json!({
            "cutoff_start": cutoff.start.to_string(),
            "cutoff_end": cutoff.end.to_string(),
            "records": records.len(),
            "reported_absences": reported_absences.to_string(),
            "hourly_rate": hourly_rate.round_dp(4).to_string()
        }),
        output: serde_json::json!({
            "working_days": summary.working_days,
            "days_worked": summary.days_worked,
            "late_minutes": summary.late_minutes,
            "undertime_minutes": summary.undertime_minutes.to_string(),
            "overtime_hours": summary.overtime_hours.to_string(),
            "holiday_dates": holiday_dates,
            "rest_day_dates": rest_day_dates,
            "holiday_pay": summary.holiday_pay.to_string(),
            "rest_day_pay": summary.rest_day_pay.to_string()
        }),
        reasoning: format!(
            "{} of {} working days worked, {} min late, {} min undertime, {} h overtime",
            summary.days_worked,
            summary.working_days,
            summary.late_minutes,
            summary.undertime_minutes.normalize(),
            summary.overtime_hours.normalize()
        ),
    };

    AttendanceAggregation {
        summary,
        audit_step,
    }
}
