//! CSV exports for a payroll run.
//!
//! Two artifacts are produced: the attendance sheet (one column per cutoff
//! date plus attendance totals) and the payslip register (one row per
//! payslip with its pay and deduction groups).

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use csv::Writer;
use rust_decimal::Decimal;

use crate::calculation::{late_minutes, undertime_minutes};
use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceRecord, AttendanceStatus, Cutoff, Payslip, ScheduleProfile};

use super::summary::DeductionBreakdown;

/// One employee's row on the attendance sheet.
#[derive(Debug, Clone)]
pub struct AttendanceSheetRow {
    /// Display name for the first column.
    pub employee_name: String,
    /// Schedule used to derive late and undertime minutes, if known.
    pub schedule: Option<ScheduleProfile>,
    /// Attendance records for the cutoff.
    pub records: Vec<AttendanceRecord>,
    /// Absence days reported by the attendance source.
    pub absences: Decimal,
}

/// One payslip's row on the register, with the employee's display name.
#[derive(Debug, Clone)]
pub struct RegisterRow<'a> {
    /// Display name.
    pub employee_name: String,
    /// The payslip.
    pub payslip: &'a Payslip,
}

fn finish(writer: Writer<Vec<u8>>) -> EngineResult<String> {
    let bytes = writer.into_inner().map_err(|e| EngineError::Export {
        message: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| EngineError::Export {
        message: e.to_string(),
    })
}

fn clock(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

/// Renders one attendance cell.
///
/// `-` without a record, `ABSENT` or `LEAVE` for those statuses, otherwise
/// `HH:MM - HH:MM` with ` | N MIN L` appended when late.
pub fn attendance_cell(record: Option<&AttendanceRecord>, late: u32) -> String {
    match record {
        None => "-".to_string(),
        Some(r) => match r.status {
            AttendanceStatus::Absent => "ABSENT".to_string(),
            AttendanceStatus::Leave => "LEAVE".to_string(),
            AttendanceStatus::Present => {
                let punches = format!("{} - {}", clock(r.actual_in), clock(r.actual_out));
                if late > 0 {
                    format!("{} | {} MIN L", punches, late)
                } else {
                    punches
                }
            }
        },
    }
}

/// Writes the attendance sheet for a cutoff.
///
/// Header: `Employee`, one `YYYY-MM-DD` column per cutoff date, then
/// `Total Late (min)`, `Total Undertime (min)`, `Total Reg. OT (hrs)`,
/// `Total Special OT (hrs)`, `Total Night Diff (hrs)` and `Absent Days`.
pub fn write_attendance_csv(cutoff: &Cutoff, rows: &[AttendanceSheetRow]) -> EngineResult<String> {
    let dates: Vec<NaiveDate> = cutoff.dates().collect();
    let mut writer = Writer::from_writer(Vec::new());

    let mut header = vec!["Employee".to_string()];
    header.extend(dates.iter().map(|d| d.format("%Y-%m-%d").to_string()));
    header.extend(
        [
            "Total Late (min)",
            "Total Undertime (min)",
            "Total Reg. OT (hrs)",
            "Total Special OT (hrs)",
            "Total Night Diff (hrs)",
            "Absent Days",
        ]
        .map(String::from),
    );
    writer.write_record(&header)?;

    for row in rows {
        let mut by_date: BTreeMap<NaiveDate, &AttendanceRecord> = BTreeMap::new();
        for record in row.records.iter().filter(|r| cutoff.contains_date(r.date)) {
            by_date.entry(record.date).or_insert(record);
        }

        let mut total_late = 0u32;
        let mut total_undertime = Decimal::ZERO;
        let mut overtime = Decimal::ZERO;
        let mut special_overtime = Decimal::ZERO;
        let mut night_differential = Decimal::ZERO;

        let mut record_line = vec![row.employee_name.clone()];
        for date in &dates {
            let record = by_date.get(date).copied();
            let late = match (record, &row.schedule) {
                (Some(r), Some(schedule)) => late_minutes(r, schedule),
                (Some(r), None) if r.is_present() => r.late.unwrap_or(0),
                _ => 0,
            };

            if let Some(r) = record.filter(|r| r.is_present()) {
                total_late += late;
                total_undertime += match &row.schedule {
                    Some(schedule) => undertime_minutes(r, schedule),
                    None => r.undertime.unwrap_or_default() * Decimal::from(60),
                };
                overtime += r.overtime.unwrap_or_default();
                special_overtime += r.special_overtime.unwrap_or_default();
                night_differential += r.night_differential.unwrap_or_default();
            }

            record_line.push(attendance_cell(record, late));
        }

        record_line.push(total_late.to_string());
        record_line.push(total_undertime.normalize().to_string());
        record_line.push(overtime.normalize().to_string());
        record_line.push(special_overtime.normalize().to_string());
        record_line.push(night_differential.normalize().to_string());
        record_line.push(row.absences.normalize().to_string());
        writer.write_record(&record_line)?;
    }

    finish(writer)
}

/// Writes the payslip register, one row per payslip.
pub fn write_register_csv(rows: &[RegisterRow<'_>]) -> EngineResult<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record([
        "Employee ID",
        "Employee",
        "Basic Pay",
        "Holiday Pay",
        "Rest Day Pay",
        "Incentives",
        "Gross Pay",
        "Allowance",
        "SSS",
        "PhilHealth",
        "Pag-IBIG",
        "Withholding Tax",
        "Attendance Deductions",
        "Custom Deductions",
        "Total Deductions",
        "Net Pay",
    ])?;

    for row in rows {
        let p = row.payslip;
        let breakdown = DeductionBreakdown::from_payslip(p);
        writer.write_record([
            p.employee_id.clone(),
            row.employee_name.clone(),
            p.basic_pay.to_string(),
            p.holiday_pay.to_string(),
            p.rest_day_pay.to_string(),
            p.total_incentives.to_string(),
            p.gross_pay.to_string(),
            p.non_taxable_allowance.to_string(),
            breakdown.sss.to_string(),
            breakdown.philhealth.to_string(),
            breakdown.pagibig.to_string(),
            breakdown.withholding_tax.to_string(),
            breakdown.attendance.to_string(),
            breakdown.custom.to_string(),
            p.total_deductions.to_string(),
            p.net_pay.to_string(),
        ])?;
    }

    finish(writer)
}
