//! Reporting over payroll runs: summaries and CSV exports.

mod export;
mod summary;

pub use export::{
    AttendanceSheetRow, RegisterRow, attendance_cell, write_attendance_csv, write_register_csv,
};
pub use summary::{DeductionBreakdown, EmployeePayroll, PayrollRunSummary};
