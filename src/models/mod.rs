//! Core data models for the payroll engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod cutoff;
mod employee;
mod payroll_run;
mod payslip;

pub use attendance::{AttendanceRecord, AttendanceStatus};
pub(crate) use attendance::MINUTES_PER_DAY;
pub use cutoff::{Cutoff, Holiday, HolidayKind};
pub use employee::{
    CompensationProfile, DaySchedule, EmployeeRecord, EmploymentStatus, SalaryType,
    ScheduleOverride, ScheduleProfile, ScheduledShift, WeeklySchedule,
};
pub use payroll_run::{
    DeductionOverride, DeductionToggle, EmployeeDeductionSetting, EmployeeIncentive, Frequency,
    GovernmentDeductionSetting, ManualDeduction, PayrollRun, PayrollStatus,
};
pub use payslip::{
    AuditStep, AuditTrace, AuditWarning, Deduction, DeductionType, Incentive, Payslip,
};
