//! Collaborator traits.
//!
//! The orchestrator reaches employee records, attendance, the cost ledger
//! and run storage only through these traits, so storage backends can be
//! swapped without touching the payroll core. All operations are
//! synchronous.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{AttendanceRecord, EmployeeRecord, PayrollRun, PayrollStatus, Payslip};

pub use crate::calculation::ContributionTable;

/// Read access to employee records.
pub trait EmployeeDirectory: Send + Sync {
    /// Returns the employee with the given ID, if any.
    fn employee(&self, employee_id: &str) -> Option<EmployeeRecord>;
}

/// Read access to attendance.
pub trait AttendanceStore: Send + Sync {
    /// Attendance records for an employee within `[start, end]`.
    fn records(&self, employee_id: &str, start: NaiveDate, end: NaiveDate)
    -> Vec<AttendanceRecord>;

    /// Absence days within `[start, end]`, already net of rest days,
    /// holidays and approved leave.
    fn absences(&self, employee_id: &str, start: NaiveDate, end: NaiveDate) -> Decimal;
}

/// Durable cost-accounting records written when a run is finalized.
///
/// Each method returns the number of records it affected.
pub trait CostLedger: Send + Sync {
    /// Writes one cost record per payslip. Writing the same run twice
    /// replaces the earlier records.
    fn record_run(&self, run: &PayrollRun, payslips: &[Payslip]) -> EngineResult<usize>;

    /// Removes the records written by a finalize that is being reverted.
    fn reverse_run(&self, run_id: Uuid) -> EngineResult<usize>;

    /// Removes the records of an archived or deleted run.
    fn remove_run(&self, run_id: Uuid) -> EngineResult<usize>;
}

/// A guarded status change applied by [`PayrollRepository::compare_and_set_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    /// The status the run must currently have.
    pub expected: PayrollStatus,
    /// The status to move to.
    pub target: PayrollStatus,
    /// The new `processed_at` value.
    pub processed_at: Option<DateTime<Utc>>,
    /// The new `updated_at` value.
    pub updated_at: DateTime<Utc>,
}

/// Storage for payroll runs and the payslips they own.
pub trait PayrollRepository: Send + Sync {
    /// Stores a new run with its payslips in one step.
    fn insert(&self, run: PayrollRun, payslips: Vec<Payslip>) -> EngineResult<()>;

    /// Returns the run header.
    fn get(&self, run_id: Uuid) -> Option<PayrollRun>;

    /// Returns the run's payslips in employee order.
    fn payslips(&self, run_id: Uuid) -> Option<Vec<Payslip>>;

    /// Replaces a draft run's header and payslips in one step.
    ///
    /// Fails with `InvalidState` if the stored run is no longer a draft.
    fn replace_draft(&self, run: PayrollRun, payslips: Vec<Payslip>) -> EngineResult<PayrollRun>;

    /// Applies a status change if the stored status still equals
    /// `update.expected`.
    ///
    /// Fails with `InvalidTransition` (from the stored status) otherwise.
    fn compare_and_set_status(&self, run_id: Uuid, update: StatusUpdate)
    -> EngineResult<PayrollRun>;

    /// Removes a run and its payslips if its status still equals `expected`.
    fn remove(&self, run_id: Uuid, expected: PayrollStatus) -> EngineResult<PayrollRun>;
}
