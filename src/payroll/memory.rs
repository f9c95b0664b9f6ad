//! In-memory collaborator implementations.
//!
//! Used by the binary and by tests. Each store keeps its state behind a
//! [`RwLock`]; a poisoned lock is recovered rather than propagated since
//! every write leaves the maps consistent.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceRecord, EmployeeRecord, PayrollRun, PayrollStatus, Payslip};

use super::collaborators::{
    AttendanceStore, CostLedger, EmployeeDirectory, PayrollRepository, StatusUpdate,
};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Employee records keyed by ID.
#[derive(Debug, Default)]
pub struct InMemoryEmployeeDirectory {
    employees: RwLock<HashMap<String, EmployeeRecord>>,
}

impl InMemoryEmployeeDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an employee record.
    pub fn upsert(&self, employee: EmployeeRecord) {
        write(&self.employees).insert(employee.id.clone(), employee);
    }
}

impl EmployeeDirectory for InMemoryEmployeeDirectory {
    fn employee(&self, employee_id: &str) -> Option<EmployeeRecord> {
        read(&self.employees).get(employee_id).cloned()
    }
}

#[derive(Debug, Default)]
struct EmployeeAttendance {
    records: Vec<AttendanceRecord>,
    absences: BTreeMap<NaiveDate, Decimal>,
}

/// Attendance records and reported absences keyed by employee.
#[derive(Debug, Default)]
pub struct InMemoryAttendanceStore {
    attendance: RwLock<HashMap<String, EmployeeAttendance>>,
}

impl InMemoryAttendanceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attendance record.
    pub fn add_record(&self, employee_id: &str, record: AttendanceRecord) {
        write(&self.attendance)
            .entry(employee_id.to_string())
            .or_default()
            .records
            .push(record);
    }

    /// Reports an absence (in days, possibly fractional) on a date.
    pub fn report_absence(&self, employee_id: &str, date: NaiveDate, days: Decimal) {
        write(&self.attendance)
            .entry(employee_id.to_string())
            .or_default()
            .absences
            .insert(date, days);
    }
}

impl AttendanceStore for InMemoryAttendanceStore {
    fn records(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<AttendanceRecord> {
        read(&self.attendance)
            .get(employee_id)
            .map(|a| {
                a.records
                    .iter()
                    .filter(|r| r.date >= start && r.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn absences(&self, employee_id: &str, start: NaiveDate, end: NaiveDate) -> Decimal {
        read(&self.attendance)
            .get(employee_id)
            .map(|a| a.absences.range(start..=end).map(|(_, days)| *days).sum())
            .unwrap_or(Decimal::ZERO)
    }
}

/// One cost-accounting record per payslip of a finalized run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRecord {
    /// The run the record belongs to.
    pub run_id: Uuid,
    /// The employee the cost is for.
    pub employee_id: String,
    /// Gross pay plus the non-taxable allowance.
    pub amount: Decimal,
    /// Net pay actually disbursed.
    pub net_pay: Decimal,
}

/// Cost records keyed by run.
#[derive(Debug, Default)]
pub struct InMemoryCostLedger {
    records: RwLock<HashMap<Uuid, Vec<CostRecord>>>,
}

impl InMemoryCostLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the records for a run.
    pub fn records_for(&self, run_id: Uuid) -> Vec<CostRecord> {
        read(&self.records).get(&run_id).cloned().unwrap_or_default()
    }

    fn take(&self, run_id: Uuid) -> usize {
        write(&self.records)
            .remove(&run_id)
            .map(|records| records.len())
            .unwrap_or(0)
    }
}

impl CostLedger for InMemoryCostLedger {
    fn record_run(&self, run: &PayrollRun, payslips: &[Payslip]) -> EngineResult<usize> {
        let records: Vec<CostRecord> = payslips
            .iter()
            .map(|p| CostRecord {
                run_id: run.id,
                employee_id: p.employee_id.clone(),
                amount: p.gross_pay + p.non_taxable_allowance,
                net_pay: p.net_pay,
            })
            .collect();
        let count = records.len();
        write(&self.records).insert(run.id, records);
        Ok(count)
    }

    fn reverse_run(&self, run_id: Uuid) -> EngineResult<usize> {
        Ok(self.take(run_id))
    }

    fn remove_run(&self, run_id: Uuid) -> EngineResult<usize> {
        Ok(self.take(run_id))
    }
}

#[derive(Debug, Clone)]
struct StoredRun {
    run: PayrollRun,
    payslips: Vec<Payslip>,
}

/// Payroll runs and their payslips keyed by run ID.
#[derive(Debug, Default)]
pub struct InMemoryPayrollRepository {
    runs: RwLock<HashMap<Uuid, StoredRun>>,
}

impl InMemoryPayrollRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored runs.
    pub fn len(&self) -> usize {
        read(&self.runs).len()
    }

    /// Returns true if no runs are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PayrollRepository for InMemoryPayrollRepository {
    fn insert(&self, run: PayrollRun, payslips: Vec<Payslip>) -> EngineResult<()> {
        let mut runs = write(&self.runs);
        if runs.contains_key(&run.id) {
            return Err(EngineError::validation(
                "id",
                format!("payroll run {} already exists", run.id),
            ));
        }
        runs.insert(run.id, StoredRun { run, payslips });
        Ok(())
    }

    fn get(&self, run_id: Uuid) -> Option<PayrollRun> {
        read(&self.runs).get(&run_id).map(|s| s.run.clone())
    }

    fn payslips(&self, run_id: Uuid) -> Option<Vec<Payslip>> {
        read(&self.runs).get(&run_id).map(|s| s.payslips.clone())
    }

    fn replace_draft(&self, run: PayrollRun, payslips: Vec<Payslip>) -> EngineResult<PayrollRun> {
        let mut runs = write(&self.runs);
        let stored = runs
            .get_mut(&run.id)
            .ok_or(EngineError::PayrollRunNotFound { run_id: run.id })?;

        if !stored.run.status.is_editable() {
            return Err(EngineError::InvalidState {
                run_id: run.id,
                status: stored.run.status,
                operation: "edit".to_string(),
            });
        }

        stored.run = run.clone();
        stored.payslips = payslips;
        Ok(run)
    }

    fn compare_and_set_status(
        &self,
        run_id: Uuid,
        update: StatusUpdate,
    ) -> EngineResult<PayrollRun> {
        let mut runs = write(&self.runs);
        let stored = runs
            .get_mut(&run_id)
            .ok_or(EngineError::PayrollRunNotFound { run_id })?;

        if stored.run.status != update.expected {
            return Err(EngineError::InvalidTransition {
                run_id,
                from: stored.run.status,
                to: update.target,
            });
        }

        stored.run.status = update.target;
        stored.run.processed_at = update.processed_at;
        stored.run.updated_at = update.updated_at;
        Ok(stored.run.clone())
    }

    fn remove(&self, run_id: Uuid, expected: PayrollStatus) -> EngineResult<PayrollRun> {
        let mut runs = write(&self.runs);
        let status = runs
            .get(&run_id)
            .map(|s| s.run.status)
            .ok_or(EngineError::PayrollRunNotFound { run_id })?;

        if status != expected {
            return Err(EngineError::InvalidState {
                run_id,
                status,
                operation: "delete".to_string(),
            });
        }

        runs.remove(&run_id)
            .map(|s| s.run)
            .ok_or(EngineError::PayrollRunNotFound { run_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, Cutoff};
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn create_run(status: PayrollStatus) -> PayrollRun {
        let at = Utc.with_ymd_and_hms(2026, 1, 16, 9, 0, 0).unwrap();
        PayrollRun {
            id: Uuid::new_v4(),
            organization_id: "org_001".to_string(),
            cutoff: Cutoff::new(d(1), d(15)).unwrap(),
            employee_ids: vec!["emp_001".to_string()],
            status,
            deductions_enabled: true,
            government_deduction_settings: vec![],
            manual_deductions: vec![],
            incentives: vec![],
            deduction_overrides: vec![],
            created_at: at,
            updated_at: at,
            processed_at: None,
        }
    }

    #[test]
    fn test_attendance_filters_by_range() {
        let store = InMemoryAttendanceStore::new();
        store.add_record("emp_001", AttendanceRecord::with_status(d(2), AttendanceStatus::Absent));
        store.add_record("emp_001", AttendanceRecord::with_status(d(20), AttendanceStatus::Absent));
        store.report_absence("emp_001", d(2), dec("1"));
        store.report_absence("emp_001", d(3), dec("0.5"));
        store.report_absence("emp_001", d(20), dec("1"));

        assert_eq!(store.records("emp_001", d(1), d(15)).len(), 1);
        assert_eq!(store.absences("emp_001", d(1), d(15)), dec("1.5"));
        assert_eq!(store.absences("emp_404", d(1), d(15)), Decimal::ZERO);
    }

    #[test]
    fn test_cost_ledger_record_is_idempotent() {
        let ledger = InMemoryCostLedger::new();
        let run = create_run(PayrollStatus::Finalized);

        assert_eq!(ledger.record_run(&run, &[]).unwrap(), 0);
        assert_eq!(ledger.reverse_run(run.id).unwrap(), 0);
        assert_eq!(ledger.remove_run(Uuid::new_v4()).unwrap(), 0);
    }

    #[test]
    fn test_compare_and_set_rejects_stale_status() {
        let repository = InMemoryPayrollRepository::new();
        let run = create_run(PayrollStatus::Draft);
        let run_id = run.id;
        repository.insert(run.clone(), vec![]).unwrap();

        let update = StatusUpdate {
            expected: PayrollStatus::Finalized,
            target: PayrollStatus::Paid,
            processed_at: None,
            updated_at: run.updated_at,
        };
        match repository.compare_and_set_status(run_id, update) {
            Err(EngineError::InvalidTransition { from, to, .. }) => {
                assert_eq!(from, PayrollStatus::Draft);
                assert_eq!(to, PayrollStatus::Paid);
            }
            other => panic!("Expected InvalidTransition, got {:?}", other),
        }
    }

    #[test]
    fn test_replace_draft_rejects_finalized_run() {
        let repository = InMemoryPayrollRepository::new();
        let run = create_run(PayrollStatus::Finalized);
        repository.insert(run.clone(), vec![]).unwrap();

        let result = repository.replace_draft(run, vec![]);
        assert!(matches!(result, Err(EngineError::InvalidState { .. })));
    }

    #[test]
    fn test_remove_requires_expected_status() {
        let repository = InMemoryPayrollRepository::new();
        let run = create_run(PayrollStatus::Paid);
        let run_id = run.id;
        repository.insert(run, vec![]).unwrap();

        assert!(repository.remove(run_id, PayrollStatus::Draft).is_err());
        assert_eq!(repository.len(), 1);
        assert!(repository.remove(run_id, PayrollStatus::Paid).is_ok());
        assert!(repository.is_empty());
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let repository = InMemoryPayrollRepository::new();
        let run = create_run(PayrollStatus::Draft);
        repository.insert(run.clone(), vec![]).unwrap();
        assert!(repository.insert(run, vec![]).is_err());
    }
}
