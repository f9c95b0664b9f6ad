//! The payroll run orchestrator.
//!
//! [`PayrollService`] gathers each employee's inputs from the collaborators,
//! fans payslip composition out over scoped worker threads, and owns the
//! payroll run lifecycle:
//!
//! ```text
//! draft <-> finalized <-> paid
//!              |           |
//!              +--> archived <--+
//! ```

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::calculation::{PayslipComputation, PayslipInput, compose_payslip};
use crate::config::{OrganizationSettings, PayPremiums, PayrollConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceRecord, CompensationProfile, Cutoff, EmployeeRecord, PayrollRun, PayrollStatus,
    Payslip, ScheduleProfile,
};
use crate::reporting::{
    AttendanceSheetRow, EmployeePayroll, PayrollRunSummary, RegisterRow, write_attendance_csv,
    write_register_csv,
};

use super::collaborators::{
    AttendanceStore, ContributionTable, CostLedger, EmployeeDirectory, PayrollRepository,
    StatusUpdate,
};
use super::params::{EmployeeRunInputs, RunParameters};

/// The collaborators a [`PayrollService`] works through.
#[derive(Clone)]
pub struct Collaborators {
    /// Employee records.
    pub employees: Arc<dyn EmployeeDirectory>,
    /// Attendance records and absences.
    pub attendance: Arc<dyn AttendanceStore>,
    /// Statutory base amounts.
    pub contributions: Arc<dyn ContributionTable>,
    /// Cost-accounting records.
    pub ledger: Arc<dyn CostLedger>,
    /// Run storage.
    pub repository: Arc<dyn PayrollRepository>,
}

/// The cost ledger side effect of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "records", rename_all = "snake_case")]
pub enum LedgerEffect {
    /// The ledger was not touched.
    None,
    /// Cost records were written on finalize.
    Recorded(usize),
    /// Cost records were reversed on revert to draft.
    Reversed(usize),
    /// Cost records were removed on archive.
    Removed(usize),
}

/// The result of a status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    /// The run after the change.
    pub run: PayrollRun,
    /// The status before the change.
    pub previous_status: PayrollStatus,
    /// What happened to the run's cost records.
    pub ledger_effect: LedgerEffect,
}

/// What a delete removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    /// The deleted run.
    pub run_id: Uuid,
    /// Number of payslips removed with it.
    pub payslips_removed: usize,
    /// Number of cost records removed.
    pub ledger_records_removed: usize,
}

/// One employee's gathered inputs, ready for composition.
struct EmployeeJob {
    employee_id: String,
    compensation: CompensationProfile,
    schedule: ScheduleProfile,
    attendance: Vec<AttendanceRecord>,
    absences: Decimal,
    inputs: EmployeeRunInputs,
}

/// Run IDs with a lifecycle operation in progress.
#[derive(Debug, Default)]
struct RunGuards {
    active: Mutex<HashSet<Uuid>>,
}

impl RunGuards {
    fn acquire(&self, run_id: Uuid, operation: &str) -> EngineResult<RunGuard<'_>> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(run_id) {
            warn!(run_id = %run_id, operation, "Rejected concurrent change to payroll run");
            return Err(EngineError::RunBusy {
                run_id,
                operation: operation.to_string(),
            });
        }
        Ok(RunGuard {
            guards: self,
            run_id,
        })
    }
}

/// Released on drop.
struct RunGuard<'a> {
    guards: &'a RunGuards,
    run_id: Uuid,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.guards
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.run_id);
    }
}

/// Computes payslips and manages payroll runs.
///
/// Edits, status changes, archives and deletes of one run are serialized:
/// while one is in progress, another on the same run fails with
/// [`EngineError::RunBusy`].
pub struct PayrollService {
    collaborators: Collaborators,
    settings: OrganizationSettings,
    premiums: PayPremiums,
    guards: RunGuards,
}

impl PayrollService {
    /// Creates a service with explicit organization settings and premiums.
    pub fn new(
        collaborators: Collaborators,
        settings: OrganizationSettings,
        premiums: PayPremiums,
    ) -> Self {
        Self {
            collaborators,
            settings,
            premiums,
            guards: RunGuards::default(),
        }
    }

    /// Creates a service using the settings and premiums of a loaded
    /// configuration.
    pub fn from_config(collaborators: Collaborators, config: &PayrollConfig) -> Self {
        Self::new(collaborators, config.settings(), config.premiums())
    }

    /// Returns the organization settings the service computes with.
    pub fn settings(&self) -> OrganizationSettings {
        self.settings
    }

    fn employee_record(&self, employee_id: &str) -> EngineResult<EmployeeRecord> {
        self.collaborators
            .employees
            .employee(employee_id)
            .ok_or_else(|| EngineError::EmployeeNotFound {
                employee_id: employee_id.to_string(),
            })
    }

    fn gather(
        &self,
        employee_id: &str,
        params: &RunParameters,
    ) -> EngineResult<EmployeeJob> {
        let employee = self.employee_record(employee_id)?;
        let compensation = employee.compensation.ok_or_else(|| {
            EngineError::computation(employee_id, "missing compensation profile")
        })?;
        let schedule = employee
            .schedule
            .ok_or_else(|| EngineError::computation(employee_id, "missing schedule profile"))?;

        let cutoff = &params.cutoff;
        let attendance = self.collaborators.attendance.records(employee_id, cutoff.start, cutoff.end);
        let absences = self.collaborators.attendance.absences(employee_id, cutoff.start, cutoff.end);

        Ok(EmployeeJob {
            employee_id: employee_id.to_string(),
            compensation,
            schedule,
            attendance,
            absences,
            inputs: params.employee_inputs(employee_id),
        })
    }

    fn compose(&self, job: &EmployeeJob, params: &RunParameters) -> EngineResult<PayslipComputation> {
        let input = PayslipInput {
            employee_id: &job.employee_id,
            compensation: &job.compensation,
            schedule: &job.schedule,
            cutoff: &params.cutoff,
            attendance: &job.attendance,
            reported_absences: job.absences,
            contributions: self.collaborators.contributions.as_ref(),
            government_setting: job.inputs.government_setting,
            deductions_enabled: params.deductions_enabled,
            manual_deductions: &job.inputs.manual_deductions,
            incentives: &job.inputs.incentives,
            overrides: &job.inputs.overrides,
        };
        let computation = compose_payslip(&input, &self.settings, &self.premiums)?;

        debug!(
            employee_id = %job.employee_id,
            gross_pay = %computation.payslip.gross_pay,
            net_pay = %computation.payslip.net_pay,
            "Composed payslip"
        );
        for warning in &computation.audit_trace.warnings {
            warn!(
                employee_id = %job.employee_id,
                code = %warning.code,
                "{}",
                warning.message
            );
        }

        Ok(computation)
    }

    /// Composes payslips for `employee_ids`, in order. The first failure
    /// aborts the whole batch.
    fn compute_payslips(
        &self,
        params: &RunParameters,
        employee_ids: &[String],
    ) -> EngineResult<Vec<PayslipComputation>> {
        let jobs = employee_ids
            .iter()
            .map(|id| self.gather(id, params))
            .collect::<EngineResult<Vec<_>>>()?;
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let workers = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
            .min(jobs.len());
        let chunk_size = jobs.len().div_ceil(workers);

        let batches: Vec<EngineResult<Vec<PayslipComputation>>> = thread::scope(|scope| {
            let handles: Vec<_> = jobs
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|job| self.compose(job, params))
                            .collect::<EngineResult<Vec<_>>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(EngineError::Computation {
                            employee_id: String::new(),
                            message: "payslip worker panicked".to_string(),
                        })
                    })
                })
                .collect()
        });

        let mut computations = Vec::with_capacity(jobs.len());
        for batch in batches {
            computations.extend(batch?);
        }
        Ok(computations)
    }

    fn load_run(&self, run_id: Uuid) -> EngineResult<PayrollRun> {
        self.collaborators
            .repository
            .get(run_id)
            .ok_or(EngineError::PayrollRunNotFound { run_id })
    }

    /// Validates the parameters, computes every payslip, and stores the run
    /// as a draft.
    ///
    /// Nothing is stored if validation or any employee's payslip fails.
    pub fn create_payroll_run(&self, params: RunParameters) -> EngineResult<PayrollRun> {
        params.validate()?;
        let payslips = self.compute_payslips(&params, &params.employee_ids)?;

        let now = Utc::now();
        let run = PayrollRun {
            id: Uuid::new_v4(),
            organization_id: params.organization_id,
            cutoff: params.cutoff,
            employee_ids: params.employee_ids,
            status: PayrollStatus::Draft,
            deductions_enabled: params.deductions_enabled,
            government_deduction_settings: params.government_deduction_settings,
            manual_deductions: params.manual_deductions,
            incentives: params.incentives,
            deduction_overrides: params.deduction_overrides,
            created_at: now,
            updated_at: now,
            processed_at: None,
        };

        self.collaborators.repository.insert(
            run.clone(),
            payslips.into_iter().map(|c| c.payslip).collect(),
        )?;

        info!(
            run_id = %run.id,
            organization_id = %run.organization_id,
            employee_count = run.employee_ids.len(),
            "Created payroll run"
        );
        Ok(run)
    }

    /// Replaces a draft run's parameters and recomputes its payslips.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the run is not a draft; validation and computation
    /// errors as for [`PayrollService::create_payroll_run`].
    pub fn update_payroll_run(
        &self,
        run_id: Uuid,
        params: RunParameters,
    ) -> EngineResult<PayrollRun> {
        let _guard = self.guards.acquire(run_id, "edit")?;
        let existing = self.load_run(run_id)?;
        if !existing.status.is_editable() {
            warn!(run_id = %run_id, status = %existing.status, "Rejected edit of locked payroll run");
            return Err(EngineError::InvalidState {
                run_id,
                status: existing.status,
                operation: "edit".to_string(),
            });
        }

        params.validate()?;
        let payslips = self.compute_payslips(&params, &params.employee_ids)?;

        let run = PayrollRun {
            id: run_id,
            organization_id: params.organization_id,
            cutoff: params.cutoff,
            employee_ids: params.employee_ids,
            status: PayrollStatus::Draft,
            deductions_enabled: params.deductions_enabled,
            government_deduction_settings: params.government_deduction_settings,
            manual_deductions: params.manual_deductions,
            incentives: params.incentives,
            deduction_overrides: params.deduction_overrides,
            created_at: existing.created_at,
            updated_at: Utc::now(),
            processed_at: None,
        };

        let run = self
            .collaborators
            .repository
            .replace_draft(run, payslips.into_iter().map(|c| c.payslip).collect())?;

        info!(run_id = %run_id, employee_count = run.employee_ids.len(), "Updated payroll run");
        Ok(run)
    }

    /// Moves a run to `target` if the lifecycle allows it.
    ///
    /// Finalizing writes cost records and reverting to draft reverses them;
    /// moving to archived delegates to
    /// [`PayrollService::archive_payroll_run`]. If the ledger fails, the
    /// status change is rolled back and the ledger error returned.
    pub fn update_payroll_run_status(
        &self,
        run_id: Uuid,
        target: PayrollStatus,
    ) -> EngineResult<StatusChange> {
        if target == PayrollStatus::Archived {
            return self.archive_payroll_run(run_id);
        }

        let _guard = self.guards.acquire(run_id, "change status of")?;
        let current = self.load_run(run_id)?;
        let from = current.status;
        if !from.can_transition_to(target) {
            warn!(run_id = %run_id, from = %from, to = %target, "Rejected status transition");
            return Err(EngineError::InvalidTransition {
                run_id,
                from,
                to: target,
            });
        }

        let now = Utc::now();
        let processed_at = match (from, target) {
            (PayrollStatus::Draft, PayrollStatus::Finalized) => Some(now),
            (_, PayrollStatus::Draft) => None,
            _ => current.processed_at,
        };
        let run = self.collaborators.repository.compare_and_set_status(
            run_id,
            StatusUpdate {
                expected: from,
                target,
                processed_at,
                updated_at: now,
            },
        )?;

        let ledger_result = match (from, target) {
            (PayrollStatus::Draft, PayrollStatus::Finalized) => self.record_costs(&run),
            (PayrollStatus::Finalized, PayrollStatus::Draft) => self
                .collaborators
                .ledger
                .reverse_run(run_id)
                .map(LedgerEffect::Reversed),
            _ => Ok(LedgerEffect::None),
        };
        let ledger_effect = match ledger_result {
            Ok(effect) => effect,
            Err(err) => {
                self.restore_status(&current, target);
                return Err(err);
            }
        };

        info!(
            run_id = %run_id,
            from = %from,
            to = %target,
            ledger_effect = ?ledger_effect,
            "Changed payroll run status"
        );
        Ok(StatusChange {
            run,
            previous_status: from,
            ledger_effect,
        })
    }

    /// Writes a freshly finalized run's cost records.
    ///
    /// The run must still be stored as finalized once the records are
    /// written; if it was removed or moved on in the meantime, the records
    /// are taken back out.
    fn record_costs(&self, run: &PayrollRun) -> EngineResult<LedgerEffect> {
        let repository = &self.collaborators.repository;
        let ledger = &self.collaborators.ledger;
        let payslips = repository
            .payslips(run.id)
            .ok_or(EngineError::PayrollRunNotFound { run_id: run.id })?;
        let count = ledger.record_run(run, &payslips)?;

        match repository.get(run.id) {
            Some(stored) if stored.status == PayrollStatus::Finalized => {
                Ok(LedgerEffect::Recorded(count))
            }
            stored => {
                if let Err(err) = ledger.remove_run(run.id) {
                    error!(
                        run_id = %run.id,
                        error = %err,
                        "Failed to remove cost records of a run changed during finalize"
                    );
                }
                Err(match stored {
                    Some(stored) => EngineError::InvalidTransition {
                        run_id: run.id,
                        from: stored.status,
                        to: PayrollStatus::Finalized,
                    },
                    None => EngineError::PayrollRunNotFound { run_id: run.id },
                })
            }
        }
    }

    /// Puts a run back to its status before a change to `applied` whose
    /// ledger step failed. A failed rollback is logged; the caller still
    /// reports the ledger error.
    fn restore_status(&self, previous: &PayrollRun, applied: PayrollStatus) {
        let restored = self.collaborators.repository.compare_and_set_status(
            previous.id,
            StatusUpdate {
                expected: applied,
                target: previous.status,
                processed_at: previous.processed_at,
                updated_at: previous.updated_at,
            },
        );
        match restored {
            Ok(_) => warn!(
                run_id = %previous.id,
                status = %previous.status,
                "Rolled back payroll run status after ledger failure"
            ),
            Err(err) => error!(
                run_id = %previous.id,
                from = %applied,
                to = %previous.status,
                error = %err,
                "Failed to roll back payroll run status after ledger failure"
            ),
        }
    }

    /// Archives a finalized or paid run and removes its cost records.
    ///
    /// The run and its payslips stay readable. If the ledger fails, the run
    /// keeps its previous status.
    pub fn archive_payroll_run(&self, run_id: Uuid) -> EngineResult<StatusChange> {
        let _guard = self.guards.acquire(run_id, "archive")?;
        let current = self.load_run(run_id)?;
        let from = current.status;
        if !from.can_transition_to(PayrollStatus::Archived) {
            warn!(run_id = %run_id, from = %from, "Rejected archive");
            return Err(EngineError::InvalidTransition {
                run_id,
                from,
                to: PayrollStatus::Archived,
            });
        }

        let run = self.collaborators.repository.compare_and_set_status(
            run_id,
            StatusUpdate {
                expected: from,
                target: PayrollStatus::Archived,
                processed_at: current.processed_at,
                updated_at: Utc::now(),
            },
        )?;
        let removed = match self.collaborators.ledger.remove_run(run_id) {
            Ok(removed) => removed,
            Err(err) => {
                self.restore_status(&current, PayrollStatus::Archived);
                return Err(err);
            }
        };

        info!(run_id = %run_id, from = %from, ledger_records_removed = removed, "Archived payroll run");
        Ok(StatusChange {
            run,
            previous_status: from,
            ledger_effect: LedgerEffect::Removed(removed),
        })
    }

    /// Permanently deletes a run that is not archived, with its payslips
    /// and cost records.
    ///
    /// If the ledger fails, the run and its payslips are stored again.
    pub fn delete_payroll_run(&self, run_id: Uuid) -> EngineResult<DeleteOutcome> {
        let _guard = self.guards.acquire(run_id, "delete")?;
        let current = self.load_run(run_id)?;
        if current.status == PayrollStatus::Archived {
            warn!(run_id = %run_id, "Rejected delete of archived payroll run");
            return Err(EngineError::InvalidState {
                run_id,
                status: current.status,
                operation: "delete".to_string(),
            });
        }

        let repository = &self.collaborators.repository;
        let payslips = repository.payslips(run_id).unwrap_or_default();
        let removed = repository.remove(run_id, current.status)?;
        let ledger_records_removed = match self.collaborators.ledger.remove_run(run_id) {
            Ok(count) => count,
            Err(err) => {
                match repository.insert(removed, payslips) {
                    Ok(()) => warn!(run_id = %run_id, "Restored payroll run after ledger failure"),
                    Err(restore_err) => error!(
                        run_id = %run_id,
                        error = %restore_err,
                        "Failed to restore payroll run after ledger failure"
                    ),
                }
                return Err(err);
            }
        };

        info!(
            run_id = %run_id,
            status = %removed.status,
            ledger_records_removed,
            "Deleted payroll run"
        );
        Ok(DeleteOutcome {
            run_id,
            payslips_removed: removed.employee_ids.len(),
            ledger_records_removed,
        })
    }

    /// Previews one employee's payslip under the given run parameters.
    ///
    /// Uses the same input assembly and compositor as run creation; only
    /// the cutoff is validated.
    pub fn preview_employee_payroll(
        &self,
        employee_id: &str,
        params: &RunParameters,
    ) -> EngineResult<PayslipComputation> {
        params.validate_cutoff()?;
        self.compute_payslips(params, &[employee_id.to_string()])?
            .pop()
            .ok_or_else(|| EngineError::computation(employee_id, "no payslip was produced"))
    }

    /// Computes one employee's pay for a cutoff with default deduction
    /// settings.
    pub fn compute_employee_payroll(
        &self,
        employee_id: &str,
        cutoff_start: NaiveDate,
        cutoff_end: NaiveDate,
    ) -> EngineResult<EmployeePayroll> {
        let cutoff = Cutoff::new(cutoff_start, cutoff_end)?;
        let params = RunParameters::new(String::new(), cutoff, vec![employee_id.to_string()]);
        let computation = self.preview_employee_payroll(employee_id, &params)?;
        Ok(EmployeePayroll::from(&computation.payslip))
    }

    /// Returns a run header.
    pub fn get_payroll_run(&self, run_id: Uuid) -> EngineResult<PayrollRun> {
        self.load_run(run_id)
    }

    /// Returns a run's payslips in employee order.
    pub fn get_payslips(&self, run_id: Uuid) -> EngineResult<Vec<Payslip>> {
        self.collaborators
            .repository
            .payslips(run_id)
            .ok_or(EngineError::PayrollRunNotFound { run_id })
    }

    /// Returns totals across a run's payslips.
    pub fn get_payroll_run_summary(&self, run_id: Uuid) -> EngineResult<PayrollRunSummary> {
        let run = self.load_run(run_id)?;
        let payslips = self.get_payslips(run_id)?;
        Ok(PayrollRunSummary::from_payslips(&run, &payslips))
    }

    fn display_name(&self, employee_id: &str) -> String {
        self.collaborators
            .employees
            .employee(employee_id)
            .map(|e| e.name)
            .unwrap_or_else(|| employee_id.to_string())
    }

    /// Renders the run's attendance sheet as CSV.
    pub fn export_attendance_csv(&self, run_id: Uuid) -> EngineResult<String> {
        let run = self.load_run(run_id)?;
        let cutoff = &run.cutoff;

        let rows: Vec<AttendanceSheetRow> = run
            .employee_ids
            .iter()
            .map(|id| {
                let employee = self.collaborators.employees.employee(id);
                AttendanceSheetRow {
                    employee_name: employee
                        .as_ref()
                        .map(|e| e.name.clone())
                        .unwrap_or_else(|| id.clone()),
                    schedule: employee.and_then(|e| e.schedule),
                    records: self.collaborators.attendance.records(id, cutoff.start, cutoff.end),
                    absences: self.collaborators.attendance.absences(id, cutoff.start, cutoff.end),
                }
            })
            .collect();

        write_attendance_csv(cutoff, &rows)
    }

    /// Renders the run's payslip register as CSV.
    pub fn export_payslip_register_csv(&self, run_id: Uuid) -> EngineResult<String> {
        let payslips = self.get_payslips(run_id)?;
        let rows: Vec<RegisterRow<'_>> = payslips
            .iter()
            .map(|payslip| RegisterRow {
                employee_name: self.display_name(&payslip.employee_id),
                payslip,
            })
            .collect();

        write_register_csv(&rows)
    }
}
