//! Payroll run orchestration.
//!
//! This module contains the collaborator traits the engine works through,
//! in-memory implementations of them, run parameters, and the
//! [`PayrollService`] that computes payslips and drives the run lifecycle.

mod collaborators;
mod memory;
mod params;
mod service;

pub use collaborators::{
    AttendanceStore, ContributionTable, CostLedger, EmployeeDirectory, PayrollRepository,
    StatusUpdate,
};
pub use memory::{
    CostRecord, InMemoryAttendanceStore, InMemoryCostLedger, InMemoryEmployeeDirectory,
    InMemoryPayrollRepository,
};
pub use params::{EmployeeRunInputs, RunParameters};
pub use service::{Collaborators, DeleteOutcome, LedgerEffect, PayrollService, StatusChange};
