//! Payslip models for the payroll engine.
//!
//! This module contains the [`Payslip`] type and its associated line items,
//! plus the audit trace recorded while a payslip is composed.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::SalaryType;

/// The origin of a deduction line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionType {
    /// A statutory contribution or withholding tax.
    Government,
    /// A manual deduction entered for the run.
    Custom,
    /// Late, undertime or absence.
    Attendance,
}

/// A single deduction line on a payslip.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{Deduction, DeductionType};
/// use rust_decimal::Decimal;
///
/// let line = Deduction {
///     name: "SSS".to_string(),
///     amount: Decimal::new(90000, 2),
///     deduction_type: DeductionType::Government,
/// };
/// assert_eq!(line.amount.to_string(), "900.00");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    /// The line name (e.g. "SSS", "Cash Advance").
    pub name: String,
    /// The deducted amount.
    pub amount: Decimal,
    /// Where the line came from.
    #[serde(rename = "type")]
    pub deduction_type: DeductionType,
}

/// An incentive line item added to gross pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incentive {
    /// The incentive name (e.g. "Perfect Attendance").
    pub name: String,
    /// The incentive amount.
    pub amount: Decimal,
    /// A free-form category (e.g. "bonus", "commission").
    #[serde(rename = "type")]
    pub incentive_type: String,
}

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings indicate potential issues that don't prevent calculation
/// but may require attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace for one payslip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
}

/// One employee's pay for one payroll run.
///
/// Money fields are rounded to cents line by line, so every total is the
/// exact sum of its lines and
/// `net_pay = max(0, gross_pay + non_taxable_allowance - total_deductions)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payslip {
    /// The employee this payslip belongs to.
    pub employee_id: String,
    /// First date of the cutoff.
    pub cutoff_start: NaiveDate,
    /// Last date of the cutoff.
    pub cutoff_end: NaiveDate,
    /// The employee's salary type at computation time.
    pub salary_type: SalaryType,
    /// Resolved daily rate.
    pub daily_rate: Decimal,
    /// Resolved hourly rate.
    pub hourly_rate: Decimal,
    /// Non-rest days in the cutoff.
    pub working_days: u32,
    /// Salary attributable to the cutoff.
    pub basic_pay: Decimal,
    /// Days with a present attendance record.
    pub days_worked: u32,
    /// Absence days reported by the attendance source.
    pub absences: Decimal,
    /// Total late hours.
    pub late_hours: Decimal,
    /// Total undertime hours.
    pub undertime_hours: Decimal,
    /// Total stored overtime hours.
    pub overtime_hours: Decimal,
    /// Premium pay for work on holidays.
    pub holiday_pay: Decimal,
    /// Premium pay for work on rest days.
    pub rest_day_pay: Decimal,
    /// Every deduction line, statutory first, then attendance, then custom.
    pub deductions: Vec<Deduction>,
    /// The incentive items behind `total_incentives`.
    pub incentives: Vec<Incentive>,
    /// Sum of `incentives`.
    pub total_incentives: Decimal,
    /// Allowance paid on top of gross pay, untaxed.
    pub non_taxable_allowance: Decimal,
    /// Basic pay plus holiday, rest-day and incentive pay.
    pub gross_pay: Decimal,
    /// Sum of all deduction lines before the earnings cap.
    pub raw_total_deductions: Decimal,
    /// Deductions actually taken after the cap.
    pub total_deductions: Decimal,
    /// The part of `raw_total_deductions` dropped by the cap.
    pub truncated_deductions: Decimal,
    /// Take-home pay, never negative.
    pub net_pay: Decimal,
}

impl Payslip {
    /// Returns the amount of the deduction line with the given name.
    pub fn deduction(&self, name: &str) -> Option<Decimal> {
        self.deductions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.amount)
    }

    /// Sums deduction lines of one type.
    pub fn deductions_of_type(&self, deduction_type: DeductionType) -> Decimal {
        self.deductions
            .iter()
            .filter(|d| d.deduction_type == deduction_type)
            .map(|d| d.amount)
            .sum()
    }
}
