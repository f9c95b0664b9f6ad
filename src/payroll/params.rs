//! Payroll run parameters and their validation.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{
    Cutoff, DeductionOverride, EmployeeDeductionSetting, EmployeeIncentive,
    GovernmentDeductionSetting, Incentive, ManualDeduction,
};

fn default_deductions_enabled() -> bool {
    true
}

/// The caller-supplied fields of a payroll run.
///
/// Used for creating and editing runs and for previews.
///
/// # Example
///
/// ```
/// use payroll_engine::models::Cutoff;
/// use payroll_engine::payroll::RunParameters;
/// use chrono::NaiveDate;
///
/// let cutoff = Cutoff::new(
///     NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
/// )
/// .unwrap();
/// let params = RunParameters::new("org_001", cutoff, vec!["emp_001".to_string()]);
/// assert!(params.deductions_enabled);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    /// The organization running payroll.
    pub organization_id: String,
    /// The period being paid.
    pub cutoff: Cutoff,
    /// The employees to pay, in order.
    pub employee_ids: Vec<String>,
    /// Master switch for statutory deductions.
    #[serde(default = "default_deductions_enabled")]
    pub deductions_enabled: bool,
    /// Per-employee statutory policy; employees without one get the default.
    #[serde(default)]
    pub government_deduction_settings: Vec<EmployeeDeductionSetting>,
    /// Manual deductions.
    #[serde(default)]
    pub manual_deductions: Vec<ManualDeduction>,
    /// Incentives.
    #[serde(default)]
    pub incentives: Vec<EmployeeIncentive>,
    /// Per-line deduction overrides.
    #[serde(default)]
    pub deduction_overrides: Vec<DeductionOverride>,
}

/// The slice of [`RunParameters`] that applies to one employee.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeRunInputs {
    /// Statutory policy.
    pub government_setting: GovernmentDeductionSetting,
    /// Manual deductions.
    pub manual_deductions: Vec<ManualDeduction>,
    /// Incentives as payslip items.
    pub incentives: Vec<Incentive>,
    /// Overrides keyed by deduction line name; the last one for a name wins.
    pub overrides: BTreeMap<String, Decimal>,
}

impl RunParameters {
    /// Creates parameters with statutory deductions enabled and nothing else.
    pub fn new(
        organization_id: impl Into<String>,
        cutoff: Cutoff,
        employee_ids: Vec<String>,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            cutoff,
            employee_ids,
            deductions_enabled: true,
            government_deduction_settings: Vec::new(),
            manual_deductions: Vec::new(),
            incentives: Vec::new(),
            deduction_overrides: Vec::new(),
        }
    }

    /// Rejects an inverted cutoff.
    pub fn validate_cutoff(&self) -> EngineResult<()> {
        if self.cutoff.end < self.cutoff.start {
            return Err(EngineError::validation(
                "cutoff_end",
                format!(
                    "cutoff end {} is before cutoff start {}",
                    self.cutoff.end, self.cutoff.start
                ),
            ));
        }
        Ok(())
    }

    /// Validates the parameters for creating or editing a run.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] if the organization is blank, the
    /// cutoff is inverted, or the employee list is empty, has a blank entry
    /// or repeats an employee.
    pub fn validate(&self) -> EngineResult<()> {
        if self.organization_id.trim().is_empty() {
            return Err(EngineError::validation(
                "organization_id",
                "organization is required",
            ));
        }

        self.validate_cutoff()?;

        if self.employee_ids.is_empty() {
            return Err(EngineError::validation(
                "employee_ids",
                "at least one employee is required",
            ));
        }

        let mut seen = HashSet::new();
        for employee_id in &self.employee_ids {
            if employee_id.trim().is_empty() {
                return Err(EngineError::validation(
                    "employee_ids",
                    "employee IDs must not be blank",
                ));
            }
            if !seen.insert(employee_id.as_str()) {
                return Err(EngineError::validation(
                    "employee_ids",
                    format!("employee '{}' is listed more than once", employee_id),
                ));
            }
        }

        Ok(())
    }

    /// Collects the settings, deductions, incentives and overrides for one
    /// employee.
    pub fn employee_inputs(&self, employee_id: &str) -> EmployeeRunInputs {
        let government_setting = self
            .government_deduction_settings
            .iter()
            .rev()
            .find(|s| s.employee_id == employee_id)
            .map(|s| s.setting)
            .unwrap_or_default();

        let manual_deductions = self
            .manual_deductions
            .iter()
            .filter(|m| m.employee_id == employee_id)
            .cloned()
            .collect();

        let incentives = self
            .incentives
            .iter()
            .filter(|i| i.employee_id == employee_id)
            .map(|i| Incentive {
                name: i.name.clone(),
                amount: i.amount,
                incentive_type: i.incentive_type.clone(),
            })
            .collect();

        let overrides = self
            .deduction_overrides
            .iter()
            .filter(|o| o.employee_id == employee_id)
            .map(|o| (o.name.clone(), o.amount))
            .collect();

        EmployeeRunInputs {
            government_setting,
            manual_deductions,
            incentives,
            overrides,
        }
    }
}
