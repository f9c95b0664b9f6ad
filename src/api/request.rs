//! Request types for the payroll API.
//!
//! This module defines the JSON request structures for the `/payroll`
//! endpoints and their conversion into [`RunParameters`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::models::{
    Cutoff, DeductionOverride, EmployeeDeductionSetting, EmployeeIncentive, Holiday,
    ManualDeduction, PayrollStatus,
};
use crate::payroll::RunParameters;

fn default_true() -> bool {
    true
}

/// Optional run fields shared by run and preview requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOptions {
    /// Holidays inside the cutoff.
    #[serde(default)]
    pub holidays: Vec<Holiday>,
    /// Master switch for statutory deductions; defaults to on.
    #[serde(default = "default_true")]
    pub deductions_enabled: bool,
    /// Per-employee statutory policy.
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

impl RunOptions {
    fn into_parameters(
        self,
        organization_id: String,
        cutoff_start: NaiveDate,
        cutoff_end: NaiveDate,
        employee_ids: Vec<String>,
    ) -> EngineResult<RunParameters> {
        let cutoff = Cutoff::with_holidays(cutoff_start, cutoff_end, self.holidays)?;
        Ok(RunParameters {
            organization_id,
            cutoff,
            employee_ids,
            deductions_enabled: self.deductions_enabled,
            government_deduction_settings: self.government_deduction_settings,
            manual_deductions: self.manual_deductions,
            incentives: self.incentives,
            deduction_overrides: self.deduction_overrides,
        })
    }
}

/// Request body for `POST /payroll/runs` and `PUT /payroll/runs/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    /// The organization running payroll.
    pub organization_id: String,
    /// First date of the cutoff.
    pub cutoff_start: NaiveDate,
    /// Last date of the cutoff.
    pub cutoff_end: NaiveDate,
    /// The employees to pay, in order.
    pub employee_ids: Vec<String>,
    /// Optional run fields.
    #[serde(flatten)]
    pub options: RunOptions,
}

impl RunRequest {
    /// Converts the request into run parameters.
    ///
    /// Fails with a validation error if the cutoff is inverted.
    pub fn into_parameters(self) -> EngineResult<RunParameters> {
        self.options.into_parameters(
            self.organization_id,
            self.cutoff_start,
            self.cutoff_end,
            self.employee_ids,
        )
    }
}

/// Request body for `POST /payroll/preview`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRequest {
    /// The employee to preview.
    pub employee_id: String,
    /// First date of the cutoff.
    pub cutoff_start: NaiveDate,
    /// Last date of the cutoff.
    pub cutoff_end: NaiveDate,
    /// The organization, if known.
    #[serde(default)]
    pub organization_id: String,
    /// Optional run fields.
    #[serde(flatten)]
    pub options: RunOptions,
}

impl PreviewRequest {
    /// Splits the request into the employee ID and run parameters covering
    /// just that employee.
    pub fn into_parameters(self) -> EngineResult<(String, RunParameters)> {
        let employee_id = self.employee_id;
        let params = self.options.into_parameters(
            self.organization_id,
            self.cutoff_start,
            self.cutoff_end,
            vec![employee_id.clone()],
        )?;
        Ok((employee_id, params))
    }
}

/// Request body for `PUT /payroll/runs/:id/status`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusRequest {
    /// The target status.
    pub status: PayrollStatus,
}

/// Query string for `DELETE /payroll/runs/:id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteQuery {
    /// Must repeat the run ID.
    #[serde(default)]
    pub confirm: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn test_run_request_defaults_optional_fields() {
        let json = r#"{
            "organization_id": "org_001",
            "cutoff_start": "2026-01-01",
            "cutoff_end": "2026-01-15",
            "employee_ids": ["emp_001", "emp_002"]
        }"#;

        let request: RunRequest = serde_json::from_str(json).unwrap();
        let params = request.into_parameters().unwrap();

        assert!(params.deductions_enabled);
        assert_eq!(params.employee_ids.len(), 2);
        assert_eq!(params.cutoff.dates().count(), 15);
    }

    #[test]
    fn test_run_request_carries_holidays_and_overrides() {
        let json = r#"{
            "organization_id": "org_001",
            "cutoff_start": "2026-01-01",
            "cutoff_end": "2026-01-15",
            "employee_ids": ["emp_001"],
            "deductions_enabled": false,
            "holidays": [{"date": "2026-01-01", "name": "New Year's Day", "kind": "regular"}],
            "deduction_overrides": [{"employee_id": "emp_001", "name": "SSS", "amount": "450"}]
        }"#;

        let request: RunRequest = serde_json::from_str(json).unwrap();
        let params = request.into_parameters().unwrap();

        assert!(!params.deductions_enabled);
        assert_eq!(params.cutoff.holidays.len(), 1);
        assert_eq!(params.deduction_overrides[0].name, "SSS");
    }

    #[test]
    fn test_inverted_cutoff_is_validation_error() {
        let json = r#"{
            "employee_id": "emp_001",
            "cutoff_start": "2026-01-15",
            "cutoff_end": "2026-01-01"
        }"#;

        let request: PreviewRequest = serde_json::from_str(json).unwrap();
        assert!(matches!(
            request.into_parameters(),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn test_status_request_uses_snake_case() {
        let request: StatusRequest = serde_json::from_str(r#"{"status": "finalized"}"#).unwrap();
        assert_eq!(request.status, PayrollStatus::Finalized);
    }
}
