//! Payroll run header, lifecycle status and per-run deduction policy.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cutoff;

/// Lifecycle status of a payroll run.
///
/// Forward path is `draft -> finalized -> paid`. A paid run may be reverted to
/// finalized and a finalized run to draft. `archived` is terminal and only
/// reachable from `finalized` or `paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollStatus {
    /// Editable; payslips may be recomputed.
    Draft,
    /// Locked; cost records exist.
    Finalized,
    /// Paid out.
    Paid,
    /// Read-only history; cost records removed.
    Archived,
}

impl PayrollStatus {
    /// Returns true if the lifecycle allows moving from `self` to `target`.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::PayrollStatus;
    ///
    /// assert!(PayrollStatus::Draft.can_transition_to(PayrollStatus::Finalized));
    /// assert!(!PayrollStatus::Draft.can_transition_to(PayrollStatus::Paid));
    /// assert!(!PayrollStatus::Archived.can_transition_to(PayrollStatus::Draft));
    /// ```
    pub fn can_transition_to(self, target: PayrollStatus) -> bool {
        use PayrollStatus::*;
        matches!(
            (self, target),
            (Draft, Finalized)
                | (Finalized, Paid)
                | (Finalized, Draft)
                | (Paid, Finalized)
                | (Finalized, Archived)
                | (Paid, Archived)
        )
    }

    /// Returns true if the run can still be edited.
    pub fn is_editable(self) -> bool {
        self == PayrollStatus::Draft
    }
}

impl std::fmt::Display for PayrollStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayrollStatus::Draft => write!(f, "draft"),
            PayrollStatus::Finalized => write!(f, "finalized"),
            PayrollStatus::Paid => write!(f, "paid"),
            PayrollStatus::Archived => write!(f, "archived"),
        }
    }
}

/// Whether a statutory deduction is taken in full or halved for a cutoff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// Take the whole base amount.
    #[default]
    Full,
    /// Take half the base amount.
    Half,
}

/// Enable flag and frequency for one statutory deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionToggle {
    /// Whether the deduction is taken at all.
    pub enabled: bool,
    /// Full or half.
    #[serde(default)]
    pub frequency: Frequency,
}

impl Default for DeductionToggle {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency: Frequency::Full,
        }
    }
}

impl DeductionToggle {
    /// Applies the toggle to a statutory base amount.
    ///
    /// The result is unrounded. Deduction lines round it to cents, so a half
    /// line is exactly `base / 2` only when `base` has an even number of
    /// cents; otherwise the two halves of a month differ from `base` by at
    /// most one cent in total.
    pub fn apply(&self, base: Decimal) -> Decimal {
        match (self.enabled, self.frequency) {
            (false, _) => Decimal::ZERO,
            (true, Frequency::Full) => base,
            (true, Frequency::Half) => base / Decimal::TWO,
        }
    }
}

/// Statutory deduction policy for one employee in one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernmentDeductionSetting {
    /// Social Security System contribution.
    #[serde(default)]
    pub sss: DeductionToggle,
    /// Pag-IBIG fund contribution.
    #[serde(default)]
    pub pagibig: DeductionToggle,
    /// PhilHealth premium.
    #[serde(default)]
    pub philhealth: DeductionToggle,
    /// Withholding tax.
    #[serde(default)]
    pub tax: DeductionToggle,
}

impl GovernmentDeductionSetting {
    /// A setting with every statutory deduction disabled.
    pub fn disabled() -> Self {
        let off = DeductionToggle {
            enabled: false,
            frequency: Frequency::Full,
        };
        Self {
            sss: off,
            pagibig: off,
            philhealth: off,
            tax: off,
        }
    }
}

/// A statutory deduction policy bound to an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeDeductionSetting {
    /// The employee the policy applies to.
    pub employee_id: String,
    /// The policy.
    #[serde(flatten)]
    pub setting: GovernmentDeductionSetting,
}

/// A manual deduction entered for one employee in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualDeduction {
    /// The employee to deduct from.
    pub employee_id: String,
    /// The line name.
    pub name: String,
    /// The amount.
    pub amount: Decimal,
}

/// An incentive granted to one employee in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeIncentive {
    /// The employee receiving the incentive.
    pub employee_id: String,
    /// The incentive name.
    pub name: String,
    /// The amount.
    pub amount: Decimal,
    /// A free-form category.
    #[serde(rename = "type", default = "default_incentive_type")]
    pub incentive_type: String,
}

fn default_incentive_type() -> String {
    "incentive".to_string()
}

/// A replacement amount for one named deduction line of one employee.
///
/// Used when a previewed payslip was edited before the run was committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionOverride {
    /// The employee whose line is replaced.
    pub employee_id: String,
    /// The deduction line name (e.g. "SSS", "Late").
    pub name: String,
    /// The replacement amount.
    pub amount: Decimal,
}

/// A payroll run header. The run owns its payslips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRun {
    /// Unique identifier for the run.
    pub id: Uuid,
    /// The organization the run belongs to.
    pub organization_id: String,
    /// The period the run covers.
    pub cutoff: Cutoff,
    /// The employees included, in the order they were selected.
    pub employee_ids: Vec<String>,
    /// Lifecycle status.
    pub status: PayrollStatus,
    /// Master switch for statutory deductions.
    pub deductions_enabled: bool,
    /// Per-employee statutory policy.
    pub government_deduction_settings: Vec<EmployeeDeductionSetting>,
    /// Manual deductions.
    pub manual_deductions: Vec<ManualDeduction>,
    /// Incentives.
    pub incentives: Vec<EmployeeIncentive>,
    /// Per-line deduction overrides.
    pub deduction_overrides: Vec<DeductionOverride>,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
    /// When the run was last changed.
    pub updated_at: DateTime<Utc>,
    /// When the run was last finalized.
    pub processed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    const ALL: [PayrollStatus; 4] = [
        PayrollStatus::Draft,
        PayrollStatus::Finalized,
        PayrollStatus::Paid,
        PayrollStatus::Archived,
    ];

    fn reachable_from(status: PayrollStatus) -> Vec<PayrollStatus> {
        ALL.into_iter()
            .filter(|t| status.can_transition_to(*t))
            .collect()
    }

    #[test]
    fn test_half_toggle_on_odd_cents_rounds_to_nearest_cent() {
        use crate::calculation::round_money;

        let half = DeductionToggle {
            enabled: true,
            frequency: Frequency::Half,
        };
        assert_eq!(half.apply(dec("900.01")), dec("450.005"));
        assert_eq!(round_money(half.apply(dec("900.01"))), dec("450.01"));
        assert_eq!(round_money(half.apply(dec("900.00"))) * Decimal::TWO, dec("900.00"));
    }

    #[test]
    fn test_draft_only_reaches_finalized() {
        assert_eq!(
            reachable_from(PayrollStatus::Draft),
            vec![PayrollStatus::Finalized]
        );
    }

    #[test]
    fn test_finalized_reaches_draft_paid_and_archived() {
        assert_eq!(
            reachable_from(PayrollStatus::Finalized),
            vec![
                PayrollStatus::Draft,
                PayrollStatus::Paid,
                PayrollStatus::Archived
            ]
        );
    }

    #[test]
    fn test_paid_reaches_finalized_and_archived() {
        assert_eq!(
            reachable_from(PayrollStatus::Paid),
            vec![PayrollStatus::Finalized, PayrollStatus::Archived]
        );
    }

    #[test]
    fn test_archived_is_terminal() {
        assert!(reachable_from(PayrollStatus::Archived).is_empty());
    }

    #[test]
    fn test_no_self_transitions() {
        for status in ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_toggle_half_frequency_halves_base() {
        let toggle = DeductionToggle {
            enabled: true,
            frequency: Frequency::Half,
        };
        assert_eq!(toggle.apply(dec("900.00")), dec("450.00"));
    }

    #[test]
    fn test_toggle_disabled_is_zero() {
        let toggle = DeductionToggle {
            enabled: false,
            frequency: Frequency::Half,
        };
        assert_eq!(toggle.apply(dec("900.00")), Decimal::ZERO);
    }

    #[test]
    fn test_default_setting_is_all_enabled_full() {
        let setting = GovernmentDeductionSetting::default();
        assert_eq!(setting.tax, DeductionToggle::default());
        assert!(setting.sss.enabled);
        assert_eq!(setting.philhealth.frequency, Frequency::Full);
    }

    #[test]
    fn test_employee_setting_flattens_toggles() {
        let json = r#"{
            "employee_id": "emp_001",
            "sss": {"enabled": true, "frequency": "half"},
            "tax": {"enabled": false}
        }"#;
        let setting: EmployeeDeductionSetting = serde_json::from_str(json).unwrap();
        assert_eq!(setting.setting.sss.frequency, Frequency::Half);
        assert!(!setting.setting.tax.enabled);
        assert!(setting.setting.pagibig.enabled);
    }

    #[test]
    fn test_status_display_matches_serde() {
        for status in ALL {
            assert_eq!(
                serde_json::to_string(&status).unwrap(),
                format!("\"{}\"", status)
            );
        }
    }
}
