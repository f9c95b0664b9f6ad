//! Deduction engine.
//!
//! Builds every deduction line for one payslip (statutory, attendance-driven
//! and manual), applies per-line overrides, and caps the total against the
//! employee's available earnings so net pay never goes negative.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::models::{
    AuditStep, AuditWarning, Deduction, DeductionType, GovernmentDeductionSetting,
    ManualDeduction, SalaryType,
};

use super::contributions::StatutoryAmounts;
use super::round_money;

/// Line name for the SSS contribution.
pub const SSS: &str = "SSS";
/// Line name for the PhilHealth premium.
pub const PHILHEALTH: &str = "PhilHealth";
/// Line name for the Pag-IBIG contribution.
pub const PAGIBIG: &str = "Pag-IBIG";
/// Line name for withholding tax.
pub const WITHHOLDING_TAX: &str = "Withholding Tax";
/// Line name for the late deduction.
pub const LATE: &str = "Late";
/// Line name for the undertime deduction.
pub const UNDERTIME: &str = "Undertime";
/// Line name for the absence deduction.
pub const ABSENCES: &str = "Absences";

/// Everything the deduction engine needs for one employee.
#[derive(Debug, Clone)]
pub struct DeductionInput<'a> {
    /// Monthly statutory base amounts.
    pub statutory: StatutoryAmounts,
    /// Enable flag and frequency per statutory deduction.
    pub government_setting: GovernmentDeductionSetting,
    /// Run-level master switch for statutory deductions.
    pub deductions_enabled: bool,
    /// Manual deductions for this employee.
    pub manual_deductions: &'a [ManualDeduction],
    /// The employee's salary type.
    pub salary_type: SalaryType,
    /// Resolved daily rate.
    pub daily_rate: Decimal,
    /// Resolved hourly rate.
    pub hourly_rate: Decimal,
    /// Total late hours.
    pub late_hours: Decimal,
    /// Total undertime hours.
    pub undertime_hours: Decimal,
    /// Absence days.
    pub absences: Decimal,
    /// Gross pay the deductions are taken from.
    pub gross_pay: Decimal,
    /// Non-taxable allowance paid with gross pay.
    pub non_taxable_allowance: Decimal,
    /// Replacement amounts keyed by line name.
    pub overrides: &'a BTreeMap<String, Decimal>,
}

/// The deduction lines and totals for one payslip.
#[derive(Debug, Clone)]
pub struct DeductionOutcome {
    /// Lines with a positive amount, statutory then attendance then custom.
    pub lines: Vec<Deduction>,
    /// Sum of all lines before the cap.
    pub raw_total: Decimal,
    /// Deductions actually taken.
    pub total: Decimal,
    /// The dropped remainder, `raw_total - total`.
    pub truncated: Decimal,
    /// Audit steps for statutory lines, attendance lines and the cap.
    pub audit_steps: Vec<AuditStep>,
    /// Warnings raised along the way.
    pub warnings: Vec<AuditWarning>,
}

impl DeductionOutcome {
    /// Sums the lines of one type.
    pub fn total_of_type(&self, deduction_type: DeductionType) -> Decimal {
        self.lines
            .iter()
            .filter(|line| line.deduction_type == deduction_type)
            .map(|line| line.amount)
            .sum()
    }
}

fn line(name: &str, amount: Decimal, deduction_type: DeductionType) -> Deduction {
    Deduction {
        name: name.to_string(),
        amount: round_money(amount),
        deduction_type,
    }
}

fn lines_json(lines: &[Deduction]) -> serde_json::Value {
    lines
        .iter()
        .map(|l| (l.name.clone(), serde_json::Value::String(l.amount.to_string())))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

/// Computes the deduction lines and the capped total for one employee.
///
/// - statutory: `amount = enabled ? (half ? base / 2 : base) : 0`; none at
///   all when `deductions_enabled` is false
/// - late: `late_hours x hourly_rate`; undertime: `undertime_hours x hourly_rate`
/// - absences: `absences x daily_rate` for monthly employees, 0 otherwise
/// - manual lines are appended as [`DeductionType::Custom`]
///
/// An override replaces the amount of every line with its name; an override
/// of 0 removes the line. Only lines with a positive amount are kept. The
/// total is `min(raw_total, max(0, gross_pay + non_taxable_allowance))` and
/// the remainder is dropped.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
///
/// use payroll_engine::calculation::{compute_deductions, DeductionInput, StatutoryAmounts};
/// use payroll_engine::models::{GovernmentDeductionSetting, SalaryType};
/// use rust_decimal::Decimal;
///
/// let overrides = BTreeMap::new();
/// let outcome = compute_deductions(
///     &DeductionInput {
///         statutory: StatutoryAmounts {
///             sss: Decimal::new(900, 0),
///             philhealth: Decimal::new(500, 0),
///             pagibig: Decimal::new(200, 0),
///             withholding_tax: Decimal::ZERO,
///         },
///         government_setting: GovernmentDeductionSetting::default(),
///         deductions_enabled: true,
///         manual_deductions: &[],
///         salary_type: SalaryType::Monthly,
///         daily_rate: Decimal::new(1000, 0),
///         hourly_rate: Decimal::new(125, 0),
///         late_hours: Decimal::ZERO,
///         undertime_hours: Decimal::ZERO,
///         absences: Decimal::ZERO,
///         gross_pay: Decimal::new(10000, 0),
///         non_taxable_allowance: Decimal::ZERO,
///         overrides: &overrides,
///     },
///     1,
/// );
///
/// assert_eq!(outcome.lines.len(), 3);
/// assert_eq!(outcome.total, Decimal::new(1600, 0));
/// ```
pub fn compute_deductions(input: &DeductionInput<'_>, step_number: u32) -> DeductionOutcome {
    let setting = &input.government_setting;
    let mut audit_steps = Vec::new();
    let mut warnings = Vec::new();

    let statutory_candidates = if input.deductions_enabled {
        vec![
            line(SSS, setting.sss.apply(input.statutory.sss), DeductionType::Government),
            line(
                PHILHEALTH,
                setting.philhealth.apply(input.statutory.philhealth),
                DeductionType::Government,
            ),
            line(
                PAGIBIG,
                setting.pagibig.apply(input.statutory.pagibig),
                DeductionType::Government,
            ),
            line(
                WITHHOLDING_TAX,
                setting.tax.apply(input.statutory.withholding_tax),
                DeductionType::Government,
            ),
        ]
    } else {
        Vec::new()
    };

    let absent_amount = match input.salary_type {
        SalaryType::Monthly => input.absences * input.daily_rate,
        SalaryType::Daily | SalaryType::Hourly => Decimal::ZERO,
    };
    let attendance_candidates = vec![
        line(LATE, input.late_hours * input.hourly_rate, DeductionType::Attendance),
        line(
            UNDERTIME,
            input.undertime_hours * input.hourly_rate,
            DeductionType::Attendance,
        ),
        line(ABSENCES, absent_amount, DeductionType::Attendance),
    ];

    let custom_candidates = input
        .manual_deductions
        .iter()
        .map(|m| line(&m.name, m.amount, DeductionType::Custom));

    let mut candidates: Vec<Deduction> = statutory_candidates
        .iter()
        .chain(attendance_candidates.iter())
        .cloned()
        .chain(custom_candidates)
        .collect();

    for (name, amount) in input.overrides {
        let mut matched = false;
        for candidate in candidates.iter_mut().filter(|c| &c.name == name) {
            candidate.amount = round_money(*amount);
            matched = true;
        }
        if !matched {
            warnings.push(AuditWarning {
                code: "UNMATCHED_OVERRIDE".to_string(),
                message: format!("Override for '{}' matches no deduction line and was ignored", name),
                severity: "low".to_string(),
            });
        }
    }

    let lines: Vec<Deduction> = candidates
        .into_iter()
        .filter(|c| c.amount > Decimal::ZERO)
        .collect();

    let government: Vec<Deduction> = lines
        .iter()
        .filter(|l| l.deduction_type == DeductionType::Government)
        .cloned()
        .collect();
    audit_steps.push(AuditStep {
        step_number,
        rule_id: "statutory_deductions".to_string(),
        rule_name: "Statutory Deductions".to_string(),
        input: serde_json::json!({
            "deductions_enabled": input.deductions_enabled,
            "base_amounts": input.statutory,
            "setting": input.government_setting
        }),
        output: lines_json(&government),
        reasoning: if input.deductions_enabled {
            format!("{} statutory line(s) after frequency and overrides", government.len())
        } else {
            "Statutory deductions are disabled for this run".to_string()
        },
    });

    let attendance: Vec<Deduction> = lines
        .iter()
        .filter(|l| l.deduction_type == DeductionType::Attendance)
        .cloned()
        .collect();
    audit_steps.push(AuditStep {
        step_number: step_number + 1,
        rule_id: "attendance_deductions".to_string(),
        rule_name: "Attendance Deductions".to_string(),
        input: serde_json::json!({
            "salary_type": input.salary_type,
            "late_hours": input.late_hours.round_dp(4).to_string(),
            "undertime_hours": input.undertime_hours.round_dp(4).to_string(),
            "absences": input.absences.to_string(),
            "hourly_rate": input.hourly_rate.round_dp(4).to_string(),
            "daily_rate": input.daily_rate.round_dp(4).to_string()
        }),
        output: lines_json(&attendance),
        reasoning: match input.salary_type {
            SalaryType::Monthly => "Late and undertime at the hourly rate, absences at the daily rate".to_string(),
            SalaryType::Daily | SalaryType::Hourly => {
                "Late and undertime at the hourly rate; absences already excluded from basic pay".to_string()
            }
        },
    });

    let raw_total: Decimal = lines.iter().map(|l| l.amount).sum();
    let available = input.gross_pay + input.non_taxable_allowance;
    let total = raw_total.min(available.max(Decimal::ZERO));
    let truncated = raw_total - total;

    if truncated > Decimal::ZERO {
        warnings.push(AuditWarning {
            code: "DEDUCTIONS_TRUNCATED".to_string(),
            message: format!(
                "Deductions of ${} exceed available earnings of ${}; ${} was not deducted",
                raw_total, available, truncated
            ),
            severity: "high".to_string(),
        });
    }

    audit_steps.push(AuditStep {
        step_number: step_number + 2,
        rule_id: "deduction_cap".to_string(),
        rule_name: "Deduction Cap".to_string(),
        input: serde_json::json!({
            "raw_total": raw_total.to_string(),
            "gross_pay": input.gross_pay.to_string(),
            "non_taxable_allowance": input.non_taxable_allowance.to_string()
        }),
        output: serde_json::json!({
            "total": total.to_string(),
            "truncated": truncated.to_string()
        }),
        reasoning: if truncated > Decimal::ZERO {
            format!("Capped at available earnings ${}", available.max(Decimal::ZERO))
        } else {
            format!("${} is within available earnings ${}", raw_total, available)
        },
    });

    DeductionOutcome {
        lines,
        raw_total,
        total,
        truncated,
        audit_steps,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeductionToggle, Frequency};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn statutory() -> StatutoryAmounts {
        StatutoryAmounts {
            sss: dec("900"),
            philhealth: dec("500"),
            pagibig: dec("200"),
            withholding_tax: dec("350"),
        }
    }

    fn create_input<'a>(
        manual: &'a [ManualDeduction],
        overrides: &'a BTreeMap<String, Decimal>,
    ) -> DeductionInput<'a> {
        DeductionInput {
            statutory: statutory(),
            government_setting: GovernmentDeductionSetting::default(),
            deductions_enabled: true,
            manual_deductions: manual,
            salary_type: SalaryType::Monthly,
            daily_rate: dec("919.5402"),
            hourly_rate: dec("114.9425"),
            late_hours: Decimal::ZERO,
            undertime_hours: Decimal::ZERO,
            absences: Decimal::ZERO,
            gross_pay: dec("10000"),
            non_taxable_allowance: Decimal::ZERO,
            overrides,
        }
    }

    fn manual(name: &str, amount: &str) -> ManualDeduction {
        ManualDeduction {
            employee_id: "emp_001".to_string(),
            name: name.to_string(),
            amount: dec(amount),
        }
    }

    /// DE-001: all statutory lines at full frequency
    #[test]
    fn test_statutory_lines_full() {
        let overrides = BTreeMap::new();
        let outcome = compute_deductions(&create_input(&[], &overrides), 1);

        let names: Vec<&str> = outcome.lines.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec![SSS, PHILHEALTH, PAGIBIG, WITHHOLDING_TAX]);
        assert_eq!(outcome.total, dec("1950"));
        assert_eq!(outcome.truncated, Decimal::ZERO);
    }

    /// DE-002: half frequency halves the base
    #[test]
    fn test_half_frequency() {
        let overrides = BTreeMap::new();
        let mut input = create_input(&[], &overrides);
        input.government_setting.sss = DeductionToggle {
            enabled: true,
            frequency: Frequency::Half,
        };

        let outcome = compute_deductions(&input, 1);
        assert_eq!(
            outcome.lines.iter().find(|l| l.name == SSS).unwrap().amount,
            dec("450")
        );
    }

    /// DE-003: disabled toggles emit no line
    #[test]
    fn test_disabled_toggle_omits_line() {
        let overrides = BTreeMap::new();
        let mut input = create_input(&[], &overrides);
        input.government_setting.tax.enabled = false;

        let outcome = compute_deductions(&input, 1);
        assert!(outcome.lines.iter().all(|l| l.name != WITHHOLDING_TAX));
        assert_eq!(outcome.total, dec("1600"));
    }

    #[test]
    fn test_zero_base_emits_no_line() {
        let overrides = BTreeMap::new();
        let mut input = create_input(&[], &overrides);
        input.statutory.withholding_tax = Decimal::ZERO;

        let outcome = compute_deductions(&input, 1);
        assert_eq!(outcome.lines.len(), 3);
    }

    #[test]
    fn test_run_switch_disables_all_statutory() {
        let overrides = BTreeMap::new();
        let mut input = create_input(&[], &overrides);
        input.deductions_enabled = false;

        let outcome = compute_deductions(&input, 1);
        assert!(outcome.lines.is_empty());
        assert_eq!(outcome.audit_steps[0].reasoning, "Statutory deductions are disabled for this run");
    }

    /// DE-004: monthly absences are deducted at the daily rate
    #[test]
    fn test_monthly_absence_deduction() {
        let overrides = BTreeMap::new();
        let mut input = create_input(&[], &overrides);
        input.deductions_enabled = false;
        input.absences = dec("1");
        input.daily_rate = dec("20000") * dec("12") / dec("261");

        let outcome = compute_deductions(&input, 1);
        assert_eq!(outcome.lines.len(), 1);
        assert_eq!(outcome.lines[0].name, ABSENCES);
        assert_eq!(outcome.lines[0].amount, dec("919.54"));
        assert_eq!(outcome.lines[0].deduction_type, DeductionType::Attendance);
    }

    /// DE-005: daily and hourly employees never get an absence line
    #[test]
    fn test_no_absence_deduction_for_daily_or_hourly() {
        let overrides = BTreeMap::new();
        for salary_type in [SalaryType::Daily, SalaryType::Hourly] {
            let mut input = create_input(&[], &overrides);
            input.salary_type = salary_type;
            input.absences = dec("3");

            let outcome = compute_deductions(&input, 1);
            assert_eq!(outcome.total_of_type(DeductionType::Attendance), Decimal::ZERO);
        }
    }

    #[test]
    fn test_late_and_undertime_at_hourly_rate() {
        let overrides = BTreeMap::new();
        let mut input = create_input(&[], &overrides);
        input.deductions_enabled = false;
        input.hourly_rate = dec("100");
        input.late_hours = dec("0.25");
        input.undertime_hours = dec("1.5");

        let outcome = compute_deductions(&input, 1);
        assert_eq!(outcome.lines[0].name, LATE);
        assert_eq!(outcome.lines[0].amount, dec("25.00"));
        assert_eq!(outcome.lines[1].name, UNDERTIME);
        assert_eq!(outcome.lines[1].amount, dec("150.00"));
    }

    #[test]
    fn test_manual_deductions_appended_as_custom() {
        let overrides = BTreeMap::new();
        let manual = vec![manual("Cash Advance", "500")];
        let outcome = compute_deductions(&create_input(&manual, &overrides), 1);

        let last = outcome.lines.last().unwrap();
        assert_eq!(last.name, "Cash Advance");
        assert_eq!(last.deduction_type, DeductionType::Custom);
        assert_eq!(outcome.total, dec("2450"));
    }

    /// DE-006: overrides replace amounts; zero removes the line
    #[test]
    fn test_overrides_replace_and_remove() {
        let mut overrides = BTreeMap::new();
        overrides.insert(SSS.to_string(), dec("800"));
        overrides.insert(WITHHOLDING_TAX.to_string(), Decimal::ZERO);

        let outcome = compute_deductions(&create_input(&[], &overrides), 1);
        assert_eq!(
            outcome.lines.iter().find(|l| l.name == SSS).unwrap().amount,
            dec("800")
        );
        assert!(outcome.lines.iter().all(|l| l.name != WITHHOLDING_TAX));
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_override_can_restore_disabled_line() {
        let mut overrides = BTreeMap::new();
        overrides.insert(WITHHOLDING_TAX.to_string(), dec("100"));
        let mut input = create_input(&[], &overrides);
        input.government_setting.tax.enabled = false;

        let outcome = compute_deductions(&input, 1);
        assert_eq!(
            outcome.lines.iter().find(|l| l.name == WITHHOLDING_TAX).unwrap().amount,
            dec("100")
        );
    }

    #[test]
    fn test_unmatched_override_warns() {
        let mut overrides = BTreeMap::new();
        overrides.insert("Loan".to_string(), dec("100"));

        let outcome = compute_deductions(&create_input(&[], &overrides), 1);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].code, "UNMATCHED_OVERRIDE");
        assert_eq!(outcome.total, dec("1950"));
    }

    /// DE-007: total is capped at available earnings
    #[test]
    fn test_cap_truncates_to_available_earnings() {
        let overrides = BTreeMap::new();
        let manual = vec![manual("Loan", "13050")];
        let outcome = compute_deductions(&create_input(&manual, &overrides), 1);

        assert_eq!(outcome.raw_total, dec("15000"));
        assert_eq!(outcome.total, dec("10000"));
        assert_eq!(outcome.truncated, dec("5000"));
        assert_eq!(outcome.warnings[0].code, "DEDUCTIONS_TRUNCATED");
    }

    #[test]
    fn test_allowance_counts_toward_available_earnings() {
        let overrides = BTreeMap::new();
        let manual = vec![manual("Loan", "9000")];
        let mut input = create_input(&manual, &overrides);
        input.non_taxable_allowance = dec("1000");

        let outcome = compute_deductions(&input, 1);
        assert_eq!(outcome.raw_total, dec("10950"));
        assert_eq!(outcome.total, dec("10950"));
        assert_eq!(outcome.truncated, Decimal::ZERO);
    }

    #[test]
    fn test_negative_available_earnings_takes_nothing() {
        let overrides = BTreeMap::new();
        let mut input = create_input(&[], &overrides);
        input.gross_pay = dec("-50");

        let outcome = compute_deductions(&input, 1);
        assert_eq!(outcome.total, Decimal::ZERO);
        assert_eq!(outcome.truncated, outcome.raw_total);
    }

    #[test]
    fn test_audit_steps_are_numbered_sequentially() {
        let overrides = BTreeMap::new();
        let outcome = compute_deductions(&create_input(&[], &overrides), 4);
        let numbers: Vec<u32> = outcome.audit_steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![4, 5, 6]);
    }
}
