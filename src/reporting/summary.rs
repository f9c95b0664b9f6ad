//! Read-only aggregates over payslips.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculation::{PAGIBIG, PHILHEALTH, SSS, WITHHOLDING_TAX};
use crate::models::{DeductionType, PayrollRun, PayrollStatus, Payslip};

/// Deduction amounts grouped the way payroll reports show them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionBreakdown {
    /// SSS contribution.
    pub sss: Decimal,
    /// PhilHealth premium.
    pub philhealth: Decimal,
    /// Pag-IBIG contribution.
    pub pagibig: Decimal,
    /// Withholding tax.
    pub withholding_tax: Decimal,
    /// Late, undertime and absence lines.
    pub attendance: Decimal,
    /// Manual deductions.
    pub custom: Decimal,
}

impl DeductionBreakdown {
    /// Groups one payslip's deduction lines.
    pub fn from_payslip(payslip: &Payslip) -> Self {
        Self {
            sss: payslip.deduction(SSS).unwrap_or_default(),
            philhealth: payslip.deduction(PHILHEALTH).unwrap_or_default(),
            pagibig: payslip.deduction(PAGIBIG).unwrap_or_default(),
            withholding_tax: payslip.deduction(WITHHOLDING_TAX).unwrap_or_default(),
            attendance: payslip.deductions_of_type(DeductionType::Attendance),
            custom: payslip.deductions_of_type(DeductionType::Custom),
        }
    }

    fn add(&mut self, other: &DeductionBreakdown) {
        self.sss += other.sss;
        self.philhealth += other.philhealth;
        self.pagibig += other.pagibig;
        self.withholding_tax += other.withholding_tax;
        self.attendance += other.attendance;
        self.custom += other.custom;
    }
}

/// One employee's computed pay for a cutoff, as returned by
/// `compute_employee_payroll`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeePayroll {
    /// The employee.
    pub employee_id: String,
    /// Days with a present record.
    pub days_worked: u32,
    /// Reported absence days.
    pub absences: Decimal,
    /// Total late hours.
    pub late_hours: Decimal,
    /// Total undertime hours.
    pub undertime_hours: Decimal,
    /// Total overtime hours.
    pub overtime_hours: Decimal,
    /// Holiday premium pay.
    pub holiday_pay: Decimal,
    /// Rest-day premium pay.
    pub rest_day_pay: Decimal,
    /// Gross pay before attendance deductions: basic pay, premiums and
    /// incentives. Late, undertime and absence amounts are deduction lines
    /// in `deductions.attendance`.
    pub gross_pay: Decimal,
    /// `gross_pay` less the late, undertime and absence deductions.
    pub gross_after_attendance: Decimal,
    /// Sum of incentives.
    pub incentive_total: Decimal,
    /// Deductions by group, before the earnings cap.
    pub deductions: DeductionBreakdown,
    /// Net pay.
    pub net_pay: Decimal,
}

impl From<&Payslip> for EmployeePayroll {
    fn from(payslip: &Payslip) -> Self {
        let deductions = DeductionBreakdown::from_payslip(payslip);
        Self {
            employee_id: payslip.employee_id.clone(),
            days_worked: payslip.days_worked,
            absences: payslip.absences,
            late_hours: payslip.late_hours,
            undertime_hours: payslip.undertime_hours,
            overtime_hours: payslip.overtime_hours,
            holiday_pay: payslip.holiday_pay,
            rest_day_pay: payslip.rest_day_pay,
            gross_pay: payslip.gross_pay,
            gross_after_attendance: payslip.gross_pay - deductions.attendance,
            incentive_total: payslip.total_incentives,
            deductions,
            net_pay: payslip.net_pay,
        }
    }
}

/// Totals across every payslip of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRunSummary {
    /// The run.
    pub run_id: Uuid,
    /// The organization.
    pub organization_id: String,
    /// The run's status when the summary was taken.
    pub status: PayrollStatus,
    /// First date of the cutoff.
    pub cutoff_start: NaiveDate,
    /// Last date of the cutoff.
    pub cutoff_end: NaiveDate,
    /// Number of payslips.
    pub employee_count: usize,
    /// Sum of basic pay.
    pub total_basic_pay: Decimal,
    /// Sum of incentives.
    pub total_incentives: Decimal,
    /// Sum of gross pay.
    pub total_gross_pay: Decimal,
    /// Sum of non-taxable allowances.
    pub total_non_taxable_allowance: Decimal,
    /// Deduction lines by group, before the earnings cap.
    pub deductions: DeductionBreakdown,
    /// Sum of deductions actually taken.
    pub total_deductions: Decimal,
    /// Sum of deductions dropped by the cap.
    pub total_truncated_deductions: Decimal,
    /// Sum of net pay.
    pub total_net_pay: Decimal,
}

impl PayrollRunSummary {
    /// Aggregates a run's payslips.
    pub fn from_payslips(run: &PayrollRun, payslips: &[Payslip]) -> Self {
        let mut summary = Self {
            run_id: run.id,
            organization_id: run.organization_id.clone(),
            status: run.status,
            cutoff_start: run.cutoff.start,
            cutoff_end: run.cutoff.end,
            employee_count: payslips.len(),
            total_basic_pay: Decimal::ZERO,
            total_incentives: Decimal::ZERO,
            total_gross_pay: Decimal::ZERO,
            total_non_taxable_allowance: Decimal::ZERO,
            deductions: DeductionBreakdown::default(),
            total_deductions: Decimal::ZERO,
            total_truncated_deductions: Decimal::ZERO,
            total_net_pay: Decimal::ZERO,
        };

        for payslip in payslips {
            summary.total_basic_pay += payslip.basic_pay;
            summary.total_incentives += payslip.total_incentives;
            summary.total_gross_pay += payslip.gross_pay;
            summary.total_non_taxable_allowance += payslip.non_taxable_allowance;
            summary
                .deductions
                .add(&DeductionBreakdown::from_payslip(payslip));
            summary.total_deductions += payslip.total_deductions;
            summary.total_truncated_deductions += payslip.truncated_deductions;
            summary.total_net_pay += payslip.net_pay;
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cutoff, Deduction, SalaryType};
    use chrono::Utc;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(name: &str, amount: &str, deduction_type: DeductionType) -> Deduction {
        Deduction {
            name: name.to_string(),
            amount: dec(amount),
            deduction_type,
        }
    }

    fn create_payslip(employee_id: &str, gross: &str, deductions: Vec<Deduction>) -> Payslip {
        let total: Decimal = deductions.iter().map(|d| d.amount).sum();
        Payslip {
            employee_id: employee_id.to_string(),
            cutoff_start: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            cutoff_end: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            salary_type: SalaryType::Monthly,
            daily_rate: dec("919.54"),
            hourly_rate: dec("114.94"),
            working_days: 11,
            basic_pay: dec(gross),
            days_worked: 11,
            absences: Decimal::ZERO,
            late_hours: Decimal::ZERO,
            undertime_hours: Decimal::ZERO,
            overtime_hours: Decimal::ZERO,
            holiday_pay: Decimal::ZERO,
            rest_day_pay: Decimal::ZERO,
            deductions,
            incentives: vec![],
            total_incentives: Decimal::ZERO,
            non_taxable_allowance: Decimal::ZERO,
            gross_pay: dec(gross),
            raw_total_deductions: total,
            total_deductions: total,
            truncated_deductions: Decimal::ZERO,
            net_pay: dec(gross) - total,
        }
    }

    #[test]
    fn test_breakdown_groups_lines() {
        let payslip = create_payslip(
            "emp_001",
            "10000",
            vec![
                line("SSS", "900", DeductionType::Government),
                line("Late", "57.47", DeductionType::Attendance),
                line("Absences", "919.54", DeductionType::Attendance),
                line("Cash Advance", "500", DeductionType::Custom),
            ],
        );

        let breakdown = DeductionBreakdown::from_payslip(&payslip);
        assert_eq!(breakdown.sss, dec("900"));
        assert_eq!(breakdown.philhealth, Decimal::ZERO);
        assert_eq!(breakdown.attendance, dec("977.01"));
        assert_eq!(breakdown.custom, dec("500"));
    }

    #[test]
    fn test_run_summary_totals() {
        let now = Utc::now();
        let run = PayrollRun {
            id: Uuid::new_v4(),
            organization_id: "org_001".to_string(),
            cutoff: Cutoff::new(
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            )
            .unwrap(),
            employee_ids: vec!["emp_001".to_string(), "emp_002".to_string()],
            status: PayrollStatus::Draft,
            deductions_enabled: true,
            government_deduction_settings: vec![],
            manual_deductions: vec![],
            incentives: vec![],
            deduction_overrides: vec![],
            created_at: now,
            updated_at: now,
            processed_at: None,
        };
        let payslips = vec![
            create_payslip("emp_001", "10000", vec![line("SSS", "900", DeductionType::Government)]),
            create_payslip("emp_002", "8000", vec![line("SSS", "720", DeductionType::Government)]),
        ];

        let summary = PayrollRunSummary::from_payslips(&run, &payslips);
        assert_eq!(summary.employee_count, 2);
        assert_eq!(summary.total_gross_pay, dec("18000"));
        assert_eq!(summary.deductions.sss, dec("1620"));
        assert_eq!(summary.total_net_pay, dec("16380"));
    }

    #[test]
    fn test_employee_payroll_from_payslip() {
        let payslip = create_payslip(
            "emp_001",
            "10000",
            vec![line("Withholding Tax", "120", DeductionType::Government)],
        );
        let payroll = EmployeePayroll::from(&payslip);
        assert_eq!(payroll.deductions.withholding_tax, dec("120"));
        assert_eq!(payroll.net_pay, dec("9880"));
        assert_eq!(payroll.gross_after_attendance, dec("10000"));
    }

    #[test]
    fn test_gross_after_attendance_subtracts_attendance_lines() {
        let payslip = create_payslip(
            "emp_001",
            "10000",
            vec![
                line("SSS", "900", DeductionType::Government),
                line("Late", "57.47", DeductionType::Attendance),
                line("Absences", "919.54", DeductionType::Attendance),
            ],
        );
        let payroll = EmployeePayroll::from(&payslip);

        assert_eq!(payroll.gross_pay, dec("10000"));
        assert_eq!(payroll.gross_after_attendance, dec("9022.99"));
        assert_eq!(
            payroll.gross_after_attendance - payroll.deductions.sss,
            payroll.net_pay
        );
    }
}
