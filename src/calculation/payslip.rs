//! Payslip composition.
//!
//! [`compose_payslip`] is the single code path behind both payslip previews
//! and persisted payroll runs. It is pure: no clock, no IDs, no I/O.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{OrganizationSettings, PayPremiums};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceRecord, AuditStep, AuditTrace, CompensationProfile, Cutoff,
    GovernmentDeductionSetting, Incentive, ManualDeduction, Payslip, SalaryType, ScheduleProfile,
};

use super::attendance::aggregate_attendance;
use super::contributions::ContributionTable;
use super::deductions::{DeductionInput, compute_deductions};
use super::incentives::total_incentives;
use super::rate::{cutoff_basic_pay, monthly_equivalent_salary, resolve_rates};
use super::round_money;

/// Everything needed to compose one employee's payslip.
#[derive(Clone, Copy)]
pub struct PayslipInput<'a> {
    /// The employee being paid.
    pub employee_id: &'a str,
    /// The employee's compensation profile.
    pub compensation: &'a CompensationProfile,
    /// The employee's schedule.
    pub schedule: &'a ScheduleProfile,
    /// The period being paid.
    pub cutoff: &'a Cutoff,
    /// Attendance records for the period.
    pub attendance: &'a [AttendanceRecord],
    /// Absence days reported by the attendance source.
    pub reported_absences: Decimal,
    /// Statutory base amount lookup.
    pub contributions: &'a dyn ContributionTable,
    /// The employee's statutory deduction policy.
    pub government_setting: GovernmentDeductionSetting,
    /// Run-level master switch for statutory deductions.
    pub deductions_enabled: bool,
    /// Manual deductions for this employee.
    pub manual_deductions: &'a [ManualDeduction],
    /// Incentives for this employee.
    pub incentives: &'a [Incentive],
    /// Deduction amount overrides keyed by line name.
    pub overrides: &'a BTreeMap<String, Decimal>,
}

/// A composed payslip and the audit trace explaining it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipComputation {
    /// The payslip.
    pub payslip: Payslip,
    /// How it was computed.
    pub audit_trace: AuditTrace,
}

/// Composes one employee's payslip for a cutoff.
///
/// - basic pay: monthly `basic / 2`; daily and hourly
///   `daily_rate x max(0, working_days - absences)`
/// - gross pay: `basic + holiday pay + rest-day pay + incentives`
/// - non-taxable allowance: half the monthly allowance
/// - net pay: `max(0, gross + allowance - total deductions)`
///
/// Calling it twice with the same input yields the same payslip.
///
/// # Errors
///
/// Returns [`EngineError::Computation`] if the basic salary or allowance is
/// negative.
pub fn compose_payslip(
    input: &PayslipInput<'_>,
    settings: &OrganizationSettings,
    premiums: &PayPremiums,
) -> EngineResult<PayslipComputation> {
    let profile = input.compensation;
    if profile.basic_salary < Decimal::ZERO {
        return Err(EngineError::computation(
            input.employee_id,
            format!("basic salary {} is negative", profile.basic_salary),
        ));
    }
    if profile.allowance_or_zero() < Decimal::ZERO {
        return Err(EngineError::computation(
            input.employee_id,
            format!("allowance {} is negative", profile.allowance_or_zero()),
        ));
    }

    let mut audit_trace = AuditTrace::default();
    let mut step_number: u32 = 1;

    let rates = resolve_rates(profile, settings, step_number);
    audit_trace.steps.push(rates.audit_step);
    step_number += 1;

    let attendance = aggregate_attendance(
        input.cutoff,
        input.schedule,
        input.attendance,
        input.reported_absences,
        rates.hourly_rate,
        premiums,
        step_number,
    );
    let summary = attendance.summary;
    audit_trace.steps.push(attendance.audit_step);
    step_number += 1;

    let basic_pay = round_money(cutoff_basic_pay(
        profile,
        rates.daily_rate,
        summary.working_days,
        summary.absences,
    ));
    let basic_reasoning = match profile.salary_type {
        SalaryType::Monthly => format!("Half of monthly salary ${}", profile.basic_salary),
        SalaryType::Daily | SalaryType::Hourly => format!(
            "{} working day(s) less {} absent x ${} daily rate",
            summary.working_days,
            summary.absences,
            rates.daily_rate.round_dp(4)
        ),
    };
    audit_trace.steps.push(AuditStep {
        step_number,
        rule_id: "basic_pay".to_string(),
        rule_name: "Basic Pay".to_string(),
        input: serde_json::json!({
            "salary_type": profile.salary_type,
            "basic_salary": profile.basic_salary.to_string(),
            "working_days": summary.working_days,
            "absences": summary.absences.to_string()
        }),
        output: serde_json::json!({ "basic_pay": basic_pay.to_string() }),
        reasoning: basic_reasoning,
    });
    step_number += 1;

    let incentives = total_incentives(input.incentives, step_number);
    audit_trace.steps.push(incentives.audit_step);
    step_number += 1;

    let non_taxable_allowance = round_money(profile.allowance_or_zero() / Decimal::TWO);
    let gross_pay = basic_pay + summary.holiday_pay + summary.rest_day_pay + incentives.total;
    audit_trace.steps.push(AuditStep {
        step_number,
        rule_id: "gross_pay".to_string(),
        rule_name: "Gross Pay".to_string(),
        input: serde_json::json!({
            "basic_pay": basic_pay.to_string(),
            "holiday_pay": summary.holiday_pay.to_string(),
            "rest_day_pay": summary.rest_day_pay.to_string(),
            "total_incentives": incentives.total.to_string()
        }),
        output: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "non_taxable_allowance": non_taxable_allowance.to_string()
        }),
        reasoning: format!(
            "${} + ${} + ${} + ${} = ${}",
            basic_pay, summary.holiday_pay, summary.rest_day_pay, incentives.total, gross_pay
        ),
    });
    step_number += 1;

    let monthly_salary = monthly_equivalent_salary(profile, rates.daily_rate, settings);
    let deductions = compute_deductions(
        &DeductionInput {
            statutory: input.contributions.statutory_amounts(monthly_salary),
            government_setting: input.government_setting,
            deductions_enabled: input.deductions_enabled,
            manual_deductions: input.manual_deductions,
            salary_type: profile.salary_type,
            daily_rate: rates.daily_rate,
            hourly_rate: rates.hourly_rate,
            late_hours: summary.late_hours,
            undertime_hours: summary.undertime_hours,
            absences: summary.absences,
            gross_pay,
            non_taxable_allowance,
            overrides: input.overrides,
        },
        step_number,
    );
    step_number += deductions.audit_steps.len() as u32;
    audit_trace.steps.extend(deductions.audit_steps);
    audit_trace.warnings.extend(deductions.warnings);

    let net_pay = (gross_pay + non_taxable_allowance - deductions.total).max(Decimal::ZERO);
    audit_trace.steps.push(AuditStep {
        step_number,
        rule_id: "net_pay".to_string(),
        rule_name: "Net Pay".to_string(),
        input: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "non_taxable_allowance": non_taxable_allowance.to_string(),
            "total_deductions": deductions.total.to_string()
        }),
        output: serde_json::json!({ "net_pay": net_pay.to_string() }),
        reasoning: format!(
            "max(0, ${} + ${} - ${}) = ${}",
            gross_pay, non_taxable_allowance, deductions.total, net_pay
        ),
    });

    let payslip = Payslip {
        employee_id: input.employee_id.to_string(),
        cutoff_start: input.cutoff.start,
        cutoff_end: input.cutoff.end,
        salary_type: profile.salary_type,
        daily_rate: round_money(rates.daily_rate),
        hourly_rate: round_money(rates.hourly_rate),
        working_days: summary.working_days,
        basic_pay,
        days_worked: summary.days_worked,
        absences: summary.absences,
        late_hours: summary.late_hours.round_dp(4),
        undertime_hours: summary.undertime_hours.round_dp(4),
        overtime_hours: summary.overtime_hours,
        holiday_pay: summary.holiday_pay,
        rest_day_pay: summary.rest_day_pay,
        deductions: deductions.lines,
        incentives: incentives.items,
        total_incentives: incentives.total,
        non_taxable_allowance,
        gross_pay,
        raw_total_deductions: deductions.raw_total,
        total_deductions: deductions.total,
        truncated_deductions: deductions.truncated,
        net_pay,
    };

    Ok(PayslipComputation {
        payslip,
        audit_trace,
    })
}
