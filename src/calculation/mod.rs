//! Calculation logic for the payroll engine.
//!
//! This module contains the pure functions that turn compensation,
//! schedule and attendance data into a payslip: rate resolution, attendance
//! aggregation, statutory contribution lookup, deductions with the earnings
//! cap, incentive totals, and the payslip compositor that ties them
//! together.

mod attendance;
mod contributions;
mod deductions;
mod incentives;
mod payslip;
mod rate;

use rust_decimal::{Decimal, RoundingStrategy};

pub use attendance::{
    AttendanceAggregation, AttendanceSummary, aggregate_attendance, count_working_days,
    late_minutes, undertime_minutes,
};
pub use contributions::{ContributionTable, StatutoryAmounts, withholding_tax};
pub use deductions::{
    ABSENCES, DeductionInput, DeductionOutcome, LATE, PAGIBIG, PHILHEALTH, SSS, UNDERTIME,
    WITHHOLDING_TAX, compute_deductions,
};
pub use incentives::{IncentiveTotal, total_incentives};
pub use payslip::{PayslipComputation, PayslipInput, compose_payslip};
pub use rate::{
    HOURS_PER_DAY, RateResolution, cutoff_basic_pay, monthly_equivalent_salary, resolve_rates,
};

/// Rounds a money amount to cents, midpoint away from zero.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::round_money;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_money(Decimal::new(100005, 3)), Decimal::new(10001, 2));
/// assert_eq!(round_money(Decimal::new(-100005, 3)), Decimal::new(-10001, 2));
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
