//! Rate resolution functionality.
//!
//! This module derives an employee's daily and hourly rates from their
//! compensation profile and the organization's rate settings.

use rust_decimal::Decimal;

use crate::config::OrganizationSettings;
use crate::models::{AuditStep, CompensationProfile, SalaryType};

/// Paid hours in one working day.
pub const HOURS_PER_DAY: Decimal = Decimal::from_parts(8, 0, 0, false, 0);

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// The result of resolving an employee's rates, including the audit step.
#[derive(Debug, Clone)]
pub struct RateResolution {
    /// The daily rate, unrounded.
    pub daily_rate: Decimal,
    /// The hourly rate, unrounded.
    pub hourly_rate: Decimal,
    /// The audit step recording this resolution.
    pub audit_step: AuditStep,
}

/// Determines an employee's daily and hourly rates.
///
/// - monthly: `daily = (basic + allowance if included) x 12 / working days per year`,
///   `hourly = daily / 8`
/// - daily: `daily = basic`, `hourly = daily / 8`
/// - hourly: `hourly = basic`, `daily = hourly x 8`
///
/// A missing allowance counts as zero. There are no error conditions.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::resolve_rates;
/// use payroll_engine::config::OrganizationSettings;
/// use payroll_engine::models::{CompensationProfile, SalaryType};
/// use rust_decimal::Decimal;
///
/// let profile = CompensationProfile {
///     salary_type: SalaryType::Daily,
///     basic_salary: Decimal::new(800, 0),
///     allowance: None,
/// };
/// let rates = resolve_rates(&profile, &OrganizationSettings::default(), 1);
/// assert_eq!(rates.daily_rate, Decimal::new(800, 0));
/// assert_eq!(rates.hourly_rate, Decimal::new(100, 0));
/// ```
pub fn resolve_rates(
    profile: &CompensationProfile,
    settings: &OrganizationSettings,
    step_number: u32,
) -> RateResolution {
    let working_days_per_year = Decimal::from(settings.working_days_per_year.get());

    let (daily_rate, hourly_rate, reasoning) = match profile.salary_type {
        SalaryType::Monthly => {
            let included_allowance = if settings.daily_rate_includes_allowance {
                profile.allowance_or_zero()
            } else {
                Decimal::ZERO
            };
            let daily =
                (profile.basic_salary + included_allowance) * MONTHS_PER_YEAR / working_days_per_year;
            (
                daily,
                daily / HOURS_PER_DAY,
                format!(
                    "(${} + ${} allowance) x 12 / {} days = ${} per day",
                    profile.basic_salary,
                    included_allowance,
                    working_days_per_year,
                    daily.round_dp(4)
                ),
            )
        }
        SalaryType::Daily => (
            profile.basic_salary,
            profile.basic_salary / HOURS_PER_DAY,
            format!("Daily salary ${} used as the daily rate", profile.basic_salary),
        ),
        SalaryType::Hourly => (
            profile.basic_salary * HOURS_PER_DAY,
            profile.basic_salary,
            format!(
                "Hourly salary ${} x 8 hours = ${} per day",
                profile.basic_salary,
                profile.basic_salary * HOURS_PER_DAY
            ),
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "rate_resolution".to_string(),
        rule_name: "Rate Resolution".to_string(),
        input: serde_json::json!({
            "salary_type": profile.salary_type,
            "basic_salary": profile.basic_salary.to_string(),
            "allowance": profile.allowance_or_zero().to_string(),
            "daily_rate_includes_allowance": settings.daily_rate_includes_allowance,
            "working_days_per_year": settings.working_days_per_year.get()
        }),
        output: serde_json::json!({
            "daily_rate": daily_rate.round_dp(4).to_string(),
            "hourly_rate": hourly_rate.round_dp(4).to_string()
        }),
        reasoning,
    };

    RateResolution {
        daily_rate,
        hourly_rate,
        audit_step,
    }
}

/// Returns the basic pay for a semi-monthly cutoff, unrounded.
///
/// Monthly employees earn half their monthly salary whatever their
/// absences (those are deducted separately); daily and hourly employees earn
/// the daily rate for each working day they were not absent.
pub fn cutoff_basic_pay(
    profile: &CompensationProfile,
    daily_rate: Decimal,
    working_days: u32,
    absences: Decimal,
) -> Decimal {
    match profile.salary_type {
        SalaryType::Monthly => profile.basic_salary / Decimal::TWO,
        SalaryType::Daily | SalaryType::Hourly => {
            daily_rate * (Decimal::from(working_days) - absences).max(Decimal::ZERO)
        }
    }
}

/// Returns the monthly salary used for statutory table lookups.
///
/// Monthly employees use their basic salary; everyone else is annualized
/// through the daily rate.
pub fn monthly_equivalent_salary(
    profile: &CompensationProfile,
    daily_rate: Decimal,
    settings: &OrganizationSettings,
) -> Decimal {
    match profile.salary_type {
        SalaryType::Monthly => profile.basic_salary,
        SalaryType::Daily | SalaryType::Hourly => {
            daily_rate * Decimal::from(settings.working_days_per_year.get()) / MONTHS_PER_YEAR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_profile(salary_type: SalaryType, basic: &str, allowance: Option<&str>) -> CompensationProfile {
        CompensationProfile {
            salary_type,
            basic_salary: dec(basic),
            allowance: allowance.map(dec),
        }
    }

    /// RR-001: monthly daily rate uses 12 / working days per year
    #[test]
    fn test_monthly_daily_rate() {
        let profile = create_profile(SalaryType::Monthly, "20000", None);
        let result = resolve_rates(&profile, &OrganizationSettings::default(), 1);

        assert_eq!(result.daily_rate, dec("20000") * dec("12") / dec("261"));
        assert_eq!(result.hourly_rate, result.daily_rate / dec("8"));
        assert_eq!(result.audit_step.rule_id, "rate_resolution");
    }

    /// RR-002: allowance only counts when the organization says so
    #[test]
    fn test_monthly_allowance_inclusion() {
        let profile = create_profile(SalaryType::Monthly, "20000", Some("2610"));

        let excluded = resolve_rates(&profile, &OrganizationSettings::default(), 1);
        assert_eq!(excluded.daily_rate, dec("20000") * dec("12") / dec("261"));

        let settings = OrganizationSettings {
            daily_rate_includes_allowance: true,
            ..OrganizationSettings::default()
        };
        let included = resolve_rates(&profile, &settings, 1);
        assert_eq!(included.daily_rate, dec("22610") * dec("12") / dec("261"));
    }

    #[test]
    fn test_custom_working_days_per_year() {
        let profile = create_profile(SalaryType::Monthly, "26000", None);
        let settings = OrganizationSettings {
            daily_rate_includes_allowance: false,
            working_days_per_year: NonZeroU32::new(312).unwrap(),
        };

        let result = resolve_rates(&profile, &settings, 1);
        assert_eq!(result.daily_rate, dec("1000"));
        assert_eq!(result.hourly_rate, dec("125"));
    }

    /// RR-003: daily salary is the daily rate
    #[test]
    fn test_daily_rates() {
        let profile = create_profile(SalaryType::Daily, "650", None);
        let result = resolve_rates(&profile, &OrganizationSettings::default(), 1);

        assert_eq!(result.daily_rate, dec("650"));
        assert_eq!(result.hourly_rate, dec("81.25"));
    }

    /// RR-004: hourly salary times eight is the daily rate
    #[test]
    fn test_hourly_rates() {
        let profile = create_profile(SalaryType::Hourly, "95.50", None);
        let result = resolve_rates(&profile, &OrganizationSettings::default(), 1);

        assert_eq!(result.hourly_rate, dec("95.50"));
        assert_eq!(result.daily_rate, dec("764.00"));
    }

    #[test]
    fn test_cutoff_basic_pay_monthly_is_half() {
        let profile = create_profile(SalaryType::Monthly, "20000", None);
        assert_eq!(
            cutoff_basic_pay(&profile, dec("919.54"), 11, dec("2")),
            dec("10000")
        );
    }

    #[test]
    fn test_cutoff_basic_pay_daily_excludes_absences() {
        let profile = create_profile(SalaryType::Daily, "650", None);
        assert_eq!(cutoff_basic_pay(&profile, dec("650"), 11, Decimal::ZERO), dec("7150"));
        assert_eq!(cutoff_basic_pay(&profile, dec("650"), 11, dec("1.5")), dec("6175"));
    }

    #[test]
    fn test_cutoff_basic_pay_never_negative() {
        let profile = create_profile(SalaryType::Hourly, "100", None);
        assert_eq!(cutoff_basic_pay(&profile, dec("800"), 2, dec("3")), Decimal::ZERO);
    }

    #[test]
    fn test_monthly_equivalent_salary_for_daily() {
        let profile = create_profile(SalaryType::Daily, "600", None);
        let settings = OrganizationSettings::default();
        assert_eq!(
            monthly_equivalent_salary(&profile, dec("600"), &settings),
            dec("13050")
        );
    }

    #[test]
    fn test_audit_step_has_correct_step_number() {
        let profile = create_profile(SalaryType::Daily, "650", None);
        let result = resolve_rates(&profile, &OrganizationSettings::default(), 5);
        assert_eq!(result.audit_step.step_number, 5);
    }
}
