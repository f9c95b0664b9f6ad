//! Statutory contribution lookups.
//!
//! The [`ContributionTable`] trait is the seam between the deduction engine
//! and whatever supplies the SSS, PhilHealth, Pag-IBIG and withholding tax
//! base amounts. [`ContributionTables`] loaded from `contributions.yaml` is
//! the implementation the crate ships.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::config::{ContributionTables, PagIbigTable, PhilHealthTable, SssTable, TaxBracket};

use super::round_money;

/// Monthly statutory base amounts for one employee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatutoryAmounts {
    /// SSS employee share.
    pub sss: Decimal,
    /// PhilHealth employee share.
    pub philhealth: Decimal,
    /// Pag-IBIG employee share.
    pub pagibig: Decimal,
    /// Monthly withholding tax.
    pub withholding_tax: Decimal,
}

/// Supplies statutory base amounts for a monthly salary.
pub trait ContributionTable: Send + Sync {
    /// Returns the monthly base amounts for `monthly_salary`.
    fn statutory_amounts(&self, monthly_salary: Decimal) -> StatutoryAmounts;
}

impl SssTable {
    /// Monthly salary credit: salary rounded to the nearest step, clamped.
    pub fn salary_credit(&self, monthly_salary: Decimal) -> Decimal {
        let steps = (monthly_salary / self.credit_step)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        (steps * self.credit_step).clamp(self.min_salary_credit, self.max_salary_credit)
    }

    /// Employee share for a monthly salary.
    pub fn contribution(&self, monthly_salary: Decimal) -> Decimal {
        round_money(self.salary_credit(monthly_salary) * self.employee_rate)
    }
}

impl PhilHealthTable {
    /// Employee share of the premium for a monthly salary.
    pub fn contribution(&self, monthly_salary: Decimal) -> Decimal {
        let base = monthly_salary.clamp(self.income_floor, self.income_ceiling);
        round_money(base * self.premium_rate * self.employee_share)
    }
}

impl PagIbigTable {
    /// Employee share for a monthly salary.
    pub fn contribution(&self, monthly_salary: Decimal) -> Decimal {
        let rate = if monthly_salary <= self.low_income_threshold {
            self.low_income_rate
        } else {
            self.rate
        };
        round_money(monthly_salary.min(self.max_fund_salary) * rate)
    }
}

/// Monthly withholding tax on `taxable` income using ascending brackets.
///
/// The highest bracket whose `over` is below the taxable amount applies.
pub fn withholding_tax(brackets: &[TaxBracket], taxable: Decimal) -> Decimal {
    brackets
        .iter()
        .rev()
        .find(|bracket| taxable > bracket.over)
        .map(|bracket| round_money(bracket.base_tax + (taxable - bracket.over) * bracket.rate))
        .unwrap_or(Decimal::ZERO)
}

impl ContributionTable for ContributionTables {
    /// # Example
    ///
    /// ```
    /// use payroll_engine::calculation::ContributionTable;
    /// use payroll_engine::config::ConfigLoader;
    /// use rust_decimal::Decimal;
    ///
    /// let loader = ConfigLoader::load("./config/default").unwrap();
    /// let amounts = loader
    ///     .config()
    ///     .contributions()
    ///     .statutory_amounts(Decimal::new(20000, 0));
    /// assert_eq!(amounts.sss, Decimal::new(900, 0));
    /// assert_eq!(amounts.withholding_tax, Decimal::ZERO);
    /// ```
    fn statutory_amounts(&self, monthly_salary: Decimal) -> StatutoryAmounts {
        if monthly_salary <= Decimal::ZERO {
            return StatutoryAmounts::default();
        }

        let sss = self.sss.contribution(monthly_salary);
        let philhealth = self.philhealth.contribution(monthly_salary);
        let pagibig = self.pagibig.contribution(monthly_salary);
        let taxable = (monthly_salary - sss - philhealth - pagibig).max(Decimal::ZERO);

        StatutoryAmounts {
            sss,
            philhealth,
            pagibig,
            withholding_tax: withholding_tax(&self.withholding_tax, taxable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn tables() -> ContributionTables {
        ConfigLoader::load("./config/default")
            .unwrap()
            .config()
            .contributions()
            .clone()
    }

    #[test]
    fn test_sss_credit_rounds_to_nearest_step() {
        let sss = tables().sss;
        assert_eq!(sss.salary_credit(dec("20240")), dec("20000"));
        assert_eq!(sss.salary_credit(dec("20250")), dec("20500"));
        assert_eq!(sss.salary_credit(dec("20260")), dec("20500"));
    }

    #[test]
    fn test_sss_credit_clamped() {
        let sss = tables().sss;
        assert_eq!(sss.salary_credit(dec("1000")), dec("4000"));
        assert_eq!(sss.salary_credit(dec("85000")), dec("30000"));
        assert_eq!(sss.contribution(dec("85000")), dec("1350.00"));
    }

    #[test]
    fn test_philhealth_floor_and_ceiling() {
        let philhealth = tables().philhealth;
        assert_eq!(philhealth.contribution(dec("8000")), dec("250.00"));
        assert_eq!(philhealth.contribution(dec("30000")), dec("750.00"));
        assert_eq!(philhealth.contribution(dec("150000")), dec("2500.00"));
    }

    #[test]
    fn test_pagibig_low_income_rate_and_cap() {
        let pagibig = tables().pagibig;
        assert_eq!(pagibig.contribution(dec("1500")), dec("15.00"));
        assert_eq!(pagibig.contribution(dec("5000")), dec("100.00"));
        assert_eq!(pagibig.contribution(dec("50000")), dec("200.00"));
    }

    #[test]
    fn test_withholding_tax_brackets() {
        let brackets = tables().withholding_tax;
        assert_eq!(withholding_tax(&brackets, dec("20833")), Decimal::ZERO);
        // 15% of the excess over 20833
        assert_eq!(withholding_tax(&brackets, dec("30833")), dec("1500.00"));
        // 1875 + 20% of the excess over 33333
        assert_eq!(withholding_tax(&brackets, dec("43333")), dec("3875.00"));
    }

    #[test]
    fn test_statutory_amounts_for_20000() {
        let amounts = tables().statutory_amounts(dec("20000"));
        assert_eq!(amounts.sss, dec("900.00"));
        assert_eq!(amounts.philhealth, dec("500.00"));
        assert_eq!(amounts.pagibig, dec("200.00"));
        assert_eq!(amounts.withholding_tax, Decimal::ZERO);
    }

    #[test]
    fn test_tax_is_computed_net_of_contributions() {
        let amounts = tables().statutory_amounts(dec("40000"));
        assert_eq!(amounts.sss, dec("1350.00"));
        assert_eq!(amounts.philhealth, dec("1000.00"));
        assert_eq!(amounts.pagibig, dec("200.00"));
        // taxable 37450: 1875 + (37450 - 33333) x 0.20
        assert_eq!(amounts.withholding_tax, dec("2698.40"));
    }

    #[test]
    fn test_zero_salary_has_no_contributions() {
        assert_eq!(
            tables().statutory_amounts(Decimal::ZERO),
            StatutoryAmounts::default()
        );
    }
}
