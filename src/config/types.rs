//! Configuration types for payroll computation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default number of paid working days per year used to derive daily rates.
pub const DEFAULT_WORKING_DAYS_PER_YEAR: u32 = 261;

fn default_working_days_per_year() -> NonZeroU32 {
    NonZeroU32::new(DEFAULT_WORKING_DAYS_PER_YEAR).unwrap_or(NonZeroU32::MIN)
}

/// Organization-wide rate computation settings.
///
/// Passed explicitly into the rate resolver so computations never read
/// ambient state.
///
/// # Example
///
/// ```
/// use payroll_engine::config::OrganizationSettings;
///
/// let settings = OrganizationSettings::default();
/// assert!(!settings.daily_rate_includes_allowance);
/// assert_eq!(settings.working_days_per_year.get(), 261);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationSettings {
    /// Whether the monthly allowance is part of the daily rate.
    #[serde(default)]
    pub daily_rate_includes_allowance: bool,
    /// Paid working days per year (the daily rate divisor).
    #[serde(default = "default_working_days_per_year")]
    pub working_days_per_year: NonZeroU32,
}

impl Default for OrganizationSettings {
    fn default() -> Self {
        Self {
            daily_rate_includes_allowance: false,
            working_days_per_year: default_working_days_per_year(),
        }
    }
}

/// Premium multipliers applied to the hourly rate for special-day work.
///
/// The multipliers are the premium on top of what basic pay already covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPremiums {
    /// Premium for work on a regular holiday.
    pub regular_holiday: Decimal,
    /// Premium for work on a special non-working day.
    pub special_holiday: Decimal,
    /// Premium for work on a rest day.
    pub rest_day: Decimal,
}

impl Default for PayPremiums {
    fn default() -> Self {
        Self {
            regular_holiday: Decimal::ONE,
            special_holiday: Decimal::new(30, 2),
            rest_day: Decimal::new(130, 2),
        }
    }
}

/// Organization configuration file structure (`organization.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationConfig {
    /// Organization display name.
    pub name: String,
    /// Rate computation settings.
    #[serde(default)]
    pub settings: OrganizationSettings,
    /// Special-day premiums.
    #[serde(default)]
    pub premiums: PayPremiums,
}

/// Social Security System contribution table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SssTable {
    /// Employee share of the monthly salary credit.
    pub employee_rate: Decimal,
    /// Lowest monthly salary credit.
    pub min_salary_credit: Decimal,
    /// Highest monthly salary credit.
    pub max_salary_credit: Decimal,
    /// Width of each salary credit bracket.
    pub credit_step: Decimal,
}

/// PhilHealth premium table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhilHealthTable {
    /// Total premium rate on the monthly basic salary.
    pub premium_rate: Decimal,
    /// Salary floor for premium computation.
    pub income_floor: Decimal,
    /// Salary ceiling for premium computation.
    pub income_ceiling: Decimal,
    /// Portion of the premium paid by the employee.
    pub employee_share: Decimal,
}

/// Pag-IBIG fund contribution table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagIbigTable {
    /// Salaries at or below this use `low_income_rate`.
    pub low_income_threshold: Decimal,
    /// Employee rate for low salaries.
    pub low_income_rate: Decimal,
    /// Employee rate otherwise.
    pub rate: Decimal,
    /// Maximum salary subject to contribution.
    pub max_fund_salary: Decimal,
}

/// One withholding tax bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// The bracket applies to taxable income above this amount.
    pub over: Decimal,
    /// Fixed tax for the bracket.
    pub base_tax: Decimal,
    /// Rate on the excess over `over`.
    pub rate: Decimal,
}

/// Statutory contribution tables file structure (`contributions.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionTables {
    /// SSS table.
    pub sss: SssTable,
    /// PhilHealth table.
    pub philhealth: PhilHealthTable,
    /// Pag-IBIG table.
    pub pagibig: PagIbigTable,
    /// Monthly withholding tax brackets, ascending by `over`.
    pub withholding_tax: Vec<TaxBracket>,
}

/// The complete payroll configuration loaded from YAML files.
#[derive(Debug, Clone)]
pub struct PayrollConfig {
    organization: OrganizationConfig,
    contributions: ContributionTables,
}

impl PayrollConfig {
    /// Creates a new PayrollConfig from its component parts.
    ///
    /// Tax brackets are sorted by their lower bound.
    pub fn new(organization: OrganizationConfig, contributions: ContributionTables) -> Self {
        let mut contributions = contributions;
        contributions
            .withholding_tax
            .sort_by(|a, b| a.over.cmp(&b.over));
        Self {
            organization,
            contributions,
        }
    }

    /// Returns the organization configuration.
    pub fn organization(&self) -> &OrganizationConfig {
        &self.organization
    }

    /// Returns the rate computation settings.
    pub fn settings(&self) -> OrganizationSettings {
        self.organization.settings
    }

    /// Returns the special-day premiums.
    pub fn premiums(&self) -> PayPremiums {
        self.organization.premiums
    }

    /// Returns the statutory contribution tables.
    pub fn contributions(&self) -> &ContributionTables {
        &self.contributions
    }
}
