//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading payroll
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use tracing::info;

use crate::error::{EngineError, EngineResult};

use super::types::{ContributionTables, OrganizationConfig, PayrollConfig};

const ORGANIZATION_FILE: &str = "organization.yaml";
const CONTRIBUTIONS_FILE: &str = "contributions.yaml";

/// Loads and provides access to payroll configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── organization.yaml   # Rate settings and special-day premiums
/// └── contributions.yaml  # SSS, PhilHealth, Pag-IBIG and withholding tax tables
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Working days per year: {}", loader.config().settings().working_days_per_year);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: PayrollConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing (`ConfigNotFound`)
    /// - Any file contains invalid YAML or fails validation (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let organization_path = path.join(ORGANIZATION_FILE);
        let organization = Self::load_yaml::<OrganizationConfig>(&organization_path)?;

        let contributions_path = path.join(CONTRIBUTIONS_FILE);
        let contributions = Self::load_yaml::<ContributionTables>(&contributions_path)?;
        Self::validate_contributions(&contributions_path, &contributions)?;

        info!(
            organization = %organization.name,
            working_days_per_year = organization.settings.working_days_per_year.get(),
            tax_brackets = contributions.withholding_tax.len(),
            "Loaded payroll configuration"
        );

        Ok(Self {
            config: PayrollConfig::new(organization, contributions),
        })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: PayrollConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Rejects tables the contribution math cannot use.
    fn validate_contributions(path: &Path, tables: &ContributionTables) -> EngineResult<()> {
        let fail = |message: &str| EngineError::ConfigParseError {
            path: path.display().to_string(),
            message: message.to_string(),
        };

        if tables.sss.credit_step <= Decimal::ZERO {
            return Err(fail("sss.credit_step must be positive"));
        }
        if tables.sss.min_salary_credit > tables.sss.max_salary_credit {
            return Err(fail("sss.min_salary_credit exceeds sss.max_salary_credit"));
        }
        if tables.philhealth.income_floor > tables.philhealth.income_ceiling {
            return Err(fail("philhealth.income_floor exceeds philhealth.income_ceiling"));
        }
        if tables.withholding_tax.is_empty() {
            return Err(fail("withholding_tax needs at least one bracket"));
        }

        Ok(())
    }

    /// Returns the underlying payroll configuration.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }
}
