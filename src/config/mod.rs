//! Configuration loading and management for the payroll engine.
//!
//! This module loads organization rate settings, special-day premiums and the
//! statutory contribution tables from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Loaded organization: {}", config.config().organization().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    ContributionTables, DEFAULT_WORKING_DAYS_PER_YEAR, OrganizationConfig, OrganizationSettings,
    PagIbigTable, PayPremiums, PayrollConfig, PhilHealthTable, SssTable, TaxBracket,
};
