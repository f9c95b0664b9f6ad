//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every error condition that can occur while computing payslips or
//! moving a payroll run through its lifecycle.

use thiserror::Error;
use uuid::Uuid;

use crate::models::PayrollStatus;

/// The main error type for the payroll engine.
///
/// All operations in the engine return this error type. Each variant carries
/// enough context (employee ID, run ID, field) for a caller to render a
/// specific message.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::Validation {
///     field: "employee_ids".to_string(),
///     message: "at least one employee is required".to_string(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Invalid field 'employee_ids': at least one employee is required"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed or failed validation.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Input had the wrong shape (empty employee list, inverted cutoff, ...).
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// A mutation was attempted on a run that is not in the required status.
    #[error("Cannot {operation} payroll run {run_id} while it is {status}")]
    InvalidState {
        /// The run that was targeted.
        run_id: Uuid,
        /// The run's current status.
        status: PayrollStatus,
        /// The rejected operation (e.g. "edit").
        operation: String,
    },

    /// A status change that the run lifecycle does not allow.
    #[error("Payroll run {run_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// The run that was targeted.
        run_id: Uuid,
        /// The run's current status.
        from: PayrollStatus,
        /// The requested status.
        to: PayrollStatus,
    },

    /// Another lifecycle operation on the same run has not finished yet.
    #[error("Cannot {operation} payroll run {run_id}: another change to it is in progress")]
    RunBusy {
        /// The run that was targeted.
        run_id: Uuid,
        /// The rejected operation (e.g. "delete").
        operation: String,
    },

    /// The employee directory has no record for the ID.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The unknown employee ID.
        employee_id: String,
    },

    /// No payroll run exists with the ID.
    #[error("Payroll run not found: {run_id}")]
    PayrollRunNotFound {
        /// The unknown run ID.
        run_id: Uuid,
    },

    /// Data needed to compute a payslip for an employee is missing or invalid.
    #[error("Cannot compute payslip for employee '{employee_id}': {message}")]
    Computation {
        /// The employee whose payslip failed.
        employee_id: String,
        /// A description of what was missing.
        message: String,
    },

    /// A background task running engine work did not complete.
    #[error("Internal error: {message}")]
    Internal {
        /// A description of the failure.
        message: String,
    },

    /// Writing an export artifact failed.
    #[error("Export failed: {message}")]
    Export {
        /// A description of the failure.
        message: String,
    },
}

impl EngineError {
    /// Shorthand for a [`EngineError::Validation`] error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`EngineError::Computation`] error.
    pub fn computation(employee_id: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Computation {
            employee_id: employee_id.into(),
            message: message.into(),
        }
    }
}

impl From<csv::Error> for EngineError {
    fn from(error: csv::Error) -> Self {
        EngineError::Export {
            message: error.to_string(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/file.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/file.yaml"
        );
    }

    #[test]
    fn test_validation_displays_field_and_message() {
        let error = EngineError::validation("cutoff_end", "must not be before cutoff_start");
        assert_eq!(
            error.to_string(),
            "Invalid field 'cutoff_end': must not be before cutoff_start"
        );
    }

    #[test]
    fn test_invalid_state_displays_status_and_operation() {
        let run_id = Uuid::nil();
        let error = EngineError::InvalidState {
            run_id,
            status: PayrollStatus::Finalized,
            operation: "edit".to_string(),
        };
        assert_eq!(
            error.to_string(),
            format!("Cannot edit payroll run {} while it is finalized", run_id)
        );
    }

    #[test]
    fn test_invalid_transition_displays_both_statuses() {
        let run_id = Uuid::nil();
        let error = EngineError::InvalidTransition {
            run_id,
            from: PayrollStatus::Draft,
            to: PayrollStatus::Paid,
        };
        assert_eq!(
            error.to_string(),
            format!("Payroll run {} cannot move from draft to paid", run_id)
        );
    }

    #[test]
    fn test_run_busy_displays_operation() {
        let run_id = Uuid::nil();
        let error = EngineError::RunBusy {
            run_id,
            operation: "delete".to_string(),
        };
        assert_eq!(
            error.to_string(),
            format!(
                "Cannot delete payroll run {}: another change to it is in progress",
                run_id
            )
        );
    }

    #[test]
    fn test_computation_error_displays_employee() {
        let error = EngineError::computation("emp_007", "missing compensation profile");
        assert_eq!(
            error.to_string(),
            "Cannot compute payslip for employee 'emp_007': missing compensation profile"
        );
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_not_found() -> EngineResult<()> {
            Err(EngineError::EmployeeNotFound {
                employee_id: "emp_404".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_not_found()?;
            Ok(())
        }

        assert!(matches!(
            propagates_error(),
            Err(EngineError::EmployeeNotFound { .. })
        ));
    }
}
