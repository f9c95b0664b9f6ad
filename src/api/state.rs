//! Application state for the payroll API.

use std::sync::Arc;

use crate::error::{EngineError, EngineResult};
use crate::payroll::PayrollService;

/// Shared application state.
///
/// Holds the payroll service every handler works through.
#[derive(Clone)]
pub struct AppState {
    service: Arc<PayrollService>,
}

impl AppState {
    /// Creates a new application state around a payroll service.
    pub fn new(service: PayrollService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Returns the payroll service.
    pub fn service(&self) -> &PayrollService {
        &self.service
    }

    /// Runs a service call on tokio's blocking pool.
    ///
    /// Service calls are synchronous and run creation fans out over its own
    /// worker threads, so they stay off the async workers.
    pub async fn run_blocking<T, F>(&self, call: F) -> EngineResult<T>
    where
        F: FnOnce(&PayrollService) -> EngineResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || call(&service))
            .await
            .unwrap_or_else(|err| {
                Err(EngineError::Internal {
                    message: format!("payroll task failed: {}", err),
                })
            })
    }
}
