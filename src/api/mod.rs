//! HTTP API for the payroll engine.
//!
//! This module exposes payslip previews, the payroll run lifecycle, run
//! summaries and CSV exports as REST endpoints under `/payroll`.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{DeleteQuery, PreviewRequest, RunOptions, RunRequest, StatusRequest};
pub use response::{ApiError, ApiErrorResponse, CreatedResponse, RunResponse};
pub use state::AppState;
