use std::env;
use std::sync::Arc;

use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::ConfigLoader;
use payroll_engine::payroll::{
    Collaborators, InMemoryAttendanceStore, InMemoryCostLedger, InMemoryEmployeeDirectory,
    InMemoryPayrollRepository, PayrollService,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_DIR: &str = "./config/default";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_dir = env::var("PAYROLL_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.into());
    let bind_addr = env::var("PAYROLL_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into());

    info!(config_dir = %config_dir, "Loading payroll configuration");
    let config = ConfigLoader::load(&config_dir)?;

    let collaborators = Collaborators {
        employees: Arc::new(InMemoryEmployeeDirectory::new()),
        attendance: Arc::new(InMemoryAttendanceStore::new()),
        contributions: Arc::new(config.config().contributions().clone()),
        ledger: Arc::new(InMemoryCostLedger::new()),
        repository: Arc::new(InMemoryPayrollRepository::new()),
    };
    let service = PayrollService::from_config(collaborators, config.config());
    let app = create_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(bind_addr = %bind_addr, "Payroll engine listening");
    axum::serve(listener, app).await?;

    Ok(())
}
