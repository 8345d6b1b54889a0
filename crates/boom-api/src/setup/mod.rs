//! Application setup and initialization
//!
//! Everything `main` needs to go from a loaded `Config` to a ready router, kept out of
//! the binary so it can be exercised from tests.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::state::{AppState, SecurityConfig};
use anyhow::{Context, Result};
use boom_core::Config;
use boom_db::PgMediaRecordStore;
use boom_infra::ReconciliationService;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    boom_infra::init_telemetry(config.log_json(), config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;
    let store = storage::setup_storage(&config).await?;
    let records = Arc::new(PgMediaRecordStore::new(pool));

    tokio::fs::create_dir_all(&config.upload().staging_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create staging directory {}",
                config.upload().staging_dir.display()
            )
        })?;

    let state = AppState::new(
        records.clone(),
        store.clone(),
        config.upload().clone(),
        SecurityConfig {
            jwt_secret: config.jwt_secret().to_string(),
            cors_origins: config.cors_origins().to_vec(),
        },
    );
    crate::error::set_production_mode(config.is_production());

    if config.reconcile().enabled {
        let service = Arc::new(ReconciliationService::new(
            records,
            store,
            config.upload(),
            config.reconcile().clone(),
        ));
        tracing::info!(
            interval_secs = service.interval().as_secs(),
            grace_period_secs = config.reconcile().grace_period.as_secs(),
            "Starting orphaned asset reconciliation"
        );
        service.start();
    } else {
        tracing::warn!("Reconciliation disabled; assets leaked by failed compensations will not be collected");
    }

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
