use anyhow::Result;
use tracing::{debug, error, info, trace};

use super::initdb::connect_and_migrate;
use super::serve::run_server;
use crate::config::{initialize_app_state, AppConfig};

pub async fn migrate_and_serve(bind_override: Option<String>) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");

    let mut config = AppConfig::load()?;
    if let Some(bind_address) = bind_override {
        config.bind_address = bind_address;
    }
    debug!("Configuration: {:?}", config);

    // Fail on a missing secret before touching the schema
    config.jwt_secret()?;

    connect_and_migrate(&config.database_url).await?.close().await?;

    let state = match initialize_app_state(&config).await {
        Ok(state) => {
            debug!("Application state initialized successfully");
            state
        }
        Err(e) => {
            error!("Failed to initialize application state: {:#}", e);
            return Err(e);
        }
    };

    run_server(state, &config.bind_address).await
}
