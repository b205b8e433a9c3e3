use anyhow::Result;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use vms_camera_api::api::RestApi;
use vms_camera_api::config;
use vms_camera_api::messaging::BrokerConnection;
use vms_camera_api::services::CameraIngestService;

#[tokio::main]
async fn main() -> Result<()> {
    // Config path: first argument, then VMS_CONFIG
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("VMS_CONFIG").ok())
        .map(PathBuf::from);

    let mut config = config::load_config(config_path.as_deref())?;
    config::apply_env_overrides(&mut config)?;

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.api.log_level.as_str()),
    )
    .init();
    info!("Starting VMS camera API");

    // The broker is connected lazily on the first request.
    let broker = Arc::new(BrokerConnection::new(config.message_broker.clone()));
    info!(
        "Publishing to exchange {} on {}:{}",
        config.message_broker.exchange, config.message_broker.host, config.message_broker.port
    );

    let ingest = CameraIngestService::new(broker, &config.message_broker);
    RestApi::new(&config.api, &config.files.root, ingest).run().await?;

    info!("API server stopped");
    Ok(())
}
