use std::error::Error;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use symctl::adapters::outbound::{
    init_buffered_logger, init_combined_logger, HttpEndpoint, LoggingActuator,
    RestLocalizationSource, RetryingTransport,
};
use symctl::application::{ControlCycleOrchestrator, ControlLoop, CycleSettings};
use symctl::domains::selection::ActionSelector;
use symctl::domains::synthesis::SynthesisProtocolClient;
use symctl::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = Config::load(&path)?;
    if let Err(e) = config.validate() {
        error!("invalid configuration in {}: {}", path, e);
        return Err(e.into());
    }
    info!("configuration loaded from {}", path);

    let logger = init_buffered_logger(
        init_combined_logger(&config.logging.file, config.log_level()?, None),
        config.logging.buffer_capacity,
    );

    let localization_endpoint = Arc::new(HttpEndpoint::new(
        config.localization.url.clone(),
        config.synthesis.write_method,
    ));
    let synthesis_endpoint = Arc::new(HttpEndpoint::new(
        config.synthesis.url.clone(),
        config.synthesis.write_method,
    ));

    let localization = Arc::new(RestLocalizationSource::new(Arc::new(
        RetryingTransport::for_localization(localization_endpoint, &config, logger.clone()),
    )));
    let synthesis = SynthesisProtocolClient::new(
        Arc::new(RetryingTransport::for_synthesis(synthesis_endpoint, &config, logger.clone())),
        config.protocol_settings(),
        logger.clone(),
    );
    let selector = ActionSelector::new(config.selection.policy, logger.clone());
    let actuator = Arc::new(LoggingActuator::new(config.robot.name.clone(), logger.clone()));

    let orchestrator = ControlCycleOrchestrator::new(
        localization,
        synthesis,
        selector,
        config.calibration(),
        actuator,
        CycleSettings::from_config(&config),
        logger.clone(),
    );
    let mut control = ControlLoop::new(orchestrator, config.control.cycle_interval(), logger.clone());

    info!(
        "controlling {} (localization {}, synthesis {})",
        config.robot.name, config.localization.url, config.synthesis.url
    );
    control.probe().await;

    let summary = control
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for ctrl-c: {}", e);
            }
        })
        .await;

    info!(
        "shutting down after {} cycle(s), session closed: {}",
        summary.cycles, summary.session_closed
    );
    Ok(())
}
