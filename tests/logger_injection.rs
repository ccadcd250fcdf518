mod common;

use std::sync::Arc;
use std::time::Duration;

use common::CaptureLogger;
use symctl::adapters::outbound::{init_buffered_logger, init_combined_logger, init_noop_logger, LoggingActuator, MultiLogger};
use symctl::domains::actuation::{Actuator, ControlAction};
use symctl::domains::logger::DomainLogger;

#[tokio::test]
async fn test_buffered_and_noop_logger() {
    let capture = Arc::new(CaptureLogger::new());
    let bridge = capture.clone() as Arc<dyn DomainLogger>;

    let buffered = init_buffered_logger(bridge, 8);
    buffered.info("one");
    buffered.warn("two");
    buffered.error("three");

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(capture.contains("INFO:one"));
    assert!(capture.contains("WARN:two"));
    assert!(capture.contains("ERR:three"));

    let noop = init_noop_logger();
    noop.info("ignored");
    noop.error("ignored-err");
}

#[tokio::test]
async fn multi_logger_fans_out_to_the_secondary_sink() {
    let primary = Arc::new(CaptureLogger::new());
    let secondary = Arc::new(CaptureLogger::new());
    let multi = MultiLogger::new(primary.clone(), Some(secondary.clone() as Arc<dyn DomainLogger>));

    multi.warn("target lost");

    assert!(primary.contains("WARN:target lost"));
    assert!(secondary.contains("WARN:target lost"));
}

#[tokio::test]
async fn combined_logger_always_yields_a_usable_sink() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("symctl.log");
    // a second init in the same process fails inside fast_log and falls back to the console
    for _ in 0..2 {
        let logger = init_combined_logger(path.to_str().unwrap(), log::LevelFilter::Info, None);
        logger.info("still logging");
    }
}

#[tokio::test]
async fn logging_actuator_reports_and_remembers_actions() {
    let capture = Arc::new(CaptureLogger::new());
    let actuator = LoggingActuator::new("DeepRacer1", capture.clone());

    actuator
        .emit(&ControlAction::Drive { steering: 0.5, throttle: -0.25 })
        .await
        .unwrap();
    assert!(capture.contains("DeepRacer1 <- steering = 0.5, throttle = -0.25"));

    actuator.emit(&ControlAction::Stop).await.unwrap();
    assert_eq!(actuator.last_emitted(), Some(ControlAction::Stop));
    assert!(capture.contains("DeepRacer1 <- stop"));
}
