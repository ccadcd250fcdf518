use chrono::Utc;
use log::{error as log_error, info as log_info, warn as log_warn};
use std::sync::Arc;

/// Logging port the control domain writes through.
/// Non-fallible from the caller's side so a broken sink never aborts a cycle.
pub trait DomainLogger: Send + Sync + 'static {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

pub type DynLogger = Arc<dyn DomainLogger>;

/// `fast_log`-backed sink writing to the console and a log file.
pub struct FileLogger;

impl FileLogger {
    pub fn init(path: &str, level: log::LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
        fast_log::init(fast_log::config::Config::new().console().file(path).level(level))?;
        Ok(())
    }
}

impl DomainLogger for FileLogger {
    fn info(&self, msg: &str) {
        log_info!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn warn(&self, msg: &str) {
        log_warn!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn error(&self, msg: &str) {
        log_error!("{} - {}", Utc::now().to_rfc3339(), msg);
    }
}
