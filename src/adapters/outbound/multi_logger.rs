use crate::domains::logger::DomainLogger;
use std::sync::Arc;

/// Forwards every message to a primary and an optional secondary logger.
pub struct MultiLogger {
    primary: Arc<dyn DomainLogger>,
    secondary: Option<Arc<dyn DomainLogger>>,
}

impl MultiLogger {
    pub fn new(primary: Arc<dyn DomainLogger>, secondary: Option<Arc<dyn DomainLogger>>) -> Self {
        Self { primary, secondary }
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        self.primary.info(msg);
        if let Some(sec) = &self.secondary {
            sec.info(msg);
        }
    }

    fn warn(&self, msg: &str) {
        self.primary.warn(msg);
        if let Some(sec) = &self.secondary {
            sec.warn(msg);
        }
    }

    fn error(&self, msg: &str) {
        self.primary.error(msg);
        if let Some(sec) = &self.secondary {
            sec.error(msg);
        }
    }
}

/// File logger via `fast_log`, with `extra` attached as a secondary sink.
/// Falls back to the console when the file cannot be opened.
pub fn init_combined_logger(
    path: &str,
    level: log::LevelFilter,
    extra: Option<Arc<dyn DomainLogger>>,
) -> Arc<dyn DomainLogger> {
    match crate::adapters::outbound::file_logger::init_file_logger(path, level) {
        Ok(file_logger) => Arc::new(MultiLogger::new(file_logger, extra)) as Arc<dyn DomainLogger>,
        Err(e) => {
            let console = crate::adapters::outbound::init_console_logger();
            console.warn(&format!("{}; logging to console only", e));
            console
        }
    }
}
