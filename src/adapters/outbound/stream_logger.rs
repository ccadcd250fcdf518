use crate::domains::logger::DomainLogger;
use std::sync::Arc;

/// Writes control-loop messages straight to the process streams, or nowhere.
enum StreamLogger {
    /// Info and warnings on stdout, errors on stderr.
    Console,
    Discard,
}

impl DomainLogger for StreamLogger {
    fn info(&self, msg: &str) {
        if let StreamLogger::Console = self {
            println!("[symctl] {}", msg);
        }
    }

    fn warn(&self, msg: &str) {
        if let StreamLogger::Console = self {
            println!("[symctl] WARN: {}", msg);
        }
    }

    fn error(&self, msg: &str) {
        if let StreamLogger::Console = self {
            eprintln!("[symctl] ERROR: {}", msg);
        }
    }
}

/// Used when the log file cannot be opened.
pub fn init_console_logger() -> Arc<dyn DomainLogger> {
    Arc::new(StreamLogger::Console)
}

/// Discards everything; default logger for protocol and selector tests.
pub fn init_noop_logger() -> Arc<dyn DomainLogger> {
    Arc::new(StreamLogger::Discard)
}
