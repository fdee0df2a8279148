use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

// @module: Console logger shared by the server and the CLI client

/// Coloured stderr logger with millisecond timestamps
pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    // @creates: New logger with specified level
    pub fn new(level: LevelFilter) -> Self {
        ConsoleLogger { level }
    }

    /// Install as the global logger
    ///
    /// The level can be changed later with `log::set_max_level`.
    pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(ConsoleLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and short tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERR"),
            Level::Warn => ("\x1B[1;33m", "WRN"),
            Level::Info => ("\x1B[1;32m", "INF"),
            Level::Debug => ("\x1B[1;36m", "DBG"),
            Level::Trace => ("\x1B[1;35m", "TRC"),
        }
    }

    /// Render one log line without the trailing newline
    pub fn format_line(level: Level, timestamp: &str, message: &str) -> String {
        let (colour, tag) = Self::style_for_level(level);
        format!("{}{} {} {}\x1B[0m", colour, timestamp, tag, message)
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        // The global max level may have been raised after init
        metadata.level() <= self.level.max(log::max_level())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f").to_string();
            let line = Self::format_line(record.level(), &now, &record.args().to_string());
            let _ = writeln!(std::io::stderr(), "{}", line);
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
