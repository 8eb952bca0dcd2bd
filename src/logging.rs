use chrono::Local;
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::OnceLock;

/// Debug topics understood by `--debug-filter`
pub const TOPICS: [&str; 4] = ["ui", "world", "physics", "stats"];

#[derive(Debug)]
struct TinyWheelsLogger {
    level: LevelFilter,
    debug_filters: Option<HashSet<String>>,
}

impl TinyWheelsLogger {
    fn topic_enabled(&self, target: &str) -> bool {
        match &self.debug_filters {
            Some(filters) => {
                filters.contains(target) || filters.iter().any(|f| target.starts_with(f.as_str()))
            }
            None => true,
        }
    }
}

impl log::Log for TinyWheelsLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if metadata.level() > self.level {
            return false;
        }
        // Filters only narrow down debug and trace output
        match metadata.level() {
            log::Level::Debug | log::Level::Trace => self.topic_enabled(metadata.target()),
            _ => true,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level_color = match record.level() {
            log::Level::Error => "\x1B[31m",
            log::Level::Warn => "\x1B[33m",
            log::Level::Info => "\x1B[32m",
            log::Level::Debug => "\x1B[36m",
            log::Level::Trace => "\x1B[35m",
        };
        let reset = "\x1B[0m";
        let timestamp = Local::now().format("%H:%M:%S%.3f");

        let mut output = format!(
            "{timestamp} {level_color}{level:5}{reset} {target}: {message}",
            level = record.level(),
            target = record.target(),
            message = record.args()
        );
        if let Some(module_path) = record.module_path() {
            if module_path != record.target() {
                output.push_str(&format!(" [{}]", module_path));
            }
        }

        let mut stdout = io::stdout().lock();
        // A closed stdout is not worth aborting the game for
        let _ = writeln!(stdout, "{}", output);
        let _ = stdout.flush();
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
    }
}

static LOGGER: OnceLock<TinyWheelsLogger> = OnceLock::new();

/// Installs the logger. `debug_filter` is a comma separated topic list.
pub fn init_logger(level: LevelFilter, debug_filter: Option<String>) -> Result<(), SetLoggerError> {
    let debug_filters = debug_filter.map(|filter_str| {
        filter_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<HashSet<String>>()
    });
    let logger = LOGGER.get_or_init(|| TinyWheelsLogger {
        level,
        debug_filters,
    });
    log::set_logger(logger).map(|()| log::set_max_level(level))
}

#[macro_export]
macro_rules! debug_ui {
    ($($arg:tt)*) => {
        log::debug!(target: "ui", "{}", format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_world {
    ($($arg:tt)*) => {
        log::debug!(target: "world", "{}", format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_physics {
    ($($arg:tt)*) => {
        log::debug!(target: "physics", "{}", format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_stats {
    ($($arg:tt)*) => {
        log::debug!(target: "stats", "{}", format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log};

    fn metadata(level: Level, target: &str) -> Metadata<'_> {
        Metadata::builder().level(level).target(target).build()
    }

    #[test]
    fn test_debug_filter_limits_topics() {
        let logger = TinyWheelsLogger {
            level: LevelFilter::Debug,
            debug_filters: Some(["world".to_string()].into_iter().collect()),
        };
        assert!(logger.enabled(&metadata(Level::Debug, "world")));
        assert!(!logger.enabled(&metadata(Level::Debug, "ui")));
        // Errors always pass the topic filter
        assert!(logger.enabled(&metadata(Level::Error, "ui")));
        assert!(!logger.enabled(&metadata(Level::Trace, "world")));
    }
}
