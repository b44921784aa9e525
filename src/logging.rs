use anyhow::Result;
use log::{LevelFilter, Metadata, Record};
use ringlog::{Drain, File, LogBuilder, MultiLogBuilder, Output, Stderr};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::LogConfig;

/// Maximum log file size before rotation (10MB)
const LOG_FILE_MAX_SIZE: u64 = 1024 * 1024 * 10;

const FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Parse filter strings like "reqwest=warn" into module prefix -> level.
/// Entries without `=` or with an unknown level are ignored.
pub fn parse_log_filters(filters: &[String]) -> HashMap<String, LevelFilter> {
    let mut map = HashMap::new();
    for filter in filters {
        if let Some((module, level)) = filter.split_once('=') {
            let level_filter = match level.trim().to_lowercase().as_str() {
                "error" => LevelFilter::Error,
                "warn" => LevelFilter::Warn,
                "info" => LevelFilter::Info,
                "debug" => LevelFilter::Debug,
                "trace" => LevelFilter::Trace,
                "off" => LevelFilter::Off,
                _ => continue,
            };
            map.insert(module.trim().to_string(), level_filter);
        }
    }
    map
}

/// Longest matching module prefix wins; unmatched targets pass.
fn should_log(metadata: &Metadata, filters: &HashMap<String, LevelFilter>) -> bool {
    let target = metadata.target();

    filters
        .iter()
        .filter(|(prefix, _)| target.starts_with(prefix.as_str()))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, level)| metadata.level() <= *level)
        .unwrap_or(true)
}

struct FilteredLogger {
    output: Mutex<Box<dyn Output>>,
    max_level: LevelFilter,
    filters: HashMap<String, LevelFilter>,
}

impl log::Log for FilteredLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level && should_log(metadata, &self.filters)
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata())
            && let Ok(mut output) = self.output.lock()
        {
            let message = format!("{} {}\n", record.level(), record.args());
            let _ = output.write_all(message.as_bytes());
        }
    }

    fn flush(&self) {
        if let Ok(mut output) = self.output.lock() {
            let _ = output.flush();
        }
    }
}

/// Periodically flushes the ringlog drain on a background thread.
///
/// Dropping the flusher stops the thread after a final flush.
struct LogFlusher {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl LogFlusher {
    fn start(mut drain: Box<dyn Drain>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = std::thread::spawn(move || {
            while flag.load(Ordering::Relaxed) {
                let _ = drain.flush();
                std::thread::sleep(FLUSH_INTERVAL);
            }
            let _ = drain.flush();
        });

        Self {
            running,
            handle: Some(handle),
        }
    }
}

impl Drop for LogFlusher {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Flushes buffered log output when dropped.
///
/// Hold it for the life of the program.
pub struct LogGuard {
    flusher: Option<LogFlusher>,
    logger: Option<&'static dyn log::Log>,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        // Stops and joins the drain thread after its final flush
        self.flusher.take();
        if let Some(logger) = self.logger {
            logger.flush();
        }
    }
}

/// Install the global logger.
///
/// Logs go to stderr, or to `trace_log` with rotation when set. With
/// per-module filters the logger writes directly instead of through a
/// ringlog drain.
pub fn init(config: &LogConfig, trace_log: Option<&Path>) -> Result<LogGuard> {
    let level = config.level.to_level_filter();

    let output: Box<dyn Output> = match trace_log {
        Some(log_file) => {
            let backup_file = log_file.with_extension("old");
            Box::new(File::new(log_file.to_path_buf(), backup_file, LOG_FILE_MAX_SIZE)?)
        }
        None => Box::new(Stderr::new()),
    };

    let filters = parse_log_filters(&config.filter);

    if filters.is_empty() {
        let base_log = LogBuilder::new()
            .output(output)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to initialize logger: {:?}", e))?;

        let drain = MultiLogBuilder::new()
            .level_filter(level)
            .default(base_log)
            .build()
            .start();

        Ok(LogGuard {
            flusher: Some(LogFlusher::start(drain)),
            logger: None,
        })
    } else {
        let logger: &'static FilteredLogger = Box::leak(Box::new(FilteredLogger {
            output: Mutex::new(output),
            max_level: level,
            filters,
        }));

        log::set_logger(logger)?;
        log::set_max_level(level);
        Ok(LogGuard {
            flusher: None,
            logger: Some(logger),
        })
    }
}
