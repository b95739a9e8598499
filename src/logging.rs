//! Per-run log file plus console output.
//!
//! Every run writes `listingwatch_<YYYYmmdd_HHMMSS>.log` into the log directory
//! and mirrors each line to the terminal.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

pub fn log_file_path(dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("listingwatch_{}.log", timestamp))
}

fn create_file_logger(
    level: LevelFilter,
    config: Config,
    dir: &Path,
) -> io::Result<(PathBuf, Box<WriteLogger<File>>)> {
    fs::create_dir_all(dir)?;
    let path = log_file_path(dir);
    let file = File::create(&path)?;
    Ok((path, WriteLogger::new(level, config, file)))
}

/// Install the global logger. Returns the log file path, or `None` if only the
/// console could be set up.
pub fn initialize(dir: &Path, debug: bool) -> Option<PathBuf> {
    let level = if debug { LevelFilter::Debug } else { LevelFilter::Info };
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    let path = match create_file_logger(level, config, dir) {
        Ok((path, file_logger)) => {
            loggers.push(file_logger);
            Some(path)
        }
        Err(err) => {
            eprintln!("Warning: Could not create log file in {:?}: {}", dir, err);
            None
        }
    };

    let _ = CombinedLogger::init(loggers);
    path
}

/// Terminal-only logger for tests; safe to call more than once.
pub fn init_for_tests() {
    let _ = CombinedLogger::init(vec![TermLogger::new(
        LevelFilter::Debug,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
