//! Logging and tracing initialization.
//!
//! Stdout is reserved for the status table, so log output goes to stderr
//! or to the configured log file.

use std::fs::{File, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::fmt::MakeWriter;

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber with the given configuration.
pub fn init_logging(config: &LoggingConfig) {
    match open_log_file(config) {
        Some(file) => install(config, Mutex::new(file), false),
        None => install(config, std::io::stderr, true),
    }
}

fn install<W>(config: &LoggingConfig, writer: W, ansi: bool)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(writer)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

fn open_log_file(config: &LoggingConfig) -> Option<File> {
    let path = config.file.as_ref()?;
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!(
                "rigscan: cannot open log file {}: {e}; logging to stderr",
                path.display()
            );
            None
        }
    }
}
