use super::commands::Cli;
use certfeed_daemon::config::{DaemonConfig, LoggingConfig};
use certfeed_types::{CertfeedError, CertfeedResult, CourseId};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_logging(cli: &Cli, logging: &LoggingConfig) -> CertfeedResult<()> {
    let level = if cli.quiet {
        "warn".to_string()
    } else {
        match cli.verbose {
            0 => logging.level.to_string(),
            1 => "info,certfeed_daemon=debug,certfeed=debug".to_string(),
            2 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    let log_file = cli.log_file.as_ref().or(logging.file.as_ref());
    let result = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| CertfeedError::Config(format!("Failed to open log file: {}", e)))?;
            let writer = std::sync::Mutex::new(file);
            if logging.json {
                subscriber.with(fmt::layer().json().with_writer(writer)).try_init()
            } else {
                subscriber
                    .with(fmt::layer().with_writer(writer).with_ansi(false))
                    .try_init()
            }
        }
        None if logging.json => subscriber.with(fmt::layer().json()).try_init(),
        None => subscriber
            .with(fmt::layer().with_target(cli.verbose >= 2))
            .try_init(),
    };

    result.map_err(|e| CertfeedError::Internal(format!("Failed to initialise logging: {}", e)))
}

/// Config file (or defaults) with env overrides, then `--data-dir`.
pub fn load_config(config_path: &Path, data_dir: Option<&PathBuf>) -> CertfeedResult<DaemonConfig> {
    let mut config = DaemonConfig::load(config_path)?;
    if let Some(dir) = data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

pub fn parse_course(s: &str) -> CertfeedResult<CourseId> {
    CourseId::from_str(s)
}

pub fn print_json<T: Serialize>(value: &T) -> CertfeedResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CertfeedError::Serialization(e.to_string()))?;
    println!("{}", text);
    Ok(())
}
