//! Logging utilities
//!
//! Provides logging setup and configuration.

use chrono::{Local, NaiveDate};
use env_logger::{Builder, Env, Target};
use log::{info, warn};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// `server.YYYY.MM.DD.log`
pub fn log_file_name(date: NaiveDate) -> String {
    format!("server.{}.log", date.format("%Y.%m.%d"))
}

/// Open (append) today's log file under `log_dir`
fn open_log_file(log_dir: &Path) -> std::io::Result<(fs::File, PathBuf)> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(log_file_name(Local::now().date_naive()));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}

/// Setup logging for the server.
///
/// `RUST_LOG` controls the filter, defaulting to `info`. With a log
/// directory, output goes to today's log file; if the file cannot be opened
/// logging stays on stderr.
pub fn setup_logging(log_dir: Option<&Path>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    let opened = log_dir.map(|dir| (dir, open_log_file(dir)));
    let mut failure = None;
    let mut log_path = None;

    match opened {
        Some((_, Ok((file, path)))) => {
            builder.target(Target::Pipe(Box::new(file)));
            log_path = Some(path);
        }
        Some((dir, Err(e))) => failure = Some((dir.display().to_string(), e)),
        None => {}
    }

    builder.init();

    if let Some(path) = log_path {
        info!("Logging to {}", path.display());
    }
    if let Some((dir, e)) = failure {
        warn!("Failed to open log file in {}: {}; logging to stderr", dir, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_named_by_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(log_file_name(date), "server.2024.03.05.log");
    }

    #[test]
    fn log_file_is_created_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");

        let (_file, path) = open_log_file(&logs).unwrap();
        assert!(path.starts_with(&logs));
        assert!(path.exists());
    }
}
