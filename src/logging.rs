use std::fs::{self, OpenOptions};
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "nba_props_terminal.log";
const DEFAULT_FILTER: &str = "info,nba_props_terminal=debug";

/// File logging for the terminal UI, which owns stdout/stderr. Falls back to
/// no subscriber when the directory is not writable; keep the guard alive for
/// the life of the process.
pub fn init_file_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let dir = log_dir?;
    // rolling::daily panics if it cannot create the file, so probe first.
    if fs::create_dir_all(dir).is_err() {
        return None;
    }
    let probe = dir.join(".write_test");
    if OpenOptions::new()
        .create(true)
        .append(true)
        .open(&probe)
        .is_err()
    {
        return None;
    }
    let _ = fs::remove_file(&probe);

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .is_ok();
    installed.then_some(guard)
}

pub fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
