// Tracing setup, initialized once per process

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Mutex, Once};

use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

fn filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    EnvFilter::from_default_env().add_directive(
        format!("expense_ledger={}", level)
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into()),
    )
}

/// Log to stderr (CLI and server modes)
pub fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        fmt()
            .with_env_filter(filter(verbose))
            .with_writer(std::io::stderr)
            .init();
    });
}

/// Log to a file so the alternate screen of the TUI stays clean.
/// Falls back to discarding output if the file can't be opened.
pub fn init_file_tracing(path: &Path, verbose: bool) {
    TRACING_INIT.call_once(|| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => fmt()
                .with_env_filter(filter(verbose))
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init(),
            Err(_) => fmt()
                .with_env_filter(filter(verbose))
                .with_writer(std::io::sink)
                .init(),
        }
    });
}
