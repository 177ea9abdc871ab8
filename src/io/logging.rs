use std::fs;
use std::path::Path;

use tracing_subscriber::EnvFilter;

/// CLI mode: log to stderr, level taken from `RUST_LOG` (default: warn).
pub fn init_cli_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// TUI mode: stderr belongs to the terminal, so log to a file in the data
/// dir instead. Logging is best-effort; a failure to open the file only
/// means the session runs unlogged.
pub fn init_tui_logging(data_dir: &Path) {
    if fs::create_dir_all(data_dir).is_err() {
        return;
    }
    let Ok(file) = fs::File::options()
        .create(true)
        .append(true)
        .open(data_dir.join("ticklist.log"))
    else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
}
