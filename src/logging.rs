//! File logging for GUI applications.
//!
//! The GUI owns the terminal, so log output never goes to stdout or stderr.
//! [`init_file_logging`] routes `tracing` events to the file named by
//! [`GuiConfig::log_file`], filtered by [`GuiConfig::log_filter`].

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::GuiConfig;

/// Install a global subscriber writing to the configured log file.
///
/// Returns `false` when no file is configured, the file cannot be opened, or
/// a global subscriber is already installed.
pub fn init_file_logging(config: &GuiConfig) -> bool {
    let Some(path) = config.log_file.as_deref() else {
        return false;
    };
    let file = match open_log_file(path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("tape_gui: cannot open log file {}: {err}", path.display());
            return false;
        }
    };

    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(build_filter(&config.log_filter))
        .with(fmt_layer)
        .try_init()
        .is_ok()
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Parse `directives`, falling back to `warn` when they are malformed.
fn build_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("warn"))
}

#[cfg(test)]
mod tests {
    use super::{build_filter, init_file_logging};
    use crate::config::GuiConfig;

    #[test]
    fn no_log_file_means_no_subscriber() {
        assert!(!init_file_logging(&GuiConfig::default()));
    }

    #[test]
    fn malformed_filter_falls_back_to_warn() {
        assert_eq!(build_filter("tape_gui=[").to_string(), "warn");
        assert_eq!(build_filter("tape_gui=debug").to_string(), "tape_gui=debug");
    }
}
