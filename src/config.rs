//! Environment configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_IDLE_SLEEP: Duration = Duration::from_millis(1);
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuiConfig {
    /// Draw the process memory usage in the bottom-right corner.
    pub show_memory_usage: bool,
    /// How long an event loop sleeps when an iteration did nothing.
    pub idle_sleep: Duration,
    /// Log file; logging stays off when unset.
    pub log_file: Option<PathBuf>,
    /// `tracing` filter directives for the log file.
    pub log_filter: String,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            show_memory_usage: false,
            idle_sleep: DEFAULT_IDLE_SLEEP,
            log_file: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl GuiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            show_memory_usage: env_flag("TAPE_GUI_SHOW_MEMORY"),
            idle_sleep: env_millis("TAPE_GUI_IDLE_SLEEP_MS").unwrap_or(defaults.idle_sleep),
            log_file: env_string_opt("TAPE_GUI_LOG").map(PathBuf::from),
            log_filter: env_string_opt("TAPE_GUI_LOG_FILTER").unwrap_or(defaults.log_filter),
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_millis(key: &str) -> Option<Duration> {
    let value = env_string_opt(key)?;
    match value.trim().parse::<u64>() {
        Ok(millis) => Some(Duration::from_millis(millis)),
        Err(_) => {
            tracing::warn!(key, value = %value, "ignoring non-numeric millisecond setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GuiConfig;
    use std::env;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn unset_environment_yields_defaults() {
        let _lock = env_lock();
        let _g1 = set_env_guard("TAPE_GUI_SHOW_MEMORY", None);
        let _g2 = set_env_guard("TAPE_GUI_IDLE_SLEEP_MS", None);
        let _g3 = set_env_guard("TAPE_GUI_LOG", None);
        let _g4 = set_env_guard("TAPE_GUI_LOG_FILTER", None);

        assert_eq!(GuiConfig::from_env(), GuiConfig::default());
        assert_eq!(GuiConfig::default().idle_sleep, Duration::from_millis(1));
        assert_eq!(GuiConfig::default().log_filter, "warn");
    }

    #[test]
    fn environment_overrides_every_field() {
        let _lock = env_lock();
        let _g1 = set_env_guard("TAPE_GUI_SHOW_MEMORY", Some("1"));
        let _g2 = set_env_guard("TAPE_GUI_IDLE_SLEEP_MS", Some("25"));
        let _g3 = set_env_guard("TAPE_GUI_LOG", Some("/tmp/tape-gui.log"));
        let _g4 = set_env_guard("TAPE_GUI_LOG_FILTER", Some("tape_gui=debug"));

        let config = GuiConfig::from_env();
        assert!(config.show_memory_usage);
        assert_eq!(config.idle_sleep, Duration::from_millis(25));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/tape-gui.log")));
        assert_eq!(config.log_filter, "tape_gui=debug");
    }

    #[test]
    fn blank_or_malformed_values_are_ignored() {
        let _lock = env_lock();
        let _g1 = set_env_guard("TAPE_GUI_SHOW_MEMORY", Some("yes"));
        let _g2 = set_env_guard("TAPE_GUI_IDLE_SLEEP_MS", Some("soon"));
        let _g3 = set_env_guard("TAPE_GUI_LOG", Some("  "));

        let config = GuiConfig::from_env();
        assert!(!config.show_memory_usage);
        assert_eq!(config.idle_sleep, Duration::from_millis(1));
        assert!(config.log_file.is_none());
    }
}
