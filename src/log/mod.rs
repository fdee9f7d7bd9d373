//! Structured, module-filterable logging for the simulation engine's internal diagnostics.
//!
//! This is not the same thing as the [`crate::report`] module's reporting: logging is for
//! developers debugging the engine, reporting is the model-level CSV output consumed by
//! downstream analysis.
//!
//! (Re)exports the five logging macros `error!`, `warn!`, `info!`, `debug!`, `trace!`, where
//! `error!` is highest priority and `trace!` lowest. Logging is disabled by default; enable it
//! with `enable_logging()`, `set_log_level()`, or the CLI's `--v=<int>` flag. Per-module
//! filters are set with `set_module_filter()` / `set_module_filters()`.
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};
use std::collections::hash_map::Entry;

use crate::HashMap;
#[cfg(feature = "logging")]
use log4rs::Handle;
use std::sync::LazyLock;
use std::sync::{Mutex, MutexGuard};

/// The log4rs pattern used by the standard logger: timestamp, level, originating module, message.
#[cfg(feature = "logging")]
const DEFAULT_LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l} [{M}] {m}{n}";

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// A module-path-scoped override of the global log level filter.
#[derive(Debug, PartialEq)]
struct ModuleLogConfiguration {
    module: String,
    level: LevelFilter,
}

impl From<(&str, LevelFilter)> for ModuleLogConfiguration {
    fn from((module, level): (&str, LevelFilter)) -> Self {
        Self {
            module: module.to_string(),
            level,
        }
    }
}

/// Holds logging configuration: the default level and any per-module overrides, plus a handle
/// to the installed global logger. Only one instance should exist; the public API is free
/// functions that fetch the singleton.
#[derive(Debug, Default)]
pub(in crate::log) struct LogConfiguration {
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_configurations: HashMap<String, ModuleLogConfiguration>,

    #[cfg(feature = "logging")]
    root_handle: Option<Handle>,
}

impl LogConfiguration {
    pub(in crate::log) fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the configuration actually changed.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_configurations.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                let module_config = entry.get_mut();
                if module_config.level == level {
                    return false;
                }
                module_config.level = level;
                true
            }
            Entry::Vacant(entry) => {
                entry.insert((module, level).into());
                true
            }
        }
    }

    pub(in crate::log) fn set_module_filter(&mut self, module: &str, level: LevelFilter) {
        if self.insert_module_filter(module, level) {
            self.set_config();
        }
    }

    pub(in crate::log) fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }
}

// The public API.

/// Enables logging with no global level filter (equivalent to `set_log_level(LevelFilter::Trace)`).
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Disables logging entirely (equivalent to `set_log_level(LevelFilter::Off)`).
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the global log level. `LevelFilter::Off` disables logging.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Sets a level filter override for the given module path (e.g. `"masim::population"`).
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    get_log_configuration().set_module_filter(module_path, level_filter);
}

/// Removes a module-specific filter; the module reverts to the global level.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}

#[cfg(test)]
mod tests {
    use super::{get_log_configuration, remove_module_filter, set_log_level};
    use log::LevelFilter;
    use std::sync::{LazyLock, Mutex};

    // Logging tests mutate a process-global singleton; force them to run serially.
    static TEST_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    #[test]
    fn set_log_level_updates_configuration() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Trace);
        set_log_level(LevelFilter::Error);
        assert_eq!(
            get_log_configuration().global_log_level,
            LevelFilter::Error
        );
        set_log_level(LevelFilter::Off);
    }

    #[test]
    fn module_filters_install_and_remove() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        super::set_module_filter("masim::population", LevelFilter::Debug);
        assert_eq!(
            get_log_configuration()
                .module_configurations
                .get("masim::population")
                .map(|config| config.level),
            Some(LevelFilter::Debug)
        );
        remove_module_filter("masim::population");
        assert!(get_log_configuration()
            .module_configurations
            .get("masim::population")
            .is_none());
    }
}
