use crate::log::{LogConfiguration, ModuleLogConfiguration, DEFAULT_LOG_PATTERN};
use log4rs::{
    append::console::ConsoleAppender,
    config::{runtime::ConfigBuilder, Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    Config,
};

impl From<&ModuleLogConfiguration> for Logger {
    fn from(module_config: &ModuleLogConfiguration) -> Self {
        Logger::builder().build(module_config.module.clone(), module_config.level)
    }
}

impl LogConfiguration {
    /// Installs (or reconfigures) the global `log4rs` logger to match this configuration.
    pub(in crate::log) fn set_config(&mut self) {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(DEFAULT_LOG_PATTERN)))
            .build();
        let mut config: ConfigBuilder =
            Config::builder().appender(Appender::builder().build("stdout", Box::new(stdout)));

        for module_config in self.module_configurations.values() {
            config = config.logger(module_config.into());
        }

        let root = Root::builder()
            .appender("stdout")
            .build(self.global_log_level);
        let new_config = config.build(root).unwrap_or_else(|error| {
            panic!("failed to build logging configuration: {error}");
        });

        match self.root_handle {
            Some(ref mut handle) => handle.set_config(new_config),
            None => self.root_handle = Some(log4rs::init_config(new_config).unwrap()),
        }
    }
}
