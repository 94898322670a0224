use crate::config::Config;
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

pub struct Logger {}

impl Logger {
    /// Installs the console logger for the server and its tools.
    ///
    /// Records from the crates listed in `log_quiet_modules` are dropped unless
    /// the configured level is TRACE.
    pub fn init_logger(config: &Config) {
        // A second init (e.g. from a test harness) keeps the first logger.
        if let Err(e) = TermLogger::init(
            config.log_level_filter,
            Self::log_config(config),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ) {
            eprintln!("Logger already initialized: {e}");
        }
    }

    fn log_config(config: &Config) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();
        for module in Self::quiet_modules(config) {
            builder.add_filter_ignore(module.clone());
        }
        builder.build()
    }

    fn quiet_modules(config: &Config) -> &[String] {
        if config.log_level_filter == LevelFilter::Trace {
            return &[];
        }
        &config.log_quiet_modules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("forum_rs").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn socket_and_database_chatter_is_quiet_by_default() {
        let config = config(&["--log-level-filter", "DEBUG"]);

        let quiet = Logger::quiet_modules(&config);

        assert!(quiet.iter().any(|m| m == "tungstenite"));
        assert!(quiet.iter().any(|m| m == "sea_orm"));
        assert!(!quiet.iter().any(|m| m == "realtime" || m == "session"));
    }

    #[test]
    fn trace_lets_every_crate_through() {
        let config = config(&["--log-level-filter", "TRACE"]);

        assert!(Logger::quiet_modules(&config).is_empty());
    }

    #[test]
    fn quiet_list_is_configurable() {
        let config = config(&["--log-quiet-modules", "hyper,realtime"]);

        assert_eq!(Logger::quiet_modules(&config), ["hyper", "realtime"]);
    }
}
