use std::error::Error;

use log::LevelFilter;
use log4rs::append::file::FileAppender;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Config as LogConfig, Root},
    encode::pattern::PatternEncoder,
};

use crate::configure::AppConfig;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}";

pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info, // Default to Info
    }
}

/// Install the global log4rs logger.
///
/// Logs go to stderr so they never interleave with command output on stdout.
pub fn setup_logger(config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let log_level = parse_level(&config.log_level);

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();

    let mut log_config_builder = LogConfig::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)));

    let mut root_builder = Root::builder().appender("stderr");

    // Conditionally add file appender
    if config.log_to_file {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build(&config.log_file)?;

        log_config_builder = log_config_builder
            .appender(Appender::builder().build("file", Box::new(file)));

        root_builder = root_builder.appender("file");
    }

    let log_config = log_config_builder.build(root_builder.build(log_level))?;

    log4rs::init_config(log_config)?;

    Ok(())
}
