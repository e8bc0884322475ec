//! Logger set-up for the CLI.
//!
//! Log lines always go to stderr so that stdout carries only the formatted
//! result and stays pipeable.
use fern::colors::{Color, ColoredLevelConfig};
use fern::Dispatch;
use log::LevelFilter;
use std::env;

/// Used when neither `--log-level` nor `PVF_LOG_LEVEL` is set.
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Install the global logger. `--log-level` wins over `PVF_LOG_LEVEL`.
pub fn init(log_level_from_flag: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = log_level_from_flag
        .map(str::to_string)
        .or_else(|| env::var("PVF_LOG_LEVEL").ok())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    let log_level = match log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => return Err(format!("Unknown log level: {unknown}").into()),
    };

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let use_colour = atty::is(atty::Stream::Stderr);

    Dispatch::new()
        .format(move |out, message, record| {
            if use_colour {
                out.finish(format_args!(
                    "[{} {}] {}",
                    colours.color(record.level()),
                    record.target(),
                    message
                ));
            } else {
                out.finish(format_args!(
                    "[{} {}] {}",
                    record.level(),
                    record.target(),
                    message
                ));
            }
        })
        .level(log_level)
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}
