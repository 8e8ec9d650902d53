use anyhow::{anyhow, Result};

const LOG_LEVEL_FILTERS: [log::LevelFilter; 6] = [
    log::LevelFilter::Off,
    log::LevelFilter::Error,
    log::LevelFilter::Warn,
    log::LevelFilter::Info,
    log::LevelFilter::Debug,
    log::LevelFilter::Trace,
];

/// Name for each log level
pub const LOG_LEVEL_FILTER_NAMES: [&'static str; 6] =
    ["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"];

/// Parse a log level name to a Level filter, ignoring case
pub fn parse_log_level_filter(lvlstr: &str) -> Result<log::LevelFilter> {
    let upper = lvlstr.to_ascii_uppercase();
    Ok(*LOG_LEVEL_FILTERS
        .iter()
        .find(|ll| upper == ll.as_str())
        .ok_or_else(|| anyhow!("invalid log level: {}", lvlstr))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_log_level_filter_test() {
        assert_eq!(parse_log_level_filter("debug").unwrap(), log::LevelFilter::Debug);
        assert_eq!(parse_log_level_filter("OFF").unwrap(), log::LevelFilter::Off);
        assert!(parse_log_level_filter("loud").is_err());
        for name in LOG_LEVEL_FILTER_NAMES {
            assert!(parse_log_level_filter(name).is_ok());
        }
    }
}
