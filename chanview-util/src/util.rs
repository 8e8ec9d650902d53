use anyhow::{Context, Result};
#[cfg(feature = "main")]
use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
#[cfg(feature = "main")]
use std::path::Path;

#[cfg(feature = "main")]
use crate::log_utils::parse_log_level_filter;

/// Drop blank lines and whole-line `#` comments
pub fn line_filter(line: &str) -> Option<String> {
    let whitespace_removed = line.trim();
    if whitespace_removed.is_empty() || whitespace_removed.starts_with('#') {
        return None;
    }
    Some(whitespace_removed.to_string())
}

/// Read the meaningful lines of a file, see [line_filter]
pub fn read_lines_path(path: &str) -> Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("open {} failed", path))?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("read {} failed", path))?;
        if let Some(l) = line_filter(&line) {
            lines.push(l);
        }
    }
    Ok(lines)
}

/// Abort on panic.
/// Use this instead of `panic = abort` in Cargo.toml, which doesn't show
/// nice backtraces.
pub fn abort_on_panic() {
    let old = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        old(info);
        std::process::abort();
    }));
}

/// Log to the console and to `<datadir>/<who>.log`.
///
/// `RUST_LOG`, if set, overrides `level_arg`.
#[cfg(feature = "main")]
pub fn setup_logging<P: AsRef<Path>>(datadir: P, who: &str, level_arg: &str) -> Result<()> {
    use fern::colors::{Color, ColoredLevelConfig};

    let level = env::var("RUST_LOG").unwrap_or(level_arg.to_string());
    let level_filter = parse_log_level_filter(&level)?;

    std::fs::create_dir_all(datadir.as_ref())
        .with_context(|| format!("create {}", datadir.as_ref().display()))?;

    // file
    let who_clone = who.to_string();
    let logfile = datadir.as_ref().join(format!("{}.log", who));
    let logfile_handle =
        fern::log_file(&logfile).with_context(|| format!("open {}", logfile.display()))?;
    let file_config = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}/{} {}] {}",
                tstamp(),
                who_clone,
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level_filter)
        .chain(logfile_handle);

    // console
    let who_clone = who.to_string();
    let colors = ColoredLevelConfig::new().info(Color::Green).error(Color::Red).warn(Color::Yellow);
    let console_config = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}/{} {}] {}",
                tstamp(),
                who_clone,
                record.target(),
                colors.color(record.level()),
                message
            ))
        })
        .level(level_filter)
        .chain(std::io::stderr());

    fern::Dispatch::new().chain(console_config).chain(file_config).apply()?;
    Ok(())
}

// Would prefer to use now_local but https://rustsec.org/advisories/RUSTSEC-2020-0071
#[cfg(feature = "main")]
pub fn tstamp() -> String {
    use time::{macros::format_description, OffsetDateTime};

    OffsetDateTime::now_utc()
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
        ))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn line_filter_test() {
        assert_eq!(line_filter("#"), None);
        assert_eq!(line_filter("   "), None);
        assert_eq!(line_filter("   # comment  "), None);
        assert_eq!(
            line_filter(r#"  {"event": "reload"}  "#),
            Some(r#"{"event": "reload"}"#.to_string())
        );
        // only whole-line comments are stripped
        assert_eq!(
            line_filter(r##"{"alias": "#rekt"}"##),
            Some(r##"{"alias": "#rekt"}"##.to_string())
        );
    }

    #[test]
    fn read_lines_test() {
        let test_file_content = "\
        # replay script
        {\"event\": \"reload\"}

        # Another comment line after blank line
        {\"event\": \"close\", \"cid\": \"0101\"}
    ";
        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        write!(temp_file, "{}", test_file_content).unwrap();
        let lines = read_lines_path(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(
            lines,
            vec![
                "{\"event\": \"reload\"}".to_string(),
                "{\"event\": \"close\", \"cid\": \"0101\"}".to_string(),
            ]
        );
        temp_file.close().unwrap();
    }

    #[test]
    fn read_missing_file_test() {
        let err = read_lines_path("/nonexistent/chanview/events").unwrap_err();
        assert!(err.to_string().contains("open /nonexistent/chanview/events failed"));
    }

    #[cfg(feature = "main")]
    #[test]
    fn tstamp_test() {
        let ts = tstamp();
        assert_eq!(ts.len(), "2024-01-01 00:00:00.000".len());
    }
}
